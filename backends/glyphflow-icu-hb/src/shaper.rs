// this_file: backends/glyphflow-icu-hb/src/shaper.rs

//! The layout driver: bidi resolution, run preparation, script dispatch.
//!
//! A lookup window is segmented into visual runs with the Unicode
//! Bidirectional Algorithm, each run is normalized (combining marks
//! composed, mirrored code points swapped for RTL) into a working buffer,
//! split into script runs, and shaped through a [`GlyphShaper`]. Glyph
//! advances are folded back into one advance per cluster, indexed by
//! code-unit position in the caller's context.

use crate::hb::{fixed_to_float, GlyphShaper, HbGlyphShaper, ShapeRequest};
use crate::scripts::{self, code_points, ScriptRun};
use glyphflow_core::{BidiRequest, FontHost, LayoutShaper, LayoutValue, Paint};
use icu_normalizer::ComposingNormalizer;
use icu_properties::bidi_data::{self, BidiAuxiliaryPropertiesBorrowed};
use icu_properties::maps::{self, CodePointMapDataBorrowed};
use icu_properties::names::PropertyEnumToValueNameLinearMapperBorrowed;
use icu_properties::Script;
use log::warn;
use std::ops::Range;
use std::sync::Arc;
use unicode_bidi::utf16::BidiInfo;
use unicode_bidi::{BidiClass, Level};

/// ZERO WIDTH SPACE, used to pad composed clusters so the working buffer
/// keeps one slot per code unit. ZWNJ and ZWJ would change shaping, and
/// some fonts are missing their glyphs.
const ZWSP: u16 = 0x200B;

fn is_combining_diacritic(unit: u16) -> bool {
    (0x0300..=0x036F).contains(&unit)
}

/// UAX#9 P2/P3: the paragraph level of the first strong character, or
/// `fallback` when the text has none.
fn first_strong_level(text: &[u16], fallback: Level) -> Level {
    for (_, ch) in code_points(text) {
        match unicode_bidi::bidi_class(ch) {
            BidiClass::L => return Level::ltr(),
            BidiClass::R | BidiClass::AL => return Level::rtl(),
            _ => {}
        }
    }
    fallback
}

/// The ICU + HarfBuzz implementation of [`LayoutShaper`].
///
/// Generic over the shaping seam so the driver can be exercised with a
/// deterministic backend; production code uses [`HbGlyphShaper`].
pub struct TextShaper<B: GlyphShaper = HbGlyphShaper> {
    host: Arc<dyn FontHost>,
    backend: B,
    script_map: CodePointMapDataBorrowed<'static, Script>,
    script_names: PropertyEnumToValueNameLinearMapperBorrowed<'static, Script>,
    mirrors: BidiAuxiliaryPropertiesBorrowed<'static>,
    nfc: ComposingNormalizer,
}

impl TextShaper<HbGlyphShaper> {
    pub fn new(host: Arc<dyn FontHost>) -> Self {
        let backend = HbGlyphShaper::new(Arc::clone(&host));
        Self::with_backend(host, backend)
    }
}

impl<B: GlyphShaper> TextShaper<B> {
    pub fn with_backend(host: Arc<dyn FontHost>, backend: B) -> Self {
        Self {
            host,
            backend,
            script_map: maps::script(),
            script_names: Script::enum_to_long_name_mapper(),
            mirrors: bidi_data::bidi_auxiliary_properties(),
            nfc: ComposingNormalizer::new_nfc(),
        }
    }

    /// Compose each trailing subrun of combining diacritical marks with
    /// its base, padding the freed slots with ZWSP, so the shaper sees a
    /// precomposed code point while advances keep per-code-unit arity.
    ///
    /// Scans right to left; a composition that does not fit the original
    /// span leaves that subrun unmodified.
    fn compose_marks(&self, chars: &[u16], working: &mut Option<Vec<u16>>) {
        let mut i = chars.len() as isize - 1;
        while i >= 0 {
            if !is_combining_diacritic(chars[i as usize]) {
                i -= 1;
                continue;
            }
            // Several marks can sit in a row; find the base below them.
            let mut j = i - 1;
            while j >= 0 && is_combining_diacritic(chars[j as usize]) {
                j -= 1;
            }
            if j < 0 {
                break;
            }
            let span = j as usize..i as usize + 1;
            let composed = self.nfc.normalize_utf16(&chars[span.clone()]);
            if composed.len() <= span.len() {
                let buf = working.get_or_insert_with(|| chars.to_vec());
                let base = span.start;
                buf[base..base + composed.len()].copy_from_slice(&composed);
                for slot in &mut buf[base + composed.len()..span.end] {
                    *slot = ZWSP;
                }
            }
            i = j - 1;
        }
    }

    /// Swap every code point carrying a Bidi_Mirroring_Glyph pair for its
    /// mirror. The shaping library does not mirror in all cases, so this
    /// happens up front for RTL runs.
    fn mirror_chars(&self, chars: &[u16], working: &mut Option<Vec<u16>>) {
        for (idx, unit) in chars.iter().enumerate() {
            let props = self.mirrors.get32_mirroring_props(*unit as u32);
            if !props.mirrored {
                continue;
            }
            let Some(mirror) = props.mirroring_glyph else {
                continue;
            };
            if mirror as u32 > 0xFFFF {
                continue;
            }
            let buf = working.get_or_insert_with(|| chars.to_vec());
            buf[idx] = mirror as u16;
        }
    }

    /// Shape one bidi run covering `range` of the context.
    fn shape_bidi_run(
        &mut self,
        value: &mut LayoutValue,
        paint: &Paint,
        text: &[u16],
        range: Range<usize>,
        rtl: bool,
    ) {
        let chars = &text[range.clone()];
        if chars.is_empty() {
            return;
        }

        let mut working: Option<Vec<u16>> = None;
        self.compose_marks(chars, &mut working);
        if rtl {
            self.mirror_chars(chars, &mut working);
        }
        let work: &[u16] = working.as_deref().unwrap_or(chars);

        let runs = scripts::script_runs(work, &self.script_map);
        if rtl {
            // Walk script runs back to front so glyph emission stays in
            // visual order across the whole bidi run.
            for run in runs.iter().rev() {
                self.shape_script_run(value, paint, work, range.start, run, rtl);
            }
        } else {
            for run in &runs {
                self.shape_script_run(value, paint, work, range.start, run, rtl);
            }
        }
    }

    fn shape_script_run(
        &mut self,
        value: &mut LayoutValue,
        paint: &Paint,
        work: &[u16],
        context_start: usize,
        run: &ScriptRun,
        rtl: bool,
    ) {
        let paint_typeface = paint
            .typeface
            .unwrap_or_else(|| self.host.default_typeface());

        // Complex scripts may need a fallback face; the base glyph count
        // keeps glyph ids from different faces in one namespace.
        let mut typeface = paint_typeface;
        let mut base_glyph = 0u32;
        if scripts::is_complex(run.script) {
            if let Some(cp) = first_non_space(&work[run.range.clone()]) {
                base_glyph = self.host.base_glyph_count(paint_typeface, cp);
            }
            if base_glyph != 0 {
                let style = self.host.typeface_style(paint_typeface);
                let name = self.script_names.get(run.script).unwrap_or("Unknown");
                typeface = self
                    .host
                    .typeface_for_script(name, style)
                    .unwrap_or_else(|| self.host.default_typeface());
            }
        }

        let request = ShapeRequest {
            text: work,
            range: run.range.clone(),
            script_tag: scripts::shaping_tag(run.script),
            rtl,
            typeface,
            language: &paint.language,
            x_ppem: (paint.text_scale_x * paint.text_size + 0.5).floor() as u32,
            y_ppem: paint.text_size as u32,
            x_scale: (paint.text_scale_x * paint.text_size * 64.0).round() as i32,
            y_scale: (paint.text_size * 64.0).round() as i32,
        };

        let raw = match self.backend.shape_run(&request) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(target: "glyphflow::shaper", "script run skipped: {err}");
                return;
            }
        };
        if raw.glyphs.is_empty() {
            return;
        }

        // One pass folds glyph advances into their cluster's leading code
        // unit and emits glyphs and pen positions in visual order.
        let mut x = value.total_advance;
        for i in 0..raw.glyphs.len() {
            let advance = fixed_to_float(raw.advances[i]);
            let slot = context_start + raw.clusters[i] as usize;
            if let Some(entry) = value.advances.get_mut(slot) {
                *entry += advance;
            }
            value.glyphs.push(raw.glyphs[i] + base_glyph);
            let (xo, yo) = raw.offsets[i];
            let xo = fixed_to_float(xo);
            let yo = fixed_to_float(yo);
            value.positions.push(x + xo + yo * paint.text_skew_x);
            value.positions.push(yo);
            x += advance;
        }
        value.total_advance = x;
    }
}

fn first_non_space(units: &[u16]) -> Option<u32> {
    code_points(units)
        .map(|(_, ch)| ch)
        .find(|ch| *ch != ' ')
        .map(|ch| ch as u32)
}

impl<B: GlyphShaper> LayoutShaper for TextShaper<B> {
    fn compute_values(
        &mut self,
        value: &mut LayoutValue,
        paint: &Paint,
        text: &[u16],
        start: usize,
        count: usize,
        dir: BidiRequest,
    ) {
        value.advances.clear();
        value.advances.resize(text.len(), 0.0);
        value.glyphs.clear();
        value.positions.clear();
        value.total_advance = 0.0;
        if count == 0 {
            return;
        }
        let end = start + count;

        let (skip_bidi, level) = match dir {
            BidiRequest::ForceLtr => (true, Level::ltr()),
            BidiRequest::ForceRtl => (true, Level::rtl()),
            BidiRequest::Ltr => (false, Level::ltr()),
            BidiRequest::Rtl => (false, Level::rtl()),
            BidiRequest::DefaultLtr => (false, first_strong_level(text, Level::ltr())),
            BidiRequest::DefaultRtl => (false, first_strong_level(text, Level::rtl())),
        };
        if skip_bidi {
            self.shape_bidi_run(value, paint, text, start..end, level.is_rtl());
            return;
        }

        let bidi = BidiInfo::new(text, Some(level));
        let para_rtl = bidi
            .paragraphs
            .first()
            .map_or(level.is_rtl(), |p| p.level.is_rtl());

        let mut runs: Vec<(Range<usize>, bool)> = Vec::new();
        for para in &bidi.paragraphs {
            let (levels, ranges) = bidi.visual_runs(para, para.range.clone());
            for range in ranges {
                let run_rtl = levels[range.start].is_rtl();
                runs.push((range, run_rtl));
            }
        }

        match runs.len() {
            0 => {
                // No usable runs; collapse to one run in the requested
                // direction.
                warn!(
                    target: "glyphflow::shaper",
                    "bidi resolution produced no runs for a {count}-unit window",
                );
                self.shape_bidi_run(value, paint, text, start..end, dir.prefers_rtl());
            }
            1 => self.shape_bidi_run(value, paint, text, start..end, para_rtl),
            _ => {
                for (range, run_rtl) in runs {
                    let clipped = range.start.max(start)..range.end.min(end);
                    if clipped.start >= clipped.end {
                        continue;
                    }
                    self.shape_bidi_run(value, paint, text, clipped, run_rtl);
                }
            }
        }
    }

    fn purge(&mut self) {
        self.backend.purge();
    }
}
