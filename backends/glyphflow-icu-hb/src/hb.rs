// this_file: backends/glyphflow-icu-hb/src/hb.rs

//! The shaper-library seam and its HarfBuzz implementation.
//!
//! [`GlyphShaper`] is the boundary between the layout driver and the
//! shaping library: a script-homogeneous run goes in, visual-order glyphs
//! with 26.6 fixed-point metrics come out. The production implementation
//! drives HarfBuzz through `harfbuzz_rs` with one cached font handle per
//! typeface.

use crate::scripts::code_points;
use glyphflow_core::{FontHost, LayoutError, Result, TypefaceId};
use harfbuzz_rs::{Direction, Face, Font, Language, Owned, Tag, UnicodeBuffer};
use log::debug;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ops::Range;
use std::str::FromStr;
use std::sync::Arc;

/// Convert a 26.6 fixed-point value to device pixels.
pub fn fixed_to_float(value: i32) -> f32 {
    value as f32 / 64.0
}

/// One script run handed to the shaping library.
///
/// `range` selects the script run inside `text`, the working buffer of
/// the enclosing bidi run; cluster values in the result are code-unit
/// indices into that same buffer.
#[derive(Debug)]
pub struct ShapeRequest<'a> {
    pub text: &'a [u16],
    pub range: Range<usize>,
    pub script_tag: Tag,
    pub rtl: bool,
    pub typeface: TypefaceId,
    pub language: &'a str,
    /// Pixels per em, horizontal and vertical.
    pub x_ppem: u32,
    pub y_ppem: u32,
    /// 26.6 fixed-point scale from font units to device pixels.
    pub x_scale: i32,
    pub y_scale: i32,
}

/// Shaped output for one script run, all arrays indexed by glyph in
/// visual order.
#[derive(Debug, Default)]
pub struct RawRun {
    pub glyphs: Vec<u32>,
    /// Leading code-unit index of each glyph's cluster.
    pub clusters: Vec<u32>,
    /// 26.6 fixed-point advances.
    pub advances: Vec<i32>,
    /// 26.6 fixed-point (x, y) offsets.
    pub offsets: Vec<(i32, i32)>,
}

/// A shaping library able to turn one script run into positioned glyphs.
pub trait GlyphShaper: Send {
    fn shape_run(&mut self, request: &ShapeRequest<'_>) -> Result<RawRun>;

    /// Drop cached per-typeface shaper faces.
    fn purge(&mut self);
}

/// HarfBuzz-backed [`GlyphShaper`] with a per-typeface font-handle cache.
pub struct HbGlyphShaper {
    host: Arc<dyn FontHost>,
    faces: HashMap<TypefaceId, Owned<Font<'static>>>,
}

impl HbGlyphShaper {
    pub fn new(host: Arc<dyn FontHost>) -> Self {
        Self {
            host,
            faces: HashMap::new(),
        }
    }

    fn font_for(&mut self, typeface: TypefaceId) -> Result<&mut Owned<Font<'static>>> {
        match self.faces.entry(typeface) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let data = self
                    .host
                    .font_data(typeface)
                    .ok_or(LayoutError::MissingFontData { typeface })?;
                // HarfBuzz borrows the bytes for the life of the face, so
                // they need a 'static home.
                let bytes: &'static [u8] = Box::leak(data.as_ref().clone().into_boxed_slice());
                let face = Face::from_bytes(bytes, 0);
                let font = Font::new(face);
                debug!(
                    target: "glyphflow::shaper",
                    "created shaper face for typeface {typeface:?}",
                );
                Ok(entry.insert(font))
            }
        }
    }
}

impl GlyphShaper for HbGlyphShaper {
    fn shape_run(&mut self, request: &ShapeRequest<'_>) -> Result<RawRun> {
        let font = self.font_for(request.typeface)?;
        font.set_ppem(request.x_ppem, request.y_ppem);
        font.set_scale(request.x_scale, request.y_scale);

        let mut buffer = UnicodeBuffer::new()
            .set_direction(if request.rtl {
                Direction::Rtl
            } else {
                Direction::Ltr
            })
            .set_script(request.script_tag)
            .set_language(Language::from_str(request.language).unwrap_or_default());
        for (offset, ch) in code_points(&request.text[request.range.clone()]) {
            buffer = buffer.add(ch as u32, (request.range.start + offset) as u32);
        }

        let output = harfbuzz_rs::shape(&*font, buffer, &[]);
        let infos = output.get_glyph_infos();
        let positions = output.get_glyph_positions();

        let mut run = RawRun::default();
        run.glyphs.reserve(infos.len());
        run.clusters.reserve(infos.len());
        run.advances.reserve(infos.len());
        run.offsets.reserve(infos.len());
        for (info, pos) in infos.iter().zip(positions.iter()) {
            run.glyphs.push(info.codepoint);
            run.clusters.push(info.cluster);
            run.advances.push(pos.x_advance);
            run.offsets.push((pos.x_offset, pos.y_offset));
        }
        Ok(run)
    }

    fn purge(&mut self) {
        self.faces.clear();
    }
}
