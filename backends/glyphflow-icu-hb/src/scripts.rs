// this_file: backends/glyphflow-icu-hb/src/scripts.rs

//! Script itemization and UTF-16 decoding for the shaping driver.
//!
//! A bidi run is split into maximal subranges sharing one Unicode script
//! before shaping; mixing scripts in a single shaping call produces wrong
//! glyph selection. Common and Inherited code points never open a run of
//! their own, they attach to whichever run surrounds them.

use harfbuzz_rs::Tag;
use icu_properties::maps::CodePointMapDataBorrowed;
use icu_properties::Script;
use std::ops::Range;

/// A maximal subrange of a bidi run sharing one script.
///
/// `range` is in code units, relative to the working buffer the run was
/// segmented from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRun {
    pub range: Range<usize>,
    pub script: Script,
}

/// Iterate `(leading code-unit index, char)` over UTF-16 code units.
///
/// Surrogate pairs decode to their supplementary code point at the index
/// of the high surrogate; unpaired surrogates yield U+FFFD.
pub fn code_points(units: &[u16]) -> impl Iterator<Item = (usize, char)> + '_ {
    let mut i = 0;
    std::iter::from_fn(move || {
        if i >= units.len() {
            return None;
        }
        let start = i;
        let unit = units[i];
        i += 1;
        let ch = if (0xD800..0xDC00).contains(&unit)
            && i < units.len()
            && (0xDC00..0xE000).contains(&units[i])
        {
            let low = units[i];
            i += 1;
            let cp = 0x10000 + (((unit as u32 - 0xD800) << 10) | (low as u32 - 0xDC00));
            char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER)
        } else {
            char::from_u32(unit as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
        };
        Some((start, ch))
    })
}

fn is_significant(script: Script) -> bool {
    !matches!(script, Script::Common | Script::Inherited | Script::Unknown)
}

/// Whether a script needs fallback-aware shaping.
///
/// The basic set shapes correctly with any face that covers it; everything
/// else may require a script-specific fallback typeface.
pub fn is_complex(script: Script) -> bool {
    !matches!(
        script,
        Script::Common
            | Script::Inherited
            | Script::Latin
            | Script::Greek
            | Script::Cyrillic
            | Script::Hangul
    )
}

/// Segment a working buffer into script runs, in logical order.
///
/// The first significant script names a run; Common, Inherited, and
/// Unknown code points attach to the current run. A run that never sees a
/// significant script stays `Common`.
pub fn script_runs(
    units: &[u16],
    script_map: &CodePointMapDataBorrowed<'static, Script>,
) -> Vec<ScriptRun> {
    let mut runs = Vec::new();
    if units.is_empty() {
        return runs;
    }

    let mut run_start = 0;
    let mut run_script = Script::Common;
    for (idx, ch) in code_points(units) {
        let script = script_map.get(ch);
        if !is_significant(script) {
            continue;
        }
        if !is_significant(run_script) {
            run_script = script;
            continue;
        }
        if script == run_script {
            continue;
        }
        runs.push(ScriptRun {
            range: run_start..idx,
            script: run_script,
        });
        run_start = idx;
        run_script = script;
    }
    runs.push(ScriptRun {
        range: run_start..units.len(),
        script: run_script,
    });
    runs
}

/// ISO 15924 script tag used to drive the shaper for `script`.
pub fn shaping_tag(script: Script) -> Tag {
    match script {
        Script::Latin => Tag::new('L', 'a', 't', 'n'),
        Script::Greek => Tag::new('G', 'r', 'e', 'k'),
        Script::Cyrillic => Tag::new('C', 'y', 'r', 'l'),
        Script::Arabic => Tag::new('A', 'r', 'a', 'b'),
        Script::Hebrew => Tag::new('H', 'e', 'b', 'r'),
        Script::Syriac => Tag::new('S', 'y', 'r', 'c'),
        Script::Thaana => Tag::new('T', 'h', 'a', 'a'),
        Script::Devanagari => Tag::new('D', 'e', 'v', 'a'),
        Script::Bengali => Tag::new('B', 'e', 'n', 'g'),
        Script::Gurmukhi => Tag::new('G', 'u', 'r', 'u'),
        Script::Gujarati => Tag::new('G', 'u', 'j', 'r'),
        Script::Oriya => Tag::new('O', 'r', 'y', 'a'),
        Script::Tamil => Tag::new('T', 'a', 'm', 'l'),
        Script::Telugu => Tag::new('T', 'e', 'l', 'u'),
        Script::Kannada => Tag::new('K', 'n', 'd', 'a'),
        Script::Malayalam => Tag::new('M', 'l', 'y', 'm'),
        Script::Sinhala => Tag::new('S', 'i', 'n', 'h'),
        Script::Thai => Tag::new('T', 'h', 'a', 'i'),
        Script::Lao => Tag::new('L', 'a', 'o', 'o'),
        Script::Tibetan => Tag::new('T', 'i', 'b', 't'),
        Script::Myanmar => Tag::new('M', 'y', 'm', 'r'),
        Script::Khmer => Tag::new('K', 'h', 'm', 'r'),
        Script::Georgian => Tag::new('G', 'e', 'o', 'r'),
        Script::Armenian => Tag::new('A', 'r', 'm', 'n'),
        Script::Ethiopian => Tag::new('E', 't', 'h', 'i'),
        Script::Hangul => Tag::new('H', 'a', 'n', 'g'),
        Script::Han => Tag::new('H', 'a', 'n', 'i'),
        Script::Hiragana => Tag::new('H', 'i', 'r', 'a'),
        Script::Katakana => Tag::new('K', 'a', 'n', 'a'),
        _ => Tag::new('Z', 'y', 'y', 'y'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icu_properties::maps;

    fn utf16(text: &str) -> Vec<u16> {
        text.encode_utf16().collect()
    }

    #[test]
    fn code_points_decode_surrogate_pairs() {
        let units = utf16("a\u{1D11E}b");
        let decoded: Vec<(usize, char)> = code_points(&units).collect();
        assert_eq!(decoded, vec![(0, 'a'), (1, '\u{1D11E}'), (3, 'b')]);
    }

    #[test]
    fn code_points_replace_unpaired_surrogates() {
        let units = vec![0x0061, 0xD834, 0x0062];
        let decoded: Vec<char> = code_points(&units).map(|(_, ch)| ch).collect();
        assert_eq!(decoded, vec!['a', char::REPLACEMENT_CHARACTER, 'b']);
    }

    #[test]
    fn splits_on_script_change() {
        let map = maps::script();
        let runs = script_runs(&utf16("ab\u{05D0}\u{05D1}"), &map);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].range, 0..2);
        assert_eq!(runs[0].script, Script::Latin);
        assert_eq!(runs[1].range, 2..4);
        assert_eq!(runs[1].script, Script::Hebrew);
    }

    #[test]
    fn common_attaches_to_the_surrounding_run() {
        let map = maps::script();
        let runs = script_runs(&utf16("12 ab, cd"), &map);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].range, 0..9);
        assert_eq!(runs[0].script, Script::Latin);
    }

    #[test]
    fn common_only_text_stays_common() {
        let map = maps::script();
        let runs = script_runs(&utf16("123 ()"), &map);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].script, Script::Common);
    }

    #[test]
    fn complex_classification() {
        assert!(!is_complex(Script::Latin));
        assert!(!is_complex(Script::Common));
        assert!(!is_complex(Script::Hangul));
        assert!(is_complex(Script::Hebrew));
        assert!(is_complex(Script::Arabic));
        assert!(is_complex(Script::Devanagari));
    }

    #[test]
    fn shaping_tags_for_major_scripts() {
        assert_eq!(shaping_tag(Script::Arabic), Tag::new('A', 'r', 'a', 'b'));
        assert_eq!(shaping_tag(Script::Hebrew), Tag::new('H', 'e', 'b', 'r'));
        assert_eq!(shaping_tag(Script::Ogham), Tag::new('Z', 'y', 'y', 'y'));
    }
}
