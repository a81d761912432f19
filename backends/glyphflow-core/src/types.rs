// this_file: backends/glyphflow-core/src/types.rs

//! Core types used throughout the glyphflow layout engine.
//!
//! Text is carried as UTF-16 code units; every index in this crate
//! (window offsets, advance slots, cluster values) is a code-unit
//! position within the caller's context buffer.

use serde::{Deserialize, Serialize};

/// Opaque identity of a typeface. Equality is by id; the font data and
/// lifetime behind an id are owned by the [`FontHost`](crate::FontHost).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypefaceId(pub u64);

/// Direction request for a layout lookup.
///
/// The `Default*` variants resolve the paragraph level from the text and
/// fall back to the named direction when no strong character decides it.
/// The `Force*` variants skip bidi resolution entirely and treat the
/// whole window as a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidiRequest {
    Ltr,
    Rtl,
    DefaultLtr,
    DefaultRtl,
    ForceLtr,
    ForceRtl,
}

impl BidiRequest {
    /// Whether the request asks for right-to-left when resolution is
    /// unavailable.
    pub fn prefers_rtl(self) -> bool {
        matches!(self, BidiRequest::Rtl | BidiRequest::DefaultRtl)
    }
}

/// Style of a typeface, used when picking a script fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypefaceStyle {
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

/// Glyph hinting mode carried on the paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hinting {
    None,
    Slight,
    Full,
}

/// Font variant carried on the paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontVariant {
    Default,
    Compact,
    Elegant,
}

/// Paint flag: synthesize a bold face when the typeface has none.
pub const PAINT_FLAG_FAKE_BOLD: u32 = 1 << 0;
/// Paint flag: position glyphs at subpixel granularity.
pub const PAINT_FLAG_SUBPIXEL: u32 = 1 << 1;
/// Paint flag: apply device kerning.
pub const PAINT_FLAG_DEV_KERN: u32 = 1 << 2;

/// The subset of paint state that affects shaping and therefore layout
/// cache identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    /// Primary typeface; `None` selects the host's default.
    pub typeface: Option<TypefaceId>,
    /// Text size in device pixels.
    pub text_size: f32,
    /// Horizontal skew applied to glyph offsets.
    pub text_skew_x: f32,
    /// Horizontal scale applied on top of the text size.
    pub text_scale_x: f32,
    /// Bitfield of `PAINT_FLAG_*` values.
    pub flags: u32,
    pub hinting: Hinting,
    pub variant: FontVariant,
    /// BCP-47 language tag, compared by value.
    pub language: String,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            typeface: None,
            text_size: 12.0,
            text_skew_x: 0.0,
            text_scale_x: 1.0,
            flags: 0,
            hinting: Hinting::Slight,
            variant: FontVariant::Default,
            language: String::new(),
        }
    }
}

impl Paint {
    pub fn new(typeface: Option<TypefaceId>, text_size: f32) -> Self {
        Self {
            typeface,
            text_size,
            ..Self::default()
        }
    }
}

/// An immutable shaped layout, shared by reference once the cache has
/// published it.
///
/// `advances` has one slot per context code unit; slots outside the
/// requested window stay at zero, and within a cluster only the leading
/// code unit carries the cluster's advance. `glyphs` are in visual order
/// across all runs, and `positions` holds an interleaved `(x, y)` pair
/// per glyph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutValue {
    pub advances: Vec<f32>,
    pub total_advance: f32,
    pub glyphs: Vec<u32>,
    pub positions: Vec<f32>,
    /// Time taken to compute this value, for cache diagnostics only.
    pub elapsed_nanos: u64,
}

impl LayoutValue {
    /// An empty value sized for a context of `context_count` code units.
    pub fn new(context_count: usize) -> Self {
        Self {
            advances: vec![0.0; context_count],
            total_advance: 0.0,
            glyphs: Vec::new(),
            positions: Vec::new(),
            elapsed_nanos: 0,
        }
    }

    /// Bytes attributed to this value in the cache budget, based on
    /// allocated capacity rather than logical length.
    pub fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + std::mem::size_of::<f32>() * self.advances.capacity()
            + std::mem::size_of::<u32>() * self.glyphs.capacity()
            + std::mem::size_of::<f32>() * self.positions.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_value_is_all_zero() {
        let value = LayoutValue::new(4);
        assert_eq!(value.advances, vec![0.0; 4]);
        assert_eq!(value.total_advance, 0.0);
        assert!(value.glyphs.is_empty());
        assert!(value.positions.is_empty());
    }

    #[test]
    fn byte_size_tracks_capacity() {
        let mut value = LayoutValue::new(8);
        let before = value.byte_size();
        value.glyphs.reserve(64);
        assert!(value.byte_size() > before);
    }
}
