// this_file: backends/glyphflow-core/src/traits.rs

//! Collaborator traits consumed by the engine and cache.

use crate::types::{BidiRequest, LayoutValue, Paint, TypefaceId, TypefaceStyle};
use std::sync::Arc;

/// Source of typefaces and font data.
///
/// The host owns every typeface it hands out, including script fallbacks;
/// the engine only records ids and never releases what it did not create.
pub trait FontHost: Send + Sync {
    /// The typeface used when a paint carries none.
    fn default_typeface(&self) -> TypefaceId;

    /// Style of a typeface the host handed out earlier.
    fn typeface_style(&self, typeface: TypefaceId) -> TypefaceStyle;

    /// A fallback typeface covering `script` (a Unicode script name such
    /// as `"Hebrew"`) in the given style, if the host has one.
    fn typeface_for_script(&self, script: &str, style: TypefaceStyle) -> Option<TypefaceId>;

    /// Glyph-namespace base for `codepoint` under `typeface`.
    ///
    /// Returns 0 when the typeface covers the code point itself.
    /// Otherwise the result is the offset to add to glyph ids shaped with
    /// the fallback face, so callers see ids in one unified namespace.
    fn base_glyph_count(&self, typeface: TypefaceId, codepoint: u32) -> u32;

    /// Raw font bytes backing a typeface, for building shaper faces.
    fn font_data(&self, typeface: TypefaceId) -> Option<Arc<Vec<u8>>>;
}

/// The shaping driver invoked by the cache (or engine) on a lookup miss.
pub trait LayoutShaper: Send {
    /// Fill `value` with advances, glyphs, and positions for the window
    /// `[start, start + count)` of `text`, shaped with `paint` in the
    /// requested direction. `value` arrives empty and sized for the
    /// context; implementations must keep `value.advances.len()` equal to
    /// `text.len()` and leave out-of-window slots at zero.
    fn compute_values(
        &mut self,
        value: &mut LayoutValue,
        paint: &Paint,
        text: &[u16],
        start: usize,
        count: usize,
        dir: BidiRequest,
    );

    /// Drop cached per-typeface shaper state.
    fn purge(&mut self);
}
