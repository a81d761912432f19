// this_file: backends/glyphflow-icu-hb/src/lib.rs

//! ICU + HarfBuzz shaping backend for the glyphflow text layout engine.
//!
//! This crate supplies the [`LayoutShaper`](glyphflow_core::LayoutShaper)
//! implementation behind [`glyphflow_core::TextLayoutEngine`]: bidi
//! resolution over UTF-16 contexts, combining-mark composition, RTL
//! mirroring, script itemization, script-aware typeface fallback, and
//! HarfBuzz shaping with per-typeface face caching.

pub mod hb;
pub mod host;
pub mod scripts;
pub mod shaper;

pub use hb::{GlyphShaper, HbGlyphShaper, RawRun, ShapeRequest};
pub use host::FileFontHost;
pub use scripts::ScriptRun;
pub use shaper::TextShaper;

use glyphflow_core::{FontHost, TextLayoutEngine};
use std::sync::Arc;

/// A ready-to-use engine: HarfBuzz shaping over `host` with the default
/// layout cache budget.
pub fn layout_engine(host: Arc<dyn FontHost>) -> TextLayoutEngine {
    TextLayoutEngine::new(Box::new(TextShaper::new(host)))
}
