// this_file: backends/glyphflow-core/src/lib.rs

//! Core traits and types for the glyphflow text layout engine.
//!
//! This crate holds the layout data model (keys, shaped values, paint
//! style), the byte-budgeted layout cache, and the engine facade. The
//! actual Unicode and shaping work lives behind the [`LayoutShaper`]
//! trait, implemented by backend crates such as `glyphflow-icu-hb`.

pub mod cache;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod traits;
pub mod types;

pub use cache::{LayoutCache, LayoutKey, DEFAULT_CACHE_BYTES};
pub use diagnostics::CacheStats;
pub use engine::TextLayoutEngine;
pub use error::LayoutError;
pub use traits::{FontHost, LayoutShaper};
pub use types::{
    BidiRequest, FontVariant, Hinting, LayoutValue, Paint, TypefaceId, TypefaceStyle,
};

/// Result type for glyphflow operations
pub type Result<T> = std::result::Result<T, LayoutError>;
