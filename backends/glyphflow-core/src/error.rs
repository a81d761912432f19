// this_file: backends/glyphflow-core/src/error.rs

//! Error types for glyphflow.
//!
//! Most shaping-side failures are recovered internally (a failed script
//! run is skipped, a failed bidi resolution collapses to a single run),
//! so the surface here is small: caller bugs and font host problems.

use crate::types::TypefaceId;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for glyphflow operations.
#[derive(Error, Debug)]
pub enum LayoutError {
    /// The requested window does not fit inside the context buffer.
    #[error("layout window start {start} + count {count} exceeds context of {context_count} code units")]
    WindowOutOfBounds {
        start: usize,
        count: usize,
        context_count: usize,
    },

    /// The font host has no data for a typeface it handed out.
    #[error("no font data available for typeface {typeface:?}")]
    MissingFontData { typeface: TypefaceId },

    /// A shaper face could not be created from the host's font data.
    #[error("failed to create shaper face for typeface {typeface:?}")]
    FaceCreation { typeface: TypefaceId },

    /// A font file could not be read.
    #[error("failed to load font file {path}: {source}")]
    FontLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Font data did not parse as a supported font format.
    #[error("invalid font data in {path}")]
    InvalidFont { path: PathBuf },
}
