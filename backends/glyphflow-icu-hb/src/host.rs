// this_file: backends/glyphflow-icu-hb/src/host.rs

//! A file-backed [`FontHost`] for embedders without their own font stack.
//!
//! Faces are registered explicitly (the default face first), each gets a
//! glyph-namespace base from the cumulative glyph counts of the faces
//! before it, and script fallbacks are declared per (script name, style).
//! The host owns every face it hands out; ids stay valid for its whole
//! lifetime.

use glyphflow_core::{FontHost, LayoutError, Result, TypefaceId, TypefaceStyle};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
struct HostFace {
    data: Arc<Vec<u8>>,
    style: TypefaceStyle,
    glyph_base: u32,
    glyph_count: u32,
}

#[derive(Debug)]
pub struct FileFontHost {
    faces: Vec<HostFace>,
    by_script: HashMap<(String, TypefaceStyle), TypefaceId>,
    default_typeface: TypefaceId,
}

impl FileFontHost {
    /// A host whose default face comes from a font file.
    pub fn new(default_font: impl AsRef<Path>, style: TypefaceStyle) -> Result<Self> {
        let mut host = Self::empty();
        host.default_typeface = host.register_file(default_font, style)?;
        Ok(host)
    }

    /// A host whose default face comes from in-memory font data.
    pub fn from_bytes(data: Vec<u8>, style: TypefaceStyle) -> Result<Self> {
        let mut host = Self::empty();
        host.default_typeface = host.register_bytes(data, style)?;
        Ok(host)
    }

    fn empty() -> Self {
        Self {
            faces: Vec::new(),
            by_script: HashMap::new(),
            default_typeface: TypefaceId(0),
        }
    }

    /// Register a font file and return its typeface id.
    pub fn register_file(
        &mut self,
        path: impl AsRef<Path>,
        style: TypefaceStyle,
    ) -> Result<TypefaceId> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| LayoutError::FontLoad {
            path: path.to_path_buf(),
            source,
        })?;
        self.register(data, style, path.to_path_buf())
    }

    /// Register in-memory font data and return its typeface id.
    pub fn register_bytes(&mut self, data: Vec<u8>, style: TypefaceStyle) -> Result<TypefaceId> {
        self.register(data, style, PathBuf::from("<bytes>"))
    }

    fn register(
        &mut self,
        data: Vec<u8>,
        style: TypefaceStyle,
        origin: PathBuf,
    ) -> Result<TypefaceId> {
        let face =
            ttf_parser::Face::parse(&data, 0).map_err(|_| LayoutError::InvalidFont { path: origin })?;
        let glyph_count = u32::from(face.number_of_glyphs());
        let glyph_base = self
            .faces
            .last()
            .map_or(0, |prev| prev.glyph_base + prev.glyph_count);
        self.faces.push(HostFace {
            data: Arc::new(data),
            style,
            glyph_base,
            glyph_count,
        });
        Ok(TypefaceId(self.faces.len() as u64))
    }

    /// Declare `typeface` as the fallback for a script (long Unicode
    /// script name, e.g. `"Hebrew"`) in the given style.
    pub fn set_script_fallback(
        &mut self,
        script: impl Into<String>,
        style: TypefaceStyle,
        typeface: TypefaceId,
    ) {
        self.by_script.insert((script.into(), style), typeface);
    }

    fn face(&self, typeface: TypefaceId) -> Option<&HostFace> {
        let index = usize::try_from(typeface.0).ok()?.checked_sub(1)?;
        self.faces.get(index)
    }

    fn covers(face: &HostFace, ch: char) -> bool {
        ttf_parser::Face::parse(&face.data, 0)
            .ok()
            .and_then(|f| f.glyph_index(ch))
            .is_some()
    }
}

impl FontHost for FileFontHost {
    fn default_typeface(&self) -> TypefaceId {
        self.default_typeface
    }

    fn typeface_style(&self, typeface: TypefaceId) -> TypefaceStyle {
        self.face(typeface)
            .map_or(TypefaceStyle::Normal, |face| face.style)
    }

    fn typeface_for_script(&self, script: &str, style: TypefaceStyle) -> Option<TypefaceId> {
        self.by_script
            .get(&(script.to_owned(), style))
            .or_else(|| self.by_script.get(&(script.to_owned(), TypefaceStyle::Normal)))
            .copied()
    }

    fn base_glyph_count(&self, typeface: TypefaceId, codepoint: u32) -> u32 {
        let Some(ch) = char::from_u32(codepoint) else {
            return 0;
        };
        let Some(face) = self.face(typeface) else {
            return 0;
        };
        if Self::covers(face, ch) {
            return 0;
        }
        self.faces
            .iter()
            .find(|candidate| Self::covers(candidate, ch))
            .map_or(0, |candidate| candidate.glyph_base)
    }

    fn font_data(&self, typeface: TypefaceId) -> Option<Arc<Vec<u8>>> {
        self.face(typeface).map(|face| Arc::clone(&face.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reports_font_load() {
        let err = FileFontHost::new("/no/such/font.ttf", TypefaceStyle::Normal).unwrap_err();
        assert!(matches!(err, LayoutError::FontLoad { .. }));
    }

    #[test]
    fn garbage_bytes_report_invalid_font() {
        let err = FileFontHost::from_bytes(vec![0u8; 32], TypefaceStyle::Normal).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidFont { .. }));
    }
}
