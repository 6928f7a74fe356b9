//! Font face resolution for raster text.
//!
//! A [`FontSpec`] family list resolves against installed fonts through
//! font-kit. Whatever the system cannot supply falls back to the embedded
//! DejaVu Sans faces, so text always has metrics. Bold and italic are only
//! synthesized when the resolved face lacks them.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use ab_glyph::{FontArc, FontVec};
use font_kit::family_name::FamilyName;
use font_kit::handle::Handle;
use font_kit::properties::{Properties, Style, Weight};
use font_kit::source::SystemSource;
use memeforge_core::FontSpec;

use crate::error::{RenderError, RenderResult};

pub(crate) static FALLBACK_REGULAR: &[u8] = include_bytes!("../assets/DejaVu/DejaVuSans.ttf");
static FALLBACK_BOLD: &[u8] = include_bytes!("../assets/DejaVu/DejaVuSans-Bold.ttf");
static FALLBACK_ITALIC: &[u8] = include_bytes!("../assets/DejaVu/DejaVuSans-Oblique.ttf");

/// A face ready for drawing, plus the styling it still needs synthesized.
#[derive(Clone)]
pub struct Face {
    /// Glyph outlines and metrics.
    pub font: FontArc,
    /// Bold was asked for but the face is regular weight.
    pub synthetic_bold: bool,
    /// Italic was asked for but the face is upright.
    pub synthetic_italic: bool,
}

impl std::fmt::Debug for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Face")
            .field("synthetic_bold", &self.synthetic_bold)
            .field("synthetic_italic", &self.synthetic_italic)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    /// Installed fonts first, embedded faces last.
    System,
    /// Embedded faces only.
    Embedded,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FaceKey {
    family: String,
    bold: bool,
    italic: bool,
}

/// Resolves font specs to faces and remembers the answers.
pub struct FontBook {
    lookup: Lookup,
    pinned: Option<FontArc>,
    faces: Mutex<HashMap<FaceKey, Face>>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("lookup", &self.lookup)
            .field("pinned", &self.pinned.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::system()
    }
}

impl FontBook {
    fn with_lookup(lookup: Lookup, pinned: Option<FontArc>) -> Self {
        Self {
            lookup,
            pinned,
            faces: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve families against installed fonts, falling back to the
    /// embedded faces.
    #[must_use]
    pub fn system() -> Self {
        Self::with_lookup(Lookup::System, None)
    }

    /// Use the embedded faces for every family. Output does not depend on
    /// what the host has installed.
    #[must_use]
    pub fn embedded() -> Self {
        Self::with_lookup(Lookup::Embedded, None)
    }

    /// Use one face for every family.
    #[must_use]
    pub fn pinned(font: FontArc) -> Self {
        Self::with_lookup(Lookup::Embedded, Some(font))
    }

    /// Parse TrueType/OpenType bytes into a face pinned for every family.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a font.
    pub fn from_bytes(bytes: Vec<u8>) -> RenderResult<Self> {
        let font = FontArc::try_from_vec(bytes).map_err(|e| RenderError::Font(e.to_string()))?;
        Ok(Self::pinned(font))
    }

    /// Whether one face serves every family.
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }

    /// The face to draw `spec` with.
    #[must_use]
    pub fn resolve(&self, spec: &FontSpec) -> Option<Face> {
        if let Some(font) = &self.pinned {
            return Some(Face {
                font: font.clone(),
                synthetic_bold: spec.bold,
                synthetic_italic: spec.italic,
            });
        }

        let key = FaceKey {
            family: spec.family.clone(),
            bold: spec.bold,
            italic: spec.italic,
        };
        let mut faces = self.faces.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(face) = faces.get(&key) {
            return Some(face.clone());
        }

        let system = match self.lookup {
            Lookup::System => system_face(&key),
            Lookup::Embedded => None,
        };
        let face = system.or_else(|| embedded_face(key.bold, key.italic))?;
        faces.insert(key, face.clone());
        Some(face)
    }
}

/// Map a CSS-style family list to font-kit names. Quotes are stripped and
/// generic names map to their font-kit counterparts. Sans-serif always
/// closes the list.
fn family_names(family: &str) -> Vec<FamilyName> {
    let mut names: Vec<FamilyName> = family
        .split(',')
        .map(|name| name.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|name| !name.is_empty())
        .map(|name| match name.to_ascii_lowercase().as_str() {
            "serif" => FamilyName::Serif,
            "sans-serif" => FamilyName::SansSerif,
            "monospace" => FamilyName::Monospace,
            "cursive" => FamilyName::Cursive,
            "fantasy" => FamilyName::Fantasy,
            _ => FamilyName::Title(name.to_string()),
        })
        .collect();
    if !names.contains(&FamilyName::SansSerif) {
        names.push(FamilyName::SansSerif);
    }
    names
}

fn system_face(key: &FaceKey) -> Option<Face> {
    let mut props = Properties::new();
    if key.bold {
        props.weight = Weight::BOLD;
    }
    if key.italic {
        props.style = Style::Italic;
    }

    let handle = match SystemSource::new().select_best_match(&family_names(&key.family), &props) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::debug!("No installed font for {:?}: {e}", key.family);
            return None;
        }
    };
    let index = match &handle {
        Handle::Path { font_index, .. } | Handle::Memory { font_index, .. } => *font_index,
    };
    let loaded = handle.load().ok()?;
    let actual = loaded.properties();
    let data = loaded.copy_font_data()?;
    let font = FontVec::try_from_vec_and_index((*data).clone(), index).ok()?;

    tracing::debug!(
        "Resolved font {:?} (bold={}, italic={}) to {}",
        key.family,
        key.bold,
        key.italic,
        loaded.full_name()
    );
    Some(Face {
        font: FontArc::new(font),
        synthetic_bold: key.bold && actual.weight.0 < Weight::SEMIBOLD.0,
        synthetic_italic: key.italic && actual.style == Style::Normal,
    })
}

fn embedded_face(bold: bool, italic: bool) -> Option<Face> {
    let bytes = match (bold, italic) {
        (true, _) => FALLBACK_BOLD,
        (false, true) => FALLBACK_ITALIC,
        (false, false) => FALLBACK_REGULAR,
    };
    let font = FontArc::try_from_slice(bytes).ok()?;
    Some(Face {
        font,
        synthetic_bold: false,
        synthetic_italic: bold && italic,
    })
}
