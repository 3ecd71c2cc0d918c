use std::path::{Path, PathBuf};

use rusttype::Font;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("No usable font found (tried: {})", format_tried(.tried))]
    NoFontAvailable { tried: Vec<PathBuf> },
}

fn format_tried(tried: &[PathBuf]) -> String {
    if tried.is_empty() {
        return "no candidates".to_string();
    }
    tried
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A parsed font together with the file it came from.
#[derive(Clone)]
pub struct LoadedFont {
    pub path: PathBuf,
    pub font: Font<'static>,
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/roboto/unhinted/RobotoTTF/Roboto-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const USER_FONT_FILES: &[&str] = &["Roboto-Bold.ttf", "DejaVuSans-Bold.ttf", "DejaVuSans.ttf"];

/// Ordered list of font files; the first one that loads wins.
#[derive(Debug, Clone, Default)]
pub struct FontStrategy {
    pub candidates: Vec<PathBuf>,
}

impl FontStrategy {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// User-supplied paths first, then the user font dir, then well-known system fonts.
    pub fn with_defaults(preferred: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut candidates: Vec<PathBuf> = preferred.into_iter().collect();
        candidates.extend(default_candidates());
        Self { candidates }
    }

    pub fn resolve(&self) -> Result<LoadedFont, FontError> {
        self.candidates
            .iter()
            .find_map(|path| load_font(path))
            .ok_or_else(|| FontError::NoFontAvailable {
                tried: self.candidates.clone(),
            })
    }
}

pub fn default_candidates() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(dir) = dirs::font_dir() {
        out.extend(USER_FONT_FILES.iter().map(|f| dir.join(f)));
    }
    out.extend(SYSTEM_FONTS.iter().map(PathBuf::from));
    out
}

fn load_font(path: &Path) -> Option<LoadedFont> {
    let bytes = std::fs::read(path).ok()?;
    let font = Font::try_from_vec(bytes)?;
    Some(LoadedFont {
        path: path.to_path_buf(),
        font,
    })
}
