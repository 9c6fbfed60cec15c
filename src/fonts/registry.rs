use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::foundation::error::{PosterError, PosterResult};

/// Generic family used when a requested family is not registered.
pub const DEFAULT_FONT: &str = "sans-serif";

/// Environment variable overriding the bundled font directory.
pub const FONTS_DIR_ENV: &str = "POSTERKIT_FONTS_DIR";

/// Fonts shipped with the crate: registry name and file name under the fonts directory.
const BUNDLED_FONTS: &[(&str, &str)] = &[
    ("Oswald-Bold", "Oswald-Bold.ttf"),
    ("Roboto-Regular", "Roboto-Regular.ttf"),
    ("BebasNeue-Regular", "BebasNeue-Regular.ttf"),
];

/// Raw font file bytes shared between the registry and renderers.
pub type FontBytes = Arc<[u8]>;

/// Read-only view of font data keyed by family name.
///
/// The text renderer depends on this trait rather than on the process-wide registry so callers
/// can inject their own source.
pub trait FontSource: Send + Sync {
    /// Font bytes registered under `family`, if any.
    fn font(&self, family: &str) -> Option<FontBytes>;
}

#[derive(Clone, Debug)]
struct RegisteredFont {
    path: PathBuf,
    data: FontBytes,
}

/// Store of loaded font files keyed by family name.
///
/// Entries are only added or overwritten; nothing is evicted implicitly. Reads take a shared lock
/// and are always safe; registration is expected to happen during start-up.
#[derive(Debug, Default)]
pub struct FontRegistry {
    fonts: RwLock<BTreeMap<String, RegisteredFont>>,
}

impl FontRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a `.ttf`/`.otf` file and register it under `name`, replacing any previous entry.
    pub fn register_font(&self, name: &str, path: impl AsRef<Path>) -> PosterResult<()> {
        let path = path.as_ref();
        if name.trim().is_empty() {
            return Err(PosterError::invalid_input(
                "Font name must be a non-empty string",
            ));
        }
        if path.as_os_str().is_empty() {
            return Err(PosterError::invalid_input(
                "Font path must be a non-empty string",
            ));
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        if !matches!(ext.as_deref(), Some("ttf" | "otf")) {
            return Err(PosterError::invalid_input(
                "Font file must be .ttf or .otf format",
            ));
        }
        if !path.exists() {
            return Err(PosterError::font_load(
                name,
                format!("File not found: {}", path.display()),
            ));
        }

        let data = std::fs::read(path).map_err(|e| PosterError::font_load(name, e.to_string()))?;
        if data.is_empty() {
            return Err(PosterError::font_load(name, "font file is empty"));
        }

        self.write().insert(
            name.to_owned(),
            RegisteredFont {
                path: path.to_path_buf(),
                data: data.into(),
            },
        );
        tracing::debug!(name, path = %path.display(), "font registered");
        Ok(())
    }

    /// Font bytes registered under `name`.
    pub fn get_font(&self, name: &str) -> Option<FontBytes> {
        self.read().get(name).map(|f| Arc::clone(&f.data))
    }

    /// Path the font registered under `name` was read from.
    pub fn font_path(&self, name: &str) -> Option<PathBuf> {
        self.read().get(name).map(|f| f.path.clone())
    }

    /// Return `true` if `name` is registered.
    pub fn is_font_registered(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Registered family names in sorted order.
    pub fn list_fonts(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Register every bundled font found in `dir`.
    ///
    /// A bundled font that is missing or unreadable is logged and skipped; start-up continues
    /// with whatever subset loaded. Returns the number of fonts registered.
    pub fn init_bundled_fonts_from(&self, dir: &Path) -> usize {
        let mut loaded = 0usize;
        for (name, file) in BUNDLED_FONTS {
            let path = dir.join(file);
            if !path.exists() {
                tracing::warn!(name, path = %path.display(), "bundled font file not found");
                continue;
            }
            match self.register_font(name, &path) {
                Ok(()) => loaded += 1,
                Err(error) => tracing::warn!(name, %error, "failed to load bundled font"),
            }
        }
        tracing::debug!(loaded, total = BUNDLED_FONTS.len(), "bundled fonts initialized");
        loaded
    }

    /// Register the bundled fonts from [`bundled_fonts_dir`].
    pub fn init_bundled_fonts(&self) -> usize {
        self.init_bundled_fonts_from(&bundled_fonts_dir())
    }

    /// Drop every registered font. Intended for tests.
    pub fn clear_fonts(&self) {
        self.write().clear();
    }

    // Every mutation is a single insert or clear, so a poisoned map is still consistent.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, RegisteredFont>> {
        self.fonts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, RegisteredFont>> {
        self.fonts.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FontSource for FontRegistry {
    fn font(&self, family: &str) -> Option<FontBytes> {
        self.get_font(family)
    }
}

/// Directory bundled fonts are read from: `$POSTERKIT_FONTS_DIR`, else `<crate>/assets/fonts`.
pub fn bundled_fonts_dir() -> PathBuf {
    std::env::var_os(FONTS_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("assets").join("fonts"))
}

/// Names of the bundled fonts, whether or not they are loaded.
pub fn list_bundled_fonts() -> Vec<&'static str> {
    BUNDLED_FONTS.iter().map(|(name, _)| *name).collect()
}

/// Family used when a requested family is not registered.
pub fn default_font() -> &'static str {
    DEFAULT_FONT
}

static SHARED: LazyLock<Arc<FontRegistry>> = LazyLock::new(|| Arc::new(FontRegistry::new()));

/// The process-wide registry.
pub fn shared() -> Arc<FontRegistry> {
    Arc::clone(&SHARED)
}

/// [`FontRegistry::register_font`] on the process-wide registry.
pub fn register_font(name: &str, path: impl AsRef<Path>) -> PosterResult<()> {
    SHARED.register_font(name, path)
}

/// [`FontRegistry::get_font`] on the process-wide registry.
pub fn get_font(name: &str) -> Option<FontBytes> {
    SHARED.get_font(name)
}

/// [`FontRegistry::is_font_registered`] on the process-wide registry.
pub fn is_font_registered(name: &str) -> bool {
    SHARED.is_font_registered(name)
}

/// [`FontRegistry::list_fonts`] on the process-wide registry.
pub fn list_fonts() -> Vec<String> {
    SHARED.list_fonts()
}

/// [`FontRegistry::init_bundled_fonts`] on the process-wide registry.
pub fn init_bundled_fonts() -> usize {
    SHARED.init_bundled_fonts()
}

/// [`FontRegistry::clear_fonts`] on the process-wide registry.
pub fn clear_fonts() {
    SHARED.clear_fonts();
}

#[cfg(test)]
#[path = "../../tests/unit/fonts/registry.rs"]
mod tests;
