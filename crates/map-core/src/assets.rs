//! Asset Catalogue
//!
//! Textures and fonts named in the `[assets]` config section are loaded
//! through an [`AssetLoader`]. A failed load never aborts the scene: the
//! catalogue logs a warning and substitutes a fallback derived from the asset
//! key, so the same key always degrades to the same colour or glyph.
//!
//! Only presence is checked here. Renderers that decode textures apply the
//! same fallback when decoding fails.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::AssetConfig;
use crate::error::AssetLoadError;
use crate::scene::arena::{ResourceArena, ResourceHandle, ResourceKind};

/// Glyph drawn in place of text when the font is unavailable.
pub const PLACEHOLDER_GLYPH: char = '?';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Texture,
    Font,
}

impl AssetKind {
    fn resource_kind(self) -> ResourceKind {
        match self {
            AssetKind::Texture => ResourceKind::Texture,
            AssetKind::Font => ResourceKind::Font,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub key: String,
    pub kind: AssetKind,
    /// Path relative to the asset root.
    pub path: PathBuf,
}

/// Source of raw asset bytes.
pub trait AssetLoader {
    fn load(&self, request: &AssetRequest) -> Result<Vec<u8>, AssetLoadError>;
}

/// Reads assets from a directory on disk.
#[derive(Debug, Clone)]
pub struct FsAssetLoader {
    root: PathBuf,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetLoader for FsAssetLoader {
    fn load(&self, request: &AssetRequest) -> Result<Vec<u8>, AssetLoadError> {
        let path = self.root.join(&request.path);
        let bytes = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AssetLoadError::NotFound {
                key: request.key.clone(),
                path: path.display().to_string(),
            },
            _ => AssetLoadError::Unreadable {
                key: request.key.clone(),
                reason: e.to_string(),
            },
        })?;

        if bytes.is_empty() {
            return Err(AssetLoadError::Empty {
                key: request.key.clone(),
            });
        }
        Ok(bytes)
    }
}

/// Loader with no backing store; every asset falls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAssetLoader;

impl AssetLoader for NullAssetLoader {
    fn load(&self, request: &AssetRequest) -> Result<Vec<u8>, AssetLoadError> {
        Err(AssetLoadError::NotFound {
            key: request.key.clone(),
            path: request.path.display().to_string(),
        })
    }
}

/// Stand-in used when an asset fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Opaque RGBA colour.
    SolidColor([u8; 4]),
    PlaceholderGlyph(char),
}

impl Fallback {
    pub fn for_asset(key: &str, kind: AssetKind) -> Self {
        match kind {
            AssetKind::Texture => Fallback::SolidColor(fallback_color(key)),
            AssetKind::Font => Fallback::PlaceholderGlyph(PLACEHOLDER_GLYPH),
        }
    }
}

/// FNV-1a over the key, folded into a muted opaque colour.
pub fn fallback_color(key: &str) -> [u8; 4] {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in key.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    let channel = |shift: u32| 64 + ((hash >> shift) & 0x7f) as u8;
    [channel(0), channel(8), channel(16), 255]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    Loaded { bytes: usize },
    Fallback(Fallback),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub kind: AssetKind,
    pub path: PathBuf,
    pub handle: ResourceHandle,
    pub source: AssetSource,
}

impl CatalogEntry {
    pub fn fallback(&self) -> Option<Fallback> {
        match self.source {
            AssetSource::Fallback(f) => Some(f),
            AssetSource::Loaded { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl AssetCatalog {
    /// The requests implied by the config, textures first, each in key order.
    pub fn requests(config: &AssetConfig) -> Vec<AssetRequest> {
        let textures = config.textures.iter().map(|(key, path)| AssetRequest {
            key: key.clone(),
            kind: AssetKind::Texture,
            path: PathBuf::from(path),
        });
        let fonts = config.fonts.iter().map(|(key, path)| AssetRequest {
            key: key.clone(),
            kind: AssetKind::Font,
            path: PathBuf::from(path),
        });
        textures.chain(fonts).collect()
    }

    /// Load every configured asset, registering one handle per asset.
    pub fn load_all(
        config: &AssetConfig,
        loader: &dyn AssetLoader,
        arena: &mut ResourceArena,
    ) -> Self {
        let mut entries = BTreeMap::new();

        for request in Self::requests(config) {
            let source = match loader.load(&request) {
                Ok(bytes) => AssetSource::Loaded { bytes: bytes.len() },
                Err(e) => {
                    let fallback = Fallback::for_asset(&request.key, request.kind);
                    tracing::warn!("{}; using fallback {:?}", e, fallback);
                    AssetSource::Fallback(fallback)
                }
            };
            let handle = arena.register(request.kind.resource_kind(), request.key.clone());
            entries.insert(
                request.key,
                CatalogEntry {
                    kind: request.kind,
                    path: request.path,
                    handle,
                    source,
                },
            );
        }

        let catalog = Self { entries };
        tracing::info!(
            "Loaded {} assets ({} fallbacks)",
            catalog.len(),
            catalog.fallback_count()
        );
        catalog
    }

    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fallback_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.fallback().is_some())
            .count()
    }
}
