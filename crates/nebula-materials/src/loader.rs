//! Texture sources: where atlas tile images come from.
//!
//! A failed load never aborts atlas construction. [`load_textures`] swaps in
//! the checkerboard from [`missing_texture`] and logs the failure.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use thiserror::Error;

/// Magenta half of the placeholder checkerboard.
const MISSING_MAGENTA: Rgba<u8> = Rgba([0xf8, 0x00, 0xf8, 0xff]);
const MISSING_BLACK: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0xff]);

/// Errors produced while fetching a texture image.
#[derive(Debug, Error)]
pub enum TextureSourceError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("texture not found: {0}")]
    NotFound(String),
}

/// Anything that can produce an RGBA image for a texture id.
pub trait TextureSource {
    fn load(&self, id: &str) -> Result<RgbaImage, TextureSourceError>;
}

/// The 2×2 magenta/black checkerboard substituted for unloadable textures.
pub fn missing_texture() -> RgbaImage {
    RgbaImage::from_fn(2, 2, |x, y| {
        if (x + y).is_multiple_of(2) {
            MISSING_MAGENTA
        } else {
            MISSING_BLACK
        }
    })
}

/// Loads every id from `source`, substituting [`missing_texture`] on failure.
pub fn load_textures(source: &dyn TextureSource, ids: &[String]) -> Vec<(String, RgbaImage)> {
    ids.iter()
        .map(|id| {
            let img = source.load(id).unwrap_or_else(|e| {
                tracing::warn!("Using placeholder for texture '{id}': {e}");
                missing_texture()
            });
            (id.clone(), img)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// DirTextureSource
// ---------------------------------------------------------------------------

/// Reads `<root>/<id>.png` from disk.
#[derive(Clone, Debug)]
pub struct DirTextureSource {
    root: PathBuf,
}

impl DirTextureSource {
    /// Opens a texture directory.
    ///
    /// # Errors
    ///
    /// Returns [`TextureSourceError::Io`] if `root` is not a readable directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, TextureSourceError> {
        let root = root.into();
        let meta = std::fs::metadata(&root).map_err(|source| TextureSourceError::Io {
            path: root.clone(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(TextureSourceError::Io {
                path: root,
                source: std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
            });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.png"))
    }

    /// Ids of every `.png` file directly under the root, sorted.
    pub fn list_ids(&self) -> Result<Vec<String>, TextureSourceError> {
        let entries = std::fs::read_dir(&self.root).map_err(|source| TextureSourceError::Io {
            path: self.root.clone(),
            source,
        })?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| TextureSourceError::Io {
                path: self.root.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "png")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

impl TextureSource for DirTextureSource {
    fn load(&self, id: &str) -> Result<RgbaImage, TextureSourceError> {
        let path = self.path_for(id);
        let bytes = std::fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                TextureSourceError::NotFound(id.to_string())
            } else {
                TextureSourceError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        let img = image::load_from_memory(&bytes)
            .map_err(|source| TextureSourceError::Image { path, source })?;
        Ok(img.to_rgba8())
    }
}

// ---------------------------------------------------------------------------
// MemoryTextureSource
// ---------------------------------------------------------------------------

/// In-memory images keyed by id. Used by tests and procedural textures.
#[derive(Clone, Debug, Default)]
pub struct MemoryTextureSource {
    images: HashMap<String, RgbaImage>,
}

impl MemoryTextureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &str, image: RgbaImage) {
        self.images.insert(id.to_string(), image);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl TextureSource for MemoryTextureSource {
    fn load(&self, id: &str) -> Result<RgbaImage, TextureSourceError> {
        self.images
            .get(id)
            .cloned()
            .ok_or_else(|| TextureSourceError::NotFound(id.to_string()))
    }
}
