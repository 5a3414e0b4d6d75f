//! Block texture atlas: packs independently sized images into a single sheet.
//!
//! Placement is done by the growing packer in [`crate::packer`], so tiles may
//! have any size. The finished [`Atlas`] owns the RGBA mip chain and a lookup
//! from texture id to its pixel rectangle and normalized UV rectangle. A
//! checkerboard placeholder is always packed under [`MISSING_TEXTURE`], and
//! lookups of unknown ids resolve to it.

use std::collections::HashMap;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::loader::missing_texture;
use crate::packer::{PackedRect, pack};

/// Id under which the placeholder checkerboard is packed.
pub const MISSING_TEXTURE: &str = "missing";

// ---------------------------------------------------------------------------
// UvRect
// ---------------------------------------------------------------------------

/// Normalized texture rectangle. `(u0, v0)` is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl UvRect {
    /// Rectangle for `rect` inside a `width × height` sheet.
    pub fn from_pixels(rect: &PackedRect, width: u32, height: u32) -> Self {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        Self {
            u0: rect.x as f32 / w,
            v0: rect.y as f32 / h,
            u1: (rect.x + rect.w) as f32 / w,
            v1: (rect.y + rect.h) as f32 / h,
        }
    }
}

// ---------------------------------------------------------------------------
// Atlas
// ---------------------------------------------------------------------------

/// A completed atlas with mipmap chain and per-texture lookup.
pub struct Atlas {
    id: String,
    width: u32,
    height: u32,
    /// Mip level 0 is the full-resolution sheet. Each later level is half-size.
    mip_chain: Vec<RgbaImage>,
    rects: HashMap<String, PackedRect>,
    skipped: Vec<String>,
}

impl Atlas {
    /// Name the atlas was built under (e.g. "blocks").
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mip_chain(&self) -> &[RgbaImage] {
        &self.mip_chain
    }

    /// Returns the number of mip levels.
    pub fn mip_level_count(&self) -> u32 {
        self.mip_chain.len() as u32
    }

    /// Pixel rectangle of a packed texture.
    pub fn rect(&self, id: &str) -> Option<PackedRect> {
        self.rects.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rects.contains_key(id)
    }

    /// UV rectangle of `id`, or of the placeholder when `id` was not packed.
    pub fn lookup(&self, id: &str) -> UvRect {
        match self.rects.get(id).or_else(|| self.rects.get(MISSING_TEXTURE)) {
            Some(rect) => UvRect::from_pixels(rect, self.width, self.height),
            None => UvRect {
                u0: 0.0,
                v0: 0.0,
                u1: 0.0,
                v1: 0.0,
            },
        }
    }

    /// Ids of images that were dropped because they had no pixels.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// All packed ids and their rectangles, in no particular order.
    pub fn rects(&self) -> impl Iterator<Item = (&str, PackedRect)> {
        self.rects.iter().map(|(id, rect)| (id.as_str(), *rect))
    }

    /// Number of packed textures, placeholder included.
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

// ---------------------------------------------------------------------------
// AtlasBuilder
// ---------------------------------------------------------------------------

/// Collects images and packs them into an [`Atlas`].
pub struct AtlasBuilder {
    id: String,
    images: Vec<(String, RgbaImage)>,
    build_mips: bool,
}

impl AtlasBuilder {
    /// Creates a new builder for the atlas named `id`.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            images: Vec::new(),
            build_mips: true,
        }
    }

    /// Whether to generate the downscaled mip levels. Default: true.
    pub fn build_mips(mut self, enabled: bool) -> Self {
        self.build_mips = enabled;
        self
    }

    /// Adds an image. A repeated id keeps the first image.
    pub fn add(&mut self, id: &str, image: RgbaImage) -> &mut Self {
        if self.images.iter().any(|(existing, _)| existing == id) {
            tracing::debug!("Atlas '{}': duplicate texture '{id}' ignored", self.id);
        } else {
            self.images.push((id.to_string(), image));
        }
        self
    }

    /// Returns how many images have been added.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Packs all images, copies their pixels and generates the mip chain.
    pub fn build(mut self) -> Atlas {
        if !self.images.iter().any(|(id, _)| id == MISSING_TEXTURE) {
            self.images.push((MISSING_TEXTURE.to_string(), missing_texture()));
        }

        let mut skipped = Vec::new();
        let mut placeable = Vec::with_capacity(self.images.len());
        for (id, img) in self.images {
            if img.width() == 0 || img.height() == 0 {
                tracing::warn!("Atlas '{}': skipping zero-sized texture '{id}'", self.id);
                skipped.push(id);
            } else {
                placeable.push((id, img));
            }
        }

        let sizes: Vec<(u32, u32)> = placeable.iter().map(|(_, img)| img.dimensions()).collect();
        let (placed, width, height) = pack(&sizes);
        let mut sheet = RgbaImage::new(width, height);
        let mut rects = HashMap::with_capacity(placeable.len());
        for ((id, img), rect) in placeable.into_iter().zip(placed) {
            match rect {
                Some(rect) => {
                    image::imageops::replace(&mut sheet, &img, rect.x as i64, rect.y as i64);
                    rects.insert(id, rect);
                }
                None => {
                    tracing::warn!("Atlas '{}': could not place texture '{id}'", self.id);
                    skipped.push(id);
                }
            }
        }

        let mip_chain = if self.build_mips {
            build_mip_chain(sheet)
        } else {
            vec![sheet]
        };

        tracing::info!(
            "Built atlas '{}': {}x{} with {} textures, {} mip levels",
            self.id,
            width,
            height,
            rects.len(),
            mip_chain.len()
        );

        Atlas {
            id: self.id,
            width,
            height,
            mip_chain,
            rects,
            skipped,
        }
    }
}

/// Halves `base` repeatedly (Triangle filter) until both sides reach 1.
fn build_mip_chain(base: RgbaImage) -> Vec<RgbaImage> {
    let mut mip_chain = vec![base];
    loop {
        let prev = &mip_chain[mip_chain.len() - 1];
        if prev.width() <= 1 && prev.height() <= 1 {
            break;
        }
        let w = (prev.width() / 2).max(1);
        let h = (prev.height() / 2).max(1);
        let downscaled = image::imageops::resize(prev, w, h, image::imageops::FilterType::Triangle);
        mip_chain.push(downscaled);
    }
    mip_chain
}

/// Packs `images` into a new atlas named `id`, with mipmaps.
pub fn generate_atlas(id: &str, images: impl IntoIterator<Item = (String, RgbaImage)>) -> Atlas {
    let mut builder = AtlasBuilder::new(id);
    for (name, img) in images {
        builder.add(&name, img);
    }
    builder.build()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
