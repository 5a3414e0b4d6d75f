//! Block textures: rectangle packing, atlas construction, texture sources and
//! block model resolution.

mod atlas;
mod loader;
mod model;
mod packer;

pub use atlas::{Atlas, AtlasBuilder, MISSING_TEXTURE, UvRect, generate_atlas};
pub use loader::{
    DirTextureSource, MemoryTextureSource, TextureSource, TextureSourceError, load_textures,
    missing_texture,
};
pub use model::{MAX_MODEL_DEPTH, ModelDef, ModelError, ModelFaces, ModelSet, ResolvedModel};
pub use packer::{GrowingPacker, PackedRect, pack, sort_for_packing};
