//! Chunk meshing: per-face quads split into lit and unlit layers, and the
//! vertex format they are drawn with.

pub mod chunk_mesh;
pub mod mesher;
pub mod vertex;

pub use chunk_mesh::ChunkMesh;
pub use mesher::{BlockUvTable, ChunkBounds, RenderLayer, build_chunk_mesh};
pub use vertex::{BLOCK_VERTEX_ATTRIBUTES, BLOCK_VERTEX_LAYOUT, BlockVertex};
