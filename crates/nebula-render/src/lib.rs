//! Chunked rendering of a voxel grid: dirty tracking, rebuild scheduling,
//! frustum culling and the GPU side of chunk meshes and the block atlas.

pub mod backend;
pub mod camera;
pub mod chunk_grid;
pub mod frustum;
pub mod gpu_chunk_mesh;
pub mod scheduler;
pub mod texture;
pub mod world_renderer;

pub use backend::{GraphicsBackend, RecordedBuffer, RecordingBackend};
pub use camera::Camera;
pub use chunk_grid::{Chunk, ChunkDirtyListener, ChunkGrid, DEFAULT_CHUNK_SIZE, DeferredChanges};
pub use frustum::Frustum;
pub use gpu_chunk_mesh::{GpuChunkMesh, WgpuBackend};
pub use scheduler::{
    DEFAULT_REBUILDS_PER_FRAME, DEFAULT_STALENESS_BUCKET, RebuildReport, RebuildScheduler,
};
pub use texture::{AtlasTexture, TextureError, mip_level_count};
pub use world_renderer::{DrawStats, RebuildStats, RendererSettings, WorldRenderer};
