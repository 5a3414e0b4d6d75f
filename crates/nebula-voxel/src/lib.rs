//! Block catalog, dense voxel grid with skylight, and change notification.

pub mod blocks;
pub mod catalog;
pub mod events;
pub mod face;
pub mod grid;
pub mod shape;

pub use catalog::{BlockCatalog, BlockId, BlockType, CatalogError, FaceTextures, RandomTickFn, RenderKind};
pub use events::{EventRecorder, WorldEvent, WorldListener};
pub use face::FaceDirection;
pub use grid::VoxelGrid;
pub use shape::CollisionShape;
