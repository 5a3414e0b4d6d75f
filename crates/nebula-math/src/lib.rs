//! Shared geometric primitives for the Nebula voxel renderer.

mod aabb;

pub use aabb::Aabb;
