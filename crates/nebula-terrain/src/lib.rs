//! Procedural terrain generation: multi-octave noise height field and column strata fill.

mod generator;
mod heightmap;

pub use generator::{DIRT_DEPTH, TerrainGenerator, TerrainParams, block_for_layer, generate_world};
pub use heightmap::{HeightmapParams, HeightmapSampler};
