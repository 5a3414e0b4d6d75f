//! Column-based terrain fill for a finite [`VoxelGrid`].
//!
//! A height field is sampled once per `(x, z)` column, then every column is
//! filled bottom-up with bedrock, stone, a dirt band and a grass cap.

use std::sync::Arc;

use nebula_voxel::blocks::{BEDROCK, DIRT, GRASS_BLOCK, STONE};
use nebula_voxel::{BlockCatalog, BlockId, VoxelGrid};

use crate::heightmap::{HeightmapParams, HeightmapSampler};

/// Thickness of the dirt band under the grass cap.
pub const DIRT_DEPTH: i32 = 5;

/// Tunables for the fBm height field.
#[derive(Clone, Debug)]
pub struct TerrainParams {
    pub octaves: u32,
    pub persistence: f64,
    /// Multiplies the base frequency `2 / (width + depth)`.
    pub frequency_scale: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            octaves: 16,
            persistence: 0.5,
            frequency_scale: 1.0,
        }
    }
}

/// Produces seeded, deterministic terrain for grids of a fixed size.
pub struct TerrainGenerator {
    sampler: HeightmapSampler,
    width: i32,
    height: i32,
    depth: i32,
}

impl TerrainGenerator {
    pub fn new(seed: u64, dims: [i32; 3], params: &TerrainParams) -> Self {
        let [width, height, depth] = dims;
        let span = (width + depth).max(1) as f64;
        let sampler = HeightmapSampler::new(HeightmapParams {
            seed,
            octaves: params.octaves,
            persistence: params.persistence,
            base_frequency: 2.0 / span * params.frequency_scale,
            ..Default::default()
        });
        Self {
            sampler,
            width,
            height,
            depth,
        }
    }

    /// Surface height of every column, indexed `x + z * width`, each in `[0, height]`.
    pub fn height_field(&self) -> Vec<i32> {
        let mut heights = Vec::with_capacity(self.width.max(0) as usize * self.depth.max(0) as usize);
        for z in 0..self.depth {
            for x in 0..self.width {
                let h = self
                    .sampler
                    .sample_range(x as f64, z as f64, 0.0, self.height as f64);
                heights.push((h as i32).clamp(0, self.height));
            }
        }
        heights
    }

    /// Fills `grid` in one pass and fires a single `all_changed`.
    pub fn generate(&self, grid: &mut VoxelGrid) {
        let heights = self.height_field();
        let width = self.width;
        tracing::debug!(
            "Generating terrain {}x{}x{} for seed {}",
            self.width,
            self.height,
            self.depth,
            grid.seed()
        );
        grid.fill_with(|x, y, z| {
            if x >= width {
                return BlockId::AIR;
            }
            match heights.get(x as usize + z as usize * width as usize) {
                Some(&surface) => block_for_layer(surface, y),
                None => BlockId::AIR,
            }
        });
    }
}

/// Which block sits at height `y` in a column whose surface height is `surface`.
pub fn block_for_layer(surface: i32, y: i32) -> BlockId {
    if y == 0 {
        BEDROCK
    } else if y == surface - 1 {
        GRASS_BLOCK
    } else if surface - y > DIRT_DEPTH {
        STONE
    } else if y < surface {
        DIRT
    } else {
        BlockId::AIR
    }
}

/// Creates a grid of `dims` and fills it with terrain for `seed`.
pub fn generate_world(
    seed: u64,
    dims: [i32; 3],
    params: &TerrainParams,
    catalog: Arc<BlockCatalog>,
) -> VoxelGrid {
    let mut grid = VoxelGrid::new(dims[0], dims[1], dims[2], seed, catalog);
    TerrainGenerator::new(seed, dims, params).generate(&mut grid);
    tracing::info!(
        "Generated {}x{}x{} world (seed {})",
        dims[0],
        dims[1],
        dims[2],
        seed
    );
    grid
}

#[cfg(test)]
mod tests {
    use nebula_voxel::blocks::default_catalog;
    use nebula_voxel::{EventRecorder, WorldEvent};

    use super::*;

    fn catalog() -> Arc<BlockCatalog> {
        Arc::new(default_catalog())
    }

    fn all_blocks(grid: &VoxelGrid) -> Vec<BlockId> {
        let mut out = Vec::new();
        for y in 0..grid.height() {
            for z in 0..grid.depth() {
                for x in 0..grid.width() {
                    out.push(grid.get(x, y, z));
                }
            }
        }
        out
    }

    #[test]
    fn test_seed_42_is_deterministic() {
        let params = TerrainParams::default();
        let a = generate_world(42, [16, 16, 16], &params, catalog());
        let b = generate_world(42, [16, 16, 16], &params, catalog());
        assert_eq!(all_blocks(&a), all_blocks(&b));
        for x in 0..16 {
            for z in 0..16 {
                assert_eq!(a.light_height(x, z), b.light_height(x, z));
            }
        }
    }

    #[test]
    fn test_bottom_layer_is_bedrock() {
        let grid = generate_world(7, [12, 20, 9], &TerrainParams::default(), catalog());
        for x in 0..12 {
            for z in 0..9 {
                assert_eq!(grid.get(x, 0, z), BEDROCK);
            }
        }
    }

    #[test]
    fn test_columns_follow_strata() {
        let dims = [16, 32, 16];
        let params = TerrainParams::default();
        let generator = TerrainGenerator::new(5, dims, &params);
        let heights = generator.height_field();
        let grid = generate_world(5, dims, &params, catalog());

        for z in 0..16 {
            for x in 0..16 {
                let surface = heights[(x + z * 16) as usize];
                assert!((0..=32).contains(&surface));
                for y in 0..32 {
                    assert_eq!(grid.get(x, y, z), block_for_layer(surface, y));
                }
            }
        }
    }

    #[test]
    fn test_block_for_layer() {
        assert_eq!(block_for_layer(10, 0), BEDROCK);
        assert_eq!(block_for_layer(10, 9), GRASS_BLOCK);
        assert_eq!(block_for_layer(10, 8), DIRT);
        assert_eq!(block_for_layer(10, 5), DIRT);
        assert_eq!(block_for_layer(10, 4), STONE);
        assert_eq!(block_for_layer(10, 1), STONE);
        assert_eq!(block_for_layer(10, 10), BlockId::AIR);
        assert_eq!(block_for_layer(10, 15), BlockId::AIR);
        assert_eq!(block_for_layer(1, 0), BEDROCK);
    }

    #[test]
    fn test_generate_fires_single_all_changed() {
        let dims = [8, 8, 8];
        let mut grid = VoxelGrid::new(8, 8, 8, 3, catalog());
        let recorder = EventRecorder::new();
        grid.add_listener(Box::new(recorder.clone()));

        TerrainGenerator::new(3, dims, &TerrainParams::default()).generate(&mut grid);
        assert_eq!(recorder.events(), vec![WorldEvent::AllChanged]);
    }

    #[test]
    fn test_grass_is_lit_after_generation() {
        let dims = [16, 24, 16];
        let params = TerrainParams::default();
        let heights = TerrainGenerator::new(11, dims, &params).height_field();
        let grid = generate_world(11, dims, &params, catalog());
        for z in 0..16 {
            for x in 0..16 {
                let surface = heights[(x + z * 16) as usize];
                if surface >= 2 {
                    assert!(grid.is_lit(x, surface - 1, z));
                    assert!(!grid.is_lit(x, surface - 2, z));
                }
            }
        }
    }
}
