//! The built-in block set.
//!
//! Registration order is fixed, so the ids below are stable for any catalog
//! produced by [`default_catalog`].

use crate::catalog::{BlockCatalog, BlockId, BlockType, FaceTextures};
use crate::face::FaceDirection;

pub const AIR: BlockId = BlockId::AIR;
pub const GRASS_BLOCK: BlockId = BlockId(1);
pub const DIRT: BlockId = BlockId(2);
pub const STONE: BlockId = BlockId(3);
pub const COBBLESTONE: BlockId = BlockId(4);
pub const BEDROCK: BlockId = BlockId(5);

/// Biome tint multiplied into the grass top face.
pub const GRASS_TINT: [f32; 3] = [0.566_406_25, 0.738_281_25, 0.347_656_25];

/// Air plus grass, dirt, stone, cobblestone and bedrock, in id order.
pub fn default_catalog() -> BlockCatalog {
    let mut catalog = BlockCatalog::new();
    let defs = [
        BlockType::new("grass_block")
            .with_faces(FaceTextures::top_side_bottom(
                "grass_block_top",
                "grass_block_side",
                "dirt",
            ))
            .with_tint(FaceDirection::PosY, GRASS_TINT),
        BlockType::new("dirt"),
        BlockType::new("stone"),
        BlockType::new("cobblestone"),
        BlockType::new("bedrock"),
    ];
    for def in defs {
        // Names are distinct and the catalog is fresh.
        if let Err(e) = catalog.register(def) {
            tracing::error!("failed to register built-in block: {e}");
        }
    }
    catalog
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::VoxelGrid;

    fn grid(w: i32, h: i32, d: i32) -> VoxelGrid {
        VoxelGrid::new(w, h, d, 3, Arc::new(default_catalog()))
    }

    #[test]
    fn test_default_ids_are_stable() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog.lookup_by_name("grass_block"), Some(GRASS_BLOCK));
        assert_eq!(catalog.lookup_by_name("dirt"), Some(DIRT));
        assert_eq!(catalog.lookup_by_name("stone"), Some(STONE));
        assert_eq!(catalog.lookup_by_name("cobblestone"), Some(COBBLESTONE));
        assert_eq!(catalog.lookup_by_name("bedrock"), Some(BEDROCK));
    }

    #[test]
    fn test_grass_faces_and_tint() {
        let catalog = default_catalog();
        let grass = catalog.get(GRASS_BLOCK);
        assert_eq!(grass.texture(FaceDirection::PosY), "grass_block_top");
        assert_eq!(grass.texture(FaceDirection::NegY), "dirt");
        assert_eq!(grass.texture(FaceDirection::PosX), "grass_block_side");
        assert_eq!(grass.tint(FaceDirection::PosY), GRASS_TINT);
        assert_eq!(grass.tint(FaceDirection::PosZ), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_default_blocks_have_no_random_tick() {
        let catalog = default_catalog();
        assert!(catalog.iter().all(|(_, block)| block.random_tick.is_none()));
    }

    #[test]
    fn test_shadowed_grass_stays_grass() {
        let mut grid = grid(4, 4, 4);
        grid.set(GRASS_BLOCK, 1, 0, 1);
        grid.set(STONE, 1, 3, 1);
        assert!(!grid.is_lit(1, 0, 1));

        grid.random_tick([0, 0, 0], [4, 4, 4]);
        grid.random_tick_scattered(256);
        assert_eq!(grid.get(1, 0, 1), GRASS_BLOCK);
    }
}
