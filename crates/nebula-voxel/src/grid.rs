//! Dense block storage for a finite world, with a per-column skylight height map.
//!
//! The grid is the single source of truth for world contents. Everything derived
//! from it (chunk meshes, collision queries) either reads it directly or learns
//! about changes through registered [`WorldListener`]s.

use std::sync::Arc;

use glam::Vec3;
use nebula_math::Aabb;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::catalog::{BlockCatalog, BlockId, BlockType};
use crate::events::WorldListener;

/// A `width × height × depth` box of blocks.
///
/// Storage is a flat `Vec<BlockId>` indexed `(y * depth + z) * width + x`.
/// Every read is bounds-checked: coordinates outside the grid read as air.
pub struct VoxelGrid {
    width: i32,
    height: i32,
    depth: i32,
    seed: u64,
    blocks: Vec<BlockId>,
    /// Lowest lit y per column, indexed `x + z * width`.
    light_heights: Vec<i32>,
    catalog: Arc<BlockCatalog>,
    listeners: Vec<Box<dyn WorldListener>>,
    rng: ChaCha8Rng,
}

impl VoxelGrid {
    /// Creates an all-air grid. Non-positive dimensions produce an empty grid.
    pub fn new(width: i32, height: i32, depth: i32, seed: u64, catalog: Arc<BlockCatalog>) -> Self {
        let (width, height, depth) = (width.max(0), height.max(0), depth.max(0));
        let volume = width as usize * height as usize * depth as usize;
        let mut grid = Self {
            width,
            height,
            depth,
            seed,
            blocks: vec![BlockId::AIR; volume],
            light_heights: vec![0; width as usize * depth as usize],
            catalog,
            listeners: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        grid.recompute_light_map();
        grid
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// `[width, height, depth]`.
    pub fn dims(&self) -> [i32; 3] {
        [self.width, self.height, self.depth]
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn catalog(&self) -> &Arc<BlockCatalog> {
        &self.catalog
    }

    /// The world RNG, seeded from the world seed.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Registers a listener. Listeners are notified in registration order.
    pub fn add_listener(&mut self, listener: Box<dyn WorldListener>) {
        self.listeners.push(listener);
    }

    pub fn in_bounds(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0 && y >= 0 && z >= 0 && x < self.width && y < self.height && z < self.depth
    }

    fn index(&self, x: i32, y: i32, z: i32) -> usize {
        flat_index(self.width, self.depth, x, y, z)
    }

    fn column_index(&self, x: i32, z: i32) -> usize {
        x as usize + z as usize * self.width as usize
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Returns the block id at `(x, y, z)`, or air outside the grid.
    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockId {
        if !self.in_bounds(x, y, z) {
            return BlockId::AIR;
        }
        self.blocks[self.index(x, y, z)]
    }

    /// Returns the block type at `(x, y, z)`, or air outside the grid.
    pub fn block(&self, x: i32, y: i32, z: i32) -> &BlockType {
        self.catalog.get(self.get(x, y, z))
    }

    pub fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        self.block(x, y, z).is_solid
    }

    pub fn is_opaque(&self, x: i32, y: i32, z: i32) -> bool {
        self.block(x, y, z).is_opaque
    }

    /// Skylight height of column `(x, z)`: the y at which the downward scan stopped.
    /// Columns outside the grid report 0.
    pub fn light_height(&self, x: i32, z: i32) -> i32 {
        if x < 0 || z < 0 || x >= self.width || z >= self.depth {
            return 0;
        }
        self.light_heights[self.column_index(x, z)]
    }

    /// `true` outside the grid, otherwise `y >= light_height(x, z)`.
    pub fn is_lit(&self, x: i32, y: i32, z: i32) -> bool {
        !self.in_bounds(x, y, z) || y >= self.light_heights[self.column_index(x, z)]
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Stores `id` at `(x, y, z)`.
    ///
    /// Returns `false` without notifying anyone if the position is outside the
    /// grid, the id is unknown to the catalog, or the block is already `id`.
    /// Otherwise updates the column's skylight (possibly firing
    /// `light_column_changed`) and fires exactly one `block_changed`.
    pub fn set(&mut self, id: BlockId, x: i32, y: i32, z: i32) -> bool {
        if !self.in_bounds(x, y, z) {
            tracing::warn!("VoxelGrid::set out of bounds: ({}, {}, {})", x, y, z);
            return false;
        }
        if !self.catalog.contains(id) {
            tracing::warn!("VoxelGrid::set unknown block id {:?} at ({}, {}, {})", id, x, y, z);
            return false;
        }
        let i = self.index(x, y, z);
        if self.blocks[i] == id {
            return false;
        }
        self.blocks[i] = id;
        self.update_light_column(x, z);
        for listener in &mut self.listeners {
            listener.block_changed(x, y, z);
        }
        true
    }

    /// Replaces every block with `f(x, y, z)` without per-block notifications,
    /// rebuilds the light map silently, then fires `all_changed` once.
    ///
    /// Ids unknown to the catalog are stored as air.
    pub fn fill_with(&mut self, mut f: impl FnMut(i32, i32, i32) -> BlockId) {
        for y in 0..self.height {
            for z in 0..self.depth {
                for x in 0..self.width {
                    let mut id = f(x, y, z);
                    if !self.catalog.contains(id) {
                        id = BlockId::AIR;
                    }
                    let i = self.index(x, y, z);
                    self.blocks[i] = id;
                }
            }
        }
        self.recompute_light_map();
        for listener in &mut self.listeners {
            listener.all_changed();
        }
    }

    /// Scans down from the top of the column while `y > 0` and the block is not opaque.
    fn scan_light_height(&self, x: i32, z: i32) -> i32 {
        let mut y = self.height - 1;
        while y > 0 && !self.is_opaque(x, y, z) {
            y -= 1;
        }
        y.max(0)
    }

    fn recompute_light_map(&mut self) {
        for x in 0..self.width {
            for z in 0..self.depth {
                let i = self.column_index(x, z);
                self.light_heights[i] = self.scan_light_height(x, z);
            }
        }
    }

    fn update_light_column(&mut self, x: i32, z: i32) {
        let i = self.column_index(x, z);
        let old = self.light_heights[i];
        let new = self.scan_light_height(x, z);
        self.light_heights[i] = new;
        if old != new {
            let (y0, y1) = (old.min(new), old.max(new));
            for listener in &mut self.listeners {
                listener.light_column_changed(x, z, y0, y1);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Invokes the random-tick hook of every block in `[min, max)`.
    pub fn random_tick(&mut self, min: [i32; 3], max: [i32; 3]) {
        for x in min[0]..max[0] {
            for y in min[1]..max[1] {
                for z in min[2]..max[2] {
                    let hook = self.block(x, y, z).random_tick;
                    if let Some(hook) = hook {
                        hook(self, x, y, z);
                    }
                }
            }
        }
    }

    /// Ticks `count` positions drawn uniformly from the grid with the world RNG.
    pub fn random_tick_scattered(&mut self, count: usize) {
        if self.blocks.is_empty() {
            return;
        }
        for _ in 0..count {
            let x = self.rng.random_range(0..self.width);
            let y = self.rng.random_range(0..self.height);
            let z = self.rng.random_range(0..self.depth);
            let hook = self.block(x, y, z).random_tick;
            if let Some(hook) = hook {
                hook(self, x, y, z);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Collision
    // -----------------------------------------------------------------------

    /// World-space collision boxes of every non-air block overlapping `area`,
    /// clamped to the grid.
    pub fn collision_boxes(&self, area: &Aabb) -> Vec<Aabb> {
        let x0 = (area.min.x.floor() as i32).max(0);
        let y0 = (area.min.y.floor() as i32).max(0);
        let z0 = (area.min.z.floor() as i32).max(0);
        let x1 = ((area.max.x + 1.0).floor() as i32).min(self.width);
        let y1 = ((area.max.y + 1.0).floor() as i32).min(self.height);
        let z1 = ((area.max.z + 1.0).floor() as i32).min(self.depth);

        let mut boxes = Vec::new();
        for x in x0..x1 {
            for y in y0..y1 {
                for z in z0..z1 {
                    let block = self.block(x, y, z);
                    if block.is_air {
                        continue;
                    }
                    let offset = Vec3::new(x as f32, y as f32, z as f32);
                    boxes.extend(block.collision.boxes().iter().map(|b| b.translate(offset)));
                }
            }
        }
        boxes
    }
}

/// Storage index of an in-bounds `(x, y, z)`, computed without `i32` overflow.
fn flat_index(width: i32, depth: i32, x: i32, y: i32, z: i32) -> usize {
    let (width, depth) = (width as usize, depth as usize);
    (y as usize * depth + z as usize) * width + x as usize
}
