//! Fixed partition of the voxel grid into chunks, with dirty tracking.
//!
//! The partition is computed once. Chunks along the far edge of each axis may
//! be smaller than the chunk size. A chunk becomes dirty when any voxel that
//! can affect its faces changes, and remembers when it first became dirty so
//! the scheduler can favor stale work.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Instant;

use glam::Vec3;
use nebula_math::Aabb;
use nebula_mesh::ChunkBounds;
use nebula_voxel::WorldListener;

/// Edge length of a chunk in voxels.
pub const DEFAULT_CHUNK_SIZE: i32 = 16;

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// One cell of the partition.
#[derive(Clone, Debug)]
pub struct Chunk {
    bounds: ChunkBounds,
    aabb: Aabb,
    dirty: bool,
    dirtied_at: Option<Instant>,
}

impl Chunk {
    fn new(bounds: ChunkBounds) -> Self {
        let aabb = Aabb::from_voxel_bounds(bounds.min, bounds.max);
        Self {
            bounds,
            aabb,
            dirty: false,
            dirtied_at: None,
        }
    }

    pub fn bounds(&self) -> &ChunkBounds {
        &self.bounds
    }

    /// World-space box, cached at construction.
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    pub fn center(&self) -> Vec3 {
        self.aabb.center()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// When the chunk last went from clean to dirty.
    pub fn dirtied_at(&self) -> Option<Instant> {
        self.dirtied_at
    }

    /// Returns `true` if this call made the chunk dirty.
    pub fn mark_dirty(&mut self, now: Instant) -> bool {
        if self.dirty {
            return false;
        }
        self.dirty = true;
        self.dirtied_at = Some(now);
        true
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

// ---------------------------------------------------------------------------
// ChunkGrid
// ---------------------------------------------------------------------------

/// All chunks of one voxel grid, stored x-fastest.
#[derive(Clone, Debug)]
pub struct ChunkGrid {
    chunk_size: i32,
    counts: [i32; 3],
    chunks: Vec<Chunk>,
}

impl ChunkGrid {
    /// Partitions a grid of `dims` voxels. Every chunk starts clean.
    pub fn new(dims: [i32; 3], chunk_size: i32) -> Self {
        let chunk_size = chunk_size.max(1);
        let counts = dims.map(|d| {
            let d = d.max(0);
            (d + chunk_size - 1) / chunk_size
        });

        let mut chunks = Vec::with_capacity((counts[0] * counts[1] * counts[2]) as usize);
        for cz in 0..counts[2] {
            for cy in 0..counts[1] {
                for cx in 0..counts[0] {
                    let min = [cx * chunk_size, cy * chunk_size, cz * chunk_size];
                    let max = [
                        (min[0] + chunk_size).min(dims[0]),
                        (min[1] + chunk_size).min(dims[1]),
                        (min[2] + chunk_size).min(dims[2]),
                    ];
                    chunks.push(Chunk::new(ChunkBounds::new(min, max)));
                }
            }
        }

        Self {
            chunk_size,
            counts,
            chunks,
        }
    }

    pub fn chunk_size(&self) -> i32 {
        self.chunk_size
    }

    /// Number of chunks along each axis.
    pub fn counts(&self) -> [i32; 3] {
        self.counts
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunk(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Flat index of chunk `(cx, cy, cz)`, or `None` outside the partition.
    pub fn index_of(&self, cx: i32, cy: i32, cz: i32) -> Option<usize> {
        let [nx, ny, nz] = self.counts;
        if !(0..nx).contains(&cx) || !(0..ny).contains(&cy) || !(0..nz).contains(&cz) {
            return None;
        }
        Some((cx + cy * nx + cz * nx * ny) as usize)
    }

    /// Chunk coordinates containing voxel `(x, y, z)`, clamped to the partition.
    pub fn chunk_coords(&self, x: i32, y: i32, z: i32) -> [i32; 3] {
        let size = self.chunk_size;
        let mut coords = [x.div_euclid(size), y.div_euclid(size), z.div_euclid(size)];
        for (c, &n) in coords.iter_mut().zip(&self.counts) {
            *c = (*c).clamp(0, (n - 1).max(0));
        }
        coords
    }

    /// Marks every chunk overlapping the inclusive voxel box `[min, max]`.
    /// Returns how many chunks went from clean to dirty.
    pub fn mark_box_dirty(&mut self, min: [i32; 3], max: [i32; 3], now: Instant) -> usize {
        if self.chunks.is_empty() {
            return 0;
        }
        let lo = self.chunk_coords(min[0], min[1], min[2]);
        let hi = self.chunk_coords(max[0], max[1], max[2]);
        let mut newly_dirty = 0;
        for cz in lo[2]..=hi[2] {
            for cy in lo[1]..=hi[1] {
                for cx in lo[0]..=hi[0] {
                    if let Some(i) = self.index_of(cx, cy, cz)
                        && self.chunks[i].mark_dirty(now)
                    {
                        newly_dirty += 1;
                    }
                }
            }
        }
        newly_dirty
    }

    pub fn mark_all_dirty(&mut self, now: Instant) -> usize {
        self.chunks
            .iter_mut()
            .map(|chunk| chunk.mark_dirty(now))
            .filter(|&newly| newly)
            .count()
    }

    pub fn mark_clean(&mut self, index: usize) {
        if let Some(chunk) = self.chunks.get_mut(index) {
            chunk.mark_clean();
        }
    }

    /// Indices of all dirty chunks, ascending.
    pub fn dirty_indices(&self) -> Vec<usize> {
        self.chunks
            .iter()
            .enumerate()
            .filter(|(_, chunk)| chunk.is_dirty())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn dirty_count(&self) -> usize {
        self.chunks.iter().filter(|chunk| chunk.is_dirty()).count()
    }
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// A change that arrived while the chunk grid was borrowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DeferredChange {
    Box { min: [i32; 3], max: [i32; 3], at: Instant },
    All { at: Instant },
}

/// Changes waiting for the chunk grid to become free.
///
/// Shared between a [`ChunkDirtyListener`] and the owner of the chunk grid,
/// which calls [`apply`](Self::apply) before reading dirty state.
#[derive(Clone, Debug, Default)]
pub struct DeferredChanges {
    queue: Rc<RefCell<Vec<DeferredChange>>>,
}

impl DeferredChanges {
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    fn push(&self, change: DeferredChange) {
        self.queue.borrow_mut().push(change);
    }

    /// Marks every queued change on `chunks` and empties the queue.
    /// Returns how many chunks went from clean to dirty.
    pub fn apply(&self, chunks: &mut ChunkGrid) -> usize {
        let changes = std::mem::take(&mut *self.queue.borrow_mut());
        changes
            .into_iter()
            .map(|change| match change {
                DeferredChange::Box { min, max, at } => chunks.mark_box_dirty(min, max, at),
                DeferredChange::All { at } => chunks.mark_all_dirty(at),
            })
            .sum()
    }
}

/// Forwards world change notifications to a [`ChunkGrid`].
///
/// Holds only a weak reference, so the grid's listener list never keeps
/// renderer state alive. Events arriving after the renderer is gone are dropped.
/// Events arriving while the chunk grid is borrowed are queued in
/// [`deferred`](Self::deferred) and applied by the next notification or by
/// the owner.
pub struct ChunkDirtyListener {
    chunks: Weak<RefCell<ChunkGrid>>,
    deferred: DeferredChanges,
}

impl ChunkDirtyListener {
    pub fn new(chunks: Weak<RefCell<ChunkGrid>>) -> Self {
        Self {
            chunks,
            deferred: DeferredChanges::default(),
        }
    }

    /// Handle to the queue of changes that could not be applied immediately.
    pub fn deferred(&self) -> DeferredChanges {
        self.deferred.clone()
    }

    fn notify(&self, change: DeferredChange) {
        let Some(chunks) = self.chunks.upgrade() else {
            return;
        };
        match chunks.try_borrow_mut() {
            Ok(mut chunks) => {
                self.deferred.apply(&mut chunks);
                match change {
                    DeferredChange::Box { min, max, at } => chunks.mark_box_dirty(min, max, at),
                    DeferredChange::All { at } => chunks.mark_all_dirty(at),
                };
            }
            Err(_) => {
                tracing::debug!("Chunk grid busy, deferring world change notification");
                self.deferred.push(change);
            }
        }
    }
}

impl WorldListener for ChunkDirtyListener {
    fn block_changed(&mut self, x: i32, y: i32, z: i32) {
        self.notify(DeferredChange::Box {
            min: [x - 1, y - 1, z - 1],
            max: [x + 1, y + 1, z + 1],
            at: Instant::now(),
        });
    }

    fn light_column_changed(&mut self, x: i32, z: i32, y0: i32, y1: i32) {
        self.notify(DeferredChange::Box {
            min: [x - 1, y0 - 1, z - 1],
            max: [x + 1, y1 + 1, z + 1],
            at: Instant::now(),
        });
    }

    fn all_changed(&mut self) {
        self.notify(DeferredChange::All { at: Instant::now() });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use nebula_voxel::VoxelGrid;
    use nebula_voxel::blocks::{STONE, default_catalog};

    use super::*;

    #[test]
    fn test_partition_uses_ceiling_division() {
        let grid = ChunkGrid::new([40, 16, 17], 16);
        assert_eq!(grid.counts(), [3, 1, 2]);
        assert_eq!(grid.len(), 6);

        let last = grid.chunk(grid.index_of(2, 0, 1).unwrap()).unwrap();
        assert_eq!(last.bounds().min, [32, 0, 16]);
        assert_eq!(last.bounds().max, [40, 16, 17]);
        assert_eq!(last.aabb().max, Vec3::new(40.0, 16.0, 17.0));
    }

    #[test]
    fn test_every_voxel_in_exactly_one_chunk() {
        let dims = [20, 9, 5];
        let grid = ChunkGrid::new(dims, 4);
        for x in 0..dims[0] {
            for y in 0..dims[1] {
                for z in 0..dims[2] {
                    let owners = grid
                        .chunks()
                        .iter()
                        .filter(|c| c.bounds().contains(x, y, z))
                        .count();
                    assert_eq!(owners, 1, "voxel ({x},{y},{z})");
                }
            }
        }
        let total: usize = grid.chunks().iter().map(|c| c.bounds().volume()).sum();
        assert_eq!(total, 20 * 9 * 5);
    }

    #[test]
    fn test_interior_change_dirties_one_chunk() {
        let mut grid = ChunkGrid::new([48, 48, 48], 16);
        let n = grid.mark_box_dirty([23, 23, 23], [25, 25, 25], Instant::now());
        assert_eq!(n, 1);
        assert_eq!(grid.dirty_indices(), vec![grid.index_of(1, 1, 1).unwrap()]);
    }

    #[test]
    fn test_corner_change_dirties_eight_chunks() {
        let chunks = Rc::new(RefCell::new(ChunkGrid::new([32, 32, 32], 16)));
        let mut world = VoxelGrid::new(32, 32, 32, 0, Arc::new(default_catalog()));
        world.add_listener(Box::new(ChunkDirtyListener::new(Rc::downgrade(&chunks))));

        // (16,16,16) sits on the corner shared by all eight chunks.
        world.set(STONE, 16, 16, 16);
        assert_eq!(chunks.borrow().dirty_count(), 8);
    }

    #[test]
    fn test_light_column_change_dirties_vertical_span() {
        let mut grid = ChunkGrid::new([16, 64, 16], 16);
        grid.mark_box_dirty([3, 9, 3], [5, 40, 5], Instant::now());
        let dirty: Vec<i32> = grid
            .dirty_indices()
            .into_iter()
            .map(|i| grid.chunk(i).unwrap().bounds().min[1])
            .collect();
        assert_eq!(dirty, vec![0, 16, 32]);
    }

    #[test]
    fn test_out_of_range_coordinates_clamp() {
        let grid = ChunkGrid::new([32, 32, 32], 16);
        assert_eq!(grid.chunk_coords(-1, -17, 100), [0, 0, 1]);
        assert_eq!(grid.chunk_coords(31, 16, 15), [1, 1, 0]);
    }

    #[test]
    fn test_timestamp_set_only_on_clean_to_dirty() {
        let mut grid = ChunkGrid::new([16, 16, 16], 16);
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(3);

        assert_eq!(grid.mark_all_dirty(t0), 1);
        assert_eq!(grid.mark_all_dirty(t1), 0);
        assert_eq!(grid.chunk(0).unwrap().dirtied_at(), Some(t0));

        grid.mark_clean(0);
        assert_eq!(grid.dirty_count(), 0);
        grid.mark_box_dirty([0, 0, 0], [0, 0, 0], t1);
        assert_eq!(grid.chunk(0).unwrap().dirtied_at(), Some(t1));
    }

    #[test]
    fn test_listener_outliving_chunks_is_harmless() {
        let chunks = Rc::new(RefCell::new(ChunkGrid::new([16, 16, 16], 16)));
        let mut world = VoxelGrid::new(16, 16, 16, 0, Arc::new(default_catalog()));
        world.add_listener(Box::new(ChunkDirtyListener::new(Rc::downgrade(&chunks))));
        drop(chunks);
        assert!(world.set(STONE, 1, 1, 1));
    }

    #[test]
    fn test_change_while_borrowed_is_applied_later() {
        let chunks = Rc::new(RefCell::new(ChunkGrid::new([32, 32, 32], 16)));
        let listener = ChunkDirtyListener::new(Rc::downgrade(&chunks));
        let deferred = listener.deferred();
        let mut world = VoxelGrid::new(32, 32, 32, 0, Arc::new(default_catalog()));
        world.add_listener(Box::new(listener));

        {
            let _held = chunks.borrow();
            world.set(STONE, 4, 4, 4);
        }
        assert_eq!(chunks.borrow().dirty_count(), 0);
        assert!(!deferred.is_empty());

        assert_eq!(deferred.apply(&mut chunks.borrow_mut()), 1);
        assert!(deferred.is_empty());
        assert_eq!(chunks.borrow().dirty_indices(), vec![0]);
    }

    #[test]
    fn test_next_notification_flushes_deferred_changes() {
        let chunks = Rc::new(RefCell::new(ChunkGrid::new([32, 32, 32], 16)));
        let listener = ChunkDirtyListener::new(Rc::downgrade(&chunks));
        let deferred = listener.deferred();
        let mut world = VoxelGrid::new(32, 32, 32, 0, Arc::new(default_catalog()));
        world.add_listener(Box::new(listener));

        {
            let _held = chunks.borrow();
            world.set(STONE, 4, 4, 4);
        }
        world.set(STONE, 28, 4, 4);
        assert!(deferred.is_empty());
        assert_eq!(chunks.borrow().dirty_count(), 2);
    }

    #[test]
    fn test_empty_grid_has_no_chunks() {
        let mut grid = ChunkGrid::new([0, 16, 16], 16);
        assert!(grid.is_empty());
        assert_eq!(grid.mark_box_dirty([0, 0, 0], [1, 1, 1], Instant::now()), 0);
    }
}
