//! Chunk meshes for one voxel grid: dirty-driven rebuilds and layered drawing.
//!
//! Each frame the host calls [`WorldRenderer::update_dirty_chunks`] once, then
//! [`WorldRenderer::render`] for [`RenderLayer::Lit`] and
//! [`RenderLayer::Unlit`]. CPU meshes are rebuilt synchronously within the
//! per-frame budget. GPU buffers are created on the first draw after a
//! rebuild, and the buffers they replace are released at the start of the
//! next draw.

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use glam::Vec3;
use nebula_materials::Atlas;
use nebula_mesh::{BlockUvTable, ChunkMesh, RenderLayer, build_chunk_mesh};
use nebula_voxel::VoxelGrid;

use crate::backend::GraphicsBackend;
use crate::chunk_grid::{ChunkDirtyListener, ChunkGrid, DEFAULT_CHUNK_SIZE, DeferredChanges};
use crate::frustum::Frustum;
use crate::scheduler::{
    DEFAULT_REBUILDS_PER_FRAME, DEFAULT_STALENESS_BUCKET, RebuildReport, RebuildScheduler,
};

/// Tunables for [`WorldRenderer`].
#[derive(Clone, Debug)]
pub struct RendererSettings {
    pub chunk_size: i32,
    pub rebuilds_per_frame: usize,
    pub staleness_bucket: Duration,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            rebuilds_per_frame: DEFAULT_REBUILDS_PER_FRAME,
            staleness_bucket: DEFAULT_STALENESS_BUCKET,
        }
    }
}

/// Running totals over every rebuild.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RebuildStats {
    /// Chunk rebuilds that produced at least one face.
    pub chunk_updates: u64,
    /// Time spent in those rebuilds.
    pub total_rebuild_time: Duration,
    /// Every rebuild, empty ones included.
    pub total_rebuilds: u64,
}

impl RebuildStats {
    pub fn average_rebuild_time(&self) -> Duration {
        if self.chunk_updates == 0 {
            Duration::ZERO
        } else {
            let nanos = self.total_rebuild_time.as_nanos() / u128::from(self.chunk_updates);
            Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
        }
    }
}

/// What the last `render` call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub visible_chunks: usize,
    pub culled_chunks: usize,
    pub draw_calls: usize,
    pub uploads: usize,
}

/// One layer of one chunk.
struct LayerMesh<B> {
    cpu: ChunkMesh,
    gpu: Option<B>,
}

impl<B> Default for LayerMesh<B> {
    fn default() -> Self {
        Self {
            cpu: ChunkMesh::new(),
            gpu: None,
        }
    }
}

/// Owns the chunk partition and per-chunk meshes of one [`VoxelGrid`].
pub struct WorldRenderer<G: GraphicsBackend> {
    chunks: Rc<RefCell<ChunkGrid>>,
    deferred: DeferredChanges,
    meshes: Vec<[LayerMesh<G::Buffer>; 2]>,
    retired: Vec<G::Buffer>,
    uvs: BlockUvTable,
    scheduler: RebuildScheduler,
    stats: RebuildStats,
}

impl<G: GraphicsBackend> WorldRenderer<G> {
    /// Partitions `grid` and subscribes to its changes. Every chunk starts dirty.
    pub fn new(grid: &mut VoxelGrid, atlas: &Atlas, settings: &RendererSettings) -> Self {
        let mut chunk_grid = ChunkGrid::new(grid.dims(), settings.chunk_size);
        chunk_grid.mark_all_dirty(Instant::now());
        let meshes = (0..chunk_grid.len()).map(|_| Default::default()).collect();

        tracing::info!(
            "World renderer: {} chunks ({:?}) of size {}",
            chunk_grid.len(),
            chunk_grid.counts(),
            chunk_grid.chunk_size()
        );

        let chunks = Rc::new(RefCell::new(chunk_grid));
        let listener = ChunkDirtyListener::new(Rc::downgrade(&chunks));
        let deferred = listener.deferred();
        grid.add_listener(Box::new(listener));

        Self {
            chunks,
            deferred,
            meshes,
            retired: Vec::new(),
            uvs: BlockUvTable::new(grid.catalog(), atlas),
            scheduler: RebuildScheduler::new(settings.rebuilds_per_frame, settings.staleness_bucket),
            stats: RebuildStats::default(),
        }
    }

    /// World edits made while this borrow is held are queued and only show
    /// up as dirty chunks after the next [`update_dirty_chunks`](Self::update_dirty_chunks).
    pub fn chunks(&self) -> Ref<'_, ChunkGrid> {
        self.chunks.borrow()
    }

    pub fn scheduler_mut(&mut self) -> &mut RebuildScheduler {
        &mut self.scheduler
    }

    pub fn stats(&self) -> &RebuildStats {
        &self.stats
    }

    pub fn dirty_count(&self) -> usize {
        self.chunks.borrow().dirty_count()
    }

    /// The CPU mesh of `layer` for chunk `index`.
    pub fn mesh(&self, index: usize, layer: RenderLayer) -> Option<&ChunkMesh> {
        self.meshes.get(index).map(|m| &m[layer.index()].cpu)
    }

    /// Re-resolves face UVs after the atlas was rebuilt, and marks every chunk dirty.
    pub fn set_atlas(&mut self, grid: &VoxelGrid, atlas: &Atlas) {
        self.uvs = BlockUvTable::new(grid.catalog(), atlas);
        self.chunks.borrow_mut().mark_all_dirty(Instant::now());
    }

    /// Rebuilds up to the per-frame budget of dirty chunks, best first.
    pub fn update_dirty_chunks(
        &mut self,
        grid: &VoxelGrid,
        viewer: Vec3,
        frustum: &Frustum,
        now: Instant,
    ) -> RebuildReport {
        let (picked, deferred) = {
            let mut chunks = self.chunks.borrow_mut();
            self.deferred.apply(&mut chunks);
            self.scheduler.select(&chunks, viewer, frustum, now)
        };

        for &index in &picked {
            self.rebuild_chunk(grid, index);
        }

        if !picked.is_empty() {
            tracing::debug!(
                "Rebuilt {} chunks, {} deferred (avg {:?} over {} updates)",
                picked.len(),
                deferred,
                self.stats.average_rebuild_time(),
                self.stats.chunk_updates
            );
        }

        RebuildReport {
            rebuilt: picked.len(),
            deferred,
        }
    }

    fn rebuild_chunk(&mut self, grid: &VoxelGrid, index: usize) {
        let Some(bounds) = self.chunks.borrow().chunk(index).map(|c| *c.bounds()) else {
            return;
        };
        let Some(layers) = self.meshes.get_mut(index) else {
            return;
        };

        let start = Instant::now();
        let mut faces = 0;
        for layer in RenderLayer::ALL {
            let mesh = build_chunk_mesh(grid, &self.uvs, &bounds, layer);
            faces += mesh.quad_count();
            let slot = &mut layers[layer.index()];
            slot.cpu = mesh;
            if let Some(old) = slot.gpu.take() {
                self.retired.push(old);
            }
        }
        let elapsed = start.elapsed();

        self.stats.total_rebuilds += 1;
        if faces > 0 {
            self.stats.chunk_updates += 1;
            self.stats.total_rebuild_time += elapsed;
        }
        self.chunks.borrow_mut().mark_clean(index);
    }

    /// Draws every chunk of `layer` whose bounds intersect `frustum`.
    pub fn render(&mut self, layer: RenderLayer, frustum: &Frustum, backend: &mut G) -> DrawStats {
        for buffer in self.retired.drain(..) {
            backend.release(buffer);
        }

        let mut stats = DrawStats::default();
        let chunks = self.chunks.borrow();
        for (chunk, layers) in chunks.chunks().iter().zip(self.meshes.iter_mut()) {
            if !frustum.intersects_aabb(chunk.aabb()) {
                stats.culled_chunks += 1;
                continue;
            }
            stats.visible_chunks += 1;

            let slot = &mut layers[layer.index()];
            if slot.cpu.is_empty() {
                continue;
            }
            let buffer = match &mut slot.gpu {
                Some(buffer) => buffer,
                gpu @ None => {
                    stats.uploads += 1;
                    gpu.insert(backend.create_buffers(&slot.cpu))
                }
            };
            backend.draw(buffer);
            stats.draw_calls += 1;
        }
        stats
    }

    /// Releases every GPU buffer. CPU meshes are kept, so drawing again re-uploads.
    pub fn free(&mut self, backend: &mut G) {
        let mut released = 0;
        for buffer in self.retired.drain(..) {
            backend.release(buffer);
            released += 1;
        }
        for layers in &mut self.meshes {
            for slot in layers.iter_mut() {
                if let Some(buffer) = slot.gpu.take() {
                    backend.release(buffer);
                    released += 1;
                }
            }
        }
        tracing::debug!("Released {released} chunk buffers");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Mat4;
    use image::{Rgba, RgbaImage};
    use nebula_materials::generate_atlas;
    use nebula_terrain::{TerrainParams, generate_world};
    use nebula_voxel::{BlockCatalog, BlockId};
    use nebula_voxel::blocks::{STONE, default_catalog};

    use super::*;
    use crate::backend::RecordingBackend;

    fn atlas_for(catalog: &BlockCatalog) -> Atlas {
        let images = catalog
            .texture_ids()
            .into_iter()
            .map(|id| (id, RgbaImage::from_pixel(16, 16, Rgba([200, 200, 200, 255]))));
        generate_atlas("blocks", images)
    }

    /// Looks at the whole 32³ world from outside its +Z face.
    fn overview() -> (Vec3, Frustum) {
        let eye = Vec3::new(16.0, 40.0, 80.0);
        let view = Mat4::look_at_rh(eye, Vec3::new(16.0, 8.0, 16.0), Vec3::Y);
        let proj = Mat4::perspective_rh(1.2, 1.0, 1000.0, 0.1);
        (eye, Frustum::from_view_projection(&(proj * view)))
    }

    /// Looks away from the world.
    fn away() -> Frustum {
        let view = Mat4::look_to_rh(Vec3::new(16.0, 16.0, 200.0), Vec3::Z, Vec3::Y);
        let proj = Mat4::perspective_rh(1.2, 1.0, 1000.0, 0.1);
        Frustum::from_view_projection(&(proj * view))
    }

    fn setup(budget: usize) -> (VoxelGrid, WorldRenderer<RecordingBackend>) {
        let catalog = Arc::new(default_catalog());
        let atlas = atlas_for(&catalog);
        let mut grid = generate_world(42, [32, 32, 32], &TerrainParams::default(), catalog);
        let settings = RendererSettings {
            rebuilds_per_frame: budget,
            ..Default::default()
        };
        let renderer = WorldRenderer::new(&mut grid, &atlas, &settings);
        (grid, renderer)
    }

    #[test]
    fn test_new_renderer_starts_all_dirty() {
        let (_grid, renderer) = setup(8);
        assert_eq!(renderer.chunks().len(), 8);
        assert_eq!(renderer.dirty_count(), 8);
    }

    #[test]
    fn test_budget_caps_rebuilds_per_frame() {
        let (grid, mut renderer) = setup(3);
        let (eye, frustum) = overview();
        let now = Instant::now();

        let report = renderer.update_dirty_chunks(&grid, eye, &frustum, now);
        assert_eq!(report, RebuildReport { rebuilt: 3, deferred: 5 });
        let report = renderer.update_dirty_chunks(&grid, eye, &frustum, now);
        assert_eq!(report, RebuildReport { rebuilt: 3, deferred: 2 });
        let report = renderer.update_dirty_chunks(&grid, eye, &frustum, now);
        assert_eq!(report, RebuildReport { rebuilt: 2, deferred: 0 });
        assert_eq!(renderer.dirty_count(), 0);
        assert_eq!(renderer.stats().total_rebuilds, 8);
    }

    #[test]
    fn test_block_edit_dirties_only_neighbors() {
        let (mut grid, mut renderer) = setup(8);
        let (eye, frustum) = overview();
        renderer.update_dirty_chunks(&grid, eye, &frustum, Instant::now());
        assert_eq!(renderer.dirty_count(), 0);

        // Interior of chunk (0,0,0), away from every chunk border.
        let changed = grid.set(STONE, 5, 30, 5) || grid.set(BlockId::AIR, 5, 30, 5);
        assert!(changed);
        let dirty = renderer.chunks().dirty_indices();
        assert!(dirty.iter().all(|&i| {
            let b = *renderer.chunks().chunk(i).unwrap().bounds();
            b.min[0] == 0 && b.min[2] == 0
        }));
        assert!(!dirty.is_empty());
    }

    #[test]
    fn test_edit_while_chunks_borrowed_is_rebuilt() {
        let (mut grid, mut renderer) = setup(8);
        let (eye, frustum) = overview();
        renderer.update_dirty_chunks(&grid, eye, &frustum, Instant::now());
        assert_eq!(renderer.dirty_count(), 0);

        {
            let _chunks = renderer.chunks();
            let changed = grid.set(STONE, 5, 30, 5) || grid.set(BlockId::AIR, 5, 30, 5);
            assert!(changed);
        }
        assert_eq!(renderer.dirty_count(), 0);

        let report = renderer.update_dirty_chunks(&grid, eye, &frustum, Instant::now());
        assert!(report.rebuilt > 0);
        assert_eq!(renderer.dirty_count(), 0);
        assert_eq!(renderer.stats().total_rebuilds, 8 + report.rebuilt as u64);
    }

    #[test]
    fn test_render_uploads_lazily_and_culls() {
        let (grid, mut renderer) = setup(8);
        let (eye, frustum) = overview();
        let mut backend = RecordingBackend::new();
        renderer.update_dirty_chunks(&grid, eye, &frustum, Instant::now());
        assert_eq!(backend.uploads(), 0);

        let first = renderer.render(RenderLayer::Lit, &frustum, &mut backend);
        assert!(first.draw_calls > 0);
        assert_eq!(first.uploads, first.draw_calls);
        assert_eq!(backend.uploads(), first.uploads);

        // Second frame draws the same buffers without uploading.
        let second = renderer.render(RenderLayer::Lit, &frustum, &mut backend);
        assert_eq!(second.uploads, 0);
        assert_eq!(second.draw_calls, first.draw_calls);

        let hidden = renderer.render(RenderLayer::Lit, &away(), &mut backend);
        assert_eq!(hidden.draw_calls, 0);
        assert_eq!(hidden.culled_chunks, 8);
    }

    #[test]
    fn test_rebuild_retires_old_buffers() {
        let (mut grid, mut renderer) = setup(8);
        let (eye, frustum) = overview();
        let mut backend = RecordingBackend::new();
        renderer.update_dirty_chunks(&grid, eye, &frustum, Instant::now());
        renderer.render(RenderLayer::Lit, &frustum, &mut backend);
        renderer.render(RenderLayer::Unlit, &frustum, &mut backend);
        let live = backend.live_count();

        grid.fill_with(|_, y, _| if y < 4 { STONE } else { BlockId::AIR });
        renderer.update_dirty_chunks(&grid, eye, &frustum, Instant::now());
        renderer.render(RenderLayer::Lit, &frustum, &mut backend);
        assert_eq!(backend.released().len(), live);

        renderer.free(&mut backend);
        assert_eq!(backend.live_count(), 0);
    }

    #[test]
    fn test_rebuild_matches_fresh_mesh() {
        let (grid, mut renderer) = setup(8);
        let (eye, frustum) = overview();
        renderer.update_dirty_chunks(&grid, eye, &frustum, Instant::now());

        let uvs = BlockUvTable::new(grid.catalog(), &atlas_for(grid.catalog()));
        let bounds = *renderer.chunks().chunk(0).unwrap().bounds();
        for layer in RenderLayer::ALL {
            let fresh = build_chunk_mesh(&grid, &uvs, &bounds, layer);
            assert_eq!(renderer.mesh(0, layer).unwrap(), &fresh);
        }
    }

    #[test]
    fn test_free_then_render_reuploads() {
        let (grid, mut renderer) = setup(8);
        let (eye, frustum) = overview();
        let mut backend = RecordingBackend::new();
        renderer.update_dirty_chunks(&grid, eye, &frustum, Instant::now());
        let first = renderer.render(RenderLayer::Lit, &frustum, &mut backend);
        renderer.free(&mut backend);
        assert_eq!(backend.live_count(), 0);

        let again = renderer.render(RenderLayer::Lit, &frustum, &mut backend);
        assert_eq!(again.uploads, first.uploads);
    }

    #[test]
    fn test_average_rebuild_time_past_u32_updates() {
        let stats = RebuildStats {
            chunk_updates: 1 << 32,
            total_rebuild_time: Duration::from_secs(1 << 32),
            total_rebuilds: 1 << 32,
        };
        assert_eq!(stats.average_rebuild_time(), Duration::from_secs(1));

        let stats = RebuildStats {
            chunk_updates: 4,
            total_rebuild_time: Duration::from_millis(10),
            total_rebuilds: 6,
        };
        assert_eq!(stats.average_rebuild_time(), Duration::from_micros(2500));
        assert_eq!(RebuildStats::default().average_rebuild_time(), Duration::ZERO);
    }
}
