//! Per-frame rebuild budget and ordering for dirty chunks.
//!
//! Dirty chunks are ranked by three keys, in order:
//! 1. chunks intersecting the view frustum come first;
//! 2. chunks that have waited through more staleness buckets come first;
//! 3. chunks nearer the viewer come first.
//!
//! Only the first `budget` chunks are rebuilt each frame. The rest stay dirty
//! and compete again next frame, so no chunk waits forever: its staleness
//! bucket keeps growing until it outranks fresher work.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use glam::Vec3;

use crate::chunk_grid::ChunkGrid;
use crate::frustum::Frustum;

/// Chunks rebuilt per frame unless configured otherwise.
pub const DEFAULT_REBUILDS_PER_FRAME: usize = 8;

/// Width of one staleness bucket.
pub const DEFAULT_STALENESS_BUCKET: Duration = Duration::from_millis(2000);

/// Outcome of one scheduling pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub rebuilt: usize,
    /// Dirty chunks left for a later frame.
    pub deferred: usize,
}

#[derive(Clone, Copy, Debug)]
struct RankKey {
    in_view: bool,
    bucket: u128,
    distance_sq: f32,
    index: usize,
}

impl RankKey {
    fn compare(&self, other: &Self) -> Ordering {
        other
            .in_view
            .cmp(&self.in_view)
            .then(other.bucket.cmp(&self.bucket))
            .then(self.distance_sq.total_cmp(&other.distance_sq))
            .then(self.index.cmp(&other.index))
    }
}

/// Picks which dirty chunks to rebuild this frame.
#[derive(Clone, Debug)]
pub struct RebuildScheduler {
    budget: usize,
    staleness_bucket: Duration,
}

impl Default for RebuildScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_REBUILDS_PER_FRAME, DEFAULT_STALENESS_BUCKET)
    }
}

impl RebuildScheduler {
    pub fn new(budget: usize, staleness_bucket: Duration) -> Self {
        let staleness_bucket = if staleness_bucket.is_zero() {
            tracing::warn!("Staleness bucket of zero, using {DEFAULT_STALENESS_BUCKET:?}");
            DEFAULT_STALENESS_BUCKET
        } else {
            staleness_bucket
        };
        Self {
            budget,
            staleness_bucket,
        }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn set_budget(&mut self, budget: usize) {
        self.budget = budget;
    }

    pub fn staleness_bucket(&self) -> Duration {
        self.staleness_bucket
    }

    /// Every dirty chunk index, best candidate first.
    pub fn rank(
        &self,
        chunks: &ChunkGrid,
        viewer: Vec3,
        frustum: &Frustum,
        now: Instant,
    ) -> Vec<usize> {
        let bucket_nanos = self.staleness_bucket.as_nanos();
        let mut keys: Vec<RankKey> = chunks
            .dirty_indices()
            .into_iter()
            .filter_map(|index| {
                let chunk = chunks.chunk(index)?;
                let waited = chunk
                    .dirtied_at()
                    .map_or(Duration::ZERO, |t| now.saturating_duration_since(t));
                Some(RankKey {
                    in_view: frustum.intersects_aabb(chunk.aabb()),
                    bucket: waited.as_nanos() / bucket_nanos,
                    distance_sq: chunk.center().distance_squared(viewer),
                    index,
                })
            })
            .collect();
        keys.sort_by(RankKey::compare);
        keys.into_iter().map(|k| k.index).collect()
    }

    /// The chunks to rebuild now, and how many dirty chunks wait for later.
    pub fn select(
        &self,
        chunks: &ChunkGrid,
        viewer: Vec3,
        frustum: &Frustum,
        now: Instant,
    ) -> (Vec<usize>, usize) {
        let mut ranked = self.rank(chunks, viewer, frustum, now);
        let deferred = ranked.len().saturating_sub(self.budget);
        ranked.truncate(self.budget);
        (ranked, deferred)
    }
}
