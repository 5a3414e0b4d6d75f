//! Grid change notification.
//!
//! [`WorldListener`] is the observer contract between the [`VoxelGrid`](crate::VoxelGrid)
//! and anything that derives data from it (chunk meshes, debug overlays).
//! [`EventRecorder`] is a listener that simply collects [`WorldEvent`]s into a
//! shared log so callers can inspect what a mutation reported.

use std::cell::RefCell;
use std::rc::Rc;

/// Observer notified by the grid when its contents change.
pub trait WorldListener {
    /// A single block at `(x, y, z)` changed type.
    fn block_changed(&mut self, x: i32, y: i32, z: i32);

    /// The skylight height of column `(x, z)` moved between `y0` and `y1` (inclusive, `y0 <= y1`).
    fn light_column_changed(&mut self, x: i32, z: i32, y0: i32, y1: i32);

    /// Everything changed (terrain generation, bulk load).
    fn all_changed(&mut self);
}

/// A single notification, as delivered to a [`WorldListener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorldEvent {
    BlockChanged { x: i32, y: i32, z: i32 },
    LightColumnChanged { x: i32, z: i32, y0: i32, y1: i32 },
    AllChanged,
}

/// Listener that appends every event to a shared log.
#[derive(Clone, Default)]
pub struct EventRecorder {
    log: Rc<RefCell<Vec<WorldEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far.
    pub fn events(&self) -> Vec<WorldEvent> {
        self.log.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `BlockChanged` events recorded.
    pub fn block_changes(&self) -> usize {
        self.log
            .borrow()
            .iter()
            .filter(|e| matches!(e, WorldEvent::BlockChanged { .. }))
            .count()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl WorldListener for EventRecorder {
    fn block_changed(&mut self, x: i32, y: i32, z: i32) {
        self.log
            .borrow_mut()
            .push(WorldEvent::BlockChanged { x, y, z });
    }

    fn light_column_changed(&mut self, x: i32, z: i32, y0: i32, y1: i32) {
        self.log
            .borrow_mut()
            .push(WorldEvent::LightColumnChanged { x, z, y0, y1 });
    }

    fn all_changed(&mut self) {
        self.log.borrow_mut().push(WorldEvent::AllChanged);
    }
}
