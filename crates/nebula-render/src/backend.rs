//! The seam between chunk bookkeeping and the graphics API.
//!
//! [`crate::WorldRenderer`] only ever creates, draws and releases opaque
//! buffer handles through [`GraphicsBackend`]. [`crate::WgpuBackend`] is the
//! real implementation; [`RecordingBackend`] keeps a log instead, for tests
//! and headless runs.

use std::collections::HashSet;

use nebula_mesh::ChunkMesh;

/// Uploads, draws and frees chunk geometry.
pub trait GraphicsBackend {
    /// Backend-side handle for one uploaded mesh.
    type Buffer;

    fn create_buffers(&mut self, mesh: &ChunkMesh) -> Self::Buffer;

    fn draw(&mut self, buffer: &Self::Buffer);

    /// Frees a handle. Each handle is released exactly once.
    fn release(&mut self, buffer: Self::Buffer);
}

/// Handle produced by [`RecordingBackend`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RecordedBuffer {
    pub id: u64,
    pub index_count: u32,
}

/// A backend that records every call and owns no GPU resources.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u64,
    live: HashSet<u64>,
    uploads: usize,
    draws: Vec<u64>,
    released: Vec<u64>,
    indices_drawn: u64,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers created so far.
    pub fn uploads(&self) -> usize {
        self.uploads
    }

    /// Handle ids passed to `draw`, in call order.
    pub fn draws(&self) -> &[u64] {
        &self.draws
    }

    /// Handle ids passed to `release`, in call order.
    pub fn released(&self) -> &[u64] {
        &self.released
    }

    /// Handles created and not yet released.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Sum of index counts over every draw call.
    pub fn indices_drawn(&self) -> u64 {
        self.indices_drawn
    }

    /// Forgets recorded draws; uploads and live handles are kept.
    pub fn clear_draws(&mut self) {
        self.draws.clear();
        self.indices_drawn = 0;
    }
}

impl GraphicsBackend for RecordingBackend {
    type Buffer = RecordedBuffer;

    fn create_buffers(&mut self, mesh: &ChunkMesh) -> RecordedBuffer {
        let id = self.next_id;
        self.next_id += 1;
        self.uploads += 1;
        self.live.insert(id);
        RecordedBuffer {
            id,
            index_count: mesh.indices.len() as u32,
        }
    }

    fn draw(&mut self, buffer: &RecordedBuffer) {
        debug_assert!(self.live.contains(&buffer.id), "draw of released buffer");
        self.draws.push(buffer.id);
        self.indices_drawn += buffer.index_count as u64;
    }

    fn release(&mut self, buffer: RecordedBuffer) {
        if !self.live.remove(&buffer.id) {
            tracing::warn!("Buffer {} released twice", buffer.id);
        }
        self.released.push(buffer.id);
    }
}
