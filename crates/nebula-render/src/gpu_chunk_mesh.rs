//! GPU-resident chunk mesh and the wgpu [`GraphicsBackend`].
//!
//! [`GpuChunkMesh`] wraps the vertex and index buffers produced by uploading
//! a [`ChunkMesh`] and exposes what an indexed draw call needs.

use nebula_mesh::ChunkMesh;
use wgpu::util::DeviceExt;

use crate::backend::GraphicsBackend;

/// A chunk mesh that has been uploaded to the GPU.
pub struct GpuChunkMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    /// Number of indices (used in `draw_indexed`).
    pub index_count: u32,
    pub vertex_count: u32,
    vertex_buffer_size: u64,
    index_buffer_size: u64,
}

impl GpuChunkMesh {
    /// Upload a [`ChunkMesh`] to the GPU, creating new buffers.
    pub fn upload(device: &wgpu::Device, mesh: &ChunkMesh) -> Self {
        let vertex_bytes = mesh.vertex_bytes();
        let index_bytes = mesh.index_bytes();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("chunk_vertex_buffer"),
            contents: vertex_bytes,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("chunk_index_buffer"),
            contents: index_bytes,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            vertex_count: mesh.vertices.len() as u32,
            vertex_buffer_size: vertex_bytes.len() as u64,
            index_buffer_size: index_bytes.len() as u64,
        }
    }

    /// Total GPU memory consumed by this mesh's buffers in bytes.
    pub fn total_gpu_bytes(&self) -> u64 {
        self.vertex_buffer_size + self.index_buffer_size
    }

    /// Bind this mesh's buffers to a render pass.
    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }

    /// Issue an indexed draw call for this mesh.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    /// Frees the GPU memory now instead of when the handles drop.
    pub fn destroy(self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

// ---------------------------------------------------------------------------
// WgpuBackend
// ---------------------------------------------------------------------------

/// Uploads chunk meshes with a wgpu device and draws them into a render pass.
///
/// Without a pass (see [`WgpuBackend::new`]) draw calls are skipped, which
/// still lets buffers be created ahead of time or released on shutdown.
pub struct WgpuBackend<'a, 'p> {
    device: &'a wgpu::Device,
    pass: Option<&'a mut wgpu::RenderPass<'p>>,
    draw_calls: u32,
}

impl<'a, 'p> WgpuBackend<'a, 'p> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self {
            device,
            pass: None,
            draw_calls: 0,
        }
    }

    /// Draws into `pass`. The caller has already set the pipeline and bind groups.
    pub fn with_pass(device: &'a wgpu::Device, pass: &'a mut wgpu::RenderPass<'p>) -> Self {
        Self {
            device,
            pass: Some(pass),
            draw_calls: 0,
        }
    }

    /// Indexed draws issued through this backend.
    pub fn draw_calls(&self) -> u32 {
        self.draw_calls
    }
}

impl GraphicsBackend for WgpuBackend<'_, '_> {
    type Buffer = GpuChunkMesh;

    fn create_buffers(&mut self, mesh: &ChunkMesh) -> GpuChunkMesh {
        GpuChunkMesh::upload(self.device, mesh)
    }

    fn draw(&mut self, buffer: &GpuChunkMesh) {
        if let Some(pass) = self.pass.as_deref_mut() {
            buffer.bind(pass);
            buffer.draw(pass);
            self.draw_calls += 1;
        }
    }

    fn release(&mut self, buffer: GpuChunkMesh) {
        buffer.destroy();
    }
}
