//! CPU-side chunk mesh: vertices plus a triangle index buffer.

use crate::vertex::BlockVertex;

/// The mesh output of one chunk and one draw layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    pub vertices: Vec<BlockVertex>,
    /// Index buffer (triangles, 3 indices per triangle).
    pub indices: Vec<u32>,
}

impl ChunkMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a quad as two triangles, `0-1-2` and `0-2-3`.
    pub fn push_quad(&mut self, verts: [BlockVertex; 4]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&verts);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns the vertex data as a byte slice for GPU upload (zero-copy).
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Returns the index data as a byte slice for GPU upload (zero-copy).
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(z: f32) -> [BlockVertex; 4] {
        [
            BlockVertex::new([0.0, 1.0, z], [1.0; 3], [0.0, 0.0]),
            BlockVertex::new([0.0, 0.0, z], [1.0; 3], [0.0, 1.0]),
            BlockVertex::new([1.0, 0.0, z], [1.0; 3], [1.0, 1.0]),
            BlockVertex::new([1.0, 1.0, z], [1.0; 3], [1.0, 0.0]),
        ]
    }

    #[test]
    fn test_push_quad_indices() {
        let mut mesh = ChunkMesh::new();
        mesh.push_quad(quad(0.0));
        mesh.push_quad(quad(1.0));
        assert_eq!(mesh.quad_count(), 2);
        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(&mesh.indices[6..], &[4, 5, 6, 4, 6, 7]);
        for &idx in &mesh.indices {
            assert!((idx as usize) < mesh.vertices.len());
        }
    }

    #[test]
    fn test_byte_views() {
        let mut mesh = ChunkMesh::new();
        assert!(mesh.is_empty());
        mesh.push_quad(quad(0.0));
        assert_eq!(mesh.vertex_bytes().len(), 4 * 32);
        assert_eq!(mesh.index_bytes().len(), 6 * 4);
    }
}
