//! Block vertex and its canonical `wgpu::VertexBufferLayout`.
//!
//! Both draw layers share [`BLOCK_VERTEX_LAYOUT`], so a pipeline built for one
//! can draw the other.
//!
//! ## Attribute Packing
//!
//! | Location | Offset | Format    | Field                     |
//! |----------|--------|-----------|---------------------------|
//! | 0        | 0      | Float32x3 | world position            |
//! | 1        | 12     | Float32x3 | shade × tint color        |
//! | 2        | 24     | Float32x2 | atlas uv                  |

use std::mem;

use wgpu::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

/// A single textured, pre-shaded vertex in world space.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlockVertex {
    pub position: [f32; 3],
    /// Directional shade multiplied by the block's face tint.
    pub color: [f32; 3],
    pub uv: [f32; 2],
}

static_assertions::assert_eq_size!(BlockVertex, [u8; 32]);

impl BlockVertex {
    pub fn new(position: [f32; 3], color: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            color,
            uv,
        }
    }
}

/// Vertex attributes covering all 32 bytes of [`BlockVertex`].
pub const BLOCK_VERTEX_ATTRIBUTES: [VertexAttribute; 3] = [
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    },
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 12,
        shader_location: 1,
    },
    VertexAttribute {
        format: VertexFormat::Float32x2,
        offset: 24,
        shader_location: 2,
    },
];

/// The vertex buffer layout for chunk draw pipelines.
pub const BLOCK_VERTEX_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: mem::size_of::<BlockVertex>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &BLOCK_VERTEX_ATTRIBUTES,
};

// ---------------------------------------------------------------------------
// Compile-time validation
// ---------------------------------------------------------------------------

const _: () = assert!(BLOCK_VERTEX_ATTRIBUTES[0].offset == mem::offset_of!(BlockVertex, position) as u64);
const _: () = assert!(BLOCK_VERTEX_ATTRIBUTES[1].offset == mem::offset_of!(BlockVertex, color) as u64);
const _: () = assert!(BLOCK_VERTEX_ATTRIBUTES[2].offset == mem::offset_of!(BlockVertex, uv) as u64);

/// Last attribute must end exactly at the stride.
const _: () = assert!(
    BLOCK_VERTEX_ATTRIBUTES[2].offset + 8 == mem::size_of::<BlockVertex>() as u64,
    "BlockVertex size changed, update BLOCK_VERTEX_LAYOUT"
);
