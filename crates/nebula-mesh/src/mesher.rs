//! Per-face chunk meshing.
//!
//! Every visible face of every block in a chunk becomes one quad. A face is
//! visible on a layer when its neighbor is not solid and the neighbor's
//! skylight matches the layer: lit neighbors go to [`RenderLayer::Lit`],
//! shadowed ones to [`RenderLayer::Unlit`]. Faces are never merged because
//! each quad samples a distinct atlas rectangle.

use nebula_materials::{Atlas, UvRect};
use nebula_voxel::{BlockCatalog, BlockId, FaceDirection, RenderKind, VoxelGrid};

use crate::chunk_mesh::ChunkMesh;
use crate::vertex::BlockVertex;

/// Which of the two draw passes a mesh belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RenderLayer {
    /// Faces looking into skylight.
    Lit = 0,
    /// Faces looking into shadow.
    Unlit = 1,
}

impl RenderLayer {
    pub const ALL: [RenderLayer; 2] = [Self::Lit, Self::Unlit];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Maps `0` and `1` to a layer.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Lit),
            1 => Some(Self::Unlit),
            _ => None,
        }
    }

    fn accepts(self, neighbor_lit: bool) -> bool {
        neighbor_lit ^ (self == Self::Unlit)
    }
}

/// Half-open voxel box `[min, max)` covered by one chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkBounds {
    pub min: [i32; 3],
    pub max: [i32; 3],
}

impl ChunkBounds {
    pub fn new(min: [i32; 3], max: [i32; 3]) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        (self.min[0]..self.max[0]).contains(&x)
            && (self.min[1]..self.max[1]).contains(&y)
            && (self.min[2]..self.max[2]).contains(&z)
    }

    /// Number of voxels inside the bounds.
    pub fn volume(&self) -> usize {
        (0..3)
            .map(|a| (self.max[a] - self.min[a]).max(0) as usize)
            .product()
    }
}

/// Atlas UVs for every face of every block type, resolved once per atlas.
#[derive(Clone, Debug)]
pub struct BlockUvTable {
    faces: Vec<[UvRect; 6]>,
}

impl BlockUvTable {
    pub fn new(catalog: &BlockCatalog, atlas: &Atlas) -> Self {
        let faces = catalog
            .iter()
            .map(|(_, block)| FaceDirection::ALL.map(|face| atlas.lookup(block.texture(face))))
            .collect();
        Self { faces }
    }

    /// UVs of `face` on block `id`. Unknown ids use air's (placeholder) entry.
    pub fn get(&self, id: BlockId, face: FaceDirection) -> UvRect {
        let entry = self
            .faces
            .get(id.0 as usize)
            .or_else(|| self.faces.first());
        match entry {
            Some(faces) => faces[face.index()],
            None => UvRect {
                u0: 0.0,
                v0: 0.0,
                u1: 0.0,
                v1: 0.0,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Builds the mesh of `layer` for the blocks inside `bounds`.
///
/// Neighbors are read through the grid, so faces on the chunk border see the
/// adjacent chunk's blocks. Identical inputs give byte-identical output.
pub fn build_chunk_mesh(
    grid: &VoxelGrid,
    uvs: &BlockUvTable,
    bounds: &ChunkBounds,
    layer: RenderLayer,
) -> ChunkMesh {
    let mut mesh = ChunkMesh::new();
    for x in bounds.min[0]..bounds.max[0] {
        for y in bounds.min[1]..bounds.max[1] {
            for z in bounds.min[2]..bounds.max[2] {
                let id = grid.get(x, y, z);
                if id.is_air() {
                    continue;
                }
                let block = grid.block(x, y, z);
                if block.render_kind == RenderKind::Invisible {
                    continue;
                }
                for face in FaceDirection::ALL {
                    let (nx, ny, nz) = face.offset(x, y, z);
                    if grid.is_solid(nx, ny, nz) || !layer.accepts(grid.is_lit(nx, ny, nz)) {
                        continue;
                    }
                    let shade = face.shade();
                    let tint = block.tint(face);
                    let color = [tint[0] * shade, tint[1] * shade, tint[2] * shade];
                    push_face(&mut mesh, face, [x, y, z], color, uvs.get(id, face));
                }
            }
        }
    }
    mesh
}

/// Emits one unit face of the block at `pos`.
fn push_face(
    mesh: &mut ChunkMesh,
    face: FaceDirection,
    pos: [i32; 3],
    color: [f32; 3],
    uv: UvRect,
) {
    let corners = face_corners(face, pos);
    let uvs = [[uv.u0, uv.v0], [uv.u0, uv.v1], [uv.u1, uv.v1], [uv.u1, uv.v0]];
    mesh.push_quad(std::array::from_fn(|i| BlockVertex::new(corners[i], color, uvs[i])));
}

/// Corner positions of a face, top-left first and counter-clockwise seen from
/// outside the block.
fn face_corners(face: FaceDirection, pos: [i32; 3]) -> [[f32; 3]; 4] {
    let [x0, y0, z0] = pos.map(|c| c as f32);
    let (x1, y1, z1) = (x0 + 1.0, y0 + 1.0, z0 + 1.0);
    match face {
        FaceDirection::NegX => [[x0, y1, z0], [x0, y0, z0], [x0, y0, z1], [x0, y1, z1]],
        FaceDirection::PosX => [[x1, y1, z1], [x1, y0, z1], [x1, y0, z0], [x1, y1, z0]],
        FaceDirection::NegY => [[x0, y0, z1], [x0, y0, z0], [x1, y0, z0], [x1, y0, z1]],
        FaceDirection::PosY => [[x0, y1, z0], [x0, y1, z1], [x1, y1, z1], [x1, y1, z0]],
        FaceDirection::NegZ => [[x1, y1, z0], [x1, y0, z0], [x0, y0, z0], [x0, y1, z0]],
        FaceDirection::PosZ => [[x0, y1, z1], [x0, y0, z1], [x1, y0, z1], [x1, y1, z1]],
    }
}
