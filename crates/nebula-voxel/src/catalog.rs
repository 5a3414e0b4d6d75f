//! Block catalog: maps compact [`BlockId`] values to [`BlockType`] capability records.
//!
//! The catalog is built once during startup and shared read-only afterwards.
//! Air is always ID 0 so that zero-initialized grid memory represents empty space.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::face::FaceDirection;
use crate::grid::VoxelGrid;
use crate::shape::CollisionShape;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Compact identifier stored in every grid cell (2 bytes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u16);

impl BlockId {
    pub const AIR: BlockId = BlockId(0);

    pub fn is_air(self) -> bool {
        self.0 == 0
    }
}

/// How the mesher treats a block type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderKind {
    /// Emits textured cube faces.
    #[default]
    Model,
    /// Emits nothing.
    Invisible,
}

/// Hook invoked when a random tick lands on a block of this type.
pub type RandomTickFn = fn(&mut VoxelGrid, i32, i32, i32);

/// Texture id for each of the six faces, indexed by [`FaceDirection::index`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceTextures([String; 6]);

impl FaceTextures {
    /// Same texture on every face.
    pub fn all(texture: &str) -> Self {
        Self(std::array::from_fn(|_| texture.to_string()))
    }

    /// Distinct top and bottom textures with a shared side texture.
    pub fn top_side_bottom(top: &str, side: &str, bottom: &str) -> Self {
        let mut faces = Self::all(side);
        faces.0[FaceDirection::PosY.index()] = top.to_string();
        faces.0[FaceDirection::NegY.index()] = bottom.to_string();
        faces
    }

    /// Textures listed west, east, down, up, north, south.
    pub fn from_array(faces: [String; 6]) -> Self {
        Self(faces)
    }

    pub fn get(&self, face: FaceDirection) -> &str {
        &self.0[face.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Capability record describing one kind of block.
#[derive(Clone, Debug)]
pub struct BlockType {
    /// Registry name (e.g. "stone", "grass_block").
    pub name: String,
    pub is_air: bool,
    /// Blocks skylight.
    pub is_opaque: bool,
    /// Hides neighbor faces and collides with entities.
    pub is_solid: bool,
    pub render_kind: RenderKind,
    pub faces: FaceTextures,
    /// Optional RGB multiplier per face, on top of the directional shade.
    pub tints: [Option<[f32; 3]>; 6],
    pub collision: CollisionShape,
    pub random_tick: Option<RandomTickFn>,
}

impl BlockType {
    /// An opaque, solid, full-cube block textured with its own name on every face.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_air: false,
            is_opaque: true,
            is_solid: true,
            render_kind: RenderKind::Model,
            faces: FaceTextures::all(name),
            tints: [None; 6],
            collision: CollisionShape::FullCube,
            random_tick: None,
        }
    }

    /// Marks the type as air: invisible, non-opaque, non-solid, no collision.
    pub fn air(mut self) -> Self {
        self.is_air = true;
        self.render_kind = RenderKind::Invisible;
        self.collision = CollisionShape::Empty;
        self.non_opaque().non_solid()
    }

    pub fn non_opaque(mut self) -> Self {
        self.is_opaque = false;
        self
    }

    pub fn non_solid(mut self) -> Self {
        self.is_solid = false;
        self
    }

    pub fn with_faces(mut self, faces: FaceTextures) -> Self {
        self.faces = faces;
        self
    }

    pub fn with_tint(mut self, face: FaceDirection, rgb: [f32; 3]) -> Self {
        self.tints[face.index()] = Some(rgb);
        self
    }

    pub fn with_collision(mut self, collision: CollisionShape) -> Self {
        self.collision = collision;
        self
    }

    pub fn with_random_tick(mut self, hook: RandomTickFn) -> Self {
        self.random_tick = Some(hook);
        self
    }

    /// Texture id used for `face`.
    pub fn texture(&self, face: FaceDirection) -> &str {
        self.faces.get(face)
    }

    /// Tint for `face`, white when none is set.
    pub fn tint(&self, face: FaceDirection) -> [f32; 3] {
        self.tints[face.index()].unwrap_or([1.0, 1.0, 1.0])
    }
}

/// Errors that can occur during block registration.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A type with the same name has already been registered.
    #[error("duplicate block name: {0}")]
    DuplicateName(String),
    /// All 65 536 slots have been consumed.
    #[error("block catalog is full (max 65536 types)")]
    CatalogFull,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Maps [`BlockId`] → [`BlockType`] with O(1) lookup by index and
/// O(1) reverse lookup by name.
pub struct BlockCatalog {
    /// Dense array where `index == BlockId.0`.
    types: Vec<BlockType>,
    name_to_id: FxHashMap<String, BlockId>,
}

impl BlockCatalog {
    /// Creates a new catalog with air pre-registered as ID 0.
    pub fn new() -> Self {
        let mut name_to_id = FxHashMap::default();
        name_to_id.insert("air".to_string(), BlockId::AIR);

        Self {
            types: vec![BlockType::new("air").air()],
            name_to_id,
        }
    }

    /// Registers a new block type and returns its assigned ID.
    ///
    /// IDs are assigned sequentially starting from 1 (0 is air).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateName`] if a type with the same name
    /// already exists, or [`CatalogError::CatalogFull`] if all slots are
    /// consumed.
    pub fn register(&mut self, block: BlockType) -> Result<BlockId, CatalogError> {
        if self.name_to_id.contains_key(&block.name) {
            return Err(CatalogError::DuplicateName(block.name));
        }
        if self.types.len() > u16::MAX as usize {
            return Err(CatalogError::CatalogFull);
        }

        let id = BlockId(self.types.len() as u16);
        self.name_to_id.insert(block.name.clone(), id);
        self.types.push(block);
        Ok(id)
    }

    /// Returns the type for a given ID. Unknown IDs resolve to air.
    pub fn get(&self, id: BlockId) -> &BlockType {
        self.types.get(id.0 as usize).unwrap_or(&self.types[0])
    }

    /// Mutable access for load-time adjustments such as applying block models.
    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut BlockType> {
        self.types.get_mut(id.0 as usize)
    }

    /// Returns `true` if `id` was produced by this catalog.
    pub fn contains(&self, id: BlockId) -> bool {
        (id.0 as usize) < self.types.len()
    }

    /// Returns the ID for a named block type, or `None` if not found.
    pub fn lookup_by_name(&self, name: &str) -> Option<BlockId> {
        self.name_to_id.get(name).copied()
    }

    /// Returns the total number of registered types (including air).
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if only air is registered.
    pub fn is_empty(&self) -> bool {
        self.types.len() <= 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &BlockType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, block)| (BlockId(i as u16), block))
    }

    /// Every distinct texture id referenced by a visible block, sorted.
    pub fn texture_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .types
            .iter()
            .filter(|block| block.render_kind == RenderKind::Model)
            .flat_map(|block| block.faces.iter().map(str::to_string))
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

impl Default for BlockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
