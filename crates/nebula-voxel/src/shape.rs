//! Collision shapes attached to block types.

use glam::Vec3;
use nebula_math::Aabb;

const FULL_CUBE: [Aabb; 1] = [Aabb {
    min: Vec3::ZERO,
    max: Vec3::ONE,
}];

/// Collision volume of a block in block-local space (`[0, 1]³`).
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CollisionShape {
    /// No collision (air, decorations).
    Empty,
    /// The whole unit cube.
    #[default]
    FullCube,
    /// An arbitrary set of boxes inside the unit cube.
    Boxes(Vec<Aabb>),
}

impl CollisionShape {
    /// Returns the local-space boxes making up this shape.
    pub fn boxes(&self) -> &[Aabb] {
        match self {
            Self::Empty => &[],
            Self::FullCube => &FULL_CUBE,
            Self::Boxes(boxes) => boxes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.boxes().is_empty()
    }
}
