//! The six axis-aligned faces of a block.

/// One of the six cardinal directions a block face can point.
///
/// Declaration order is the order faces are emitted when meshing a block:
/// west, east, down, up, north, south.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FaceDirection {
    /// −X (west).
    NegX = 0,
    /// +X (east).
    PosX = 1,
    /// −Y (down).
    NegY = 2,
    /// +Y (up).
    PosY = 3,
    /// −Z (north).
    NegZ = 4,
    /// +Z (south).
    PosZ = 5,
}

impl FaceDirection {
    /// All six directions in emission order.
    pub const ALL: [FaceDirection; 6] = [
        Self::NegX,
        Self::PosX,
        Self::NegY,
        Self::PosY,
        Self::NegZ,
        Self::PosZ,
    ];

    /// Returns the unit normal as `[f32; 3]` for this face direction.
    pub fn normal(self) -> [f32; 3] {
        match self {
            Self::PosX => [1.0, 0.0, 0.0],
            Self::NegX => [-1.0, 0.0, 0.0],
            Self::PosY => [0.0, 1.0, 0.0],
            Self::NegY => [0.0, -1.0, 0.0],
            Self::PosZ => [0.0, 0.0, 1.0],
            Self::NegZ => [0.0, 0.0, -1.0],
        }
    }

    /// Returns the neighbor coordinate in this direction.
    pub fn offset(self, x: i32, y: i32, z: i32) -> (i32, i32, i32) {
        match self {
            Self::PosX => (x + 1, y, z),
            Self::NegX => (x - 1, y, z),
            Self::PosY => (x, y + 1, z),
            Self::NegY => (x, y - 1, z),
            Self::PosZ => (x, y, z + 1),
            Self::NegZ => (x, y, z - 1),
        }
    }

    /// Returns the opposite face direction.
    pub fn opposite(self) -> Self {
        match self {
            Self::PosX => Self::NegX,
            Self::NegX => Self::PosX,
            Self::PosY => Self::NegY,
            Self::NegY => Self::PosY,
            Self::PosZ => Self::NegZ,
            Self::NegZ => Self::PosZ,
        }
    }

    /// Fixed brightness multiplier applied to faces pointing this way.
    ///
    /// Up and east are full bright, north and south 0.8, down and west 0.6.
    pub fn shade(self) -> f32 {
        match self {
            Self::PosX | Self::PosY => 1.0,
            Self::NegZ | Self::PosZ => 0.8,
            Self::NegX | Self::NegY => 0.6,
        }
    }

    /// Returns the direction index (0–5).
    pub fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, face) in FaceDirection::ALL.iter().enumerate() {
            assert_eq!(face.index(), i);
        }
    }

    #[test]
    fn test_opposite_is_involution() {
        for face in FaceDirection::ALL {
            assert_ne!(face, face.opposite());
            assert_eq!(face, face.opposite().opposite());
        }
    }

    #[test]
    fn test_offset_agrees_with_normal() {
        for face in FaceDirection::ALL {
            let (x, y, z) = face.offset(0, 0, 0);
            let n = face.normal();
            assert_eq!([x as f32, y as f32, z as f32], n);
        }
    }

    #[test]
    fn test_shade_values() {
        assert_eq!(FaceDirection::PosY.shade(), 1.0);
        assert_eq!(FaceDirection::PosX.shade(), 1.0);
        assert_eq!(FaceDirection::NegZ.shade(), 0.8);
        assert_eq!(FaceDirection::PosZ.shade(), 0.8);
        assert_eq!(FaceDirection::NegY.shade(), 0.6);
        assert_eq!(FaceDirection::NegX.shade(), 0.6);
    }
}
