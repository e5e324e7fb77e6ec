//! Horizontal orientations used to describe how a track piece sits in its block.

use bevy::math::{DVec3, IVec3};
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Compass direction on the horizontal plane. North is -Z, East is +X.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub enum Facing {
    North,
    East,
    South,
    West,
}

impl Facing {
    pub const ALL: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    pub fn offset(self) -> IVec3 {
        match self {
            Facing::North => IVec3::new(0, 0, -1),
            Facing::East => IVec3::new(1, 0, 0),
            Facing::South => IVec3::new(0, 0, 1),
            Facing::West => IVec3::new(-1, 0, 0),
        }
    }

    pub fn vector(self) -> DVec3 {
        self.offset().as_dvec3()
    }

    pub fn opposite(self) -> Facing {
        match self {
            Facing::North => Facing::South,
            Facing::East => Facing::West,
            Facing::South => Facing::North,
            Facing::West => Facing::East,
        }
    }

    /// Rotate a quarter turn, clockwise when seen from above for `Turn::Right`.
    pub fn turned(self, turn: Turn) -> Facing {
        match (self, turn) {
            (Facing::North, Turn::Right) | (Facing::South, Turn::Left) => Facing::East,
            (Facing::East, Turn::Right) | (Facing::West, Turn::Left) => Facing::South,
            (Facing::South, Turn::Right) | (Facing::North, Turn::Left) => Facing::West,
            (Facing::West, Turn::Right) | (Facing::East, Turn::Left) => Facing::North,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Facing::East | Facing::West => Axis::X,
            Facing::North | Facing::South => Axis::Z,
        }
    }

    pub(crate) fn index(self) -> u32 {
        match self {
            Facing::North => 0,
            Facing::East => 1,
            Facing::South => 2,
            Facing::West => 3,
        }
    }
}

/// Horizontal axis a straight piece runs along.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    /// The facing a straight piece on this axis is laid out towards.
    pub fn facing(self) -> Facing {
        match self {
            Axis::X => Facing::East,
            Axis::Z => Facing::South,
        }
    }

    pub fn other(self) -> Axis {
        match self {
            Axis::X => Axis::Z,
            Axis::Z => Axis::X,
        }
    }

    pub(crate) fn index(self) -> u32 {
        match self {
            Axis::X => 0,
            Axis::Z => 1,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub enum Turn {
    Left,
    Right,
}

impl Turn {
    pub(crate) fn index(self) -> u32 {
        match self {
            Turn::Left => 0,
            Turn::Right => 1,
        }
    }
}

/// Which way along its heading a rolling-stock unit wants to travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Face {
    #[default]
    Front,
    Back,
}

impl Face {
    pub fn sign(self) -> f64 {
        match self {
            Face::Front => 1.0,
            Face::Back => -1.0,
        }
    }

    pub fn opposite(self) -> Face {
        match self {
            Face::Front => Face::Back,
            Face::Back => Face::Front,
        }
    }
}
