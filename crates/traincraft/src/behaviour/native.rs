//! Native track: behaviour derived entirely from block kind, orientation and
//! position. Nothing here is stored per block beyond the enum value itself.

use bevy::math::{DVec3, IVec3};
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::points::PointsState;
use super::straight_state::StraightTrackState;
use super::{StatefulTrack, TrackIdentifier};
use crate::config::TRACK_HEIGHT;
use crate::orientation::{Axis, Facing, Turn};
use crate::path::TrackPath;

pub const STRAIGHT_KIND: &str = "traincraft:straight";
pub const ASCENDING_KIND: &str = "traincraft:ascending";
pub const CURVE_KIND: &str = "traincraft:curve";
pub const S_BEND_KIND: &str = "traincraft:s_bend";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum NativeTrack {
    /// One block of level track.
    Straight { axis: Axis },
    /// Straight slope climbing one block over `length` blocks towards `facing`.
    Ascending { facing: Facing, length: u8 },
    /// Quarter turn of `radius` blocks, entered heading `facing`.
    Curve { facing: Facing, turn: Turn, radius: u8 },
    /// Shifts the line one block sideways over `length` blocks.
    SBend { facing: Facing, shift: Turn, length: u8 },
}

/// Midpoint of the block edge a train heading `facing` enters `origin` through,
/// at rail height.
pub fn entry_point(origin: IVec3, facing: Facing) -> DVec3 {
    let centre = origin.as_dvec3() + DVec3::new(0.5, TRACK_HEIGHT, 0.5);
    centre - facing.vector() * 0.5
}

impl NativeTrack {
    pub fn path(&self, origin: IVec3) -> TrackPath {
        match *self {
            NativeTrack::Straight { axis } => {
                let facing = axis.facing();
                let start = entry_point(origin, facing);
                TrackPath::straight(start, start + facing.vector())
            }
            NativeTrack::Ascending { facing, length } => {
                let start = entry_point(origin, facing);
                let run = f64::from(length.max(1));
                TrackPath::straight(start, start + facing.vector() * run + DVec3::Y)
            }
            NativeTrack::Curve {
                facing,
                turn,
                radius,
            } => {
                let start = entry_point(origin, facing);
                TrackPath::quarter_turn(start, facing, turn, f64::from(radius.max(1)) - 0.5, 0.0)
            }
            NativeTrack::SBend {
                facing,
                shift,
                length,
            } => {
                let start = entry_point(origin, facing);
                let forward = facing.vector() * f64::from(length.max(1));
                let end = start + forward + facing.turned(shift).vector();
                TrackPath::bezier([start, start + forward * 0.5, end - forward * 0.5, end])
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NativeTrack::Straight { .. } => STRAIGHT_KIND,
            NativeTrack::Ascending { .. } => ASCENDING_KIND,
            NativeTrack::Curve { .. } => CURVE_KIND,
            NativeTrack::SBend { .. } => S_BEND_KIND,
        }
    }

    /// Packs the orientation fields into the identifier's configuration word.
    fn config_word(&self) -> u32 {
        match *self {
            NativeTrack::Straight { axis } => axis.index(),
            NativeTrack::Ascending { facing, length } => facing.index() | (u32::from(length) << 4),
            NativeTrack::Curve {
                facing,
                turn,
                radius,
            } => facing.index() | (turn.index() << 2) | (u32::from(radius) << 4),
            NativeTrack::SBend {
                facing,
                shift,
                length,
            } => facing.index() | (shift.index() << 2) | (u32::from(length) << 4),
        }
    }

    pub fn identifier(&self, origin: IVec3) -> TrackIdentifier {
        TrackIdentifier {
            kind: self.kind(),
            origin,
            config: self.config_word(),
        }
    }

    /// The stateful form of this piece, used to build crossings and points.
    /// Slopes and S-bends have none.
    pub fn convert_to_stateful(&self, origin: IVec3) -> Option<Box<dyn StatefulTrack>> {
        match *self {
            NativeTrack::Straight { axis } => Some(Box::new(StraightTrackState::new(origin, axis))),
            NativeTrack::Curve {
                facing,
                turn,
                radius,
            } => {
                let mut points = PointsState::new(origin, facing, turn, radius);
                points.set_switched_unchecked(true);
                Some(Box::new(points))
            }
            NativeTrack::Ascending { .. } | NativeTrack::SBend { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slaves::slave_offsets;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_straight_spans_one_block_at_rail_height() {
        let path = NativeTrack::Straight { axis: Axis::X }.path(IVec3::new(2, 5, 3));
        assert!((path.start() - DVec3::new(2.0, 5.125, 3.5)).length() < EPS);
        assert!((path.end() - DVec3::new(3.0, 5.125, 3.5)).length() < EPS);

        let path = NativeTrack::Straight { axis: Axis::Z }.path(IVec3::ZERO);
        assert!((path.start() - DVec3::new(0.5, 0.125, 0.0)).length() < EPS);
        assert!((path.end() - DVec3::new(0.5, 0.125, 1.0)).length() < EPS);
    }

    #[test]
    fn test_ascending_rises_one_block() {
        let track = NativeTrack::Ascending {
            facing: Facing::North,
            length: 2,
        };
        let path = track.path(IVec3::ZERO);
        assert!((path.start() - DVec3::new(0.5, 0.125, 1.0)).length() < EPS);
        assert!((path.end() - DVec3::new(0.5, 1.125, -1.0)).length() < EPS);
        assert!((path.length() - 5.0_f64.sqrt()).abs() < EPS);
    }

    #[test]
    fn test_curve_leaves_through_side_edge() {
        let track = NativeTrack::Curve {
            facing: Facing::East,
            turn: Turn::Right,
            radius: 1,
        };
        let path = track.path(IVec3::ZERO);
        // Enters through the west edge heading east, leaves through the south edge.
        assert!((path.start() - DVec3::new(0.0, 0.125, 0.5)).length() < 1e-9);
        assert!((path.end() - DVec3::new(0.5, 0.125, 1.0)).length() < 1e-9);
        assert!((path.direction(1.0) - Facing::South.vector()).length() < 1e-9);
        assert_eq!(slave_offsets(&path, IVec3::ZERO).len(), 1);
    }

    #[test]
    fn test_s_bend_shifts_one_block_sideways() {
        let track = NativeTrack::SBend {
            facing: Facing::East,
            shift: Turn::Left,
            length: 3,
        };
        let path = track.path(IVec3::ZERO);
        assert!((path.end() - DVec3::new(3.0, 0.125, -0.5)).length() < EPS);
        // Leaves parallel to how it entered.
        assert!((path.direction(1.0) - Facing::East.vector()).length() < 1e-9);
        let slaves = slave_offsets(&path, IVec3::ZERO);
        assert!(slaves.contains(&IVec3::new(2, 0, -1)));
    }

    #[test]
    fn test_identifier_tracks_configuration() {
        let a = NativeTrack::Straight { axis: Axis::X };
        let b = NativeTrack::Straight { axis: Axis::Z };
        assert_eq!(a.identifier(IVec3::ONE), a.identifier(IVec3::ONE));
        assert_ne!(a.identifier(IVec3::ONE), b.identifier(IVec3::ONE));
        assert_ne!(a.identifier(IVec3::ONE), a.identifier(IVec3::ZERO));
    }

    #[test]
    fn test_slopes_have_no_stateful_form() {
        let slope = NativeTrack::Ascending {
            facing: Facing::West,
            length: 1,
        };
        assert!(slope.convert_to_stateful(IVec3::ZERO).is_none());
    }
}
