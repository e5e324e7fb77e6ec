//! Track behaviours: what a placed track piece does.
//!
//! A behaviour turns a block position into a [`TrackPath`], an identity token,
//! the set of cells the piece covers and its reaction to passing stock. There
//! are exactly two shapes:
//!
//! - [`NativeTrack`]: stateless, a pure function of block kind, orientation and
//!   position. Cheap to rebuild, nothing persisted per block.
//! - [`StatefulTrack`]: owns its position and mutable configuration (switch
//!   setting, occupancy), is rebuilt through a factory registered in the
//!   [`StatefulRegistry`], and exposes serialization hooks for the host's
//!   persistence layer.
//!
//! Overlap compatibility is decided from both sides' [`OverlapClass`] by a
//! commutative rule, so `a.can_overlap(b) == b.can_overlap(a)` always holds.

mod native;
mod occupancy;
mod points;
mod registry;
mod straight_state;


use std::collections::HashSet;
use std::fmt;

use bevy::math::IVec3;
use bevy::prelude::Entity;

use crate::error::TrackError;
use crate::orientation::Axis;
use crate::path::TrackPath;
use crate::slaves::{slave_offsets, slave_offsets_union};

pub use native::{entry_point, NativeTrack, ASCENDING_KIND, CURVE_KIND, STRAIGHT_KIND, S_BEND_KIND};
pub use occupancy::Occupancy;
pub use points::{PointsConfig, PointsState, POINTS_FACTORY};
pub use registry::{
    seal_stateful_registry, StatefulFactory, StatefulRegistry, StatefulTrackAppExt,
};
pub use straight_state::{StraightStateConfig, StraightTrackState, STRAIGHT_STATE_FACTORY};

/// Identifies "this behaviour, at this origin, in this configuration".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackIdentifier {
    pub kind: &'static str,
    pub origin: IVec3,
    pub config: u32,
}

/// One rolling-stock unit passing over a piece during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockPass {
    pub stock: Entity,
    pub tick: u64,
}

/// How a piece may share grid cells with other pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlapClass {
    /// Never shares a cell.
    Exclusive,
    /// Straight track that can be crossed by another crossable track running
    /// along the other axis.
    Crossable { axis: Axis },
}

impl OverlapClass {
    /// Commutative compatibility rule behind [`TrackBehaviour::can_overlap`].
    pub fn compatible_with(self, other: OverlapClass) -> bool {
        match (self, other) {
            (OverlapClass::Crossable { axis: a }, OverlapClass::Crossable { axis: b }) => a != b,
            _ => false,
        }
    }
}

/// Behaviour backed by per-piece state that the host persists.
///
/// Implementations store their own origin; every query ignores the world and
/// answers from that state alone.
pub trait StatefulTrack: fmt::Debug + Send + Sync + 'static {
    /// Identifier of the factory that rebuilds this behaviour.
    fn factory(&self) -> &'static str;

    fn origin(&self) -> IVec3;

    /// The path stock follows over this piece in its current configuration.
    fn path(&self) -> TrackPath;

    /// Every leg this piece can route stock over, current leg first.
    fn alternative_paths(&self) -> Vec<TrackPath> {
        vec![self.path()]
    }

    fn identifier(&self) -> TrackIdentifier;

    /// Cells covered by any leg, relative to the origin.
    fn slave_offsets(&self) -> HashSet<IVec3> {
        slave_offsets_union(&self.alternative_paths(), self.origin())
    }

    fn overlap_class(&self) -> OverlapClass {
        OverlapClass::Exclusive
    }

    /// Called once per tick for every stock unit traversing this piece. Must
    /// tolerate repeat calls for the same stock in the same tick.
    fn on_stock_pass(&mut self, pass: &StockPass);

    /// Whether any stock stood on this piece during `tick`.
    fn is_occupied_at(&self, _tick: u64) -> bool {
        false
    }

    /// Apply a player reconfiguration (e.g. throw a switch). Returns `false`
    /// when this piece has nothing to configure or refuses right now.
    fn interact(&mut self, _tick: u64) -> bool {
        false
    }

    /// The native piece this state is equivalent to, if there is one.
    fn convert_to_native(&self) -> Option<NativeTrack>;

    fn serialize(&self) -> Result<serde_json::Value, TrackError>;

    fn deserialize(&mut self, tag: &serde_json::Value) -> Result<(), TrackError>;

    fn write_to_stream(&self) -> Vec<u8>;

    fn read_from_stream(&mut self, bytes: &[u8]) -> Result<(), TrackError>;
}

#[derive(Debug)]
pub enum TrackBehaviour {
    Native(NativeTrack),
    Stateful(Box<dyn StatefulTrack>),
}

impl From<NativeTrack> for TrackBehaviour {
    fn from(native: NativeTrack) -> Self {
        TrackBehaviour::Native(native)
    }
}

impl TrackBehaviour {
    pub fn stateful(track: impl StatefulTrack) -> Self {
        TrackBehaviour::Stateful(Box::new(track))
    }

    /// Path over this piece. Stateful pieces ignore `origin`.
    pub fn path(&self, origin: IVec3) -> TrackPath {
        match self {
            TrackBehaviour::Native(native) => native.path(origin),
            TrackBehaviour::Stateful(state) => state.path(),
        }
    }

    pub fn alternative_paths(&self, origin: IVec3) -> Vec<TrackPath> {
        match self {
            TrackBehaviour::Native(native) => vec![native.path(origin)],
            TrackBehaviour::Stateful(state) => state.alternative_paths(),
        }
    }

    pub fn identifier(&self, origin: IVec3) -> TrackIdentifier {
        match self {
            TrackBehaviour::Native(native) => native.identifier(origin),
            TrackBehaviour::Stateful(state) => state.identifier(),
        }
    }

    pub fn slave_offsets(&self, origin: IVec3) -> HashSet<IVec3> {
        match self {
            TrackBehaviour::Native(native) => slave_offsets(&native.path(origin), origin),
            TrackBehaviour::Stateful(state) => state.slave_offsets(),
        }
    }

    pub fn overlap_class(&self) -> OverlapClass {
        match self {
            TrackBehaviour::Native(_) => OverlapClass::Exclusive,
            TrackBehaviour::Stateful(state) => state.overlap_class(),
        }
    }

    pub fn can_overlap(&self, other: &TrackBehaviour) -> bool {
        self.overlap_class().compatible_with(other.overlap_class())
    }

    pub fn on_stock_pass(&mut self, pass: &StockPass) {
        match self {
            TrackBehaviour::Native(_) => {}
            TrackBehaviour::Stateful(state) => state.on_stock_pass(pass),
        }
    }

    pub fn is_stateful(&self) -> bool {
        matches!(self, TrackBehaviour::Stateful(_))
    }

    pub fn as_stateful(&self) -> Option<&dyn StatefulTrack> {
        match self {
            TrackBehaviour::Native(_) => None,
            TrackBehaviour::Stateful(state) => Some(state.as_ref()),
        }
    }

    pub fn as_native(&self) -> Option<NativeTrack> {
        match self {
            TrackBehaviour::Native(native) => Some(*native),
            TrackBehaviour::Stateful(_) => None,
        }
    }
}
