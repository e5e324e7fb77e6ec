//! Stateful straight track, the form a straight takes when it is part of a
//! crossing.

use bevy::math::IVec3;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::{NativeTrack, Occupancy, OverlapClass, StatefulTrack, StockPass, TrackIdentifier};
use crate::error::TrackError;
use crate::orientation::Axis;
use crate::path::TrackPath;

pub const STRAIGHT_STATE_FACTORY: &str = "traincraft:straight_state";

/// Persisted configuration of a [`StraightTrackState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct StraightStateConfig {
    pub axis: Axis,
}

#[derive(Debug, Clone)]
pub struct StraightTrackState {
    origin: IVec3,
    config: StraightStateConfig,
    occupancy: Occupancy,
}

impl StraightTrackState {
    pub fn new(origin: IVec3, axis: Axis) -> Self {
        Self {
            origin,
            config: StraightStateConfig { axis },
            occupancy: Occupancy::default(),
        }
    }

    /// Factory entry: an east-west straight at `origin`.
    pub fn create(origin: IVec3) -> Box<dyn StatefulTrack> {
        Box::new(Self::new(origin, Axis::X))
    }

    pub fn axis(&self) -> Axis {
        self.config.axis
    }

    pub fn set_axis(&mut self, axis: Axis) {
        self.config.axis = axis;
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    fn native(&self) -> NativeTrack {
        NativeTrack::Straight {
            axis: self.config.axis,
        }
    }
}

impl StatefulTrack for StraightTrackState {
    fn factory(&self) -> &'static str {
        STRAIGHT_STATE_FACTORY
    }

    fn origin(&self) -> IVec3 {
        self.origin
    }

    fn path(&self) -> TrackPath {
        self.native().path(self.origin)
    }

    fn identifier(&self) -> TrackIdentifier {
        TrackIdentifier {
            kind: STRAIGHT_STATE_FACTORY,
            origin: self.origin,
            config: self.config.axis.index(),
        }
    }

    fn overlap_class(&self) -> OverlapClass {
        OverlapClass::Crossable {
            axis: self.config.axis,
        }
    }

    fn on_stock_pass(&mut self, pass: &StockPass) {
        self.occupancy.record(pass);
    }

    fn is_occupied_at(&self, tick: u64) -> bool {
        self.occupancy.is_occupied_at(tick)
    }

    fn convert_to_native(&self) -> Option<NativeTrack> {
        Some(self.native())
    }

    fn serialize(&self) -> Result<serde_json::Value, TrackError> {
        serde_json::to_value(self.config).map_err(|e| TrackError::Encode(e.to_string()))
    }

    fn deserialize(&mut self, tag: &serde_json::Value) -> Result<(), TrackError> {
        self.config = serde_json::from_value(tag.clone())?;
        Ok(())
    }

    fn write_to_stream(&self) -> Vec<u8> {
        bitcode::encode(&self.config)
    }

    fn read_from_stream(&mut self, bytes: &[u8]) -> Result<(), TrackError> {
        self.config = bitcode::decode(bytes)?;
        Ok(())
    }
}
