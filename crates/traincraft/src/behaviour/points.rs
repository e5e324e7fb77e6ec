//! Points (a switch): one through leg and one diverging leg sharing an entry.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::{entry_point, NativeTrack, Occupancy, StatefulTrack, StockPass, TrackIdentifier};
use crate::error::TrackError;
use crate::orientation::{Facing, Turn};
use crate::path::TrackPath;

pub const POINTS_FACTORY: &str = "traincraft:points";

/// Persisted configuration of a [`PointsState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct PointsConfig {
    /// Heading of stock entering at the toe.
    pub facing: Facing,
    /// Side the diverging leg curves towards.
    pub hand: Turn,
    /// Radius of the diverging leg, and length of the through leg, in blocks.
    pub radius: u8,
    /// `true` routes stock onto the diverging leg.
    pub switched: bool,
}

#[derive(Debug, Clone)]
pub struct PointsState {
    origin: IVec3,
    config: PointsConfig,
    occupancy: Occupancy,
}

impl PointsState {
    pub fn new(origin: IVec3, facing: Facing, hand: Turn, radius: u8) -> Self {
        Self {
            origin,
            config: PointsConfig {
                facing,
                hand,
                radius: radius.max(1),
                switched: false,
            },
            occupancy: Occupancy::default(),
        }
    }

    /// Factory entry: single-block right-hand points facing east.
    pub fn create(origin: IVec3) -> Box<dyn StatefulTrack> {
        Box::new(Self::new(origin, Facing::East, Turn::Right, 1))
    }

    pub fn config(&self) -> PointsConfig {
        self.config
    }

    pub fn is_switched(&self) -> bool {
        self.config.switched
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    /// Throw the points. Refused while any stock stood on them during `tick`.
    pub fn set_switched(&mut self, switched: bool, tick: u64) -> bool {
        if self.occupancy.is_occupied_at(tick) {
            warn!(
                "Points at {}: refusing to switch while occupied in tick {}",
                self.origin, tick
            );
            return false;
        }
        self.config.switched = switched;
        true
    }

    pub(crate) fn set_switched_unchecked(&mut self, switched: bool) {
        self.config.switched = switched;
    }

    pub fn through_path(&self) -> TrackPath {
        let start = entry_point(self.origin, self.config.facing);
        let run = f64::from(self.config.radius);
        TrackPath::straight(start, start + self.config.facing.vector() * run)
    }

    pub fn diverging_path(&self) -> TrackPath {
        self.curve().path(self.origin)
    }

    fn curve(&self) -> NativeTrack {
        NativeTrack::Curve {
            facing: self.config.facing,
            turn: self.config.hand,
            radius: self.config.radius,
        }
    }

    fn config_word(&self) -> u32 {
        self.config.facing.index()
            | (self.config.hand.index() << 2)
            | (u32::from(self.config.switched) << 3)
            | (u32::from(self.config.radius) << 4)
    }
}

impl StatefulTrack for PointsState {
    fn factory(&self) -> &'static str {
        POINTS_FACTORY
    }

    fn origin(&self) -> IVec3 {
        self.origin
    }

    fn path(&self) -> TrackPath {
        if self.config.switched {
            self.diverging_path()
        } else {
            self.through_path()
        }
    }

    /// Through leg first so routing prefers it on ties.
    fn alternative_paths(&self) -> Vec<TrackPath> {
        vec![self.through_path(), self.diverging_path()]
    }

    fn identifier(&self) -> TrackIdentifier {
        TrackIdentifier {
            kind: POINTS_FACTORY,
            origin: self.origin,
            config: self.config_word(),
        }
    }

    fn on_stock_pass(&mut self, pass: &StockPass) {
        self.occupancy.record(pass);
    }

    fn is_occupied_at(&self, tick: u64) -> bool {
        self.occupancy.is_occupied_at(tick)
    }

    fn interact(&mut self, tick: u64) -> bool {
        self.set_switched(!self.config.switched, tick)
    }

    /// Switched points become the plain curve. Unswitched points become a
    /// plain straight only when the through leg is a single block long and
    /// runs the way a native straight on that axis does.
    fn convert_to_native(&self) -> Option<NativeTrack> {
        if self.config.switched {
            return Some(self.curve());
        }
        let axis = self.config.facing.axis();
        if self.config.radius != 1 || axis.facing() != self.config.facing {
            return None;
        }
        Some(NativeTrack::Straight { axis })
    }

    fn serialize(&self) -> Result<serde_json::Value, TrackError> {
        serde_json::to_value(self.config).map_err(|e| TrackError::Encode(e.to_string()))
    }

    fn deserialize(&mut self, tag: &serde_json::Value) -> Result<(), TrackError> {
        let config: PointsConfig = serde_json::from_value(tag.clone())?;
        if config.radius == 0 {
            return Err(TrackError::InvalidTag("points radius must be at least 1".to_string()));
        }
        self.config = config;
        Ok(())
    }

    fn write_to_stream(&self) -> Vec<u8> {
        bitcode::encode(&self.config)
    }

    fn read_from_stream(&mut self, bytes: &[u8]) -> Result<(), TrackError> {
        let config: PointsConfig = bitcode::decode(bytes)?;
        if config.radius == 0 {
            return Err(TrackError::Decode("points radius must be at least 1".to_string()));
        }
        self.config = config;
        Ok(())
    }
}
