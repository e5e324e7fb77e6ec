//! Movement routing: which path a rolling-stock unit continues onto.
//!
//! The manager never owns track. It resolves everything through a
//! [`TrackAccess`] view, so the same queries run against the live
//! [`TrackMap`](crate::world::TrackMap) resource or a test fixture.

mod manager;
mod route;


use bevy::math::DVec3;

use crate::behaviour::TrackIdentifier;
use crate::follower::TrackFollower;
use crate::orientation::Face;
use crate::path::TrackPath;
use crate::world::{TrackAccess, TrackKey};

pub use manager::GridMovementManager;
pub use route::{Route, RouteLeg};

/// A path found on a placed piece, oriented the way stock will travel it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathHit {
    pub key: TrackKey,
    pub identifier: TrackIdentifier,
    /// Index into the piece's alternative paths.
    pub leg: usize,
    /// `true` when stock runs the leg from its end to its start.
    pub reversed: bool,
    pub path: TrackPath,
}

/// Result of snapping a free position onto track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestHit {
    pub hit: PathHit,
    /// Parameter of the snapped point on `hit.path`.
    pub progress: f64,
    /// Distance from the query position to the snapped point.
    pub distance: f64,
}

impl ClosestHit {
    pub fn position(&self) -> DVec3 {
        self.hit.path.interpolate(self.progress)
    }
}

/// Routing queries made by rolling stock.
pub trait MovementManager {
    /// The path that continues on from the end of `from`, if any piece joins
    /// it there. The result starts where `from` ends.
    fn next(&self, world: &dyn TrackAccess, from: &TrackPath) -> Option<TrackPath>;

    /// The path nearest to a free-standing unit, oriented along the unit's
    /// heading as seen from `face`.
    fn closest(
        &self,
        world: &dyn TrackAccess,
        follower: &TrackFollower,
        face: Face,
    ) -> Option<TrackPath>;
}
