//! Rolling stock following track each fixed tick.

use std::collections::HashMap;

use bevy::math::DVec3;
use bevy::prelude::*;

use crate::behaviour::{StockPass, TrackIdentifier};
use crate::config::MAX_HOPS_PER_TICK;
use crate::movement::{GridMovementManager, PathHit};
use crate::orientation::Face;
use crate::path::TrackPath;
use crate::world::{TrackAccess, TrackKey, TrackMap};
use crate::TickCounter;

/// A rolling-stock unit's position on the track network.
///
/// `path` is always oriented in the direction of travel, so `progress` only
/// ever grows. `heading` is the unit's front, which points against the travel
/// direction when `face` is [`Face::Back`].
#[derive(Component, Debug, Clone, PartialEq)]
pub struct TrackFollower {
    pub position: DVec3,
    pub heading: DVec3,
    pub face: Face,
    /// Blocks per tick.
    pub speed: f64,
    pub path: Option<TrackPath>,
    /// Piece `path` belongs to.
    pub on: Option<TrackKey>,
    pub progress: f64,
    /// Set when the unit ran out of track. `speed` is kept, so later ticks
    /// keep asking for the next path and the unit moves off once one is laid.
    pub halted: bool,
}

impl TrackFollower {
    /// A unit not yet on any path. It snaps onto the nearest track on its
    /// first tick.
    pub fn new(position: DVec3, heading: DVec3, face: Face, speed: f64) -> Self {
        Self {
            position,
            heading,
            face,
            speed,
            path: None,
            on: None,
            progress: 0.0,
            halted: false,
        }
    }

    /// A unit already placed on `hit.path` at `progress`.
    pub fn on_path(hit: &PathHit, progress: f64, speed: f64) -> Self {
        let progress = progress.clamp(0.0, 1.0);
        Self {
            position: hit.path.interpolate(progress),
            heading: hit.path.direction(progress),
            face: Face::Front,
            speed,
            path: Some(hit.path),
            on: Some(hit.key),
            progress,
            halted: false,
        }
    }

    /// Drop the current path so the next tick re-acquires from `position`.
    pub fn derail(&mut self) {
        self.path = None;
        self.on = None;
        self.progress = 0.0;
    }

    fn refresh(&mut self, path: &TrackPath) {
        self.position = path.interpolate(self.progress);
        self.heading = path.direction(self.progress) * self.face.sign();
    }
}

/// Move one follower `speed` blocks along the network, chaining onto the next
/// path as each one runs out.
///
/// Returns every piece the unit stood on during the step, in order and
/// without repeats.
pub fn step_follower(
    manager: &GridMovementManager,
    world: &dyn TrackAccess,
    follower: &mut TrackFollower,
) -> Vec<TrackKey> {
    if follower.path.is_none() {
        let Some(closest) =
            manager.closest_hit(world, follower.position, follower.heading, follower.face)
        else {
            return Vec::new();
        };
        debug!(
            "Follower acquired track {} at distance {:.3}",
            closest.hit.key.0, closest.distance
        );
        follower.path = Some(closest.hit.path);
        follower.on = Some(closest.hit.key);
        follower.progress = closest.progress;
    }
    let Some(mut path) = follower.path else {
        return Vec::new();
    };

    let mut passed: Vec<TrackKey> = follower.on.into_iter().collect();
    let mut remaining = follower.speed.max(0.0);
    let was_halted = follower.halted;

    // Distance along this step at which each identifier was entered. Meeting
    // one again means the unit went all the way round a loop, so whole laps
    // are dropped from what is left to travel.
    let mut travelled = -follower.progress * path.length();
    let mut entered: HashMap<TrackIdentifier, f64> = HashMap::new();
    if let Some(piece) = follower.on.and_then(|key| world.piece(key)) {
        entered.insert(piece.behaviour.identifier(piece.origin), travelled);
    }

    let mut hops = 0;
    loop {
        let length = path.length();
        let left = (1.0 - follower.progress) * length;
        if remaining <= left {
            if length > 0.0 {
                follower.progress += remaining / length;
            }
            if remaining > 0.0 {
                follower.halted = false;
            }
            break;
        }
        remaining -= left;
        travelled += length;
        follower.progress = 1.0;

        hops += 1;
        if hops > MAX_HOPS_PER_TICK {
            break;
        }
        let Some(hit) = manager.next_hit(world, &path) else {
            if !was_halted {
                info!(
                    "Follower halted at end of track {:?}, {:.3} blocks short",
                    follower.on.map(|k| k.0),
                    remaining
                );
            }
            follower.halted = true;
            break;
        };
        if let Some(entry) = entered.insert(hit.identifier, travelled) {
            let lap = travelled - entry;
            if lap > 0.0 {
                debug!(
                    "Follower lapped a {:.3} block loop at track {} within one tick",
                    lap, hit.key.0
                );
                remaining %= lap;
            }
            entered.clear();
            entered.insert(hit.identifier, travelled);
        }
        path = hit.path;
        follower.on = Some(hit.key);
        follower.progress = 0.0;
        if !passed.contains(&hit.key) {
            passed.push(hit.key);
        }
    }

    follower.path = Some(path);
    follower.refresh(&path);
    passed
}

/// Advance every follower by one tick and report the pieces it passed over.
pub fn advance_followers(
    tick: Res<TickCounter>,
    manager: Res<GridMovementManager>,
    mut tracks: ResMut<TrackMap>,
    mut followers: Query<(Entity, &mut TrackFollower)>,
) {
    for (entity, mut follower) in &mut followers {
        let passed = step_follower(&manager, &*tracks, &mut follower);
        let pass = StockPass {
            stock: entity,
            tick: tick.0,
        };
        for key in passed {
            tracks.notify_stock_pass(key, &pass);
        }
    }
}
