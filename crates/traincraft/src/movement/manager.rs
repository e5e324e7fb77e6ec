// ---------------------------------------------------------------------------
// GridMovementManager: next / closest / successors over a grid of track cells
// ---------------------------------------------------------------------------

use std::collections::HashSet;

use bevy::math::DVec3;
use bevy::prelude::*;

use super::{ClosestHit, MovementManager, PathHit};
use crate::config::{
    CLOSEST_SEARCH_RADIUS, MIN_HEADING_ALIGNMENT, NEXT_PROBE_DISTANCE, PATH_JOIN_TOLERANCE,
};
use crate::follower::TrackFollower;
use crate::orientation::Face;
use crate::path::TrackPath;
use crate::slaves::cell_of;
use crate::world::{TrackAccess, TrackKey, TrackRef};

/// Movement manager for block-grid track. Holds only tuning; every query
/// reads the world it is handed.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct GridMovementManager {
    /// Largest Chebyshev radius, in cells, `closest` searches.
    pub search_radius: i32,
    /// Maximum gap between the end of one path and the start of the next.
    pub join_tolerance: f64,
}

impl Default for GridMovementManager {
    fn default() -> Self {
        Self {
            search_radius: CLOSEST_SEARCH_RADIUS,
            join_tolerance: PATH_JOIN_TOLERANCE,
        }
    }
}

impl GridMovementManager {
    /// Cells probed for a continuation of `from`: half a block past its end
    /// along the end tangent, then the same with the climb removed so a slope
    /// finds the level track it lands on.
    fn probe_cells(from: &TrackPath) -> Vec<IVec3> {
        let end = from.end();
        let dir = from.direction(1.0);
        let mut cells = vec![cell_of(end + dir * NEXT_PROBE_DISTANCE)];
        let level = DVec3::new(dir.x, 0.0, dir.z).normalize_or_zero();
        if level != DVec3::ZERO {
            let cell = cell_of(end + level * NEXT_PROBE_DISTANCE);
            if !cells.contains(&cell) {
                cells.push(cell);
            }
        }
        cells
    }

    /// `candidate` runs straight back over `from`.
    fn is_u_turn(&self, candidate: &TrackPath, from: &TrackPath) -> bool {
        candidate.end().distance(from.start()) <= self.join_tolerance
            && candidate
                .interpolate(0.5)
                .distance(from.interpolate(0.5))
                <= self.join_tolerance
    }

    /// Orient `path` so it continues from `from`, trying forward first.
    fn join(
        &self,
        occupant: &TrackRef<'_>,
        leg: usize,
        path: TrackPath,
        from: &TrackPath,
    ) -> Vec<PathHit> {
        let mut hits = Vec::new();
        for (reversed, candidate) in [(false, path), (true, path.reverse())] {
            if candidate.start().distance(from.end()) > self.join_tolerance {
                continue;
            }
            if self.is_u_turn(&candidate, from) {
                continue;
            }
            hits.push(PathHit {
                key: occupant.key,
                identifier: occupant.behaviour.identifier(occupant.origin),
                leg,
                reversed,
                path: candidate,
            });
        }
        hits
    }

    /// First path joining the end of `from`, on each piece's current leg.
    pub fn next_hit(&self, world: &dyn TrackAccess, from: &TrackPath) -> Option<PathHit> {
        for cell in Self::probe_cells(from) {
            for occupant in world.occupants(cell) {
                let (leg, current) = current_leg(&occupant);
                if let Some(hit) = self.join(&occupant, leg, current, from).into_iter().next() {
                    return Some(hit);
                }
            }
        }
        None
    }

    /// Every leg, on any piece and in either orientation, that joins the end
    /// of `from`. Ordered like [`next_hit`](Self::next_hit) would try them,
    /// with each piece's alternative legs in the piece's own order.
    pub fn successors(&self, world: &dyn TrackAccess, from: &TrackPath) -> Vec<PathHit> {
        let mut seen: HashSet<(TrackKey, usize, bool)> = HashSet::new();
        let mut hits = Vec::new();
        for cell in Self::probe_cells(from) {
            for occupant in world.occupants(cell) {
                let legs = occupant.behaviour.alternative_paths(occupant.origin);
                for (leg, path) in legs.into_iter().enumerate() {
                    for hit in self.join(&occupant, leg, path, from) {
                        if seen.insert((hit.key, hit.leg, hit.reversed)) {
                            hits.push(hit);
                        }
                    }
                }
            }
        }
        hits
    }

    /// Snap a free position onto the nearest compatible path.
    ///
    /// `heading` is the unit's front; `face` says whether it travels towards
    /// its front or its back. A zero heading accepts any orientation and
    /// keeps the path as built.
    pub fn closest_hit(
        &self,
        world: &dyn TrackAccess,
        position: DVec3,
        heading: DVec3,
        face: Face,
    ) -> Option<ClosestHit> {
        let desired = heading.normalize_or_zero() * face.sign();
        let centre = cell_of(position);
        let mut seen: HashSet<TrackKey> = HashSet::new();

        for radius in 0..=self.search_radius.max(0) {
            let mut best: Option<ClosestHit> = None;
            for cell in ring(centre, radius) {
                for occupant in world.occupants(cell) {
                    if !seen.insert(occupant.key) {
                        continue;
                    }
                    let (leg, path) = current_leg(&occupant);
                    let (t, distance) = path.closest_progress(position);
                    let along = if desired == DVec3::ZERO {
                        1.0
                    } else {
                        path.direction(t).dot(desired)
                    };
                    if along.abs() < MIN_HEADING_ALIGNMENT {
                        continue;
                    }
                    if best.as_ref().is_some_and(|b| b.distance <= distance) {
                        continue;
                    }
                    let reversed = along < 0.0;
                    let (path, progress) = if reversed {
                        (path.reverse(), 1.0 - t)
                    } else {
                        (path, t)
                    };
                    best = Some(ClosestHit {
                        hit: PathHit {
                            key: occupant.key,
                            identifier: occupant.behaviour.identifier(occupant.origin),
                            leg,
                            reversed,
                            path,
                        },
                        progress,
                        distance,
                    });
                }
            }
            if best.is_some() {
                return best;
            }
        }
        None
    }
}

/// Index and path of the leg a piece currently routes stock over.
fn current_leg(occupant: &TrackRef<'_>) -> (usize, TrackPath) {
    let current = occupant.path();
    let leg = occupant
        .behaviour
        .alternative_paths(occupant.origin)
        .iter()
        .position(|p| *p == current)
        .unwrap_or(0);
    (leg, current)
}

/// Cells at exactly Chebyshev distance `radius` from `centre`, in y, z, x
/// order.
fn ring(centre: IVec3, radius: i32) -> impl Iterator<Item = IVec3> {
    (-radius..=radius).flat_map(move |dy| {
        (-radius..=radius).flat_map(move |dz| {
            (-radius..=radius).filter_map(move |dx| {
                let on_shell = dx.abs().max(dy.abs()).max(dz.abs()) == radius;
                on_shell.then(|| centre + IVec3::new(dx, dy, dz))
            })
        })
    })
}

impl MovementManager for GridMovementManager {
    fn next(&self, world: &dyn TrackAccess, from: &TrackPath) -> Option<TrackPath> {
        self.next_hit(world, from).map(|hit| hit.path)
    }

    fn closest(
        &self,
        world: &dyn TrackAccess,
        follower: &TrackFollower,
        face: Face,
    ) -> Option<TrackPath> {
        self.closest_hit(world, follower.position, follower.heading, face)
            .map(|closest| closest.hit.path)
    }
}
