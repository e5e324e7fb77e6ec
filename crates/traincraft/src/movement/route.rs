//! Shortest leg sequence between a starting path and a goal cell.

use std::cell::Cell;
use std::collections::HashSet;

use bevy::prelude::*;
use pathfinding::prelude::dijkstra;

use super::{GridMovementManager, PathHit};
use crate::config::ROUTE_MAX_EXPANSIONS;
use crate::path::TrackPath;
use crate::world::{TrackAccess, TrackKey};

/// One step of a [`Route`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteLeg {
    pub key: TrackKey,
    /// Which of the piece's alternative paths to take. For points this is
    /// the setting they must be thrown to.
    pub leg: usize,
    pub reversed: bool,
    pub path: TrackPath,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Legs in travel order, starting with the start leg.
    pub legs: Vec<RouteLeg>,
    /// Total length of every leg after the first, in blocks.
    pub length: f64,
}

/// Search node: a leg of a piece in one travel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RouteNode {
    key: TrackKey,
    leg: usize,
    reversed: bool,
}

impl RouteNode {
    fn resolve(&self, world: &dyn TrackAccess) -> Option<TrackPath> {
        let piece = world.piece(self.key)?;
        let path = *piece.behaviour.alternative_paths(piece.origin).get(self.leg)?;
        Some(if self.reversed { path.reverse() } else { path })
    }
}

/// Leg length in whole millimetres, the integer cost Dijkstra needs.
fn cost_of(path: &TrackPath) -> u64 {
    (path.length() * 1000.0).round() as u64
}

impl GridMovementManager {
    /// Shortest sequence of legs from `start` to any piece covering `goal`.
    ///
    /// Expansion is bounded by `ROUTE_MAX_EXPANSIONS`; a goal further away
    /// than that, or unreachable, yields `None`.
    pub fn route(&self, world: &dyn TrackAccess, start: &PathHit, goal: IVec3) -> Option<Route> {
        let goal_keys: HashSet<TrackKey> = world.occupants(goal).iter().map(|t| t.key).collect();
        if goal_keys.is_empty() {
            return None;
        }

        let origin = RouteNode {
            key: start.key,
            leg: start.leg,
            reversed: start.reversed,
        };
        let expansions = Cell::new(0usize);
        let found = dijkstra(
            &origin,
            |node| {
                expansions.set(expansions.get() + 1);
                if expansions.get() > ROUTE_MAX_EXPANSIONS {
                    return Vec::new();
                }
                let Some(path) = node.resolve(world) else {
                    return Vec::new();
                };
                self.successors(world, &path)
                    .into_iter()
                    .map(|hit| {
                        let next = RouteNode {
                            key: hit.key,
                            leg: hit.leg,
                            reversed: hit.reversed,
                        };
                        (next, cost_of(&hit.path))
                    })
                    .collect()
            },
            |node| goal_keys.contains(&node.key),
        );
        if found.is_none() && expansions.get() > ROUTE_MAX_EXPANSIONS {
            debug!(
                "Route search from track {} gave up after {} expansions",
                start.key.0, ROUTE_MAX_EXPANSIONS
            );
        }
        let (nodes, cost) = found?;

        let mut legs = Vec::with_capacity(nodes.len());
        for node in nodes {
            let path = node.resolve(world)?;
            legs.push(RouteLeg {
                key: node.key,
                leg: node.leg,
                reversed: node.reversed,
                path,
            });
        }
        Some(Route {
            legs,
            length: cost as f64 / 1000.0,
        })
    }
}
