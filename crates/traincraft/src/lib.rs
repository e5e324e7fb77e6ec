//! Track path and movement-routing core of a rail mod.
//!
//! Placed track pieces have a [`behaviour::TrackBehaviour`] that yields a
//! parametric [`path::TrackPath`]; rolling stock follows those paths and asks
//! a [`movement::MovementManager`] which path comes next. [`RailPlugin`] wires
//! the pieces into a Bevy app.

use bevy::prelude::*;

pub mod behaviour;
pub mod config;
pub mod error;
pub mod follower;
pub mod movement;
pub mod orientation;
pub mod path;
pub mod slaves;
pub mod world;

#[cfg(test)]
pub mod test_harness;

use behaviour::{seal_stateful_registry, StatefulRegistry};
use follower::advance_followers;
use movement::GridMovementManager;
use world::TrackMap;

// ---------------------------------------------------------------------------
// Core resources
// ---------------------------------------------------------------------------

/// Global tick counter incremented each FixedUpdate. Stock passes are stamped
/// with it.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

pub fn advance_tick(mut tick: ResMut<TickCounter>) {
    tick.0 = tick.0.wrapping_add(1);
}

pub struct RailPlugin;

impl Plugin for RailPlugin {
    fn build(&self, app: &mut App) {
        // Plugins built earlier may already have registered their factories.
        if !app.world().contains_resource::<StatefulRegistry>() {
            app.insert_resource(StatefulRegistry::with_builtin());
        }

        app.init_resource::<TickCounter>()
            .init_resource::<TrackMap>()
            .init_resource::<GridMovementManager>()
            .add_systems(Startup, seal_stateful_registry)
            .add_systems(FixedUpdate, (advance_tick, advance_followers).chain());
    }
}
