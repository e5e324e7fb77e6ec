//! # TestLine: headless integration test harness
//!
//! Wraps `bevy::app::App` + `RailPlugin` so tests can lay track, put rolling
//! stock on it and step fixed ticks without a window or renderer.

use bevy::app::App;
use bevy::prelude::*;

use crate::behaviour::{StatefulRegistry, TrackBehaviour};
use crate::follower::TrackFollower;
use crate::movement::GridMovementManager;
use crate::world::{TrackKey, TrackMap};
use crate::{RailPlugin, TickCounter};

/// A headless Bevy App wrapping `RailPlugin`.
pub struct TestLine {
    app: App,
    keys: Vec<TrackKey>,
}

impl Default for TestLine {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLine {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// An empty world. Startup has already run, so the stateful registry is
    /// sealed.
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(RailPlugin);
        app.update();
        Self {
            app,
            keys: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // World setup (builder pattern, consumes and returns Self)
    // -----------------------------------------------------------------------

    /// Place a piece. Panics if placement is refused, since a test fixture
    /// that cannot be built is a broken test.
    pub fn with_track(mut self, origin: IVec3, behaviour: impl Into<TrackBehaviour>) -> Self {
        let key = self
            .app
            .world_mut()
            .resource_mut::<TrackMap>()
            .place(origin, behaviour)
            .unwrap_or_else(|err| panic!("fixture placement at {origin} failed: {err}"));
        self.keys.push(key);
        self
    }

    /// Spawn a rolling-stock unit and return its entity.
    pub fn spawn_follower(&mut self, follower: TrackFollower) -> Entity {
        self.app.world_mut().spawn(follower).id()
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Run `n` fixed ticks directly, independent of wall-clock time.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Keys of pieces placed through [`with_track`](Self::with_track), in
    /// placement order.
    pub fn key(&self, index: usize) -> TrackKey {
        self.keys[index]
    }

    pub fn tracks(&self) -> &TrackMap {
        self.app.world().resource::<TrackMap>()
    }

    pub fn tracks_mut(&mut self) -> Mut<'_, TrackMap> {
        self.app.world_mut().resource_mut::<TrackMap>()
    }

    pub fn manager(&self) -> &GridMovementManager {
        self.app.world().resource::<GridMovementManager>()
    }

    pub fn registry(&self) -> &StatefulRegistry {
        self.app.world().resource::<StatefulRegistry>()
    }

    pub fn tick_count(&self) -> u64 {
        self.app.world().resource::<TickCounter>().0
    }

    pub fn follower(&self, entity: Entity) -> &TrackFollower {
        self.app
            .world()
            .get::<TrackFollower>(entity)
            .unwrap_or_else(|| panic!("entity {entity:?} has no TrackFollower"))
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }
}
