// ---------------------------------------------------------------------------
// StatefulRegistry: string-keyed factories for stateful track
// ---------------------------------------------------------------------------

use std::collections::BTreeMap;

use bevy::prelude::*;

use super::points::{PointsState, POINTS_FACTORY};
use super::straight_state::{StraightTrackState, STRAIGHT_STATE_FACTORY};
use super::StatefulTrack;
use crate::error::TrackError;

/// Builds a default-configured stateful behaviour at an origin. The host then
/// loads saved or received configuration into it.
pub type StatefulFactory = fn(IVec3) -> Box<dyn StatefulTrack>;

/// Table of stateful track factories, keyed by "modid:name" identifiers.
///
/// Populated while plugins are built, then sealed at `Startup`; after that
/// every registration is rejected so the table cannot drift at runtime.
#[derive(Resource, Default)]
pub struct StatefulRegistry {
    factories: BTreeMap<String, StatefulFactory>,
    sealed: bool,
}

impl StatefulRegistry {
    /// Registry holding the factories this crate ships.
    pub fn with_builtin() -> Self {
        let mut registry = Self::default();
        registry.factories.insert(
            STRAIGHT_STATE_FACTORY.to_string(),
            StraightTrackState::create as StatefulFactory,
        );
        registry
            .factories
            .insert(POINTS_FACTORY.to_string(), PointsState::create as StatefulFactory);
        registry
    }

    pub fn register(&mut self, identifier: &str, factory: StatefulFactory) -> Result<(), TrackError> {
        if self.sealed {
            warn!(
                "StatefulRegistry: '{}' registered after startup, ignoring",
                identifier
            );
            return Err(TrackError::RegistryRejected(identifier.to_string()));
        }
        if self.factories.contains_key(identifier) {
            warn!(
                "StatefulRegistry: duplicate identifier '{}', ignoring second registration",
                identifier
            );
            return Err(TrackError::RegistryRejected(identifier.to_string()));
        }
        self.factories.insert(identifier.to_string(), factory);
        Ok(())
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    /// Registered identifiers in sorted order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(&self, identifier: &str, origin: IVec3) -> Result<Box<dyn StatefulTrack>, TrackError> {
        self.factories
            .get(identifier)
            .map(|factory| factory(origin))
            .ok_or_else(|| TrackError::UnknownFactory(identifier.to_string()))
    }

    /// Rebuild a behaviour from its tag-compound form.
    pub fn restore_from_tag(
        &self,
        identifier: &str,
        origin: IVec3,
        tag: &serde_json::Value,
    ) -> Result<Box<dyn StatefulTrack>, TrackError> {
        let mut track = self.create(identifier, origin)?;
        track.deserialize(tag)?;
        Ok(track)
    }

    /// Rebuild a behaviour from its wire form.
    pub fn restore_from_stream(
        &self,
        identifier: &str,
        origin: IVec3,
        bytes: &[u8],
    ) -> Result<Box<dyn StatefulTrack>, TrackError> {
        let mut track = self.create(identifier, origin)?;
        track.read_from_stream(bytes)?;
        Ok(track)
    }
}

/// Seal the registry once every plugin has had its chance to register.
pub fn seal_stateful_registry(mut registry: ResMut<StatefulRegistry>) {
    registry.seal();
    debug!(
        "StatefulRegistry sealed with {} factories",
        registry.factories.len()
    );
}

/// Extension trait on `App` for one-line factory registration.
///
/// # Example
///
/// ```ignore
/// use traincraft::behaviour::StatefulTrackAppExt;
///
/// fn build(&self, app: &mut App) {
///     app.register_stateful_track("mymod:buffer_stop", BufferStop::create);
/// }
/// ```
pub trait StatefulTrackAppExt {
    fn register_stateful_track(&mut self, identifier: &str, factory: StatefulFactory) -> &mut Self;
}

impl StatefulTrackAppExt for App {
    fn register_stateful_track(&mut self, identifier: &str, factory: StatefulFactory) -> &mut Self {
        if !self.world().contains_resource::<StatefulRegistry>() {
            self.insert_resource(StatefulRegistry::with_builtin());
        }
        // Rejections are already logged by the registry.
        let _ = self
            .world_mut()
            .resource_mut::<StatefulRegistry>()
            .register(identifier, factory);
        self
    }
}
