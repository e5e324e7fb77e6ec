//! Grid storage of placed track, and the read interface the movement manager
//! queries it through.
//!
//! In the game the world and its tile entities own track behaviours. The core
//! only ever sees them through [`TrackAccess`]; [`TrackMap`] is the in-memory
//! implementation the plugin and the tests run against.

use std::collections::{BTreeMap, HashMap, HashSet};

use bevy::prelude::*;

use crate::behaviour::{StockPass, TrackBehaviour};
use crate::config::PATH_JOIN_TOLERANCE;
use crate::error::TrackError;
use crate::path::TrackPath;

/// Stable handle of a placed piece. Keys are handed out in placement order and
/// never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackKey(pub u32);

/// Borrowed view of one placed piece.
#[derive(Debug, Clone, Copy)]
pub struct TrackRef<'a> {
    pub key: TrackKey,
    pub origin: IVec3,
    pub behaviour: &'a TrackBehaviour,
}

impl TrackRef<'_> {
    pub fn path(&self) -> TrackPath {
        self.behaviour.path(self.origin)
    }
}

/// Read-only view of the world's track, as seen by movement queries.
pub trait TrackAccess {
    /// Every piece covering `cell` (at its origin or through a slave offset),
    /// in placement order.
    fn occupants(&self, cell: IVec3) -> Vec<TrackRef<'_>>;

    fn piece(&self, key: TrackKey) -> Option<TrackRef<'_>>;

    /// First piece covering `cell`, if any.
    fn lookup_behaviour(&self, cell: IVec3) -> Option<TrackRef<'_>> {
        self.occupants(cell).into_iter().next()
    }
}

#[derive(Debug)]
struct PlacedTrack {
    origin: IVec3,
    behaviour: TrackBehaviour,
    cells: Vec<IVec3>,
}

/// Placed track, indexed both by key and by every cell each piece covers.
#[derive(Resource, Debug, Default)]
pub struct TrackMap {
    pieces: BTreeMap<TrackKey, PlacedTrack>,
    cells: HashMap<IVec3, Vec<TrackKey>>,
    next_key: u32,
}

/// Absolute cells covered by `behaviour` at `origin`, in a fixed order.
fn covered_cells(behaviour: &TrackBehaviour, origin: IVec3) -> Vec<IVec3> {
    let mut cells: Vec<IVec3> = behaviour
        .slave_offsets(origin)
        .into_iter()
        .map(|offset| origin + offset)
        .collect();
    cells.sort_by_key(|c| (c.y, c.z, c.x));
    cells
}

impl TrackMap {
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = TrackKey> + '_ {
        self.pieces.keys().copied()
    }

    pub fn get(&self, key: TrackKey) -> Option<&TrackBehaviour> {
        self.pieces.get(&key).map(|p| &p.behaviour)
    }

    pub fn origin_of(&self, key: TrackKey) -> Option<IVec3> {
        self.pieces.get(&key).map(|p| p.origin)
    }

    /// Cells covered by a placed piece.
    pub fn cells_of(&self, key: TrackKey) -> Option<&[IVec3]> {
        self.pieces.get(&key).map(|p| p.cells.as_slice())
    }

    /// Place a piece with its origin at `origin`.
    ///
    /// Fails if any cell the piece covers already holds a piece it cannot
    /// overlap.
    pub fn place(
        &mut self,
        origin: IVec3,
        behaviour: impl Into<TrackBehaviour>,
    ) -> Result<TrackKey, TrackError> {
        let behaviour = behaviour.into();
        let cells = covered_cells(&behaviour, origin);
        self.check_footprint(&behaviour, &cells, None)?;

        let key = TrackKey(self.next_key);
        self.next_key += 1;
        for cell in &cells {
            self.cells.entry(*cell).or_default().push(key);
        }
        self.pieces.insert(
            key,
            PlacedTrack {
                origin,
                behaviour,
                cells,
            },
        );
        Ok(key)
    }

    pub fn remove(&mut self, key: TrackKey) -> Option<TrackBehaviour> {
        let placed = self.pieces.remove(&key)?;
        for cell in &placed.cells {
            self.unindex(*cell, key);
        }
        Some(placed.behaviour)
    }

    /// Forward a stock pass to a piece. Unknown keys are ignored: the piece
    /// may have been removed since the follower last looked.
    pub fn notify_stock_pass(&mut self, key: TrackKey, pass: &StockPass) {
        if let Some(placed) = self.pieces.get_mut(&key) {
            placed.behaviour.on_stock_pass(pass);
        }
    }

    /// Apply a player reconfiguration to a stateful piece (e.g. throw points).
    pub fn interact(&mut self, key: TrackKey, tick: u64) -> Result<bool, TrackError> {
        let placed = self.pieces.get_mut(&key).ok_or(TrackError::NotFound(key))?;
        match &mut placed.behaviour {
            TrackBehaviour::Native(_) => Ok(false),
            TrackBehaviour::Stateful(state) => Ok(state.interact(tick)),
        }
    }

    /// Swap a native piece for its stateful form. `Ok(false)` when it has
    /// none, when the swap would move the path's endpoints, or when its
    /// footprint would run over another piece.
    pub fn convert_to_stateful(&mut self, key: TrackKey) -> Result<bool, TrackError> {
        let placed = self.pieces.get(&key).ok_or(TrackError::NotFound(key))?;
        let Some(stateful) = placed
            .behaviour
            .as_native()
            .and_then(|native| native.convert_to_stateful(placed.origin))
        else {
            return Ok(false);
        };
        self.replace_behaviour(key, TrackBehaviour::Stateful(stateful))
    }

    /// Swap a stateful piece back to its native form. `Ok(false)` when the
    /// current configuration has no native equivalent, or when stock stood on
    /// the piece during `tick`.
    pub fn convert_to_native(&mut self, key: TrackKey, tick: u64) -> Result<bool, TrackError> {
        let placed = self.pieces.get(&key).ok_or(TrackError::NotFound(key))?;
        let Some(state) = placed.behaviour.as_stateful() else {
            return Ok(false);
        };
        if state.is_occupied_at(tick) {
            debug!(
                "Track {} at {}: occupied in tick {}, not converting to native",
                key.0, placed.origin, tick
            );
            return Ok(false);
        }
        let Some(native) = state.convert_to_native() else {
            return Ok(false);
        };
        self.replace_behaviour(key, TrackBehaviour::Native(native))
    }

    /// Tag-compound form of a stateful piece: factory identifier plus data.
    pub fn stateful_tag(
        &self,
        key: TrackKey,
    ) -> Result<Option<(&'static str, serde_json::Value)>, TrackError> {
        let placed = self.pieces.get(&key).ok_or(TrackError::NotFound(key))?;
        match placed.behaviour.as_stateful() {
            Some(state) => Ok(Some((state.factory(), state.serialize()?))),
            None => Ok(None),
        }
    }

    /// Replace a piece's behaviour in place, keeping its key.
    ///
    /// The new path must run between the same two points as the old one, in
    /// the same direction, and its footprint must be free apart from this
    /// piece. Anything else leaves the piece untouched and returns `Ok(false)`.
    fn replace_behaviour(
        &mut self,
        key: TrackKey,
        behaviour: TrackBehaviour,
    ) -> Result<bool, TrackError> {
        let placed = self.pieces.get(&key).ok_or(TrackError::NotFound(key))?;
        let origin = placed.origin;
        let old_path = placed.behaviour.path(origin);
        let new_path = behaviour.path(origin);
        if !new_path.same_endpoints(&old_path, PATH_JOIN_TOLERANCE) {
            warn!(
                "Track {} at {}: conversion would move path endpoints, keeping current behaviour",
                key.0, origin
            );
            return Ok(false);
        }

        let cells = covered_cells(&behaviour, origin);
        if let Err(err) = self.check_footprint(&behaviour, &cells, Some(key)) {
            warn!(
                "Track {} at {}: conversion blocked ({}), keeping current behaviour",
                key.0, origin, err
            );
            return Ok(false);
        }

        let old_cells = std::mem::take(&mut self.pieces.get_mut(&key).ok_or(TrackError::NotFound(key))?.cells);
        let keep: HashSet<IVec3> = cells.iter().copied().collect();
        for cell in old_cells.iter().filter(|c| !keep.contains(c)) {
            self.unindex(*cell, key);
        }
        let had: HashSet<IVec3> = old_cells.into_iter().collect();
        for cell in cells.iter().filter(|c| !had.contains(c)) {
            self.cells.entry(*cell).or_default().push(key);
        }

        let placed = self.pieces.get_mut(&key).ok_or(TrackError::NotFound(key))?;
        placed.behaviour = behaviour;
        placed.cells = cells;
        Ok(true)
    }

    fn check_footprint(
        &self,
        behaviour: &TrackBehaviour,
        cells: &[IVec3],
        ignore: Option<TrackKey>,
    ) -> Result<(), TrackError> {
        for cell in cells {
            let Some(keys) = self.cells.get(cell) else {
                continue;
            };
            for other_key in keys.iter().filter(|k| Some(**k) != ignore) {
                let Some(other) = self.pieces.get(other_key) else {
                    continue;
                };
                if !behaviour.can_overlap(&other.behaviour) {
                    warn!(
                        "Track placement refused: cell {} is occupied by track {}",
                        cell, other_key.0
                    );
                    return Err(TrackError::Occupied {
                        cell: *cell,
                        by: *other_key,
                    });
                }
            }
        }
        Ok(())
    }

    fn unindex(&mut self, cell: IVec3, key: TrackKey) {
        if let Some(keys) = self.cells.get_mut(&cell) {
            keys.retain(|k| *k != key);
            if keys.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }
}

impl TrackAccess for TrackMap {
    fn occupants(&self, cell: IVec3) -> Vec<TrackRef<'_>> {
        let Some(keys) = self.cells.get(&cell) else {
            return Vec::new();
        };
        keys.iter().filter_map(|key| self.piece(*key)).collect()
    }

    fn piece(&self, key: TrackKey) -> Option<TrackRef<'_>> {
        self.pieces.get(&key).map(|placed| TrackRef {
            key,
            origin: placed.origin,
            behaviour: &placed.behaviour,
        })
    }
}
