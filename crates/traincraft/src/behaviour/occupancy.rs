use bevy::prelude::Entity;

use super::StockPass;

/// Stock seen on a piece during the most recent tick anything passed.
///
/// Recording is idempotent: the same stock reported twice in a tick is kept
/// once, and the first report of a newer tick forgets the older one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occupancy {
    tick: Option<u64>,
    stocks: Vec<Entity>,
}

impl Occupancy {
    /// Returns `true` if this pass was not already recorded.
    pub fn record(&mut self, pass: &StockPass) -> bool {
        if self.tick != Some(pass.tick) {
            self.tick = Some(pass.tick);
            self.stocks.clear();
        }
        if self.stocks.contains(&pass.stock) {
            return false;
        }
        self.stocks.push(pass.stock);
        true
    }

    pub fn is_occupied_at(&self, tick: u64) -> bool {
        self.tick == Some(tick) && !self.stocks.is_empty()
    }

    pub fn stocks_at(&self, tick: u64) -> &[Entity] {
        if self.tick == Some(tick) {
            &self.stocks
        } else {
            &[]
        }
    }

    pub fn last_tick(&self) -> Option<u64> {
        self.tick
    }
}
