//! Player x gameweek aggregate.
//!
//! Every player row holds all 38 gameweek cells from the moment the player is
//! first seen; cells start at the neutral value and a merge replaces exactly
//! one cell. Nothing is summed, so replaying a match leaves the matrix as it
//! was.

use std::collections::BTreeMap;

use log::debug;

use crate::classify::{ReturnLabel, classify};
use crate::extract::PlayerStatRecord;
use crate::gameweek::{Gameweek, SEASON_GAMEWEEKS};

const SLOTS: usize = SEASON_GAMEWEEKS as usize;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatPair {
    pub xg: f64,
    pub xag: f64,
}

impl StatPair {
    pub fn from_record(record: &PlayerStatRecord) -> Self {
        Self {
            xg: record.non_penalty_xg,
            xag: record.expected_assists,
        }
    }

    pub fn total(self) -> f64 {
        self.xg + self.xag
    }

    pub fn label(self) -> ReturnLabel {
        classify(self.xg, self.xag)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRow<C> {
    cells: [C; SLOTS],
    observed: [bool; SLOTS],
}

impl<C: Copy + Default> PlayerRow<C> {
    fn new() -> Self {
        Self {
            cells: [C::default(); SLOTS],
            observed: [false; SLOTS],
        }
    }

    pub fn get(&self, gameweek: Gameweek) -> C {
        self.cells[gameweek.slot()]
    }

    /// Whether a match has written this cell, as opposed to the default.
    pub fn is_observed(&self, gameweek: Gameweek) -> bool {
        self.observed[gameweek.slot()]
    }

    pub fn cells(&self) -> impl Iterator<Item = (Gameweek, C)> + '_ {
        Gameweek::all().map(|gw| (gw, self.get(gw)))
    }

    pub fn observed_cells(&self) -> impl Iterator<Item = (Gameweek, C)> + '_ {
        self.cells().filter(|(gw, _)| self.is_observed(*gw))
    }

    fn set(&mut self, gameweek: Gameweek, value: C) {
        self.cells[gameweek.slot()] = value;
        self.observed[gameweek.slot()] = true;
    }
}

/// Rows are keyed by player name and iterate in name order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerMatrix<C> {
    rows: BTreeMap<String, PlayerRow<C>>,
}

pub type NumericMatrix = PlayerMatrix<StatPair>;
pub type ReturnMatrix = PlayerMatrix<ReturnLabel>;

impl<C: Copy + Default> Default for PlayerMatrix<C> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<C: Copy + Default> PlayerMatrix<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Replaces one cell, creating the player's full row first if needed.
    pub fn set(&mut self, player: &str, gameweek: Gameweek, value: C) {
        if !self.rows.contains_key(player) {
            self.rows.insert(player.to_string(), PlayerRow::new());
        }
        if let Some(row) = self.rows.get_mut(player) {
            row.set(gameweek, value);
        }
    }

    pub fn get(&self, player: &str, gameweek: Gameweek) -> Option<C> {
        self.rows.get(player).map(|row| row.get(gameweek))
    }

    pub fn row(&self, player: &str) -> Option<&PlayerRow<C>> {
        self.rows.get(player)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &PlayerRow<C>)> {
        self.rows.iter().map(|(name, row)| (name.as_str(), row))
    }

    /// Gameweeks any player has an observed cell for, ascending.
    pub fn observed_gameweeks(&self) -> Vec<Gameweek> {
        Gameweek::all()
            .filter(|gw| self.rows.values().any(|row| row.is_observed(*gw)))
            .collect()
    }

    /// Copies every observed cell of `other` over this matrix.
    pub fn absorb(&mut self, other: &PlayerMatrix<C>) {
        for (player, row) in other.rows() {
            for (gw, value) in row.observed_cells() {
                self.set(player, gw, value);
            }
        }
    }

    pub fn map<D: Copy + Default>(&self, f: impl Fn(C) -> D) -> PlayerMatrix<D> {
        let rows = self
            .rows
            .iter()
            .map(|(name, row)| {
                let mapped = PlayerRow {
                    cells: row.cells.map(&f),
                    observed: row.observed,
                };
                (name.clone(), mapped)
            })
            .collect();
        PlayerMatrix { rows }
    }
}

/// Second-pass classification over a finished numeric matrix.
pub fn classify_matrix(numeric: &NumericMatrix) -> ReturnMatrix {
    numeric.map(StatPair::label)
}

/// Owns both aggregate views and keeps them in step: every merge writes the
/// raw pair and its label at the same time.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    numeric: NumericMatrix,
    returns: ReturnMatrix,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, gameweek: Gameweek, record: &PlayerStatRecord) {
        let pair = StatPair::from_record(record);
        self.merge_pair(&record.player_name, gameweek, pair);
        debug!(
            "stored {} {}: npxG {:.2}, xAG {:.2}",
            record.player_name, gameweek, pair.xg, pair.xag
        );
    }

    pub fn merge_all(&mut self, gameweek: Gameweek, records: &[PlayerStatRecord]) {
        for record in records {
            self.merge(gameweek, record);
        }
    }

    /// Merges every observed cell of a numeric matrix, e.g. one read back
    /// from a per-match artifact.
    pub fn absorb(&mut self, numeric: &NumericMatrix) {
        for (player, row) in numeric.rows() {
            for (gw, pair) in row.observed_cells() {
                self.merge_pair(player, gw, pair);
            }
        }
    }

    fn merge_pair(&mut self, player: &str, gameweek: Gameweek, pair: StatPair) {
        self.numeric.set(player, gameweek, pair);
        self.returns.set(player, gameweek, pair.label());
    }

    pub fn numeric(&self) -> &NumericMatrix {
        &self.numeric
    }

    pub fn returns(&self) -> &ReturnMatrix {
        &self.returns
    }

    pub fn into_parts(self) -> (NumericMatrix, ReturnMatrix) {
        (self.numeric, self.returns)
    }
}
