use std::fmt;

pub const SEASON_GAMEWEEKS: u8 = 38;
pub const MATCHES_PER_GAMEWEEK: usize = 10;
pub const SEASON_MATCHES: usize = SEASON_GAMEWEEKS as usize * MATCHES_PER_GAMEWEEK;

/// A round of the league season, always within `1..=38`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Gameweek(u8);

impl Gameweek {
    pub fn new(number: u8) -> Option<Self> {
        (1..=SEASON_GAMEWEEKS).contains(&number).then_some(Self(number))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Zero-based slot in a per-player row.
    pub fn slot(self) -> usize {
        usize::from(self.0 - 1)
    }

    pub fn all() -> impl Iterator<Item = Gameweek> {
        (1..=SEASON_GAMEWEEKS).map(Gameweek)
    }

    /// Column label used in the aggregate artifacts, e.g. `GW7`.
    pub fn label(self) -> String {
        format!("GW{}", self.0)
    }
}

impl fmt::Display for Gameweek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GW{}", self.0)
    }
}

/// Maps a 1-based manifest index onto its gameweek: ten consecutive indices
/// share one round. This assumes the manifest lists fixtures in round order
/// and every round has exactly ten fixtures; it is not derived from dates.
/// Index 0 is treated as 1, indices past the season clamp to the last round.
pub fn gameweek(match_index: usize) -> Gameweek {
    let zero_based = match_index.saturating_sub(1);
    let round = (zero_based / MATCHES_PER_GAMEWEEK + 1).min(usize::from(SEASON_GAMEWEEKS));
    Gameweek(round as u8)
}
