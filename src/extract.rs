use log::debug;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

use crate::locate::selector;

static BODY_ROW: Lazy<Selector> = Lazy::new(|| selector("tbody > tr"));
static PLAYER_CELL: Lazy<Selector> = Lazy::new(|| selector(r#"th[data-stat="player"]"#));
static NPXG_CELL: Lazy<Selector> = Lazy::new(|| selector(r#"td[data-stat="npxg"]"#));
// Report pages spell the expected-assists column two ways.
static XAG_CELLS: Lazy<[Selector; 2]> = Lazy::new(|| {
    [
        selector(r#"td[data-stat="xg_assist"]"#),
        selector(r#"td[data-stat="xag"]"#),
    ]
});

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStatRecord {
    pub player_name: String,
    pub non_penalty_xg: f64,
    pub expected_assists: f64,
}

impl PlayerStatRecord {
    pub fn new(
        player_name: impl Into<String>,
        non_penalty_xg: f64,
        expected_assists: f64,
    ) -> Self {
        Self {
            player_name: player_name.into(),
            non_penalty_xg: sanitize_stat(non_penalty_xg),
            expected_assists: sanitize_stat(expected_assists),
        }
    }
}

/// Reads one team table into records, in row order. Rows without a player
/// name (sub-headers, spacer rows) are skipped; a missing or unreadable stat
/// cell reads as `0.0`. Duplicate names are passed through; the aggregator
/// keeps the last one.
pub fn extract_records(table: ElementRef<'_>) -> Vec<PlayerStatRecord> {
    let mut records = Vec::new();
    for (row_idx, row) in table.select(&BODY_ROW).enumerate() {
        let name = row
            .select(&PLAYER_CELL)
            .next()
            .map(element_text)
            .filter(|name| !name.is_empty());
        let Some(name) = name else {
            debug!("skipping row {row_idx}: no player name");
            continue;
        };

        let npxg = row
            .select(&NPXG_CELL)
            .next()
            .map(|cell| parse_stat(&element_text(cell)))
            .unwrap_or(0.0);
        let xag = XAG_CELLS
            .iter()
            .find_map(|sel| row.select(sel).next())
            .map(|cell| parse_stat(&element_text(cell)))
            .unwrap_or(0.0);

        records.push(PlayerStatRecord::new(name, npxg, xag));
    }
    records
}

/// Parses a stat cell; blanks, junk, negatives and non-finite values are `0.0`.
pub fn parse_stat(raw: &str) -> f64 {
    raw.trim().parse::<f64>().map(sanitize_stat).unwrap_or(0.0)
}

fn sanitize_stat(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Text content of an element with runs of whitespace collapsed.
pub fn element_text(el: ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
