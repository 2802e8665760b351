//! Finding the per-team player tables on a match report page.
//!
//! A report page carries a dozen or more tables that look alike (summary,
//! passing, defence, keeper, ...), and the markup differs between sections of
//! the site. Each [`TableStrategy`] encodes one way of recognising the two
//! team tables; [`TableLocator`] tries them in priority order and takes the
//! first one that resolves both sides.

use log::{debug, warn};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::extract::element_text;

pub const SUMMARY_ID_MARKER: &str = "summary";
pub const PLAYER_STATS_CAPTION: &str = "Player Stats Table";

static SUMMARY_TABLE: Lazy<Selector> =
    Lazy::new(|| selector(&format!(r#"table[id*="{SUMMARY_ID_MARKER}"]"#)));
static SWITCHER_CONTENT: Lazy<Selector> = Lazy::new(|| selector("div.switcher_content"));
static STATS_TABLE: Lazy<Selector> = Lazy::new(|| selector("table.stats_table"));
static CAPTION: Lazy<Selector> = Lazy::new(|| selector("caption"));
static TABLE: Lazy<Selector> = Lazy::new(|| selector("table"));
static HEADER_CELL: Lazy<Selector> = Lazy::new(|| selector("th"));

/// Parses a literal selector. Each module forces its selectors in a test.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static css selector")
}

/// The team names a page is expected to mention. Matching is by substring,
/// since captions decorate names ("Arsenal Player Stats Table").
#[derive(Debug, Clone, Copy)]
pub struct Sides<'s> {
    pub home: &'s str,
    pub away: &'s str,
}

#[derive(Debug, Clone, Copy)]
pub struct TeamTables<'a> {
    pub home: ElementRef<'a>,
    pub away: ElementRef<'a>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocateError {
    #[error("no team tables for {home} vs {away} (tried: {})", .tried.join(", "))]
    NotFound {
        home: String,
        away: String,
        tried: Vec<&'static str>,
    },
}

pub trait TableStrategy {
    fn name(&self) -> &'static str;

    /// Both team tables, or `None` if this strategy cannot resolve both.
    fn find<'a>(&self, page: &'a Html, sides: Sides<'_>) -> Option<TeamTables<'a>>;
}

/// Tables whose `id` carries the `summary` marker, matched to a side by
/// their caption.
pub struct SummaryIdStrategy;

impl TableStrategy for SummaryIdStrategy {
    fn name(&self) -> &'static str {
        "summary-id"
    }

    fn find<'a>(&self, page: &'a Html, sides: Sides<'_>) -> Option<TeamTables<'a>> {
        let mut home = None;
        let mut away = None;
        for table in page.select(&SUMMARY_TABLE) {
            let Some(caption) = caption_text(table) else {
                continue;
            };
            if caption.contains(sides.home) {
                home.get_or_insert(table);
            } else if caption.contains(sides.away) {
                away.get_or_insert(table);
            }
        }
        Some(TeamTables {
            home: home?,
            away: away?,
        })
    }
}

/// Stats tables inside `switcher_content` containers whose caption reads
/// "Player Stats Table". Captions naming a team decide the side; otherwise
/// the first table is home and the second is away.
pub struct PlayerStatsCaptionStrategy;

impl TableStrategy for PlayerStatsCaptionStrategy {
    fn name(&self) -> &'static str {
        "player-stats-caption"
    }

    fn find<'a>(&self, page: &'a Html, sides: Sides<'_>) -> Option<TeamTables<'a>> {
        let candidates: Vec<(ElementRef<'a>, String)> = page
            .select(&SWITCHER_CONTENT)
            .filter_map(|div| div.select(&STATS_TABLE).next())
            .filter_map(|table| caption_text(table).map(|caption| (table, caption)))
            .filter(|(_, caption)| caption.contains(PLAYER_STATS_CAPTION))
            .collect();

        let mut home = None;
        let mut away = None;
        let mut unnamed = Vec::new();
        for (table, caption) in &candidates {
            if caption.contains(sides.home) {
                home.get_or_insert(*table);
            } else if caption.contains(sides.away) {
                away.get_or_insert(*table);
            } else {
                unnamed.push(*table);
            }
        }

        let mut unnamed = unnamed.into_iter();
        if home.is_none() {
            home = unnamed.next();
        }
        if away.is_none() {
            away = unnamed.next();
        }
        Some(TeamTables {
            home: home?,
            away: away?,
        })
    }
}

pub struct TableLocator {
    strategies: Vec<Box<dyn TableStrategy>>,
}

impl Default for TableLocator {
    fn default() -> Self {
        Self::new(vec![
            Box::new(SummaryIdStrategy),
            Box::new(PlayerStatsCaptionStrategy),
        ])
    }
}

impl TableLocator {
    pub fn new(strategies: Vec<Box<dyn TableStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn locate<'a>(
        &self,
        page: &'a Html,
        sides: Sides<'_>,
    ) -> Result<TeamTables<'a>, LocateError> {
        for strategy in &self.strategies {
            if let Some(tables) = strategy.find(page, sides) {
                debug!(
                    "located {} / {} tables via {}",
                    sides.home,
                    sides.away,
                    strategy.name()
                );
                return Ok(tables);
            }
        }
        warn!(
            "could not find both team tables for {} vs {}",
            sides.home, sides.away
        );
        Err(LocateError::NotFound {
            home: sides.home.to_string(),
            away: sides.away.to_string(),
            tried: self.strategy_names(),
        })
    }
}

/// First table whose header cells include every one of `required`.
pub fn find_table_with_headers<'a>(page: &'a Html, required: &[&str]) -> Option<ElementRef<'a>> {
    page.select(&TABLE).find(|table| {
        let headers: Vec<String> = table.select(&HEADER_CELL).map(element_text).collect();
        required
            .iter()
            .all(|want| headers.iter().any(|have| have == want))
    })
}

fn caption_text(table: ElementRef<'_>) -> Option<String> {
    table.select(&CAPTION).next().map(element_text)
}
