//! Expected clean sheets from the season fixtures page.
//!
//! One pass, no gameweek state: each played fixture contributes one game to
//! both teams, and a clean-sheet indicator when the opponent's xG is within
//! the return threshold.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use log::debug;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::classify::clean_sheet_likely;
use crate::extract::element_text;
use crate::locate::{find_table_with_headers, selector};

pub const SCHEDULE_HEADERS: [&str; 2] = ["xG", "Home"];

static BODY_ROW: Lazy<Selector> = Lazy::new(|| selector("tbody > tr"));
static HOME_TEAM: Lazy<Selector> = Lazy::new(|| selector(r#"td[data-stat="home_team"]"#));
static AWAY_TEAM: Lazy<Selector> = Lazy::new(|| selector(r#"td[data-stat="away_team"]"#));
static HOME_XG: Lazy<Selector> = Lazy::new(|| selector(r#"td[data-stat="home_xg"]"#));
static AWAY_XG: Lazy<Selector> = Lazy::new(|| selector(r#"td[data-stat="away_xg"]"#));

#[derive(Debug, Clone, PartialEq)]
pub struct FixtureXg {
    pub home_team: String,
    pub away_team: String,
    pub home_xg: f64,
    pub away_xg: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamCleanSheets {
    pub team: String,
    pub total_games: u32,
    pub expected_cleans: u32,
}

/// Played fixtures from the schedule table. Unplayed fixtures (blank xG),
/// spacer rows and rows with unreadable xG are left out.
pub fn extract_fixtures(page: &Html) -> Result<Vec<FixtureXg>> {
    let table = find_table_with_headers(page, &SCHEDULE_HEADERS)
        .ok_or_else(|| anyhow!("no fixtures table with xG and Home columns"))?;
    Ok(table.select(&BODY_ROW).filter_map(parse_fixture_row).collect())
}

fn parse_fixture_row(row: ElementRef<'_>) -> Option<FixtureXg> {
    let text = |sel: &Selector| row.select(sel).next().map(element_text);
    let home_team = text(&HOME_TEAM)?;
    let away_team = text(&AWAY_TEAM)?;
    let home_xg = text(&HOME_XG)?;
    let away_xg = text(&AWAY_XG)?;
    if home_team.is_empty() || away_team.is_empty() || home_xg.is_empty() || away_xg.is_empty() {
        return None;
    }
    match (home_xg.parse::<f64>(), away_xg.parse::<f64>()) {
        (Ok(home_xg), Ok(away_xg)) => Some(FixtureXg {
            home_team,
            away_team,
            home_xg,
            away_xg,
        }),
        _ => {
            debug!("skipping {home_team} vs {away_team}: unreadable xG");
            None
        }
    }
}

/// Per-team totals, sorted by team name.
pub fn summarize(fixtures: &[FixtureXg]) -> Vec<TeamCleanSheets> {
    let mut by_team: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for fixture in fixtures {
        let sides = [
            (&fixture.home_team, fixture.away_xg),
            (&fixture.away_team, fixture.home_xg),
        ];
        for (team, opponent_xg) in sides {
            let entry = by_team.entry(team.as_str()).or_default();
            entry.0 += 1;
            entry.1 += u32::from(clean_sheet_likely(opponent_xg));
        }
    }
    by_team
        .into_iter()
        .map(|(team, (total_games, expected_cleans))| TeamCleanSheets {
            team: team.to_string(),
            total_games,
            expected_cleans,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(home: &str, away: &str, home_xg: f64, away_xg: f64) -> FixtureXg {
        FixtureXg {
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_xg,
            away_xg,
        }
    }

    #[test]
    fn summary_counts_games_and_cleans() {
        let fixtures = vec![
            fixture("Arsenal", "Chelsea", 2.1, 0.7),
            fixture("Chelsea", "Luton Town", 0.4, 1.3),
        ];
        let summary = summarize(&fixtures);
        assert_eq!(
            summary,
            vec![
                TeamCleanSheets {
                    team: "Arsenal".to_string(),
                    total_games: 1,
                    expected_cleans: 1,
                },
                TeamCleanSheets {
                    team: "Chelsea".to_string(),
                    total_games: 2,
                    expected_cleans: 0,
                },
                TeamCleanSheets {
                    team: "Luton Town".to_string(),
                    total_games: 1,
                    expected_cleans: 1,
                },
            ]
        );
    }

    #[test]
    fn unplayed_and_spacer_rows_are_skipped() {
        let html = r#"<table id="sched"><thead><tr>
              <th>Wk</th><th>Home</th><th>xG</th><th>Score</th><th>xG</th><th>Away</th>
            </tr></thead><tbody>
              <tr><td data-stat="home_team">Burnley</td><td data-stat="home_xg">0.3</td>
                  <td data-stat="away_xg">1.9</td><td data-stat="away_team">Manchester City</td></tr>
              <tr class="spacer"><td colspan="6"></td></tr>
              <tr><td data-stat="home_team">Arsenal</td><td data-stat="home_xg"></td>
                  <td data-stat="away_xg"></td><td data-stat="away_team">Everton</td></tr>
              <tr><td data-stat="home_team">Fulham</td><td data-stat="home_xg">x</td>
                  <td data-stat="away_xg">1.0</td><td data-stat="away_team">Brentford</td></tr>
            </tbody></table>"#;
        let page = Html::parse_document(html);
        let fixtures = extract_fixtures(&page).expect("schedule table");
        assert_eq!(fixtures, vec![fixture("Burnley", "Manchester City", 0.3, 1.9)]);
    }

    #[test]
    fn static_selectors_parse() {
        for sel in [&BODY_ROW, &HOME_TEAM, &AWAY_TEAM, &HOME_XG, &AWAY_XG] {
            Lazy::force(sel);
        }
    }

    #[test]
    fn missing_schedule_table_is_an_error() {
        let page = Html::parse_document("<table><tr><th>Squad</th></tr></table>");
        assert!(extract_fixtures(&page).is_err());
    }
}
