//! Per-match fetch, locate, extract and merge, plus the sequential job loop
//! over a whole manifest.

use std::cell::Cell;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use scraper::Html;
use thiserror::Error;

use crate::artifact::{self, load_numeric, save_atomically, write_numeric, write_returns};
use crate::config::Config;
use crate::extract::{PlayerStatRecord, extract_records};
use crate::fetch::{FetchError, Fetcher, Sleeper, Transport};
use crate::gameweek::{Gameweek, gameweek};
use crate::locate::{LocateError, Sides, TableLocator};
use crate::manifest::MatchReference;
use crate::matrix::{Aggregator, NumericMatrix, ReturnMatrix};

#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Locate(#[from] LocateError),
    #[error("team tables for match {0} have no player rows")]
    NoPlayers(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchData {
    pub index: usize,
    pub gameweek: Gameweek,
    pub home: Vec<PlayerStatRecord>,
    pub away: Vec<PlayerStatRecord>,
}

impl MatchData {
    pub fn records(&self) -> impl Iterator<Item = &PlayerStatRecord> {
        self.home.iter().chain(self.away.iter())
    }

    pub fn merge_into(&self, aggregator: &mut Aggregator) {
        for record in self.records() {
            aggregator.merge(self.gameweek, record);
        }
    }
}

/// Locates and reads both team tables of an already fetched report page.
pub fn parse_match_page(
    body: &str,
    locator: &TableLocator,
    reference: &MatchReference,
) -> Result<MatchData, MatchError> {
    let page = Html::parse_document(body);
    let sides = Sides {
        home: &reference.home_team,
        away: &reference.away_team,
    };
    let tables = locator.locate(&page, sides)?;
    let data = MatchData {
        index: reference.index,
        gameweek: gameweek(reference.index),
        home: extract_records(tables.home),
        away: extract_records(tables.away),
    };
    if data.home.is_empty() && data.away.is_empty() {
        return Err(MatchError::NoPlayers(reference.index));
    }
    Ok(data)
}

pub fn scrape_match<T: Transport, S: Sleeper>(
    fetcher: &Fetcher<T, S>,
    locator: &TableLocator,
    reference: &MatchReference,
) -> Result<MatchData, MatchError> {
    let body = fetcher.fetch(&reference.url)?;
    parse_match_page(&body, locator, reference)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchJob {
    pub reference: MatchReference,
    pub artifact: PathBuf,
}

pub fn build_jobs(matches: Vec<MatchReference>, config: &Config) -> Vec<MatchJob> {
    matches
        .into_iter()
        .take(config.match_limit)
        .map(|reference| MatchJob {
            artifact: config.match_artifact_path(reference.index),
            reference,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Processed { gameweek: Gameweek, players: usize },
    Resumed,
    Skipped(String),
    WriteFailed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub resumed: usize,
    pub skipped: Vec<(usize, String)>,
    pub write_failures: Vec<(usize, String)>,
}

impl RunSummary {
    fn record(&mut self, index: usize, outcome: MatchOutcome) {
        match outcome {
            MatchOutcome::Processed { .. } => self.processed += 1,
            MatchOutcome::Resumed => self.resumed += 1,
            MatchOutcome::Skipped(reason) => self.skipped.push((index, reason)),
            MatchOutcome::WriteFailed(reason) => self.write_failures.push((index, reason)),
        }
    }
}

/// Drives jobs one at a time against a single fetcher, so requests to the
/// stats host are never concurrent. Every match fetch after the first one
/// made by this runner is preceded by the inter-match pause.
pub struct Runner<'a, T, S, P> {
    fetcher: &'a Fetcher<T, S>,
    locator: TableLocator,
    pause: P,
    inter_match_delay: std::time::Duration,
    fetched_before: Cell<bool>,
}

impl<'a, T: Transport, S: Sleeper, P: Sleeper> Runner<'a, T, S, P> {
    pub fn new(fetcher: &'a Fetcher<T, S>, pause: P, config: &Config) -> Self {
        Self {
            fetcher,
            locator: TableLocator::default(),
            pause,
            inter_match_delay: config.inter_match_delay,
            fetched_before: Cell::new(false),
        }
    }

    pub fn pause(&self) -> &P {
        &self.pause
    }

    /// Runs every job, resuming from existing artifacts. Jobs fail
    /// independently; the summary lists what was skipped and why.
    pub fn run(&self, jobs: &[MatchJob], aggregator: &mut Aggregator) -> RunSummary {
        let mut summary = RunSummary::default();
        for job in jobs {
            let outcome = self.run_one(job, aggregator);
            summary.record(job.reference.index, outcome);
        }
        summary
    }

    pub fn run_one(&self, job: &MatchJob, aggregator: &mut Aggregator) -> MatchOutcome {
        let reference = &job.reference;
        if job.artifact.exists() {
            match load_numeric(&job.artifact) {
                Ok(saved) => {
                    info!(
                        "match {}: resuming from {}",
                        reference.index,
                        job.artifact.display()
                    );
                    aggregator.absorb(&saved);
                    return MatchOutcome::Resumed;
                }
                Err(err) => {
                    warn!(
                        "match {}: unreadable artifact, refetching: {err:#}",
                        reference.index
                    );
                }
            }
        }

        info!(
            "processing match {} for {}: {} vs {}",
            reference.index,
            gameweek(reference.index),
            reference.home_team,
            reference.away_team
        );
        if self.fetched_before.replace(true) {
            self.pause.sleep(self.inter_match_delay);
        }
        let data = match scrape_match(self.fetcher, &self.locator, reference) {
            Ok(data) => data,
            Err(err) => {
                warn!("match {} skipped: {err}", reference.index);
                return MatchOutcome::Skipped(err.to_string());
            }
        };

        let mut per_match = Aggregator::new();
        data.merge_into(&mut per_match);
        data.merge_into(aggregator);

        let players = per_match.numeric().len();
        if let Err(err) = save_numeric(&job.artifact, per_match.numeric()) {
            warn!("match {}: {err:#}", reference.index);
            return MatchOutcome::WriteFailed(format!("{err:#}"));
        }
        info!(
            "match {}: {} players saved to {}",
            reference.index,
            players,
            job.artifact.display()
        );
        MatchOutcome::Processed {
            gameweek: data.gameweek,
            players,
        }
    }
}

pub fn save_numeric(path: &Path, matrix: &NumericMatrix) -> Result<()> {
    save_atomically(path, |file| write_numeric(file, matrix))
        .with_context(|| format!("save {}", path.display()))
}

pub fn save_returns(path: &Path, matrix: &ReturnMatrix) -> Result<()> {
    save_atomically(path, |file| write_returns(file, matrix))
        .with_context(|| format!("save {}", path.display()))
}

/// Reads the per-match artifacts for indices `1..=match_count` into one
/// numeric matrix. Missing files are skipped; returns the matrix and how
/// many artifacts were read.
pub fn collect_artifacts(output_dir: &Path, match_count: usize) -> (NumericMatrix, usize) {
    let mut matrix = NumericMatrix::new();
    let mut found = 0;
    for index in 1..=match_count {
        let path = output_dir.join(artifact::match_artifact_name(index));
        if !path.exists() {
            info!("{} does not exist, skipping", path.display());
            continue;
        }
        match load_numeric(&path) {
            Ok(saved) => {
                matrix.absorb(&saved);
                found += 1;
            }
            Err(err) => warn!("skipping {}: {err:#}", path.display()),
        }
    }
    (matrix, found)
}
