//! CSV sinks and sources for the aggregate files.
//!
//! Writes go to a `.tmp` sibling first and are renamed into place. A resumed
//! run therefore only ever sees complete artifacts.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::clean_sheets::TeamCleanSheets;
use crate::extract::parse_stat;
use crate::gameweek::Gameweek;
use crate::matrix::{NumericMatrix, ReturnMatrix, StatPair};

pub const LIKELY_RETURNS_FILE: &str = "likelyReturns.csv";
pub const EXPECTED_CLEANS_FILE: &str = "expected_cleans.csv";
const PLAYER_COLUMN: &str = "Player";

pub fn match_artifact_name(match_index: usize) -> String {
    format!("match_{match_index}_data.csv")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatColumn {
    Npxg,
    Xag,
}

fn npxg_header(gw: Gameweek) -> String {
    format!("{gw} npxG")
}

fn xag_header(gw: Gameweek) -> String {
    format!("{gw} xAG")
}

/// Recognises `GW{n} npxG` and `GW{n} xAG`. Plain `xG` is accepted as an
/// older spelling of the non-penalty column.
fn parse_stat_header(header: &str) -> Option<(Gameweek, StatColumn)> {
    let (gw, stat) = header.trim().split_once(' ')?;
    let number = gw.strip_prefix("GW")?.parse::<u8>().ok()?;
    let gameweek = Gameweek::new(number)?;
    let column = match stat.trim() {
        "npxG" | "xG" => StatColumn::Npxg,
        "xAG" => StatColumn::Xag,
        _ => return None,
    };
    Some((gameweek, column))
}

/// Numeric matrix as `Player, GW{n} npxG, GW{n} xAG, ...`, restricted to the
/// gameweeks that hold observed data.
pub fn write_numeric<W: Write>(writer: W, matrix: &NumericMatrix) -> Result<()> {
    let gameweeks = matrix.observed_gameweeks();
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec![PLAYER_COLUMN.to_string()];
    for gw in &gameweeks {
        header.push(npxg_header(*gw));
        header.push(xag_header(*gw));
    }
    wtr.write_record(&header).context("write numeric header")?;

    for (player, row) in matrix.rows() {
        let mut record = vec![player.to_string()];
        for gw in &gameweeks {
            let pair = row.get(*gw);
            record.push(pair.xg.to_string());
            record.push(pair.xag.to_string());
        }
        wtr.write_record(&record)
            .with_context(|| format!("write numeric row for {player}"))?;
    }
    wtr.flush().context("flush numeric matrix")?;
    Ok(())
}

/// Reads a numeric matrix back. The first column is the player name; stat
/// columns are found by header, unknown columns are ignored, and a gameweek
/// with only one of its two columns reads the other as `0.0`.
///
/// Full-width artifacts pad the gameweeks a match did not cover with zeros.
/// A gameweek whose cells are all blank or zero is therefore left unobserved,
/// so absorbing the file never overwrites another match's data.
pub fn read_numeric<R: Read>(reader: R) -> Result<NumericMatrix> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers().context("read numeric header")?.clone();

    let mut columns: Vec<(Gameweek, Option<usize>, Option<usize>)> = Vec::new();
    for (idx, header) in headers.iter().enumerate().skip(1) {
        let Some((gw, stat)) = parse_stat_header(header) else {
            continue;
        };
        let pos = match columns.iter().position(|(g, _, _)| *g == gw) {
            Some(pos) => pos,
            None => {
                columns.push((gw, None, None));
                columns.len() - 1
            }
        };
        match stat {
            StatColumn::Npxg => columns[pos].1 = Some(idx),
            StatColumn::Xag => columns[pos].2 = Some(idx),
        }
    }

    let mut rows = Vec::new();
    for (row_idx, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("read numeric row {}", row_idx + 1))?;
        let Some(player) = record.get(0).map(str::trim).filter(|p| !p.is_empty()) else {
            continue;
        };
        let pairs: Vec<StatPair> = columns
            .iter()
            .map(|(_, xg_idx, xag_idx)| StatPair {
                xg: stat_cell(&record, *xg_idx),
                xag: stat_cell(&record, *xag_idx),
            })
            .collect();
        rows.push((player.to_string(), pairs));
    }

    let carries_data: Vec<bool> = (0..columns.len())
        .map(|col| rows.iter().any(|(_, pairs)| pairs[col] != StatPair::default()))
        .collect();

    let mut matrix = NumericMatrix::new();
    for (player, pairs) in &rows {
        for (col, (gw, _, _)) in columns.iter().enumerate() {
            if carries_data[col] {
                matrix.set(player, *gw, pairs[col]);
            }
        }
    }
    Ok(matrix)
}

fn stat_cell(record: &csv::StringRecord, idx: Option<usize>) -> f64 {
    idx.and_then(|i| record.get(i)).map(parse_stat).unwrap_or(0.0)
}

/// Label matrix as `Player, GW1 .. GW38`, blank cells written as empty.
pub fn write_returns<W: Write>(writer: W, matrix: &ReturnMatrix) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec![PLAYER_COLUMN.to_string()];
    header.extend(Gameweek::all().map(Gameweek::label));
    wtr.write_record(&header).context("write returns header")?;

    for (player, row) in matrix.rows() {
        let mut record = vec![player.to_string()];
        record.extend(row.cells().map(|(_, label)| label.as_str().to_string()));
        wtr.write_record(&record)
            .with_context(|| format!("write returns row for {player}"))?;
    }
    wtr.flush().context("flush returns matrix")?;
    Ok(())
}

pub fn write_clean_sheets<W: Write>(writer: W, teams: &[TeamCleanSheets]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Team", "Total_Games", "Expected_Cleans"])
        .context("write clean sheet header")?;
    for team in teams {
        wtr.write_record([
            team.team.clone(),
            team.total_games.to_string(),
            team.expected_cleans.to_string(),
        ])
        .with_context(|| format!("write clean sheet row for {}", team.team))?;
    }
    wtr.flush().context("flush clean sheets")?;
    Ok(())
}

/// Writes through `write` into `path` via a temporary sibling and a rename.
pub fn save_atomically(
    path: &Path,
    write: impl FnOnce(&mut File) -> Result<()>,
) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let tmp = path.with_extension("csv.tmp");
    let mut file =
        File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
    write(&mut file)?;
    file.sync_all()
        .with_context(|| format!("sync {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

pub fn load_numeric(path: &Path) -> Result<NumericMatrix> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    read_numeric(file).with_context(|| format!("parse {}", path.display()))
}
