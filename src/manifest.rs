use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

pub const URL_COLUMN: &str = "Match URL";
pub const HOME_COLUMN: &str = "Home Team";
pub const AWAY_COLUMN: &str = "Away Team";

/// One fixture from the manifest. `index` is the 1-based row position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReference {
    pub index: usize,
    pub url: String,
    pub home_team: String,
    pub away_team: String,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot open manifest {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("manifest is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),
    #[error("manifest row {row} is malformed: {source}")]
    Row { row: usize, source: csv::Error },
    #[error("manifest header is unreadable: {0}")]
    Header(csv::Error),
}

#[derive(Debug, Deserialize)]
struct ManifestRow {
    #[serde(rename = "Match URL")]
    url: String,
    #[serde(rename = "Home Team")]
    home_team: String,
    #[serde(rename = "Away Team")]
    away_team: String,
}

pub fn load_manifest(path: &Path) -> Result<Vec<MatchReference>, ManifestError> {
    let file = File::open(path).map_err(|source| ManifestError::Open {
        path: path.display().to_string(),
        source,
    })?;
    read_manifest(file)
}

/// Parses the whole manifest up front so a bad file fails before any fetch.
pub fn read_manifest<R: Read>(reader: R) -> Result<Vec<MatchReference>, ManifestError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers().map_err(ManifestError::Header)?.clone();
    let missing: Vec<&'static str> = [URL_COLUMN, HOME_COLUMN, AWAY_COLUMN]
        .into_iter()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(ManifestError::MissingColumns(missing));
    }

    let mut matches = Vec::new();
    for (idx, row) in rdr.deserialize::<ManifestRow>().enumerate() {
        let index = idx + 1;
        let row = row.map_err(|source| ManifestError::Row { row: index, source })?;
        matches.push(MatchReference {
            index,
            url: row.url,
            home_team: row.home_team,
            away_team: row.away_team,
        });
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_indexed_from_one() {
        let raw = "Match URL,Home Team,Away Team,Date\n\
                   https://x.test/m/1,Burnley,Manchester City,2023-08-11\n\
                   https://x.test/m/2, Arsenal ,Nott'ham Forest,2023-08-12\n";
        let matches = read_manifest(raw.as_bytes()).expect("valid manifest");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].index, 1);
        assert_eq!(matches[1].index, 2);
        assert_eq!(matches[1].home_team, "Arsenal");
        assert_eq!(matches[1].away_team, "Nott'ham Forest");
    }

    #[test]
    fn missing_columns_abort() {
        let raw = "Match URL,Home\nhttps://x.test/m/1,Burnley\n";
        let err = read_manifest(raw.as_bytes()).unwrap_err();
        match err {
            ManifestError::MissingColumns(cols) => {
                assert_eq!(cols, vec![HOME_COLUMN, AWAY_COLUMN]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_row_is_malformed() {
        let raw = "Match URL,Home Team,Away Team\nhttps://x.test/m/1,Burnley\n";
        assert!(matches!(
            read_manifest(raw.as_bytes()),
            Err(ManifestError::Row { row: 1, .. })
        ));
    }
}
