use anyhow::{Context, Result, anyhow};

use xg_returns::config::{Config, arg_value, init_logging};
use xg_returns::fetch::{Fetcher, ThreadSleeper};
use xg_returns::manifest::load_manifest;
use xg_returns::matrix::Aggregator;
use xg_returns::pipeline::{MatchJob, MatchOutcome, Runner};

fn main() -> Result<()> {
    init_logging();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = Config::from_env().with_args(&args);

    let index = arg_value(&args, "--index")
        .context("usage: match_ingest --index <n> [--manifest <csv>] [--out <dir>]")?
        .parse::<usize>()
        .context("--index must be a positive integer")?;

    let matches = load_manifest(&config.manifest_path)
        .with_context(|| format!("load manifest {}", config.manifest_path.display()))?;
    let reference = matches
        .into_iter()
        .find(|m| m.index == index)
        .ok_or_else(|| anyhow!("invalid match index {index}; the manifest is 1-based"))?;

    let job = MatchJob {
        artifact: config.match_artifact_path(reference.index),
        reference,
    };
    let fetcher = Fetcher::from_config(&config)?;
    let runner = Runner::new(&fetcher, ThreadSleeper, &config);
    let mut aggregator = Aggregator::new();

    match runner.run_one(&job, &mut aggregator) {
        MatchOutcome::Processed { gameweek, players } => {
            println!("Match {index} ({gameweek}): {players} players");
            println!("Saved: {}", job.artifact.display());
        }
        MatchOutcome::Resumed => {
            println!("Match {index} already saved at {}", job.artifact.display());
        }
        MatchOutcome::Skipped(reason) => {
            println!("No data was processed for match {index}: {reason}");
        }
        MatchOutcome::WriteFailed(reason) => {
            return Err(anyhow!("match {index} could not be saved: {reason}"));
        }
    }
    Ok(())
}
