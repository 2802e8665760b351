use anyhow::{Context, Result};

use xg_returns::config::{Config, init_logging};
use xg_returns::fetch::{Fetcher, ThreadSleeper};
use xg_returns::manifest::load_manifest;
use xg_returns::matrix::Aggregator;
use xg_returns::pipeline::{Runner, build_jobs, save_returns};

fn main() -> Result<()> {
    init_logging();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = Config::from_env().with_args(&args);

    // A broken manifest must stop the run before anything is fetched.
    let matches = load_manifest(&config.manifest_path)
        .with_context(|| format!("load manifest {}", config.manifest_path.display()))?;
    let jobs = build_jobs(matches, &config);

    let fetcher = Fetcher::from_config(&config)?;
    let runner = Runner::new(&fetcher, ThreadSleeper, &config);
    let mut aggregator = Aggregator::new();
    let summary = runner.run(&jobs, &mut aggregator);

    let out_path = config.likely_returns_path();
    save_returns(&out_path, aggregator.returns())?;

    println!("Likely returns run complete");
    println!("Matches: {}", jobs.len());
    println!("Processed: {}", summary.processed);
    println!("Resumed: {}", summary.resumed);
    println!("Players: {}", aggregator.returns().len());
    println!("Output: {}", out_path.display());
    if !summary.skipped.is_empty() {
        println!("Skipped: {}", summary.skipped.len());
        for (index, reason) in summary.skipped.iter().take(8) {
            println!(" - match {index}: {reason}");
        }
    }
    if !summary.write_failures.is_empty() {
        println!("Write failures: {}", summary.write_failures.len());
        for (index, reason) in &summary.write_failures {
            println!(" - match {index}: {reason}");
        }
    }

    Ok(())
}
