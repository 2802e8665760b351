use anyhow::Result;

use xg_returns::config::{Config, init_logging};
use xg_returns::matrix::classify_matrix;
use xg_returns::pipeline::{collect_artifacts, save_returns};

fn main() -> Result<()> {
    init_logging();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = Config::from_env().with_args(&args);

    let (numeric, found) = collect_artifacts(&config.output_dir, config.match_limit);
    let returns = classify_matrix(&numeric);

    let out_path = config.likely_returns_path();
    save_returns(&out_path, &returns)?;

    println!("Artifacts read: {found}/{}", config.match_limit);
    println!("Players: {}", returns.len());
    println!("Output: {}", out_path.display());
    Ok(())
}
