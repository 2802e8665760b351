use anyhow::{Context, Result};
use scraper::Html;

use xg_returns::artifact::{save_atomically, write_clean_sheets};
use xg_returns::clean_sheets::{extract_fixtures, summarize};
use xg_returns::config::{Config, arg_value, init_logging};
use xg_returns::fetch::Fetcher;

fn main() -> Result<()> {
    init_logging();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = Config::from_env().with_args(&args);
    let url = arg_value(&args, "--url").unwrap_or_else(|| config.schedule_url.clone());

    let fetcher = Fetcher::from_config(&config)?;
    let body = fetcher
        .fetch(&url)
        .with_context(|| format!("fetch schedule {url}"))?;
    let page = Html::parse_document(&body);
    let fixtures = extract_fixtures(&page)?;
    let summary = summarize(&fixtures);

    let out_path = config.expected_cleans_path();
    save_atomically(&out_path, |file| write_clean_sheets(file, &summary))?;

    println!("{:<24} {:>11} {:>15}", "Team", "Total_Games", "Expected_Cleans");
    for team in &summary {
        println!(
            "{:<24} {:>11} {:>15}",
            team.team, team.total_games, team.expected_cleans
        );
    }
    println!("Fixtures: {}", fixtures.len());
    println!("Output: {}", out_path.display());
    Ok(())
}
