use criterion::{Criterion, criterion_group, criterion_main};
use scraper::Html;
use std::hint::black_box;

use xg_returns::extract::{PlayerStatRecord, extract_records};
use xg_returns::gameweek::gameweek;
use xg_returns::locate::{Sides, TableLocator};
use xg_returns::matrix::{Aggregator, classify_matrix};

fn report_page(rows: usize) -> String {
    let mut body = String::new();
    for (id, team) in [("a", "Arsenal"), ("b", "Chelsea")] {
        body.push_str(&format!(
            r#"<table id="stats_{id}_summary"><caption>{team} Player Stats Table</caption><tbody>"#
        ));
        for i in 0..rows {
            body.push_str(&format!(
                r#"<tr><th data-stat="player">{team} {i}</th><td data-stat="npxg">0.{i}</td><td data-stat="xg_assist">0.1</td></tr>"#
            ));
        }
        body.push_str("</tbody></table>");
        for filler in ["passing", "defense", "possession", "misc"] {
            body.push_str(&format!(
                r#"<table id="stats_{id}_{filler}"><caption>{team} {filler}</caption><tbody><tr><td>1</td></tr></tbody></table>"#
            ));
        }
    }
    format!("<html><body>{body}</body></html>")
}

fn bench_locate_and_extract(c: &mut Criterion) {
    let raw = report_page(16);
    let locator = TableLocator::default();
    c.bench_function("locate_and_extract", |b| {
        b.iter(|| {
            let page = Html::parse_document(black_box(&raw));
            let tables = locator
                .locate(
                    &page,
                    Sides {
                        home: "Arsenal",
                        away: "Chelsea",
                    },
                )
                .unwrap();
            let home = extract_records(tables.home);
            let away = extract_records(tables.away);
            black_box(home.len() + away.len());
        })
    });
}

fn bench_season_classification(c: &mut Criterion) {
    let mut aggregator = Aggregator::new();
    for index in 1..=380usize {
        for slot in 0..28 {
            let record = PlayerStatRecord::new(
                format!("player {}", (index % 20) * 28 + slot),
                (slot as f64) / 40.0,
                0.1,
            );
            aggregator.merge(gameweek(index), &record);
        }
    }
    c.bench_function("season_classification", |b| {
        b.iter(|| {
            let returns = classify_matrix(black_box(aggregator.numeric()));
            black_box(returns.len());
        })
    });
}

criterion_group!(benches, bench_locate_and_extract, bench_season_classification);
criterion_main!(benches);
