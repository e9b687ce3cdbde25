use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use rand::SeedableRng;
use rand::rngs::StdRng;

use matchup_engine::config::EngineConfig;
use matchup_engine::logging;
use matchup_engine::roster::Roster;
use matchup_engine::sampler::MatchupPair;
use matchup_engine::trendline::TrendLine;
use matchup_engine::view::build_view;
use matchup_engine::wire::parse_update_json;

const CLOSEST_SHOWN: usize = 10;

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    if let Err(err) = logging::init() {
        eprintln!("[WARN] {err}");
    }

    let cfg = EngineConfig::from_env().context("load MATCHUP_* settings")?;
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/matchup_update.json"));

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let update = parse_update_json(&raw).with_context(|| format!("parse {}", path.display()))?;
    let matrix = update.matrix().context("matchup grid")?;

    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let view = build_view(&matrix, &cfg, None, update.winner, &mut rng)?;
    let roster = Roster::melee();

    println!("Ranking: {}", cfg.ranking.label());
    let rows: Vec<String> = view
        .matrix
        .row_competitors()
        .into_iter()
        .map(|c| roster.label(c))
        .collect();
    println!("Rows: {}", rows.join(", "));
    let cols: Vec<String> = view
        .matrix
        .col_competitors()
        .into_iter()
        .map(|c| roster.label(c))
        .collect();
    println!("Cols: {}", cols.join(", "));

    println!("Closest matchups:");
    for pair in view.closest.iter().take(CLOSEST_SHOWN) {
        println!("  {}", describe_pair(&roster, pair));
    }

    if let Some(winner) = update.winner {
        println!("Suggestions for {:?}:", winner.other());
    } else {
        println!("Suggestions:");
    }
    for (row, pair) in view.suggestions.iter().enumerate() {
        match pair {
            Some(pair) => println!("  {}", describe_pair(&roster, pair)),
            None => println!("  row {row}: no suggestion"),
        }
    }

    println!("Least squares: {}", describe_line(view.trendlines.least_squares));
    println!("Principal axis: {}", describe_line(view.trendlines.principal_axis));
    match view.trendlines.grid {
        Some(fit) => println!(
            "Grid search: {} (split {:.3}, {} candidates)",
            describe_line(Some(fit.line)),
            fit.split_difference,
            fit.candidates
        ),
        None => println!("Grid search: n/a"),
    }
    Ok(())
}

fn describe_pair(roster: &Roster, pair: &MatchupPair) -> String {
    let offset = pair
        .offset
        .map(|o| format!("{:+.1}%", o * 100.0))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "{} vs {}: {} over {} games",
        roster.label(pair.with),
        roster.label(pair.against),
        offset,
        pair.matches
    )
}

fn describe_line(line: Option<TrendLine>) -> String {
    match line {
        Some(l) => format!("y = {:.3}x + {:.3}", l.k, l.d),
        None => "n/a".to_string(),
    }
}
