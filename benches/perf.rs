use criterion::{Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;

use matchup_engine::config::EngineConfig;
use matchup_engine::matrix::MatchupMatrix;
use matchup_engine::ranking::{RankStrategy, compute_order};
use matchup_engine::sampler::{WeightFn, closest_matchups, sample_opponents};
use matchup_engine::trendline::{GridParams, fit_grid_search};
use matchup_engine::view::build_view;
use matchup_engine::wire::parse_update_json;

fn fixture_matrix() -> MatchupMatrix {
    parse_update_json(UPDATE_JSON)
        .and_then(|u| u.matrix())
        .expect("valid fixture json")
}

fn bench_update_parse(c: &mut Criterion) {
    c.bench_function("update_parse", |b| {
        b.iter(|| {
            let update = parse_update_json(black_box(UPDATE_JSON)).unwrap();
            black_box(update.matchups.len());
        })
    });
}

fn bench_ranking(c: &mut Criterion) {
    let matrix = fixture_matrix();
    for strategy in [
        RankStrategy::WeightedAverage,
        RankStrategy::DampedAverage,
        RankStrategy::PairwiseDominance,
    ] {
        c.bench_function(&format!("rank_{}", strategy.label()), |b| {
            b.iter(|| {
                let order = compute_order(black_box(&matrix), strategy, 5);
                black_box(order.len());
            })
        });
    }
}

fn bench_closest_matchups(c: &mut Criterion) {
    let matrix = fixture_matrix();
    c.bench_function("closest_matchups", |b| {
        b.iter(|| {
            let pairs = closest_matchups(black_box(&matrix));
            black_box(pairs.len());
        })
    });
}

fn bench_sample_opponents(c: &mut Criterion) {
    let matrix = fixture_matrix();
    let mut rng = StdRng::seed_from_u64(7);
    c.bench_function("sample_opponents", |b| {
        b.iter(|| {
            let picks = sample_opponents(black_box(&matrix), WeightFn::FlatFloor, &mut rng).unwrap();
            black_box(picks.len());
        })
    });
}

fn bench_grid_search(c: &mut Criterion) {
    let matrix = fixture_matrix();
    let params = GridParams::default();
    c.bench_function("grid_search_default", |b| {
        b.iter(|| {
            let fit = fit_grid_search(black_box(&matrix), 5, &params).unwrap();
            black_box(fit.split_difference);
        })
    });
}

fn bench_full_view(c: &mut Criterion) {
    let matrix = fixture_matrix();
    let cfg = EngineConfig {
        grid: GridParams {
            slope_min: -5.0,
            ..GridParams::default()
        },
        ..EngineConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(7);
    c.bench_function("build_view", |b| {
        b.iter(|| {
            let view = build_view(black_box(&matrix), &cfg, None, None, &mut rng).unwrap();
            black_box(view.closest.len());
        })
    });
}

criterion_group!(
    perf,
    bench_update_parse,
    bench_ranking,
    bench_closest_matchups,
    bench_sample_opponents,
    bench_grid_search,
    bench_full_view
);
criterion_main!(perf);

static UPDATE_JSON: &str = include_str!("../tests/fixtures/matchup_update.json");
