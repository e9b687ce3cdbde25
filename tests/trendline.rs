use matchup_engine::matrix::{MatchupCell, MatchupMatrix};
use matchup_engine::trendline::{
    GridParams, Point, fit_grid_search, fit_least_squares, fit_principal_axis, split_difference,
    weighted_cells,
};

fn diagonal_points() -> Vec<Point> {
    [0.0, 0.25, 0.5, 0.75]
        .iter()
        .map(|&v| Point::new(v, v))
        .collect()
}

#[test]
fn colinear_points_fit_the_identity_line() {
    let ols = fit_least_squares(&diagonal_points()).unwrap();
    assert!((ols.k - 1.0).abs() < 1e-9 && ols.d.abs() < 1e-9, "{ols:?}");

    let pca = fit_principal_axis(&diagonal_points()).unwrap();
    assert!((pca.k - 1.0).abs() < 1e-9 && pca.d.abs() < 1e-9, "{pca:?}");
}

/// Heavy lopsided cells above the diagonal, near-even ones below it.
fn upper_weighted() -> MatchupMatrix {
    let n = 5;
    let cells = (0..n)
        .map(|r| {
            (0..n)
                .map(|c| {
                    if c > r {
                        if (r + c) % 2 == 1 {
                            MatchupCell::new(0.9, 20)
                        } else {
                            MatchupCell::new(0.85, 16)
                        }
                    } else if c < r {
                        MatchupCell::new(0.55, 8)
                    } else {
                        MatchupCell::new(0.5, 10)
                    }
                })
                .collect()
        })
        .collect();
    MatchupMatrix::from_cells(cells).unwrap()
}

#[test]
fn grid_search_is_within_resolution_of_a_finer_grid() {
    let m = upper_weighted();
    let cells = weighted_cells(&m, 5);
    let heaviest = cells.iter().map(|c| c.weight).fold(0.0, f64::max);

    let coarse = fit_grid_search(&m, 5, &GridParams::default()).unwrap();
    let oracle = fit_grid_search(
        &m,
        5,
        &GridParams {
            slope_min: -5.0,
            slope_max: 0.0,
            slope_step: 0.01,
            intercept_step: 0.005,
            intercept_span: 1.0,
        },
    )
    .unwrap();

    assert!(coarse.split_difference <= oracle.split_difference + heaviest);
    assert!((split_difference(&cells, coarse.line) - coarse.split_difference).abs() < 1e-12);
    // Far better than leaving every cell on one side.
    let total: f64 = cells.iter().map(|c| c.weight).sum();
    assert!(coarse.split_difference < total / 4.0);
}
