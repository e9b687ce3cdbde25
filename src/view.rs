use rand::Rng;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::matrix::{CompetitorMask, MatchupMatrix};
use crate::ranking::compute_orders;
use crate::sampler::{MatchupPair, WeightFn, closest_matchups, sample_opponent};
use crate::transform::{filter_by_mask, invert_and_transpose, reorder};
use crate::trendline::{
    GridFit, TrendLine, collapse_rows, fit_grid_search, fit_least_squares, fit_principal_axis,
};
use crate::wire::Side;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trendlines {
    pub least_squares: Option<TrendLine>,
    pub principal_axis: Option<TrendLine>,
    pub grid: Option<GridFit>,
}

/// Everything a renderer needs for one update. `matrix` is filtered and
/// reordered; `row_order`/`col_order` index into the filtered matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupView {
    pub matrix: MatchupMatrix,
    pub row_order: Vec<usize>,
    pub col_order: Vec<usize>,
    pub closest: Vec<MatchupPair>,
    /// One entry per row of the filtered matrix; `None` where the row had no
    /// positive sampling weight.
    pub suggestions: Vec<Option<MatchupPair>>,
    pub trendlines: Trendlines,
}

pub fn build_view<R: Rng>(
    matrix: &MatchupMatrix,
    cfg: &EngineConfig,
    mask: Option<&CompetitorMask>,
    last_winner: Option<Side>,
    rng: &mut R,
) -> Result<MatchupView> {
    let filtered = match mask {
        Some(mask) => filter_by_mask(matrix, mask)?,
        None => matrix.clone(),
    };

    let (row_order, col_order) = compute_orders(&filtered, cfg.ranking, cfg.match_threshold);
    let ordered = reorder(&filtered, &row_order, &col_order)?;

    let closest = closest_matchups(&filtered);

    // Suggestions are for whoever just lost; rows are P1, so flip when P1 won.
    let suggestions = if last_winner == Some(Side::P1) {
        suggest(&invert_and_transpose(&filtered), cfg.weighting, rng)?
    } else {
        suggest(&filtered, cfg.weighting, rng)?
    };

    let trendlines = fit_trendlines(&ordered, cfg)?;

    Ok(MatchupView {
        matrix: ordered,
        row_order,
        col_order,
        closest,
        suggestions,
        trendlines,
    })
}

fn suggest<R: Rng>(
    matrix: &MatchupMatrix,
    weighting: WeightFn,
    rng: &mut R,
) -> Result<Vec<Option<MatchupPair>>> {
    matrix
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            match sample_opponent(row, |wr, m| weighting.weight(wr, m), &mut *rng) {
                Ok(pick) => Ok(Some(MatchupPair::from(&row[pick]))),
                Err(EngineError::DegenerateSample { .. }) => {
                    log::warn!("no suggestion for row {i}: every opponent weighs zero");
                    Ok(None)
                }
                Err(err) => Err(err),
            }
        })
        .collect()
}

fn fit_trendlines(matrix: &MatchupMatrix, cfg: &EngineConfig) -> Result<Trendlines> {
    let points = collapse_rows(matrix, cfg.match_threshold);
    let least_squares = degenerate_as_none("least squares", fit_least_squares(&points))?;
    let principal_axis = degenerate_as_none("principal axis", fit_principal_axis(&points))?;
    let grid = degenerate_as_none(
        "grid search",
        fit_grid_search(matrix, cfg.match_threshold, &cfg.grid),
    )?;
    Ok(Trendlines {
        least_squares,
        principal_axis,
        grid,
    })
}

fn degenerate_as_none<T>(name: &str, fit: Result<T>) -> Result<Option<T>> {
    match fit {
        Ok(v) => Ok(Some(v)),
        Err(EngineError::DegenerateFit(reason)) => {
            log::warn!("{name} trendline skipped: {reason}");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::matrix::MatchupCell;

    fn sample_matrix() -> MatchupMatrix {
        MatchupMatrix::from_cells(vec![
            vec![MatchupCell::new(0.5, 6), MatchupCell::new(0.3, 10), MatchupCell::new(0.2, 8)],
            vec![MatchupCell::new(0.7, 10), MatchupCell::new(0.5, 6), MatchupCell::new(0.4, 9)],
            vec![MatchupCell::new(0.8, 8), MatchupCell::new(0.6, 9), MatchupCell::new(0.5, 6)],
        ])
        .unwrap()
    }

    #[test]
    fn view_orders_strongest_row_first() {
        let mut rng = StdRng::seed_from_u64(7);
        let view = build_view(&sample_matrix(), &EngineConfig::default(), None, None, &mut rng).unwrap();
        assert_eq!(view.row_order, vec![2, 1, 0]);
        assert_eq!(view.matrix.rows()[0][0].with.index(), 2);
        assert_eq!(view.suggestions.len(), 3);
        assert!(view.suggestions.iter().all(Option::is_some));
        assert!(view.trendlines.grid.is_some());
    }

    #[test]
    fn masked_view_shrinks_everything() {
        let mut rng = StdRng::seed_from_u64(7);
        let mask = CompetitorMask::from_flags(vec![true, false, true]);
        let view = build_view(
            &sample_matrix(),
            &EngineConfig::default(),
            Some(&mask),
            Some(Side::P1),
            &mut rng,
        )
        .unwrap();
        assert_eq!(view.matrix.dimension(), 2);
        assert!(view.closest.iter().all(|p| p.with.index() != 1 && p.against.index() != 1));
        assert!(view.suggestions.iter().flatten().all(|p| p.against.index() != 1));
    }

    #[test]
    fn zero_weight_row_only_loses_its_suggestion() {
        // Row 1 is all lopsided results, which the quartic weighting zeroes out.
        let matrix = MatchupMatrix::from_cells(vec![
            vec![MatchupCell::new(0.5, 10), MatchupCell::new(0.0, 10)],
            vec![MatchupCell::new(1.0, 10), MatchupCell::new(1.0, 10)],
        ])
        .unwrap();
        let cfg = EngineConfig {
            weighting: WeightFn::QuarticPenalty { threshold: 5 },
            ..EngineConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let view = build_view(&matrix, &cfg, None, None, &mut rng).unwrap();
        assert_eq!(view.suggestions.len(), 2);
        assert!(view.suggestions[0].is_some());
        assert!(view.suggestions[1].is_none());
        assert_eq!(view.row_order.len(), 2);
        assert_eq!(view.closest.len(), 4);
    }

    #[test]
    fn empty_matrix_builds_an_empty_view() {
        let mut rng = StdRng::seed_from_u64(7);
        let empty = MatchupMatrix::from_cells(Vec::new()).unwrap();
        let view = build_view(&empty, &EngineConfig::default(), None, None, &mut rng).unwrap();
        assert!(view.suggestions.is_empty());
        assert_eq!(view.trendlines.least_squares, None);
    }
}
