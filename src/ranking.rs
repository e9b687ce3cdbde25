use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::matrix::{Competitor, MatchupMatrix, NamedMatchupCell};
use crate::transform::invert_and_transpose;

/// How rows (and, on the inverted matrix, columns) are ordered strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankStrategy {
    /// Match-weighted mean win rate.
    #[default]
    WeightedAverage,
    /// Same numerator, divided by `sqrt(total matches)`.
    DampedAverage,
    /// Majority wins over every other row, column by column.
    PairwiseDominance,
}

impl RankStrategy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "weighted" | "weighted_average" | "average" => Some(Self::WeightedAverage),
            "damped" | "damped_average" => Some(Self::DampedAverage),
            "dominance" | "pairwise" | "pairwise_dominance" => Some(Self::PairwiseDominance),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::WeightedAverage => "weighted",
            Self::DampedAverage => "damped",
            Self::PairwiseDominance => "dominance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RowScore {
    /// Position of the row in the scored matrix.
    pub index: usize,
    pub competitor: Option<Competitor>,
    /// `None` when the row has no usable data; such rows sort last.
    pub score: Option<f64>,
    pub total_matches: u64,
}

/// Per-row strength under `strategy`, in input order.
///
/// `threshold` is the minimum match count a cell needs to take part in a
/// pairwise comparison; the averaging strategies ignore it.
pub fn row_scores(matrix: &MatchupMatrix, strategy: RankStrategy, threshold: u32) -> Vec<RowScore> {
    let rows = matrix.rows();
    let dominance = match strategy {
        RankStrategy::PairwiseDominance => Some(net_dominance(rows, threshold)),
        _ => None,
    };

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let (wins, matches) = weighted_wins(row);
            let score = match strategy {
                RankStrategy::WeightedAverage => (matches > 0).then(|| wins / matches as f64),
                RankStrategy::DampedAverage => {
                    (matches > 0).then(|| wins / (matches as f64).sqrt())
                }
                RankStrategy::PairwiseDominance => {
                    dominance.as_ref().map(|net| net[i] as f64)
                }
            };
            RowScore {
                index: i,
                competitor: row.first().map(|c| c.with),
                score,
                total_matches: total_matches(row),
            }
        })
        .collect()
}

/// Row permutation, strongest first. The sort is stable: rows with equal
/// scores keep their input order. Pairwise dominance breaks ties by the row's
/// total match count first.
pub fn compute_order(matrix: &MatchupMatrix, strategy: RankStrategy, threshold: u32) -> Vec<usize> {
    let mut scores = row_scores(matrix, strategy, threshold);
    scores.sort_by(|a, b| {
        let primary = cmp_score_desc(a.score, b.score);
        match strategy {
            RankStrategy::PairwiseDominance => {
                primary.then_with(|| b.total_matches.cmp(&a.total_matches))
            }
            _ => primary,
        }
    });
    let order: Vec<usize> = scores.iter().map(|s| s.index).collect();
    log::debug!(
        "ranked {} rows with {} strategy",
        order.len(),
        strategy.label()
    );
    order
}

/// Row order plus column order. Columns are ranked on the inverted matrix so
/// "strongest column" means the same thing as "strongest row".
pub fn compute_orders(
    matrix: &MatchupMatrix,
    strategy: RankStrategy,
    threshold: u32,
) -> (Vec<usize>, Vec<usize>) {
    let rows = compute_order(matrix, strategy, threshold);
    let cols = compute_order(&invert_and_transpose(matrix), strategy, threshold);
    (rows, cols)
}

fn weighted_wins(row: &[NamedMatchupCell]) -> (f64, u64) {
    row.iter()
        .filter_map(|c| c.cell.win_rate.map(|wr| (wr, c.cell.matches)))
        .fold((0.0, 0u64), |(wins, matches), (wr, m)| {
            (wins + wr * m as f64, matches + m as u64)
        })
}

fn total_matches(row: &[NamedMatchupCell]) -> u64 {
    row.iter().map(|c| c.cell.matches as u64).sum()
}

fn net_dominance(rows: &[Vec<NamedMatchupCell>], threshold: u32) -> Vec<i64> {
    let n = rows.len();
    let mut net = vec![0i64; n];
    for i in 0..n {
        for j in (i + 1)..n {
            match pair_margin(&rows[i], &rows[j], threshold).cmp(&0) {
                Ordering::Greater => {
                    net[i] += 1;
                    net[j] -= 1;
                }
                Ordering::Less => {
                    net[i] -= 1;
                    net[j] += 1;
                }
                Ordering::Equal => {}
            }
        }
    }
    net
}

/// Columns where row `a` does better than row `b`, minus columns where it does
/// worse. Only cells with enough matches on both sides count.
fn pair_margin(a: &[NamedMatchupCell], b: &[NamedMatchupCell], threshold: u32) -> i64 {
    a.iter()
        .zip(b)
        .filter(|(ca, cb)| ca.cell.matches >= threshold && cb.cell.matches >= threshold)
        .filter_map(|(ca, cb)| Some((ca.cell.win_rate?, cb.cell.win_rate?)))
        .map(|(wa, wb)| {
            if wa > wb {
                1
            } else if wa < wb {
                -1
            } else {
                0
            }
        })
        .sum()
}

fn cmp_score_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::MatchupCell;

    fn m(cells: Vec<Vec<MatchupCell>>) -> MatchupMatrix {
        MatchupMatrix::from_cells(cells).unwrap()
    }

    #[test]
    fn rows_without_data_sort_last() {
        let matrix = m(vec![
            vec![MatchupCell::empty(), MatchupCell::empty(), MatchupCell::empty()],
            vec![MatchupCell::empty(), MatchupCell::new(0.5, 4), MatchupCell::new(0.2, 4)],
            vec![MatchupCell::empty(), MatchupCell::new(0.8, 4), MatchupCell::empty()],
        ]);
        assert_eq!(compute_order(&matrix, RankStrategy::WeightedAverage, 0), vec![2, 1, 0]);
        assert_eq!(compute_order(&matrix, RankStrategy::DampedAverage, 0), vec![2, 1, 0]);
    }

    #[test]
    fn damped_average_rewards_volume() {
        // Row 0: 0.6 over 100 matches. Row 1: 0.9 over 4 matches.
        let matrix = m(vec![
            vec![MatchupCell::empty(), MatchupCell::new(0.6, 100)],
            vec![MatchupCell::new(0.9, 4), MatchupCell::empty()],
        ]);
        assert_eq!(compute_order(&matrix, RankStrategy::WeightedAverage, 0), vec![1, 0]);
        // 60 / 10 = 6.0 beats 3.6 / 2 = 1.8.
        assert_eq!(compute_order(&matrix, RankStrategy::DampedAverage, 0), vec![0, 1]);
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let matrix = m(vec![
            vec![MatchupCell::new(0.5, 2), MatchupCell::new(0.5, 2)],
            vec![MatchupCell::new(0.5, 2), MatchupCell::new(0.5, 2)],
        ]);
        assert_eq!(compute_order(&matrix, RankStrategy::WeightedAverage, 0), vec![0, 1]);
    }

    #[test]
    fn dominance_ignores_magnitude() {
        // Row 0 beats row 1 narrowly in two columns; row 1 wins one column by a mile.
        let matrix = m(vec![
            vec![MatchupCell::new(0.55, 10), MatchupCell::new(0.55, 10), MatchupCell::new(0.0, 10)],
            vec![MatchupCell::new(0.50, 10), MatchupCell::new(0.50, 10), MatchupCell::new(1.0, 10)],
            vec![MatchupCell::new(0.10, 10), MatchupCell::new(0.10, 10), MatchupCell::new(0.10, 10)],
        ]);
        assert_eq!(compute_order(&matrix, RankStrategy::WeightedAverage, 0), vec![1, 0, 2]);
        assert_eq!(compute_order(&matrix, RankStrategy::PairwiseDominance, 5), vec![0, 1, 2]);
    }

    #[test]
    fn dominance_skips_cells_below_threshold() {
        let matrix = m(vec![
            vec![MatchupCell::new(0.9, 2), MatchupCell::new(0.5, 3)],
            vec![MatchupCell::new(0.1, 2), MatchupCell::new(0.5, 30)],
        ]);
        let scores = row_scores(&matrix, RankStrategy::PairwiseDominance, 5);
        assert_eq!(scores[0].score, Some(0.0));
        assert_eq!(scores[1].score, Some(0.0));
        // Tie on net dominance, row 1 has more evidence.
        assert_eq!(compute_order(&matrix, RankStrategy::PairwiseDominance, 5), vec![1, 0]);
    }

    #[test]
    fn strategy_parse_accepts_aliases() {
        assert_eq!(RankStrategy::parse("Damped"), Some(RankStrategy::DampedAverage));
        assert_eq!(RankStrategy::parse("pairwise"), Some(RankStrategy::PairwiseDominance));
        assert_eq!(RankStrategy::parse("elo"), None);
    }
}
