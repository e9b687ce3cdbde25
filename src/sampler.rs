use std::cmp::Ordering;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::matrix::{Competitor, MatchupMatrix, NamedMatchupCell};

/// Below this many matches the flat-floor weighting treats a pairing as unexplored.
pub const FLAT_FLOOR_MATCHES: u32 = 5;

/// Display-ready pairing: who plays whom, how far from even, on how many games.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchupPair {
    pub with: Competitor,
    pub against: Competitor,
    pub offset: Option<f64>,
    pub matches: u32,
}

impl From<&NamedMatchupCell> for MatchupPair {
    fn from(c: &NamedMatchupCell) -> Self {
        Self {
            with: c.with,
            against: c.against,
            offset: c.cell.offset(),
            matches: c.cell.matches,
        }
    }
}

/// Sampling weight for an opponent cell.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightFn {
    /// Weight 1 under five matches, otherwise favours close and well-played pairings.
    #[default]
    FlatFloor,
    /// Weight 1 under `threshold` matches, otherwise `1 - (2|wr - 0.5|)^4`.
    QuarticPenalty { threshold: u32 },
}

impl WeightFn {
    pub fn parse(raw: &str, threshold: u32) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "flat" | "flat_floor" => Some(Self::FlatFloor),
            "quartic" | "quartic_penalty" => Some(Self::QuarticPenalty { threshold }),
            _ => None,
        }
    }

    pub fn weight(&self, win_rate: Option<f64>, matches: u32) -> f64 {
        let floor = match self {
            WeightFn::FlatFloor => FLAT_FLOOR_MATCHES,
            WeightFn::QuarticPenalty { threshold } => *threshold,
        };
        if matches < floor {
            return 1.0;
        }
        let Some(wr) = win_rate else {
            return 0.0;
        };
        let spread = (wr - 0.5).abs();
        match self {
            WeightFn::FlatFloor => 0.5 - spread + 0.5 / matches as f64,
            WeightFn::QuarticPenalty { .. } => 1.0 - (spread * 2.0).powi(4),
        }
    }
}

/// Every played pairing, most even first. Pairings with no games are left out,
/// undefined offsets go last, ties prefer more games.
pub fn closest_matchups(matrix: &MatchupMatrix) -> Vec<MatchupPair> {
    let mut pairs: Vec<MatchupPair> = matrix
        .cells()
        .filter(|c| c.cell.matches > 0)
        .map(MatchupPair::from)
        .collect();
    pairs.sort_by(|a, b| {
        cmp_abs_offset(a.offset, b.offset).then_with(|| b.matches.cmp(&a.matches))
    });
    pairs
}

/// Roulette-wheel draw over `weights`. Non-finite and negative weights count as
/// zero; an all-zero row is an error.
pub fn sample_index_by_weight<R: Rng>(weights: &[f64], rng: &mut R) -> Result<usize> {
    let clean: Vec<f64> = weights
        .iter()
        .map(|w| if w.is_finite() && *w > 0.0 { *w } else { 0.0 })
        .collect();
    let total: f64 = clean.iter().sum();
    if total <= 0.0 {
        return Err(EngineError::DegenerateSample { row: None });
    }

    let draw: f64 = rng.gen_range(0.0..1.0);
    let mut cumulative = 0.0;
    for (i, w) in clean.iter().enumerate() {
        cumulative += w / total;
        if draw < cumulative {
            return Ok(i);
        }
    }
    // Rounding can leave the last cumulative value a hair under 1.0.
    clean
        .iter()
        .rposition(|w| *w > 0.0)
        .ok_or(EngineError::DegenerateSample { row: None })
}

/// Pick an opponent column for one row. `weight_fn` maps `(win_rate, matches)`
/// to a non-negative weight; [`WeightFn::weight`] covers the built-in schemes.
pub fn sample_opponent<F, R>(row: &[NamedMatchupCell], weight_fn: F, rng: &mut R) -> Result<usize>
where
    F: Fn(Option<f64>, u32) -> f64,
    R: Rng,
{
    let weights: Vec<f64> = row
        .iter()
        .map(|c| weight_fn(c.cell.win_rate, c.cell.matches))
        .collect();
    sample_index_by_weight(&weights, rng)
}

/// One suggested opponent per row of `matrix`.
pub fn sample_opponents<R: Rng>(
    matrix: &MatchupMatrix,
    weight_fn: WeightFn,
    rng: &mut R,
) -> Result<Vec<MatchupPair>> {
    matrix
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let pick = sample_opponent(row, |wr, m| weight_fn.weight(wr, m), &mut *rng).map_err(
                |err| match err {
                    EngineError::DegenerateSample { .. } => {
                        EngineError::DegenerateSample { row: Some(i) }
                    }
                    other => other,
                },
            )?;
            Ok(MatchupPair::from(&row[pick]))
        })
        .collect()
}

fn cmp_abs_offset(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.abs().partial_cmp(&b.abs()).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
