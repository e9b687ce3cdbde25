use std::collections::BTreeMap;
use std::f64::consts::PI;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::matrix::Competitor;
use crate::records::{GameRecord, RecordConfig};

const BASE_RATING: f64 = 1500.0;
const SCALE: f64 = 173.7178;
const MAX_VOLATILITY_ITERATIONS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub rating: f64,
    pub rd: f64,
    pub volatility: f64,
    /// Games rated so far.
    #[serde(default)]
    pub matches: u32,
}

impl Default for Rating {
    fn default() -> Self {
        Self {
            rating: BASE_RATING,
            rd: 350.0,
            volatility: 0.06,
            matches: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GlickoConfig {
    /// System constant constraining volatility change.
    pub tau: f64,
    pub epsilon: f64,
}

impl Default for GlickoConfig {
    fn default() -> Self {
        Self {
            tau: 0.5,
            epsilon: 1e-6,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GameOutcome {
    pub opponent: Rating,
    /// 1.0 win, 0.0 loss.
    pub score: f64,
}

/// One game of a rating period between a P1 character and a P2 character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodGame {
    pub p1: Competitor,
    pub p2: Competitor,
    pub p1_won: bool,
}

/// Glicko-2 update of one rating over one period.
pub fn update_rating(current: Rating, games: &[GameOutcome], cfg: &GlickoConfig) -> Rating {
    let mu = (current.rating - BASE_RATING) / SCALE;
    let phi = current.rd / SCALE;
    let sigma = current.volatility;

    if games.is_empty() {
        return Rating {
            rating: current.rating,
            rd: SCALE * (phi * phi + sigma * sigma).sqrt(),
            volatility: sigma,
            matches: current.matches,
        };
    }

    let mut v_inv = 0.0;
    let mut score_sum = 0.0;
    for game in games {
        let mu_j = (game.opponent.rating - BASE_RATING) / SCALE;
        let g_j = g(game.opponent.rd / SCALE);
        let e_j = expected(mu, mu_j, g_j);
        v_inv += g_j * g_j * e_j * (1.0 - e_j);
        score_sum += g_j * (game.score - e_j);
    }
    let v = 1.0 / v_inv;
    let delta = v * score_sum;

    let sigma_new = solve_volatility(phi, delta, v, sigma, cfg);
    let phi_star = (phi * phi + sigma_new * sigma_new).sqrt();
    let phi_new = 1.0 / (1.0 / (phi_star * phi_star) + 1.0 / v).sqrt();
    let mu_new = mu + phi_new * phi_new * score_sum;

    Rating {
        rating: BASE_RATING + SCALE * mu_new,
        rd: SCALE * phi_new,
        volatility: sigma_new,
        matches: current.matches + games.len() as u32,
    }
}

/// Rate every P1 and P2 character over one period. Each side is rated
/// separately and every update uses the opponents' ratings from before the period.
pub fn rate_period(
    p1: &[Rating],
    p2: &[Rating],
    games: &[PeriodGame],
    cfg: &GlickoConfig,
) -> Result<(Vec<Rating>, Vec<Rating>)> {
    let mut p1_games: Vec<Vec<GameOutcome>> = vec![Vec::new(); p1.len()];
    let mut p2_games: Vec<Vec<GameOutcome>> = vec![Vec::new(); p2.len()];

    for game in games {
        let (a, b) = (game.p1.index(), game.p2.index());
        if a >= p1.len() {
            return Err(EngineError::InvalidIndex { index: a, len: p1.len() });
        }
        if b >= p2.len() {
            return Err(EngineError::InvalidIndex { index: b, len: p2.len() });
        }
        let p1_score = if game.p1_won { 1.0 } else { 0.0 };
        p1_games[a].push(GameOutcome {
            opponent: p2[b],
            score: p1_score,
        });
        p2_games[b].push(GameOutcome {
            opponent: p1[a],
            score: 1.0 - p1_score,
        });
    }

    let rate = |side: &[Rating], results: &[Vec<GameOutcome>]| -> Vec<Rating> {
        side.iter()
            .zip(results)
            .map(|(r, games)| update_rating(*r, games, cfg))
            .collect()
    };
    Ok((rate(p1, &p1_games), rate(p2, &p2_games)))
}

/// Inclusive `played_at` bounds.
pub type DateRange = (NaiveDateTime, NaiveDateTime);

/// One rating period per calendar day, oldest day first, games in play order.
/// Games outside `range` or rejected by `cfg` are dropped; quit-outs that
/// survive are scored with the quitter losing.
pub fn rating_periods(
    games: &[GameRecord],
    range: Option<DateRange>,
    cfg: &RecordConfig,
) -> Vec<Vec<PeriodGame>> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&GameRecord>> = BTreeMap::new();
    for game in games {
        if let Some((start, end)) = range {
            if game.played_at < start || game.played_at > end {
                continue;
            }
        }
        if !cfg.counts_for_ratings(game) {
            continue;
        }
        by_day.entry(game.played_at.date()).or_default().push(game);
    }
    by_day
        .into_values()
        .map(|mut day| {
            day.sort_by_key(|g| g.played_at);
            day.into_iter()
                .map(|g| PeriodGame {
                    p1: g.row,
                    p2: g.col,
                    p1_won: g.row_won_effective(),
                })
                .collect()
        })
        .collect()
}

/// Replay a history from default ratings for `n` characters per side, one
/// period per day.
pub fn rate_history(
    n: usize,
    games: &[GameRecord],
    range: Option<DateRange>,
    records: &RecordConfig,
    cfg: &GlickoConfig,
) -> Result<(Vec<Rating>, Vec<Rating>)> {
    let mut p1 = vec![Rating::default(); n];
    let mut p2 = vec![Rating::default(); n];
    let periods = rating_periods(games, range, records);
    log::debug!("rating {} games over {} periods", games.len(), periods.len());
    for period in &periods {
        (p1, p2) = rate_period(&p1, &p2, period, cfg)?;
    }
    Ok((p1, p2))
}

fn g(phi: f64) -> f64 {
    1.0 / (1.0 + 3.0 * phi * phi / (PI * PI)).sqrt()
}

fn expected(mu: f64, mu_j: f64, g_j: f64) -> f64 {
    1.0 / (1.0 + (-g_j * (mu - mu_j)).exp())
}

/// Illinois (regula falsi) solve for the new volatility.
fn solve_volatility(phi: f64, delta: f64, v: f64, sigma: f64, cfg: &GlickoConfig) -> f64 {
    let a = (sigma * sigma).ln();
    let tau2 = cfg.tau * cfg.tau;
    let f = |x: f64| {
        let ex = x.exp();
        let num = ex * (delta * delta - phi * phi - v - ex);
        let den = 2.0 * (phi * phi + v + ex).powi(2);
        num / den - (x - a) / tau2
    };

    let mut big_a = a;
    let mut big_b = if delta * delta > phi * phi + v {
        (delta * delta - phi * phi - v).ln()
    } else {
        let mut k = 1.0;
        while f(a - k * cfg.tau) < 0.0 && k < MAX_VOLATILITY_ITERATIONS as f64 {
            k += 1.0;
        }
        a - k * cfg.tau
    };

    let mut f_a = f(big_a);
    let mut f_b = f(big_b);
    let mut iterations = 0;
    while (big_b - big_a).abs() > cfg.epsilon {
        if iterations == MAX_VOLATILITY_ITERATIONS {
            log::warn!("volatility solve did not converge, keeping last bracket");
            break;
        }
        iterations += 1;
        let c = big_a + (big_a - big_b) * f_a / (f_b - f_a);
        let f_c = f(c);
        if f_c * f_b <= 0.0 {
            big_a = big_b;
            f_a = f_b;
        } else {
            f_a /= 2.0;
        }
        big_b = c;
        f_b = f_c;
    }
    (big_a / 2.0).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(rating: f64, rd: f64) -> Rating {
        Rating {
            rating,
            rd,
            volatility: 0.06,
            matches: 0,
        }
    }

    #[test]
    fn matches_glickman_reference_example() {
        let games = [
            GameOutcome { opponent: r(1400.0, 30.0), score: 1.0 },
            GameOutcome { opponent: r(1550.0, 100.0), score: 0.0 },
            GameOutcome { opponent: r(1700.0, 300.0), score: 0.0 },
        ];
        let out = update_rating(r(1500.0, 200.0), &games, &GlickoConfig::default());
        assert!((out.rating - 1464.06).abs() < 0.02, "rating {}", out.rating);
        assert!((out.rd - 151.52).abs() < 0.01, "rd {}", out.rd);
        assert!((out.volatility - 0.05999).abs() < 1e-5, "vol {}", out.volatility);
    }

    #[test]
    fn idle_period_only_widens_deviation() {
        let out = update_rating(r(1500.0, 200.0), &[], &GlickoConfig::default());
        assert_eq!(out.rating, 1500.0);
        assert!((out.rd - 200.2714).abs() < 1e-3);
        assert_eq!(out.volatility, 0.06);
    }

    #[test]
    fn period_moves_both_sides() {
        let p1 = vec![Rating::default(); 2];
        let p2 = vec![Rating::default(); 2];
        let games = [PeriodGame {
            p1: Competitor(0),
            p2: Competitor(1),
            p1_won: true,
        }];
        let (n1, n2) = rate_period(&p1, &p2, &games, &GlickoConfig::default()).unwrap();
        assert!((n1[0].rating - 1662.31).abs() < 0.01);
        assert!(n2[1].rating < 1500.0);
        // Idle characters keep their rating.
        assert_eq!(n1[1].rating, 1500.0);
        assert!(n1[1].rd > 350.0);
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    fn record(day: u32, hour: u32, p1: usize, p2: usize, p1_won: bool) -> GameRecord {
        GameRecord {
            played_at: at(day, hour),
            row: Competitor(p1),
            col: Competitor(p2),
            row_won: p1_won,
            frames: 60 * 120,
            ending: crate::records::GameEnding::Normal,
        }
    }

    #[test]
    fn history_splits_into_daily_periods() {
        let games = vec![
            record(3, 9, 0, 1, true),
            record(1, 20, 1, 0, false),
            record(1, 8, 0, 0, true),
            record(2, 12, 1, 1, true),
        ];
        let periods = rating_periods(&games, None, &RecordConfig::default());
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[0].len(), 2);
        // Within a day, games keep play order.
        assert_eq!(periods[0][0].p1, Competitor(0));
        assert_eq!(periods[0][1].p1, Competitor(1));
        assert_eq!(periods[2][0].p2, Competitor(1));
    }

    #[test]
    fn date_range_is_inclusive() {
        let games = vec![
            record(1, 8, 0, 1, true),
            record(2, 8, 0, 1, true),
            record(3, 8, 0, 1, true),
            record(4, 8, 0, 1, true),
        ];
        let range = Some((at(2, 8), at(3, 8)));
        let periods = rating_periods(&games, range, &RecordConfig::default());
        assert_eq!(periods.len(), 2);

        let (p1, p2) =
            rate_history(2, &games, range, &RecordConfig::default(), &GlickoConfig::default())
                .unwrap();
        assert_eq!(p1[0].matches, 2);
        assert_eq!(p2[1].matches, 2);
        assert_eq!(p1[1].matches, 0);
        assert!(p1[0].rating > 1500.0);
    }

    #[test]
    fn quit_outs_need_allow_exit_for_ratings() {
        let mut quit = record(1, 8, 0, 1, true);
        quit.ending = crate::records::GameEnding::Quit { by_row: true };
        let games = vec![quit];
        assert!(rating_periods(&games, None, &RecordConfig::default()).is_empty());
        let lenient = RecordConfig {
            allow_exit: true,
            ..RecordConfig::default()
        };
        let periods = rating_periods(&games, None, &lenient);
        assert!(!periods[0][0].p1_won);
    }

    #[test]
    fn period_rejects_unknown_characters() {
        let side = vec![Rating::default(); 2];
        let games = [PeriodGame {
            p1: Competitor(2),
            p2: Competitor(0),
            p1_won: false,
        }];
        assert!(rate_period(&side, &side, &games, &GlickoConfig::default()).is_err());
    }
}
