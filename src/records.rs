use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::matrix::{Competitor, MatchupCell, MatchupMatrix};

pub const FRAMES_PER_SECOND: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEnding {
    Normal,
    /// Someone quit out; `by_row` tells which side.
    Quit { by_row: bool },
}

/// One finished game, seen from the row competitor's side.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub played_at: NaiveDateTime,
    pub row: Competitor,
    pub col: Competitor,
    pub row_won: bool,
    pub frames: u32,
    pub ending: GameEnding,
}

impl GameRecord {
    /// Result after applying the quit rule: whoever quits loses.
    pub fn row_won_effective(&self) -> bool {
        match self.ending {
            GameEnding::Normal => self.row_won,
            GameEnding::Quit { by_row } => !by_row,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Only the most recent `window` games of a pairing count.
    pub window: usize,
    pub recency_weighted: bool,
    pub recency_decay: f64,
    pub min_game_seconds: u32,
    /// Let quit-out games into rating periods, scored as a loss for the
    /// quitter. The matchup matrix never counts them.
    pub allow_exit: bool,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            window: 100,
            recency_weighted: true,
            recency_decay: 0.1,
            min_game_seconds: 30,
            allow_exit: false,
        }
    }
}

impl RecordConfig {
    pub fn counts_for_matrix(&self, game: &GameRecord) -> bool {
        self.long_enough(game) && game.ending == GameEnding::Normal
    }

    pub fn counts_for_ratings(&self, game: &GameRecord) -> bool {
        if !self.long_enough(game) {
            return false;
        }
        match game.ending {
            GameEnding::Normal => true,
            GameEnding::Quit { .. } => self.allow_exit,
        }
    }

    fn long_enough(&self, game: &GameRecord) -> bool {
        game.frames / FRAMES_PER_SECOND >= self.min_game_seconds
    }
}

/// Weight of a game `age` positions before the newest one in its pairing.
pub fn recency_weight(age: usize, decay: f64) -> f64 {
    (-decay * (age as f64 - 1.0)).exp()
}

/// Build the raw `n`×`n` grid from a game history. Pairings without games are
/// left empty; the grid is not forced to be symmetric.
pub fn build_cells(
    n: usize,
    games: &[GameRecord],
    cfg: &RecordConfig,
) -> Result<Vec<Vec<MatchupCell>>> {
    let mut buckets: Vec<Vec<&GameRecord>> = vec![Vec::new(); n * n];
    let mut skipped = 0usize;
    for game in games {
        for idx in [game.row.index(), game.col.index()] {
            if idx >= n {
                return Err(EngineError::InvalidIndex { index: idx, len: n });
            }
        }
        if !cfg.counts_for_matrix(game) {
            skipped += 1;
            continue;
        }
        buckets[game.row.index() * n + game.col.index()].push(game);
    }
    if skipped > 0 {
        log::debug!("skipped {skipped} short or quit-out games");
    }

    let mut cells = vec![vec![MatchupCell::empty(); n]; n];
    for (slot, bucket) in buckets.iter_mut().enumerate() {
        if bucket.is_empty() {
            continue;
        }
        bucket.sort_by(|a, b| a.played_at.cmp(&b.played_at));
        let start = bucket.len().saturating_sub(cfg.window);
        let recent = &bucket[start..];
        cells[slot / n][slot % n] = pairing_cell(recent, cfg);
    }
    Ok(cells)
}

pub fn build_matrix(n: usize, games: &[GameRecord], cfg: &RecordConfig) -> Result<MatchupMatrix> {
    MatchupMatrix::from_cells(build_cells(n, games, cfg)?)
}

fn pairing_cell(recent: &[&GameRecord], cfg: &RecordConfig) -> MatchupCell {
    let matches = recent.len() as u32;
    if recent.is_empty() {
        return MatchupCell::empty();
    }
    let newest = recent.len() - 1;
    let (won, total) = recent
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(won, total), (i, g)| {
            let w = if cfg.recency_weighted {
                recency_weight(newest - i, cfg.recency_decay)
            } else {
                1.0
            };
            let result = if g.row_won_effective() { 1.0 } else { 0.0 };
            (won + w * result, total + w)
        });
    if total > 0.0 {
        MatchupCell::new(won / total, matches)
    } else {
        MatchupCell {
            win_rate: None,
            matches,
        }
    }
}
