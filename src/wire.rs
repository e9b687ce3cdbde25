use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::matrix::{MatchupCell, MatchupMatrix};

/// Which player port a game result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    P1,
    P2,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::P1 => Side::P2,
            Side::P2 => Side::P1,
        }
    }
}

/// The snapshot pushed on every matchup update. Rows are P1's characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupUpdate {
    pub matchups: Vec<Vec<MatchupCell>>,
    #[serde(default)]
    pub winner: Option<Side>,
}

impl MatchupUpdate {
    pub fn matrix(&self) -> Result<MatchupMatrix> {
        MatchupMatrix::from_cells(self.matchups.clone())
    }
}

pub fn parse_matrix_json(raw: &str) -> Result<MatchupMatrix> {
    let cells: Vec<Vec<MatchupCell>> = serde_json::from_str(raw)?;
    MatchupMatrix::from_cells(cells)
}

pub fn parse_update_json(raw: &str) -> Result<MatchupUpdate> {
    Ok(serde_json::from_str(raw)?)
}
