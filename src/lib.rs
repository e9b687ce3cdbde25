pub mod config;
pub mod error;
pub mod glicko;
pub mod logging;
pub mod matrix;
pub mod ranking;
pub mod records;
pub mod roster;
pub mod sampler;
pub mod tiers;
pub mod transform;
pub mod trendline;
pub mod view;
pub mod wire;

pub use error::{EngineError, Result};
pub use matrix::{Competitor, CompetitorMask, MatchupCell, MatchupMatrix, NamedMatchupCell};
