use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ranking::RankStrategy;
use crate::records::RecordConfig;
use crate::sampler::WeightFn;
use crate::trendline::GridParams;

pub const DEFAULT_MATCH_THRESHOLD: u32 = 5;

/// Everything a host tunes per call. Hosts own persistence; this only knows
/// how to read itself from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub match_threshold: u32,
    pub ranking: RankStrategy,
    pub weighting: WeightFn,
    pub grid: GridParams,
    pub records: RecordConfig,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            ranking: RankStrategy::default(),
            weighting: WeightFn::default(),
            grid: GridParams::default(),
            records: RecordConfig::default(),
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset or unparseable variables fall back to the defaults; the grid must
    /// still be valid afterwards.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let match_threshold = parsed(&lookup, "MATCHUP_THRESHOLD").unwrap_or(d.match_threshold);

        let ranking = lookup("MATCHUP_RANKING")
            .and_then(|raw| {
                let strategy = RankStrategy::parse(&raw);
                if strategy.is_none() {
                    log::warn!("unknown MATCHUP_RANKING {raw:?}, using default");
                }
                strategy
            })
            .unwrap_or(d.ranking);

        let weighting = lookup("MATCHUP_WEIGHTING")
            .and_then(|raw| {
                let weight = WeightFn::parse(&raw, match_threshold);
                if weight.is_none() {
                    log::warn!("unknown MATCHUP_WEIGHTING {raw:?}, using default");
                }
                weight
            })
            .unwrap_or(d.weighting);

        let grid = GridParams {
            slope_min: parsed(&lookup, "MATCHUP_GRID_SLOPE_MIN").unwrap_or(d.grid.slope_min),
            slope_max: parsed(&lookup, "MATCHUP_GRID_SLOPE_MAX").unwrap_or(d.grid.slope_max),
            slope_step: parsed(&lookup, "MATCHUP_GRID_SLOPE_STEP").unwrap_or(d.grid.slope_step),
            intercept_step: parsed(&lookup, "MATCHUP_GRID_INTERCEPT_STEP")
                .unwrap_or(d.grid.intercept_step),
            intercept_span: parsed(&lookup, "MATCHUP_GRID_INTERCEPT_SPAN")
                .unwrap_or(d.grid.intercept_span),
        };
        grid.validate().context("invalid MATCHUP_GRID_* settings")?;

        let records = RecordConfig {
            window: parsed::<usize, _>(&lookup, "MATCHUP_WINDOW")
                .unwrap_or(d.records.window)
                .max(1),
            recency_decay: parsed(&lookup, "MATCHUP_DECAY").unwrap_or(d.records.recency_decay),
            ..d.records
        };

        Ok(Self {
            match_threshold,
            ranking,
            weighting,
            grid,
            records,
            seed: parsed(&lookup, "MATCHUP_SEED"),
        })
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    let value = raw.trim().parse::<T>().ok();
    if value.is_none() {
        log::warn!("ignoring unparseable {key}={raw:?}");
    }
    value
}
