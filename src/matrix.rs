use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Stable roster index of a competitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Competitor(pub usize);

impl Competitor {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One head-to-head statistic as the producer ships it.
///
/// `win_rate` is `None` when there is no data. On the wire that is the string
/// `"nan"`, which is also what we write back out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchupCell {
    #[serde(default, with = "win_rate_wire")]
    pub win_rate: Option<f64>,
    #[serde(default)]
    pub matches: u32,
}

impl MatchupCell {
    pub fn new(win_rate: f64, matches: u32) -> Self {
        Self {
            win_rate: Some(win_rate),
            matches,
        }
    }

    pub fn empty() -> Self {
        Self {
            win_rate: None,
            matches: 0,
        }
    }

    /// Signed distance from an even matchup.
    pub fn offset(&self) -> Option<f64> {
        self.win_rate.map(|wr| wr - 0.5)
    }

    /// The same statistic seen from the column competitor's side.
    pub fn inverted(&self) -> Self {
        Self {
            win_rate: self.win_rate.map(|wr| 1.0 - wr),
            matches: self.matches,
        }
    }
}

impl Default for MatchupCell {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NamedMatchupCell {
    pub with: Competitor,
    pub against: Competitor,
    #[serde(flatten)]
    pub cell: MatchupCell,
}

/// Square grid of named cells, `rows[row][col]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MatchupMatrix {
    pub(crate) rows: Vec<Vec<NamedMatchupCell>>,
}

impl MatchupMatrix {
    /// Attach roster indices to a raw producer grid. Row `i` is competitor `i`.
    pub fn from_cells(cells: Vec<Vec<MatchupCell>>) -> Result<Self> {
        let n = cells.len();
        let mut rows = Vec::with_capacity(n);
        for (i, row) in cells.into_iter().enumerate() {
            if row.len() != n {
                return Err(EngineError::NotSquare {
                    row: i,
                    expected: n,
                    found: row.len(),
                });
            }
            rows.push(
                row.into_iter()
                    .enumerate()
                    .map(|(j, cell)| NamedMatchupCell {
                        with: Competitor(i),
                        against: Competitor(j),
                        cell,
                    })
                    .collect(),
            );
        }
        Ok(Self { rows })
    }

    pub fn from_named_rows(rows: Vec<Vec<NamedMatchupCell>>) -> Result<Self> {
        let n = rows.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n) {
            return Err(EngineError::NotSquare {
                row: i,
                expected: n,
                found: row.len(),
            });
        }
        Ok(Self { rows })
    }

    pub fn dimension(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<NamedMatchupCell>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[NamedMatchupCell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&NamedMatchupCell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn cells(&self) -> impl Iterator<Item = &NamedMatchupCell> + '_ {
        self.rows.iter().flat_map(|row| row.iter())
    }

    /// Competitor labels down the left edge, top to bottom.
    pub fn row_competitors(&self) -> Vec<Competitor> {
        self.rows
            .iter()
            .filter_map(|row| row.first().map(|c| c.with))
            .collect()
    }

    /// Competitor labels along the top edge, left to right.
    pub fn col_competitors(&self) -> Vec<Competitor> {
        self.rows
            .first()
            .map(|row| row.iter().map(|c| c.against).collect())
            .unwrap_or_default()
    }

    pub fn raw_cells(&self) -> Vec<Vec<MatchupCell>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|c| c.cell).collect())
            .collect()
    }
}

/// Inclusion filter over the competitors of a matrix, `false` drops both the
/// row and the column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompetitorMask(Vec<bool>);

impl CompetitorMask {
    pub fn all(n: usize) -> Self {
        Self(vec![true; n])
    }

    pub fn from_flags(flags: Vec<bool>) -> Self {
        Self(flags)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn flags(&self) -> &[bool] {
        &self.0
    }

    pub fn is_included(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    pub fn set(&mut self, index: usize, included: bool) -> Result<()> {
        let len = self.0.len();
        let slot = self
            .0
            .get_mut(index)
            .ok_or(EngineError::InvalidIndex { index, len })?;
        *slot = included;
        Ok(())
    }

    pub fn included_count(&self) -> usize {
        self.0.iter().filter(|f| **f).count()
    }

    pub fn excluded_indices(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, keep)| (!keep).then_some(i))
            .collect()
    }
}

mod win_rate_wire {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_f64(*v),
            None => s.serialize_str("nan"),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Option::<Raw>::deserialize(d)? {
            None => Ok(None),
            Some(Raw::Number(v)) => Ok(v.is_finite().then_some(v)),
            Some(Raw::Text(raw)) => {
                let s = raw.trim();
                if s.is_empty() || s.eq_ignore_ascii_case("nan") {
                    return Ok(None);
                }
                let v = s
                    .parse::<f64>()
                    .map_err(|_| <D::Error as serde::de::Error>::custom(format!("invalid win_rate {raw:?}")))?;
                Ok(v.is_finite().then_some(v))
            }
        }
    }
}
