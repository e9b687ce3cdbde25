use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("index {index} out of range for dimension {len}")]
    InvalidIndex { index: usize, len: usize },

    #[error("mask has {found} entries, matrix has {expected} competitors")]
    MaskLength { expected: usize, found: usize },

    #[error("order of length {found} is not a permutation of 0..{expected}")]
    NotAPermutation { expected: usize, found: usize },

    #[error("row {row} has {found} cells, expected {expected}")]
    NotSquare {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("no positive sampling weight (row {row:?})")]
    DegenerateSample { row: Option<usize> },

    #[error("degenerate fit: {0}")]
    DegenerateFit(DegenerateFit),

    #[error("invalid grid parameters: {0}")]
    InvalidGrid(String),

    #[error("JSON Parse Error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a closed-form trendline could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateFit {
    TooFewPoints(usize),
    /// Every point shares one x, the slope would be infinite.
    SharedX,
    ZeroCovariance,
    /// Equal variance on both axes and no correlation: no principal direction.
    Isotropic,
    /// The principal axis is vertical.
    Vertical,
}

impl std::fmt::Display for DegenerateFit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegenerateFit::TooFewPoints(n) => write!(f, "need at least 2 points, got {n}"),
            DegenerateFit::SharedX => write!(f, "all points share one x coordinate"),
            DegenerateFit::ZeroCovariance => write!(f, "covariance matrix is zero"),
            DegenerateFit::Isotropic => write!(f, "covariance has no dominant axis"),
            DegenerateFit::Vertical => write!(f, "principal axis is vertical"),
        }
    }
}

impl From<DegenerateFit> for EngineError {
    fn from(reason: DegenerateFit) -> Self {
        EngineError::DegenerateFit(reason)
    }
}
