use serde::{Deserialize, Serialize};

use crate::error::{DegenerateFit, EngineError, Result};
use crate::matrix::{MatchupCell, MatchupMatrix};

/// Points closer than this to a candidate line count for neither side.
const ON_LINE_EPS: f64 = 1e-9;
/// Degeneracy cutoff, relative to the magnitude of the data being fitted.
const REL_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightedPoint {
    pub point: Point,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSide {
    Above,
    Below,
    On,
}

/// `y = k·x + d` in the unit square, x = column position, y = row position
/// with row 0 at the top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendLine {
    pub k: f64,
    pub d: f64,
}

impl TrendLine {
    pub fn new(k: f64, d: f64) -> Self {
        Self { k, d }
    }

    pub fn y_at(&self, x: f64) -> f64 {
        self.k * x + self.d
    }

    /// `None` for a horizontal line.
    pub fn x_at(&self, y: f64) -> Option<f64> {
        (self.k != 0.0).then(|| (y - self.d) / self.k)
    }

    pub fn side_of(&self, p: Point) -> LineSide {
        let diff = p.y - self.y_at(p.x);
        if diff.abs() < ON_LINE_EPS {
            LineSide::On
        } else if diff > 0.0 {
            LineSide::Above
        } else {
            LineSide::Below
        }
    }

    /// The part of the line inside `[0,1]²`, left end first. `None` when the
    /// line misses the square.
    pub fn clip_to_unit_square(&self) -> Option<(Point, Point)> {
        let mut hits: Vec<Point> = vec![Point::new(0.0, self.d), Point::new(1.0, self.y_at(1.0))];
        if let Some(x) = self.x_at(0.0) {
            hits.push(Point::new(x, 0.0));
        }
        if let Some(x) = self.x_at(1.0) {
            hits.push(Point::new(x, 1.0));
        }
        let inside = |v: f64| (-ON_LINE_EPS..=1.0 + ON_LINE_EPS).contains(&v);
        hits.retain(|p| inside(p.x) && inside(p.y));
        let left = hits.iter().copied().min_by(|a, b| a.x.total_cmp(&b.x))?;
        let right = hits.iter().copied().max_by(|a, b| a.x.total_cmp(&b.x))?;
        Some((left, right))
    }
}

/// Center of cell `(row, col)` in an `n`×`n` matrix.
pub fn cell_center(row: usize, col: usize, n: usize) -> Point {
    let n = n.max(1) as f64;
    Point::new((col as f64 + 0.5) / n, 1.0 - (row as f64 + 0.5) / n)
}

/// Confidence of a cell: distance from even scaled by `sqrt(matches)`. Cells
/// under `threshold` matches or without data weigh nothing.
pub fn cell_weight(cell: &MatchupCell, threshold: u32) -> f64 {
    if cell.matches < threshold {
        return 0.0;
    }
    cell.win_rate
        .map(|wr| (wr - 0.5).abs() * (cell.matches as f64).sqrt())
        .unwrap_or(0.0)
}

/// Every cell with positive weight, at its center.
pub fn weighted_cells(matrix: &MatchupMatrix, threshold: u32) -> Vec<WeightedPoint> {
    let n = matrix.dimension();
    let mut out = Vec::new();
    for (r, row) in matrix.rows().iter().enumerate() {
        for (c, named) in row.iter().enumerate() {
            let weight = cell_weight(&named.cell, threshold);
            if weight > 0.0 {
                out.push(WeightedPoint {
                    point: cell_center(r, c, n),
                    weight,
                });
            }
        }
    }
    out
}

/// One point per row: the weighted mean column position at the row's height.
/// Rows with no weight are dropped.
pub fn collapse_rows(matrix: &MatchupMatrix, threshold: u32) -> Vec<Point> {
    let n = matrix.dimension();
    matrix
        .rows()
        .iter()
        .enumerate()
        .filter_map(|(r, row)| {
            let (sum_wx, sum_w) = row.iter().enumerate().fold((0.0, 0.0), |(wx, w), (c, named)| {
                let cw = cell_weight(&named.cell, threshold);
                (wx + cw * cell_center(r, c, n).x, w + cw)
            });
            (sum_w > 0.0).then(|| Point::new(sum_wx / sum_w, cell_center(r, 0, n).y))
        })
        .collect()
}

/// Closed-form ordinary least squares on vertical residuals.
pub fn fit_least_squares(points: &[Point]) -> Result<TrendLine> {
    if points.len() < 2 {
        return Err(DegenerateFit::TooFewPoints(points.len()).into());
    }
    let n = points.len() as f64;
    let (mut sx, mut sy, mut sxy, mut sxx) = (0.0, 0.0, 0.0, 0.0);
    for p in points {
        sx += p.x;
        sy += p.y;
        sxy += p.x * p.y;
        sxx += p.x * p.x;
    }
    let denom = n * sxx - sx * sx;
    if denom <= REL_EPS * n * sxx {
        return Err(DegenerateFit::SharedX.into());
    }
    let k = (n * sxy - sx * sy) / denom;
    let d = (sy - k * sx) / n;
    Ok(TrendLine::new(k, d))
}

/// Total least squares: the line through the centroid along the dominant
/// eigenvector of the 2×2 covariance matrix.
pub fn fit_principal_axis(points: &[Point]) -> Result<TrendLine> {
    if points.len() < 2 {
        return Err(DegenerateFit::TooFewPoints(points.len()).into());
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.y).sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for p in points {
        let dx = p.x - mean_x;
        let dy = p.y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    sxx /= n;
    syy /= n;
    sxy /= n;

    let trace = sxx + syy;
    let magnitude = points.iter().map(|p| p.x * p.x + p.y * p.y).sum::<f64>() / n;
    if trace <= REL_EPS * magnitude {
        return Err(DegenerateFit::ZeroCovariance.into());
    }

    let det = sxx * syy - sxy * sxy;
    let disc = (trace * trace / 4.0 - det).max(0.0).sqrt();
    if disc <= REL_EPS * trace {
        return Err(DegenerateFit::Isotropic.into());
    }
    let lambda = trace / 2.0 + disc;

    let (vx, vy) = if sxy.abs() > REL_EPS * trace {
        (lambda - syy, sxy)
    } else if sxx > syy {
        (1.0, 0.0)
    } else {
        (0.0, 1.0)
    };
    if vx.abs() <= REL_EPS * lambda {
        return Err(DegenerateFit::Vertical.into());
    }

    let k = vy / vx;
    Ok(TrendLine::new(k, mean_y - k * mean_x))
}

/// Search space for [`fit_grid_search`]. Cost grows with
/// `(slope range / slope_step) × (intercept range / intercept_step)`, so the
/// steps are the accuracy/latency knob.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridParams {
    pub slope_min: f64,
    pub slope_max: f64,
    pub slope_step: f64,
    pub intercept_step: f64,
    /// Intercepts run over `[0, -k + intercept_span]`.
    pub intercept_span: f64,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            slope_min: -30.0,
            slope_max: 0.0,
            slope_step: 0.1,
            intercept_step: 0.05,
            intercept_span: 1.0,
        }
    }
}

impl GridParams {
    pub fn validate(&self) -> Result<()> {
        let all = [
            self.slope_min,
            self.slope_max,
            self.slope_step,
            self.intercept_step,
            self.intercept_span,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::InvalidGrid("values must be finite".to_string()));
        }
        if self.slope_step <= 0.0 || self.intercept_step <= 0.0 {
            return Err(EngineError::InvalidGrid("steps must be positive".to_string()));
        }
        if self.slope_min > self.slope_max {
            return Err(EngineError::InvalidGrid(format!(
                "slope_min {} exceeds slope_max {}",
                self.slope_min, self.slope_max
            )));
        }
        Ok(())
    }

    fn slope_steps(&self) -> usize {
        ((self.slope_max - self.slope_min) / self.slope_step + 1e-9).floor() as usize
    }

    /// Slope of step `si`; the last step lands exactly on `slope_max`.
    fn slope_at(&self, si: usize) -> f64 {
        (self.slope_min + si as f64 * self.slope_step).min(self.slope_max)
    }

    fn intercept_steps(&self, k: f64) -> Option<usize> {
        let d_max = -k + self.intercept_span;
        (d_max >= 0.0).then(|| (d_max / self.intercept_step + 1e-9).floor() as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridFit {
    pub line: TrendLine,
    pub split_difference: f64,
    pub candidates: usize,
}

/// `|Σ weight above − Σ weight below|`; points on the line count for neither.
pub fn split_difference(cells: &[WeightedPoint], line: TrendLine) -> f64 {
    let (above, below) = cells.iter().fold((0.0, 0.0), |(a, b), wp| match line.side_of(wp.point) {
        LineSide::Above => (a + wp.weight, b),
        LineSide::Below => (a, b + wp.weight),
        LineSide::On => (a, b),
    });
    (above - below).abs()
}

/// Brute-force scan for the line that splits the cell weight most evenly.
/// Slopes ascend from `slope_min`, intercepts from 0; the first candidate with
/// the lowest split wins.
pub fn fit_grid_search(matrix: &MatchupMatrix, threshold: u32, params: &GridParams) -> Result<GridFit> {
    fit_grid_search_cells(&weighted_cells(matrix, threshold), params)
}

pub fn fit_grid_search_cells(cells: &[WeightedPoint], params: &GridParams) -> Result<GridFit> {
    params.validate()?;

    let mut best: Option<GridFit> = None;
    let mut candidates = 0usize;
    for si in 0..=params.slope_steps() {
        let k = params.slope_at(si);
        let Some(d_steps) = params.intercept_steps(k) else {
            continue;
        };
        for di in 0..=d_steps {
            let line = TrendLine::new(k, di as f64 * params.intercept_step);
            let split = split_difference(cells, line);
            candidates += 1;
            if best.is_none_or(|b| split < b.split_difference) {
                best = Some(GridFit {
                    line,
                    split_difference: split,
                    candidates: 0,
                });
            }
        }
    }

    let mut fit = best.ok_or_else(|| {
        EngineError::InvalidGrid("no candidate line intersects the intercept range".to_string())
    })?;
    fit.candidates = candidates;
    log::debug!(
        "grid search: {} candidates over {} cells, best k={:.3} d={:.3} split={:.4}",
        candidates,
        cells.len(),
        fit.line.k,
        fit.line.d,
        fit.split_difference
    );
    Ok(fit)
}
