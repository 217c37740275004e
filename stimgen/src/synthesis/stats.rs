//! Per-axis moments and the Pearson correlation of a point set.

use crate::types::Point;

/// Mean and population standard deviation of one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisMoments {
    pub mean: f64,
    pub std: f64,
}

pub fn axis_moments(values: impl Iterator<Item = f64> + Clone) -> AxisMoments {
    let n = values.clone().count();
    if n == 0 {
        return AxisMoments { mean: 0.0, std: 0.0 };
    }
    let mean = values.clone().sum::<f64>() / n as f64;
    let var = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
    AxisMoments {
        mean,
        std: var.sqrt(),
    }
}

pub fn x_moments(points: &[Point]) -> AxisMoments {
    axis_moments(points.iter().map(|p| p.x))
}

pub fn y_moments(points: &[Point]) -> AxisMoments {
    axis_moments(points.iter().map(|p| p.y))
}

/// (min, max) of one axis. Empty input yields (0, 0).
pub fn axis_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo > hi {
        (0.0, 0.0)
    } else {
        (lo, hi)
    }
}

/// Pearson correlation coefficient.
///
/// Returns 0.0 when either axis has zero variance or fewer than two points,
/// where the coefficient is undefined.
pub fn pearson(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    let mx = points.iter().map(|p| p.x).sum::<f64>() / n as f64;
    let my = points.iter().map(|p| p.y).sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for p in points {
        let dx = p.x - mx;
        let dy = p.y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    (sxy / denom).clamp(-1.0, 1.0)
}
