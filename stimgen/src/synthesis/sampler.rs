//! Correlated bivariate-normal draws and their mapping into the unit square.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::constants::MIN_RESIDUAL_VARIANCE;
use crate::types::Point;

use super::config::Scaling;
use super::stats::{axis_range, x_moments, y_moments};

/// Linear map turning independent standard normals into a correlated pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CorrelationMap {
    /// Lower-triangular Cholesky factor `[[1, 0], [r, sqrt(1 - r²)]]`.
    Cholesky { l21: f64, l22: f64 },
    /// `y = r·x + sqrt(max(floor, 1 - r²))·z`, used when `1 - r²` is not
    /// positive so the covariance has no Cholesky factor.
    LinearMix { weight: f64, residual: f64 },
}

impl CorrelationMap {
    pub fn new(r: f64) -> Self {
        let residual = 1.0 - r * r;
        if residual > 0.0 && residual.is_finite() {
            CorrelationMap::Cholesky {
                l21: r,
                l22: residual.max(MIN_RESIDUAL_VARIANCE).sqrt(),
            }
        } else {
            CorrelationMap::LinearMix {
                weight: if r.is_finite() { r.clamp(-1.0, 1.0) } else { 0.0 },
                residual: MIN_RESIDUAL_VARIANCE.sqrt(),
            }
        }
    }

    #[inline]
    pub fn apply(&self, z0: f64, z1: f64) -> Point {
        match *self {
            CorrelationMap::Cholesky { l21, l22 } => Point::new(z0, l21 * z0 + l22 * z1),
            CorrelationMap::LinearMix { weight, residual } => {
                Point::new(z0, weight * z0 + residual * z1)
            }
        }
    }
}

/// Draw `n` correlated standard-normal pairs.
pub fn draw_correlated<R: Rng>(rng: &mut R, r: f64, n: usize) -> Vec<Point> {
    let map = CorrelationMap::new(r);
    (0..n)
        .map(|_| {
            let z0: f64 = rng.sample(StandardNormal);
            let z1: f64 = rng.sample(StandardNormal);
            map.apply(z0, z1)
        })
        .collect()
}

/// Centre and scale each axis to zero mean, unit (population) variance.
/// Zero-variance axes are only centred.
pub fn standardize(points: &mut [Point]) {
    let mx = x_moments(points);
    let my = y_moments(points);
    let sx = if mx.std == 0.0 { 1.0 } else { mx.std };
    let sy = if my.std == 0.0 { 1.0 } else { my.std };
    for p in points.iter_mut() {
        p.x = (p.x - mx.mean) / sx;
        p.y = (p.y - my.mean) / sy;
    }
}

/// Per-axis min–max rescale to [0, 1]. Constant axes map to 0.
pub fn min_max(points: &mut [Point]) {
    let (x_lo, x_hi) = axis_range(points.iter().map(|p| p.x));
    let (y_lo, y_hi) = axis_range(points.iter().map(|p| p.y));
    let x_span = if x_hi - x_lo == 0.0 { 1.0 } else { x_hi - x_lo };
    let y_span = if y_hi - y_lo == 0.0 { 1.0 } else { y_hi - y_lo };
    for p in points.iter_mut() {
        p.x = (p.x - x_lo) / x_span;
        p.y = (p.y - y_lo) / y_span;
    }
}

/// Map raw correlated samples into the unit square.
pub fn to_unit_square(points: &mut [Point], scaling: Scaling) {
    match scaling {
        Scaling::MinMax => min_max(points),
        Scaling::SigmaWindow { sigmas, min_span } => {
            standardize(points);
            for p in points.iter_mut() {
                *p = Point::new(p.x / sigmas + 0.5, p.y / sigmas + 0.5).clipped();
            }
            let (x_lo, x_hi) = axis_range(points.iter().map(|p| p.x));
            let (y_lo, y_hi) = axis_range(points.iter().map(|p| p.y));
            if x_hi - x_lo < min_span || y_hi - y_lo < min_span {
                min_max(points);
            }
        }
    }
}
