//! Core value types: points, correlation levels, and topics.
//!
//! A [`Point`] serializes as a two-element JSON array `[x, y]`, which is the
//! shape the study engine reads from a stimulus' `coordinates` parameter.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::constants::{clamp_target, LEVEL_STEP, MAX_TARGET, MIN_SPREAD_MAGNITUDE};

/// A point in the unit square.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Clip both coordinates to [0, 1].
    #[inline]
    pub fn clipped(self) -> Self {
        Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
        }
    }

    pub fn in_unit_square(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.x, self.y].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [x, y] = <[f64; 2]>::deserialize(deserializer)?;
        Ok(Point { x, y })
    }
}

/// Ordered point set. Order is insertion order and carries no meaning.
pub type PointSet = Vec<Point>;

// ── Correlation direction ──

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "pos")]
    Positive,
    #[serde(rename = "neg")]
    Negative,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Positive => "pos",
            Direction::Negative => "neg",
        }
    }

    pub fn sign(&self) -> f64 {
        match self {
            Direction::Positive => 1.0,
            Direction::Negative => -1.0,
        }
    }
}

/// Target correlation for a discrete level (2 → 0.2, 8 → 0.8), signed by direction.
pub fn level_target(level: u32, direction: Direction) -> f64 {
    clamp_target(direction.sign() * level as f64 * LEVEL_STEP)
}

/// `count` evenly spaced targets over `level_target ± band`.
///
/// The magnitude is kept within [0.01, 0.99] so every target keeps the
/// level's sign. A single target sits at the lower end of the band.
pub fn spread_targets(level: u32, direction: Direction, band: f64, count: usize) -> Vec<f64> {
    let base = level as f64 * LEVEL_STEP;
    let lo = (base - band).max(MIN_SPREAD_MAGNITUDE);
    let hi = (base + band).min(MAX_TARGET);
    linspace(lo, hi, count)
        .into_iter()
        .map(|t| direction.sign() * t)
        .collect()
}

/// Evenly spaced values over `[start, end]`, endpoints included.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    if i == count - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

// ── Topics ──

/// A labelled relationship shown alongside a stimulus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Full sentence describing the relationship.
    pub label: String,
    /// X axis name.
    pub x: String,
    /// Y axis name.
    pub y: String,
}

impl Topic {
    pub fn new(label: impl Into<String>, x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            x: x.into(),
            y: y.into(),
        }
    }
}
