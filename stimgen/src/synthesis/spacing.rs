//! Minimum-separation refinement.
//!
//! Crowded points (those with a neighbour closer than `min_distance`) receive
//! small Gaussian jitter for a bounded number of rounds. A round that would
//! leave more violating pairs than before is rolled back, so the violation
//! count never grows. The contract is best-effort: the caller gets whatever
//! separation the rounds achieved.
//!
//! With default settings few point sets end fully separated: roughly 3% of
//! `accurate` runs and 15% of `coarse` runs report
//! [`SpacingReport::resolved`]. Treat the remaining violation count as a
//! quality measure, not a pass/fail check.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::types::Point;

/// Dense symmetric pairwise distance matrix (row-major, n × n).
pub struct DistanceMatrix {
    n: usize,
    d: Vec<f64>,
}

impl DistanceMatrix {
    pub fn new(points: &[Point]) -> Self {
        let n = points.len();
        let mut d = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let dist = points[i].distance(&points[j]);
                d[i * n + j] = dist;
                d[j * n + i] = dist;
            }
        }
        Self { n, d }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.d[i * self.n + j]
    }

    /// Smallest off-diagonal entry, or +∞ with fewer than two points.
    pub fn min_off_diagonal(&self) -> f64 {
        let mut best = f64::INFINITY;
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                best = best.min(self.get(i, j));
            }
        }
        best
    }

    /// Number of unordered pairs closer than `min_distance`.
    pub fn violations(&self, min_distance: f64) -> usize {
        let mut count = 0;
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                if self.get(i, j) < min_distance {
                    count += 1;
                }
            }
        }
        count
    }

    /// Per-point flag: has at least one neighbour closer than `min_distance`.
    pub fn crowded(&self, min_distance: f64) -> Vec<bool> {
        (0..self.n)
            .map(|i| (0..self.n).any(|j| j != i && self.get(i, j) < min_distance))
            .collect()
    }
}

/// Outcome of spacing refinement for one point set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpacingReport {
    /// Violating pairs before any jitter.
    pub initial_violations: usize,
    /// Violating pairs after each round that ran (rolled-back rounds repeat
    /// the previous count).
    pub rounds: Vec<usize>,
    /// Smallest pairwise distance of the final set (+∞ below two points).
    pub min_distance: f64,
}

impl SpacingReport {
    pub fn final_violations(&self) -> usize {
        self.rounds.last().copied().unwrap_or(self.initial_violations)
    }

    pub fn resolved(&self) -> bool {
        self.final_violations() == 0
    }

    /// Violation counts never increase from one round to the next.
    pub fn is_monotone(&self) -> bool {
        let mut prev = self.initial_violations;
        for &v in &self.rounds {
            if v > prev {
                return false;
            }
            prev = v;
        }
        true
    }
}

/// Jitter crowded points until no pair is closer than `min_distance` or
/// `max_rounds` rounds have run. Jitter σ is `jitter_fraction · min_distance`
/// per axis; coordinates are re-clipped to [0, 1].
pub fn enforce_min_distance<R: Rng>(
    points: &mut [Point],
    min_distance: f64,
    max_rounds: usize,
    jitter_fraction: f64,
    rng: &mut R,
) -> SpacingReport {
    if points.len() < 2 {
        return SpacingReport {
            initial_violations: 0,
            rounds: Vec::new(),
            min_distance: f64::INFINITY,
        };
    }

    let mut matrix = DistanceMatrix::new(points);
    let mut current = matrix.violations(min_distance);
    let mut report = SpacingReport {
        initial_violations: current,
        rounds: Vec::new(),
        min_distance: matrix.min_off_diagonal(),
    };
    if current == 0 {
        return report;
    }

    let sigma = min_distance * jitter_fraction;
    let mut candidate = points.to_vec();
    for _ in 0..max_rounds {
        let crowded = matrix.crowded(min_distance);
        candidate.copy_from_slice(points);
        for (p, &is_crowded) in candidate.iter_mut().zip(crowded.iter()) {
            if !is_crowded {
                continue;
            }
            let dx: f64 = rng.sample(StandardNormal);
            let dy: f64 = rng.sample(StandardNormal);
            *p = Point::new(p.x + sigma * dx, p.y + sigma * dy).clipped();
        }

        let next_matrix = DistanceMatrix::new(&candidate);
        let next = next_matrix.violations(min_distance);
        if next <= current {
            points.copy_from_slice(&candidate);
            matrix = next_matrix;
            current = next;
        }
        report.rounds.push(current);
        if current == 0 {
            break;
        }
    }

    report.min_distance = matrix.min_off_diagonal();
    report
}
