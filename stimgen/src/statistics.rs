//! Correlation report over a generated component table.
//!
//! Summarizes every `correlation` value the table carries (one per
//! synthesized component, so labelled cells count once per delay), with a
//! fixed-bin histogram between the observed extremes.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::design::{ComponentTable, SynthesisTally};
use crate::error::{Result, StimgenError};
use crate::synthesis::stats::axis_moments;

/// Width of the longest histogram bar.
const BAR_WIDTH: usize = 50;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CorrelationSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub histogram: Vec<HistogramBin>,
    pub tolerance_misses: usize,
    pub unresolved_spacing: usize,
}

impl CorrelationSummary {
    /// Summary of `values`; `None` when there are none.
    pub fn from_values(values: &[f64], bins: usize) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let moments = axis_moments(values.iter().copied());
        Some(Self {
            count: values.len(),
            min,
            max,
            mean: moments.mean,
            std_dev: moments.std,
            histogram: histogram(values, min, max, bins),
            tolerance_misses: 0,
            unresolved_spacing: 0,
        })
    }

    pub fn from_table(table: &ComponentTable, tally: &SynthesisTally, bins: usize) -> Option<Self> {
        Self::from_values(&table.correlations(), bins).map(|mut s| {
            s.tolerance_misses = tally.tolerance_misses;
            s.unresolved_spacing = tally.unresolved_spacing;
            s
        })
    }

    /// Text bar chart, one line per bin.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Total correlations: {}", self.count);
        let _ = writeln!(
            out,
            "Min: {:.4}, Max: {:.4}, Mean: {:.4}, Std: {:.4}",
            self.min, self.max, self.mean, self.std_dev
        );
        let _ = writeln!(
            out,
            "Tolerance misses: {}, unresolved spacing: {}",
            self.tolerance_misses, self.unresolved_spacing
        );
        let _ = writeln!(out, "\nHistogram (bins: {}):", self.histogram.len());
        let _ = writeln!(out, "{:<20} {:<10} Bar", "Bin Range", "Count");
        let _ = writeln!(out, "{}", "-".repeat(60));
        let max_count = self.histogram.iter().map(|b| b.count).max().unwrap_or(0);
        for bin in &self.histogram {
            let bar_len = if max_count > 0 {
                (BAR_WIDTH as u64 * bin.count as u64 / max_count as u64) as usize
            } else {
                0
            };
            let _ = writeln!(
                out,
                "[{:7.4}, {:7.4})  {:<10} {}",
                bin.lower,
                bin.upper,
                bin.count,
                "█".repeat(bar_len)
            );
        }
        out
    }
}

/// Equal-width bins over `[min, max]`; the last bin is closed on the right.
fn histogram(values: &[f64], min: f64, max: f64, bins: usize) -> Vec<HistogramBin> {
    let bins = bins.max(1);
    let span = max - min;
    let width = if span > 0.0 { span / bins as f64 } else { 1.0 / bins as f64 };
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + i as f64 * width,
            upper: min + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();
    for &v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

pub fn save_summary(summary: &CorrelationSummary, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| StimgenError::io(parent, e))?;
        }
    }
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json).map_err(|e| StimgenError::io(path, e))
}
