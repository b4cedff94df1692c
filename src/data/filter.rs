use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{CoverageRange, LineTable, SpectralLine};

/// Grid steps wider than this split the reference spectrum into separate ranges.
pub const COVERAGE_GAP: f64 = 1.0;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("halfwidth must be a positive number, got {0}")]
    Halfwidth(f64),
    #[error("max_ratio must lie in (0, 1], got {0}")]
    MaxRatio(f64),
}

/// Knobs of the significance filter.
///
/// A line survives when its intensity is at least `max_ratio` times the
/// strongest line within roughly `± halfwidth` of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbridgeParams {
    pub halfwidth: f64,
    pub max_ratio: f64,
}

impl Default for AbridgeParams {
    fn default() -> Self {
        Self {
            halfwidth: 3.0,
            max_ratio: 0.01,
        }
    }
}

impl AbridgeParams {
    pub fn new(halfwidth: f64, max_ratio: f64) -> Result<Self, ParamError> {
        let params = Self {
            halfwidth,
            max_ratio,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check the parameter domains (also needed after deserializing).
    pub fn validate(&self) -> Result<(), ParamError> {
        if !(self.halfwidth.is_finite() && self.halfwidth > 0.0) {
            return Err(ParamError::Halfwidth(self.halfwidth));
        }
        if !(self.max_ratio > 0.0 && self.max_ratio <= 1.0) {
            return Err(ParamError::MaxRatio(self.max_ratio));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Coverage ranges
// ---------------------------------------------------------------------------

/// Split an ascending grid into contiguous ranges wherever a step exceeds
/// [`COVERAGE_GAP`].
pub fn coverage_ranges(grid: &[f64]) -> Vec<CoverageRange> {
    let Some(&first) = grid.first() else {
        return Vec::new();
    };
    let mut ranges = Vec::new();
    let mut start = first;
    for pair in grid.windows(2) {
        if pair[1] - pair[0] > COVERAGE_GAP {
            ranges.push(CoverageRange {
                start,
                end: pair[0],
            });
            start = pair[1];
        }
    }
    ranges.push(CoverageRange {
        start,
        end: grid[grid.len() - 1],
    });
    ranges
}

/// Whether `wavenumber` lies in any of `ranges` (sorted, disjoint).
pub fn is_covered(ranges: &[CoverageRange], wavenumber: f64) -> bool {
    let idx = ranges.partition_point(|r| r.start <= wavenumber);
    idx > 0 && ranges[idx - 1].contains(wavenumber)
}

/// Drop lines that fall outside every range. Source order is kept.
pub fn restrict_to_coverage(table: &LineTable, ranges: &[CoverageRange]) -> LineTable {
    let lines = table
        .lines
        .iter()
        .filter(|l| is_covered(ranges, l.wavenumber))
        .copied()
        .collect();
    LineTable::new(table.molecule.clone(), lines)
}

// ---------------------------------------------------------------------------
// Local maximum profile
// ---------------------------------------------------------------------------

/// Strongest intensity near each integer wavenumber bin.
///
/// Bin `b` covers lines in `[b + 0.5 - halfwidth, b + 0.5 + halfwidth]`.
/// Bins whose window holds no line with a finite intensity are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMaxProfile {
    first_bin: i64,
    values: Vec<Option<f64>>,
}

impl LocalMaxProfile {
    /// Compute bins `first_bin..end_bin`.
    pub fn build(lines: &[SpectralLine], first_bin: i64, end_bin: i64, halfwidth: f64) -> Self {
        let mut sorted: Vec<(f64, f64)> = lines
            .iter()
            .filter(|l| !l.wavenumber.is_nan())
            .map(|l| (l.wavenumber, l.intensity))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let values = (first_bin..end_bin.max(first_bin))
            .map(|bin| {
                let centre = bin as f64 + 0.5;
                let lo = sorted.partition_point(|&(wn, _)| wn < centre - halfwidth);
                let hi = sorted.partition_point(|&(wn, _)| wn <= centre + halfwidth);
                sorted[lo..hi.max(lo)]
                    .iter()
                    .map(|&(_, intensity)| intensity)
                    .filter(|i| !i.is_nan())
                    .fold(None, |acc: Option<f64>, i| Some(acc.map_or(i, |m| m.max(i))))
            })
            .collect();

        Self { first_bin, values }
    }

    pub fn first_bin(&self) -> i64 {
        self.first_bin
    }

    /// Number of bins computed, defined or not.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, bin: i64) -> Option<f64> {
        let idx = usize::try_from(bin.checked_sub(self.first_bin)?).ok()?;
        self.values.get(idx).copied().flatten()
    }

    /// Local maximum for the bin a wavenumber floors into.
    pub fn at(&self, wavenumber: f64) -> Option<f64> {
        if !wavenumber.is_finite() {
            return None;
        }
        self.get(wavenumber.floor() as i64)
    }
}

// ---------------------------------------------------------------------------
// Abridger
// ---------------------------------------------------------------------------

/// Output of one filtering pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AbridgedTable {
    pub table: LineTable,
    pub params: AbridgeParams,
    /// Lines in the source table before any filtering.
    pub source_len: usize,
}

/// Reusable filter bound to one reference grid.
///
/// Coverage ranges and the bin span depend only on the grid, so they are
/// computed once and shared by every molecule.
#[derive(Debug, Clone)]
pub struct Abridger {
    params: AbridgeParams,
    ranges: Vec<CoverageRange>,
    first_bin: i64,
    end_bin: i64,
}

impl Abridger {
    pub fn new(grid: &[f64], params: AbridgeParams) -> Result<Self, ParamError> {
        params.validate()?;
        let ranges = coverage_ranges(grid);
        let (first_bin, end_bin) = match (ranges.first(), ranges.last()) {
            (Some(first), Some(last)) => (first.start.floor() as i64, last.end.ceil() as i64),
            _ => (0, 0),
        };
        Ok(Self {
            params,
            ranges,
            first_bin,
            end_bin,
        })
    }

    pub fn params(&self) -> AbridgeParams {
        self.params
    }

    pub fn ranges(&self) -> &[CoverageRange] {
        &self.ranges
    }

    /// Local-maximum profile of a table already restricted to coverage.
    pub fn profile(&self, restricted: &LineTable) -> LocalMaxProfile {
        LocalMaxProfile::build(
            &restricted.lines,
            self.first_bin,
            self.end_bin,
            self.params.halfwidth,
        )
    }

    /// Keep only the locally significant lines of `table`.
    ///
    /// A line whose bin has no local maximum is dropped.
    pub fn abridge(&self, table: &LineTable) -> AbridgedTable {
        let restricted = restrict_to_coverage(table, &self.ranges);
        let profile = self.profile(&restricted);
        let ratio = self.params.max_ratio;

        let lines: Vec<SpectralLine> = restricted
            .lines
            .into_iter()
            .filter(|l| match profile.at(l.wavenumber) {
                Some(local_max) => l.intensity >= ratio * local_max,
                None => false,
            })
            .collect();

        log::debug!(
            "{}: {} lines, {} kept across {} coverage ranges",
            table.molecule,
            table.len(),
            lines.len(),
            self.ranges.len()
        );

        AbridgedTable {
            table: LineTable::new(table.molecule.clone(), lines),
            params: self.params,
            source_len: table.len(),
        }
    }
}

/// One-shot convenience wrapper around [`Abridger`].
pub fn abridge(
    table: &LineTable,
    grid: &[f64],
    params: AbridgeParams,
) -> Result<AbridgedTable, ParamError> {
    Ok(Abridger::new(grid, params)?.abridge(table))
}
