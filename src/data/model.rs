use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// SpectralLine – one row of a line catalog
// ---------------------------------------------------------------------------

/// Spectroscopic columns carried along from a HITRAN record.
/// The abridger never looks at these.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineAux {
    pub molecule_num: Option<u8>,
    pub isotope_num: Option<u8>,
    pub weighted_transition: f64,
    pub air_hwhm: f64,
    pub self_hwhm: f64,
    pub lower_energy: f64,
    /// Temperature dependence exponent of `air_hwhm`.
    pub air_hwhm_temp_dependence: f64,
    pub air_pressure_shift: f64,
}

/// A single transition. Malformed numeric fields are stored as NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralLine {
    /// Line centre (cm⁻¹).
    pub wavenumber: f64,
    /// Line strength.
    pub intensity: f64,
    pub aux: Option<LineAux>,
}

impl SpectralLine {
    pub fn new(wavenumber: f64, intensity: f64) -> Self {
        Self {
            wavenumber,
            intensity,
            aux: None,
        }
    }
}

// ---------------------------------------------------------------------------
// LineTable – all lines of one molecule, in source order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineTable {
    pub molecule: String,
    pub lines: Vec<SpectralLine>,
}

impl LineTable {
    pub fn new(molecule: impl Into<String>, lines: Vec<SpectralLine>) -> Self {
        Self {
            molecule: molecule.into(),
            lines,
        }
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines with `lo <= wavenumber <= hi`, source order kept.
    pub fn lines_between(&self, lo: f64, hi: f64) -> impl Iterator<Item = &SpectralLine> {
        self.lines
            .iter()
            .filter(move |l| l.wavenumber >= lo && l.wavenumber <= hi)
    }
}

// ---------------------------------------------------------------------------
// CoverageRange – a contiguous stretch of the reference grid
// ---------------------------------------------------------------------------

/// Closed wavenumber interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageRange {
    pub start: f64,
    pub end: f64,
}

impl CoverageRange {
    pub fn contains(&self, wavenumber: f64) -> bool {
        wavenumber >= self.start && wavenumber <= self.end
    }
}

impl fmt::Display for CoverageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.4}, {:.4}]", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// ReferenceSpectrum – the telluric transmission model
// ---------------------------------------------------------------------------

/// Ascending wavenumber grid plus one or more transmission curves.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSpectrum {
    pub wavenumber: Vec<f64>,
    /// Column name → samples, same length as `wavenumber`.
    pub curves: BTreeMap<String, Vec<f64>>,
}

impl ReferenceSpectrum {
    pub fn len(&self) -> usize {
        self.wavenumber.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavenumber.is_empty()
    }
}

/// Start/end wavenumber of one spectrometer order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderBoundary {
    pub start: f64,
    pub end: f64,
}

// ---------------------------------------------------------------------------
// LoadReport – bookkeeping for the "skip bad rows" policy
// ---------------------------------------------------------------------------

/// How many rows a loader read and how many had a field coerced to NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub rows: usize,
    pub malformed_rows: usize,
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rows, {} malformed", self.rows, self.malformed_rows)
    }
}
