use anyhow::Result;

use crate::data::model::LineTable;
use crate::registry::MoleculeRegistry;

/// Orders of magnitude below the strongest visible line that still get a stick.
const DYNAMIC_RANGE_DECADES: i32 = 2;
/// Vertical band (in plot units, 0..1) given to each molecule.
const SLOT_HEIGHT: f64 = 0.1;
/// Baseline of the lowest band.
const SLOT_BASE: f64 = 0.05;

// ---------------------------------------------------------------------------
// Visible wavenumber window
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewWindow {
    pub central_wavenumber: f64,
    pub bandwidth: f64,
}

impl Default for ViewWindow {
    fn default() -> Self {
        Self {
            central_wavenumber: 1000.0,
            bandwidth: 10.0,
        }
    }
}

impl ViewWindow {
    /// `(low, high)` wavenumber limits.
    pub fn xlim(&self) -> (f64, f64) {
        let half = self.bandwidth / 2.0;
        (self.central_wavenumber - half, self.central_wavenumber + half)
    }

    pub fn contains(&self, wavenumber: f64) -> bool {
        let (lo, hi) = self.xlim();
        wavenumber >= lo && wavenumber <= hi
    }

    /// Shift by whole window widths; negative steps move to lower wavenumber.
    pub fn pan(&mut self, steps: f64) {
        self.central_wavenumber += self.bandwidth * steps;
    }
}

// ---------------------------------------------------------------------------
// Stick overlays
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stick {
    pub wavenumber: f64,
    /// Top of the stick in plot units.
    pub height: f64,
}

/// One molecule's lines drawn as vertical sticks in its own band.
#[derive(Debug, Clone, PartialEq)]
pub struct StickOverlay {
    pub molecule: String,
    pub slot: usize,
    pub sticks: Vec<Stick>,
}

impl StickOverlay {
    /// Bottom of this overlay's band.
    pub fn baseline(&self) -> f64 {
        self.slot as f64 * SLOT_HEIGHT + SLOT_BASE
    }
}

/// Log-scale the lines inside `window` into band `slot`.
///
/// Lines weaker than the strongest visible line by more than two decades
/// are left out; the strongest reaches the top of the band.
pub fn stick_overlay(table: &LineTable, window: &ViewWindow, slot: usize) -> StickOverlay {
    let (lo, hi) = window.xlim();
    let visible: Vec<(f64, f64)> = table
        .lines_between(lo, hi)
        .map(|l| (l.wavenumber, l.intensity))
        .collect();
    let max = visible
        .iter()
        .map(|&(_, i)| i)
        .filter(|i| !i.is_nan())
        .fold(f64::NEG_INFINITY, f64::max);

    let mut overlay = StickOverlay {
        molecule: table.molecule.clone(),
        slot,
        sticks: Vec::new(),
    };
    if !(max > 0.0 && max.is_finite()) {
        return overlay;
    }

    let min = max / 10f64.powi(DYNAMIC_RANGE_DECADES);
    let (log_min, log_max) = (min.log10(), max.log10());
    let baseline = overlay.baseline();
    overlay.sticks = visible
        .into_iter()
        .filter(|&(_, i)| i >= min)
        .map(|(wavenumber, i)| Stick {
            wavenumber,
            height: (i.log10() - log_min) / (log_max - log_min) * SLOT_HEIGHT + baseline,
        })
        .collect();
    overlay
}

/// Overlays for the registry's selected molecules, stacked in selection order.
pub fn selected_overlays(
    registry: &mut MoleculeRegistry,
    window: &ViewWindow,
) -> Result<Vec<StickOverlay>> {
    let selected = registry.selected().to_vec();
    selected
        .iter()
        .enumerate()
        .map(|(slot, name)| -> Result<StickOverlay> {
            Ok(stick_overlay(registry.table(name)?, window, slot))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Line identification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct LineHit {
    pub molecule: String,
    pub wavenumber: f64,
    pub distance: f64,
}

impl LineHit {
    /// e.g. `H2O 1000.20000`
    pub fn label(&self) -> String {
        format!("{}{:11.5}", self.molecule, self.wavenumber)
    }
}

/// The stick top closest to `(x, y)`.
///
/// `aspect` converts one vertical plot unit into wavenumbers so both axes
/// are compared on screen scale.
pub fn nearest_line(overlays: &[StickOverlay], x: f64, y: f64, aspect: f64) -> Option<LineHit> {
    let mut best: Option<LineHit> = None;
    for overlay in overlays {
        for stick in &overlay.sticks {
            let dx = stick.wavenumber - x;
            let dy = (stick.height - y) * aspect;
            let distance = dx.hypot(dy);
            if best.as_ref().map_or(true, |b| distance < b.distance) {
                best = Some(LineHit {
                    molecule: overlay.molecule.clone(),
                    wavenumber: stick.wavenumber,
                    distance,
                });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::SpectralLine;
    use approx::assert_relative_eq;

    fn table(name: &str, pairs: &[(f64, f64)]) -> LineTable {
        LineTable::new(
            name,
            pairs.iter().map(|&(w, i)| SpectralLine::new(w, i)).collect(),
        )
    }

    #[test]
    fn pan_moves_by_bandwidth() {
        let mut window = ViewWindow::default();
        assert_eq!(window.xlim(), (995.0, 1005.0));
        window.pan(1.0);
        assert_eq!(window.xlim(), (1005.0, 1015.0));
        window.pan(-2.0);
        assert_relative_eq!(window.central_wavenumber, 990.0);
    }

    #[test]
    fn sticks_are_log_scaled_within_two_decades() {
        let t = table(
            "O3",
            &[(996.0, 1.0), (997.0, 0.1), (998.0, 0.01), (999.0, 0.001), (1010.0, 50.0)],
        );
        let overlay = stick_overlay(&t, &ViewWindow::default(), 1);
        assert_relative_eq!(overlay.baseline(), 0.15);
        let heights: Vec<f64> = overlay.sticks.iter().map(|s| s.height).collect();
        assert_eq!(heights.len(), 3);
        assert_relative_eq!(heights[0], 0.25, epsilon = 1e-12);
        assert_relative_eq!(heights[1], 0.20, epsilon = 1e-12);
        assert_relative_eq!(heights[2], 0.15, epsilon = 1e-12);
    }

    #[test]
    fn empty_window_gives_no_sticks() {
        let t = table("CO2", &[(2000.0, 1.0)]);
        assert!(stick_overlay(&t, &ViewWindow::default(), 0).sticks.is_empty());
    }

    #[test]
    fn nearest_line_weighs_vertical_distance() {
        let window = ViewWindow::default();
        let overlays = vec![
            stick_overlay(&table("H2O", &[(1000.0, 1.0)]), &window, 0),
            stick_overlay(&table("CH4", &[(1000.3, 1.0)]), &window, 3),
        ];
        // Close in x to H2O but at the height of the CH4 band.
        let hit = nearest_line(&overlays, 1000.1, 0.45, 5.0).unwrap();
        assert_eq!(hit.molecule, "CH4");
        assert_eq!(hit.label(), "CH4 1000.30000");

        let hit = nearest_line(&overlays, 1000.1, 0.15, 5.0).unwrap();
        assert_eq!(hit.molecule, "H2O");
        assert!(nearest_line(&[], 1000.0, 0.5, 1.0).is_none());
    }

    #[test]
    fn selected_overlays_follow_selection_order() {
        let mut registry = MoleculeRegistry::from_tables(vec![
            table("H2O", &[(1000.0, 1.0)]),
            table("O3", &[(1001.0, 1.0)]),
        ]);
        registry.toggle("O3");
        registry.toggle("H2O");
        let overlays = selected_overlays(&mut registry, &ViewWindow::default()).unwrap();
        assert_eq!(overlays[0].molecule, "O3");
        assert_eq!(overlays[1].slot, 1);
        assert_relative_eq!(overlays[1].sticks[0].height, 0.25, epsilon = 1e-12);
    }
}
