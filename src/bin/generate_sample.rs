use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::{Compression, write::GzEncoder};

use xatmos::molecules::Molecule;

fn gaussian(x: f64, mu: f64, sigma: f64, depth: f64) -> f64 {
    depth * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Deterministic splitmix64 stream, enough for reproducible samples.
struct SimpleRng(u64);

impl SimpleRng {
    /// Uniform in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        ((z ^ (z >> 31)) >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// Synthetic lines: (wavenumber, intensity, isotope number).
fn generate_lines(rng: &mut SimpleRng, n: usize, lo: f64, hi: f64) -> Vec<(f64, f64, u8)> {
    let mut lines: Vec<(f64, f64, u8)> = (0..n)
        .map(|_| {
            let wn = rng.uniform(lo, hi);
            // Log-uniform over six decades, like a real band.
            let intensity = 10f64.powf(rng.uniform(-26.0, -20.0));
            let isotope = if rng.next_f64() < 0.8 { 1 } else { 2 };
            (wn, intensity, isotope)
        })
        .collect();
    lines.sort_by(|a, b| a.0.total_cmp(&b.0));
    lines
}

/// One HITRAN-2004 fixed-width record (leading columns only).
fn par_record(molecule: u8, isotope: u8, wn: f64, intensity: f64) -> String {
    format!(
        "{molecule:2}{isotope:1}{wn:12.6}{intensity:10.3E}{:10.3E}{:5.3}{:5.3}{:10.4}{:4.2}{:8.5}",
        0.01, 0.075, 0.35, 100.0, 0.69, -0.002
    )
}

fn write_gz(path: &Path, text: &str) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(text.as_bytes())?;
    encoder.finish()?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    std::fs::create_dir_all(&out_dir)?;
    let mut rng = SimpleRng(42);

    // Reference grid: two windows, 950-1010 and 1040-1100, step 0.05
    let grid: Vec<f64> = (0..1200)
        .map(|i| 950.0 + i as f64 * 0.05)
        .chain((0..1200).map(|i| 1040.0 + i as f64 * 0.05))
        .collect();
    let absorbers = [(960.0, 0.5, 0.6), (1000.0, 1.0, 0.3), (1060.0, 0.3, 0.8)];

    let mut atmos = String::new();
    for i in 0..7 {
        atmos.push_str(&format!("# synthetic transmission model, line {i}\n"));
    }
    atmos.push_str("# wn\ttrans1mm\ttrans4mm\n");
    for &wn in &grid {
        let depth: f64 = absorbers
            .iter()
            .map(|&(mu, sigma, d)| gaussian(wn, mu, sigma, d))
            .sum();
        let t1 = (1.0 - depth).clamp(0.0, 1.0);
        let t4 = (1.0 - 2.0 * depth).clamp(0.0, 1.0);
        atmos.push_str(&format!("{wn:.4}\t{t1:.5}\t{t4:.5}\n"));
    }
    write_gz(&out_dir.join("atmos.txt.gz"), &atmos)?;

    let mut orders = String::from("# synthetic orders\n# start\tend\n#\n");
    for k in 0..30 {
        let start = 950.0 + k as f64 * 5.0;
        orders.push_str(&format!("{start:.3}\t{:.3}\n", start + 4.2));
    }
    std::fs::write(out_dir.join("orders.txt"), orders)?;

    let mut total = 0;
    for name in ["H2O", "CO2", "O3"] {
        let Some(molecule) = Molecule::by_name(name) else {
            continue;
        };
        let lines = generate_lines(&mut rng, 20_000, 900.0, 1150.0);
        let mut par = String::new();
        for &(wn, intensity, isotope) in &lines {
            par.push_str(&par_record(molecule.number, isotope, wn, intensity));
            par.push('\n');
        }
        let path = out_dir.join(format!("{:02}_hit04.par.gz", molecule.number));
        write_gz(&path, &par)?;
        total += lines.len();
    }

    println!(
        "Wrote {} grid points and {total} lines to {}",
        grid.len(),
        out_dir.display()
    );
    Ok(())
}
