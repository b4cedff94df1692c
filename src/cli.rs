use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use crate::data::filter::AbridgeParams;
use crate::data::loader::{CatalogFiles, HitranDirectory};
use crate::molecules::{DEFAULT_MOLECULES, Molecule};

/// Abridge molecular line catalogs against telluric transmission coverage.
#[derive(Debug, Parser)]
#[command(name = "xatmos")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Filter HITRAN catalogs down to locally significant lines.
    Abridge(AbridgeArgs),
    /// List the known HITRAN molecules and isotopologues.
    Molecules,
    /// Show the sticks of abridged tables inside a wavenumber window.
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
pub struct AbridgeArgs {
    /// Directory holding `NN_hit04.par[.gz]` catalogs.
    #[arg(long, value_name = "DIR")]
    pub hitran_dir: Option<PathBuf>,

    /// Catalog file for one molecule (`.par`, `.csv`, `.parquet`, optionally `.gz`).
    #[arg(long, value_name = "NAME=FILE", value_parser = parse_catalog)]
    pub catalog: Vec<(String, PathBuf)>,

    /// Reference transmission spectrum (`atmos.txt.gz`).
    #[arg(long, value_name = "FILE")]
    pub reference: PathBuf,

    /// Where to write `hitran_abridged_<NAME>.txt.gz`.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Molecules to process (default: H2O, CO2, O3, N2O, CH4, NO2).
    #[arg(long, value_delimiter = ',')]
    pub molecules: Vec<String>,

    /// Only keep these isotope numbers.
    #[arg(long, value_delimiter = ',')]
    pub isotopes: Vec<u8>,

    /// JSON file with `halfwidth` and/or `max_ratio`.
    #[arg(long, value_name = "FILE")]
    pub params: Option<PathBuf>,

    /// Half-width of the local-maximum window (cm⁻¹).
    #[arg(long)]
    pub halfwidth: Option<f64>,

    /// Minimum intensity relative to the local maximum.
    #[arg(long)]
    pub max_ratio: Option<f64>,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Directory with abridged tables.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Centre of the window (cm⁻¹).
    #[arg(long, default_value_t = 1000.0)]
    pub center: f64,

    /// Width of the window (cm⁻¹).
    #[arg(long, default_value_t = 10.0)]
    pub bandwidth: f64,

    /// Pan the window by this many widths before showing it.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub pan: f64,

    /// Molecules to overlay (default: all found).
    #[arg(long, value_delimiter = ',')]
    pub molecules: Vec<String>,

    /// Spectrometer order boundaries to list alongside.
    #[arg(long, value_name = "FILE")]
    pub orders: Option<PathBuf>,

    /// Identify the line nearest to this `X,Y` plot position.
    #[arg(long, value_name = "X,Y", value_delimiter = ',', allow_negative_numbers = true)]
    pub pick: Option<Vec<f64>>,

    /// Wavenumbers per vertical plot unit, used by `--pick`.
    #[arg(long, default_value_t = 10.0)]
    pub aspect: f64,
}

impl AbridgeArgs {
    /// Defaults, overridden by the JSON file, overridden by flags.
    pub fn resolve_params(&self) -> Result<AbridgeParams> {
        let mut params = match &self.params {
            Some(path) => read_params(path)?,
            None => AbridgeParams::default(),
        };
        if let Some(h) = self.halfwidth {
            params.halfwidth = h;
        }
        if let Some(r) = self.max_ratio {
            params.max_ratio = r;
        }
        params.validate()?;
        Ok(params)
    }

    /// Explicit catalogs first, the HITRAN directory for everything else.
    pub fn line_source(&self) -> Result<CatalogFiles> {
        if self.hitran_dir.is_none() && self.catalog.is_empty() {
            bail!("either --hitran-dir or --catalog is required");
        }
        let fallback = self.hitran_dir.as_ref().map(|dir| HitranDirectory::new(dir));
        let mut source = CatalogFiles::new(fallback);
        if !self.isotopes.is_empty() {
            source = source.with_isotopes(self.isotopes.clone());
        }
        for (name, path) in &self.catalog {
            source.insert(name.clone(), path.clone());
        }
        Ok(source)
    }

    pub fn resolve_molecules(&self) -> Result<Vec<Molecule>> {
        if self.molecules.is_empty() {
            return resolve_names(DEFAULT_MOLECULES);
        }
        resolve_names(self.molecules.iter().map(String::as_str))
    }
}

fn parse_catalog(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=FILE, got '{s}'")),
    }
}

fn read_params(path: &Path) -> Result<AbridgeParams> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading parameters {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing parameters {}", path.display()))
}

fn resolve_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Vec<Molecule>> {
    names
        .into_iter()
        .map(|name| match Molecule::by_name(name) {
            Some(m) => Ok(m),
            None => bail!("unknown molecule '{name}'"),
        })
        .collect()
}
