use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::data::filter::Abridger;
use crate::data::loader::LineSource;
use crate::data::writer::{abridged_file_name, write_abridged};
use crate::molecules::Molecule;

// ---------------------------------------------------------------------------
// Batch abridgement over several molecules
// ---------------------------------------------------------------------------

/// What happened to one molecule during a batch run.
#[derive(Debug)]
pub enum MoleculeOutcome {
    Written {
        name: String,
        before: usize,
        after: usize,
        path: PathBuf,
    },
    /// The source has no catalog for this molecule.
    NoData { name: String },
    Failed { name: String, error: anyhow::Error },
}

impl MoleculeOutcome {
    pub fn name(&self) -> &str {
        match self {
            MoleculeOutcome::Written { name, .. }
            | MoleculeOutcome::NoData { name }
            | MoleculeOutcome::Failed { name, .. } => name,
        }
    }
}

impl fmt::Display for MoleculeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoleculeOutcome::Written {
                name,
                before,
                after,
                path,
            } => write!(f, "{name} {before} {after} → {}", path.display()),
            MoleculeOutcome::NoData { name } => write!(f, "{name}: no data"),
            MoleculeOutcome::Failed { name, error } => write!(f, "{name}: failed: {error:#}"),
        }
    }
}

/// Abridge every molecule in turn and write one table per molecule into
/// `out_dir`. A molecule that fails never stops the others.
pub fn run_batch(
    source: &dyn LineSource,
    abridger: &Abridger,
    molecules: &[Molecule],
    out_dir: &Path,
) -> Vec<MoleculeOutcome> {
    molecules
        .iter()
        .map(|molecule| {
            let outcome = match abridge_one(source, abridger, molecule, out_dir) {
                Ok(Some((before, after, path))) => MoleculeOutcome::Written {
                    name: molecule.name.to_string(),
                    before,
                    after,
                    path,
                },
                Ok(None) => MoleculeOutcome::NoData {
                    name: molecule.name.to_string(),
                },
                Err(error) => MoleculeOutcome::Failed {
                    name: molecule.name.to_string(),
                    error,
                },
            };
            match &outcome {
                MoleculeOutcome::Written { .. } => log::info!("{outcome}"),
                MoleculeOutcome::NoData { .. } => log::warn!("{outcome}"),
                MoleculeOutcome::Failed { .. } => log::error!("{outcome}"),
            }
            outcome
        })
        .collect()
}

fn abridge_one(
    source: &dyn LineSource,
    abridger: &Abridger,
    molecule: &Molecule,
    out_dir: &Path,
) -> Result<Option<(usize, usize, PathBuf)>> {
    let Some((table, report)) = source.line_table(molecule)? else {
        return Ok(None);
    };
    if report.malformed_rows > 0 {
        log::debug!("{}: {report}", molecule.name);
    }
    let abridged = abridger.abridge(&table);
    let path = out_dir.join(abridged_file_name(molecule.name));
    write_abridged(&path, &abridged)
        .with_context(|| format!("writing abridged table for {}", molecule.name))?;
    Ok(Some((abridged.source_len, abridged.table.len(), path)))
}
