use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::color::{Rgb8, generate_palette};
use crate::data::loader::load_abridged;
use crate::data::model::LineTable;
use crate::data::writer::ABRIDGED_PREFIX;

// ---------------------------------------------------------------------------
// Per-session molecule registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Entry {
    path: Option<PathBuf>,
    color: Rgb8,
    /// Loaded on first use.
    table: Option<LineTable>,
}

/// The molecules available to one viewing session: where each abridged
/// table lives, its display colour, its cached table and whether it is
/// currently selected.
#[derive(Debug, Clone, Default)]
pub struct MoleculeRegistry {
    entries: BTreeMap<String, Entry>,
    /// Selection order decides the stacking slot of each overlay.
    selected: Vec<String>,
}

impl MoleculeRegistry {
    /// Scan `dir` for `hitran_abridged_<NAME>.txt*` files.
    pub fn discover(dir: &Path) -> Result<Self> {
        let mut found = BTreeMap::new();
        for entry in std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
            let path = entry?.path();
            let Some(name) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(molecule_from_file_name)
            else {
                continue;
            };
            found.insert(name.to_string(), path);
        }
        log::info!("found {} abridged tables in {}", found.len(), dir.display());

        let mut registry = Self::default();
        let colors = generate_palette(found.len());
        for ((name, path), color) in found.into_iter().zip(colors) {
            registry.entries.insert(
                name,
                Entry {
                    path: Some(path),
                    color,
                    table: None,
                },
            );
        }
        Ok(registry)
    }

    /// Build from tables already in memory.
    pub fn from_tables(tables: Vec<LineTable>) -> Self {
        let colors = generate_palette(tables.len());
        let mut by_name: BTreeMap<String, LineTable> = BTreeMap::new();
        for table in tables {
            by_name.insert(table.molecule.clone(), table);
        }
        let entries = by_name
            .into_iter()
            .zip(colors)
            .map(|((name, table), color)| {
                (
                    name,
                    Entry {
                        path: None,
                        color,
                        table: Some(table),
                    },
                )
            })
            .collect();
        Self {
            entries,
            selected: Vec::new(),
        }
    }

    /// Known molecule names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn color(&self, name: &str) -> Option<Rgb8> {
        self.entries.get(name).map(|e| e.color)
    }

    /// The molecule's table, read from disk the first time it is asked for.
    pub fn table(&mut self, name: &str) -> Result<&LineTable> {
        let Some(entry) = self.entries.get_mut(name) else {
            bail!("unknown molecule '{name}'");
        };
        if entry.table.is_none() {
            let Some(path) = &entry.path else {
                bail!("no table for molecule '{name}'");
            };
            log::debug!("loading {}", path.display());
            entry.table = Some(load_abridged(path, name)?);
        }
        entry
            .table
            .as_ref()
            .with_context(|| format!("no table for molecule '{name}'"))
    }

    // -- selection --

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.iter().any(|s| s == name)
    }

    /// Flip one molecule in or out of the selection. Unknown names are ignored.
    pub fn toggle(&mut self, name: &str) {
        if let Some(pos) = self.selected.iter().position(|s| s == name) {
            self.selected.remove(pos);
        } else if self.entries.contains_key(name) {
            self.selected.push(name.to_string());
        }
    }

    /// Add one molecule to the selection if it is not there yet. Returns
    /// `false` for names the registry does not know.
    pub fn select(&mut self, name: &str) -> bool {
        if !self.entries.contains_key(name) {
            return false;
        }
        if !self.is_selected(name) {
            self.selected.push(name.to_string());
        }
        true
    }

    pub fn select_all(&mut self) {
        self.selected = self.entries.keys().cloned().collect();
    }

    pub fn select_none(&mut self) {
        self.selected.clear();
    }
}

/// `hitran_abridged_CO2.txt.gz` → `CO2`
fn molecule_from_file_name(file_name: &str) -> Option<&str> {
    let rest = file_name.strip_prefix(ABRIDGED_PREFIX)?;
    let end = rest.find(".txt")?;
    let name = &rest[..end];
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{AbridgeParams, AbridgedTable};
    use crate::data::model::SpectralLine;
    use crate::data::writer::{abridged_file_name, write_abridged};
    use tempfile::tempdir;

    fn table(name: &str) -> LineTable {
        LineTable::new(name, vec![SpectralLine::new(1000.5, 1.0)])
    }

    #[test]
    fn file_names_map_to_molecules() {
        assert_eq!(molecule_from_file_name("hitran_abridged_CO2.txt.gz"), Some("CO2"));
        assert_eq!(molecule_from_file_name("hitran_abridged_NO+.txt"), Some("NO+"));
        assert_eq!(molecule_from_file_name("hitran_abridged_.txt"), None);
        assert_eq!(molecule_from_file_name("atmos.txt.gz"), None);
    }

    #[test]
    fn discover_assigns_colours_and_loads_lazily() {
        let dir = tempdir().unwrap();
        for name in ["O3", "CH4"] {
            let abridged = AbridgedTable {
                table: table(name),
                params: AbridgeParams::default(),
                source_len: 1,
            };
            write_abridged(&dir.path().join(abridged_file_name(name)), &abridged).unwrap();
        }
        std::fs::write(dir.path().join("orders.txt"), "").unwrap();

        let mut registry = MoleculeRegistry::discover(dir.path()).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["CH4", "O3"]);
        assert_ne!(registry.color("CH4"), registry.color("O3"));
        assert_eq!(registry.table("O3").unwrap().len(), 1);
        assert!(registry.table("H2O").is_err());
    }

    #[test]
    fn selection_keeps_click_order() {
        let mut registry =
            MoleculeRegistry::from_tables(vec![table("H2O"), table("CO2"), table("O3")]);
        registry.toggle("O3");
        registry.toggle("H2O");
        registry.toggle("XX");
        assert_eq!(registry.selected(), ["O3", "H2O"]);
        registry.toggle("O3");
        assert_eq!(registry.selected(), ["H2O"]);
        assert!(!registry.is_selected("O3"));

        registry.select_all();
        assert_eq!(registry.selected(), ["CO2", "H2O", "O3"]);
        registry.select_none();
        assert!(registry.selected().is_empty());
    }

    #[test]
    fn explicit_selection_is_idempotent() {
        let mut registry = MoleculeRegistry::from_tables(vec![table("H2O"), table("CO2")]);
        assert!(registry.select("CO2"));
        assert!(registry.select("H2O"));
        assert!(registry.select("CO2"));
        assert!(!registry.select("Kr"));
        assert_eq!(registry.selected(), ["CO2", "H2O"]);
    }
}
