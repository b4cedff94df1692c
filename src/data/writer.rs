use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::{Compression, write::GzEncoder};

use super::filter::AbridgedTable;
use super::loader::is_gzip;

/// File-name prefix of abridged tables; the molecule name follows it.
pub const ABRIDGED_PREFIX: &str = "hitran_abridged_";

/// `hitran_abridged_<NAME>.txt.gz`
pub fn abridged_file_name(molecule: &str) -> String {
    format!("{ABRIDGED_PREFIX}{molecule}.txt.gz")
}

/// Write an abridged table: two `#` lines recording the filter parameters,
/// then `wavenumber,intensity` CSV. Gzip-compressed when `path` ends in `.gz`.
pub fn write_abridged(path: &Path, abridged: &AbridgedTable) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    if is_gzip(path) {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        write_table(&mut encoder, abridged)?;
        encoder
            .finish()
            .and_then(|mut inner| inner.flush())
            .with_context(|| format!("finishing {}", path.display()))?;
    } else {
        let mut out = BufWriter::new(file);
        write_table(&mut out, abridged)?;
        out.flush()
            .with_context(|| format!("flushing {}", path.display()))?;
    }
    Ok(())
}

/// Serialize to any sink.
pub fn write_table<W: Write>(out: &mut W, abridged: &AbridgedTable) -> Result<()> {
    writeln!(
        out,
        "# comparison_range_halfwidth = {:?}",
        abridged.params.halfwidth
    )?;
    writeln!(out, "# comparison_max_ratio = {:?}", abridged.params.max_ratio)?;

    let mut csv_writer = csv::Writer::from_writer(out);
    csv_writer.write_record(["wavenumber", "intensity"])?;
    for line in &abridged.table.lines {
        csv_writer.serialize((line.wavenumber, line.intensity))?;
    }
    csv_writer.flush().context("writing abridged rows")?;
    Ok(())
}
