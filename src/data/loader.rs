use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float32Array, Float64Array};
use flate2::read::GzDecoder;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{
    LineAux, LineTable, LoadReport, OrderBoundary, ReferenceSpectrum, SpectralLine,
};
use crate::molecules::Molecule;

/// Preamble lines ahead of the `# wn` header in a reference spectrum file.
const REFERENCE_PREAMBLE: usize = 7;
/// Preamble lines of an orders file (which has no header row).
const ORDERS_PREAMBLE: usize = 3;
/// Field widths of the leading columns of a HITRAN-2004 `.par` record.
const HITRAN_WIDTHS: [usize; 10] = [2, 1, 12, 10, 10, 5, 5, 10, 4, 8];

// ---------------------------------------------------------------------------
// Line sources
// ---------------------------------------------------------------------------

/// Supplies one molecule's line table.
///
/// `Ok(None)` means the backing catalog does not exist; `Err` is reserved
/// for catalogs that exist but could not be read.
pub trait LineSource {
    fn line_table(&self, molecule: &Molecule) -> Result<Option<(LineTable, LoadReport)>>;
}

/// A directory of per-molecule HITRAN files named `NN_hit04.par[.gz]`.
#[derive(Debug, Clone)]
pub struct HitranDirectory {
    root: PathBuf,
    isotopes: Option<Vec<u8>>,
}

impl HitranDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            isotopes: None,
        }
    }

    /// Only keep rows of these isotope numbers.
    pub fn with_isotopes(mut self, isotopes: Vec<u8>) -> Self {
        self.isotopes = Some(isotopes);
        self
    }

    /// First existing candidate path for a molecule, compressed file first.
    pub fn path_for(&self, molecule: &Molecule) -> Option<PathBuf> {
        let stem = format!("{:02}_hit04.par", molecule.number);
        [format!("{stem}.gz"), stem]
            .into_iter()
            .map(|name| self.root.join(name))
            .find(|p| p.is_file())
    }
}

impl LineSource for HitranDirectory {
    fn line_table(&self, molecule: &Molecule) -> Result<Option<(LineTable, LoadReport)>> {
        let Some(path) = self.path_for(molecule) else {
            return Ok(None);
        };
        let reader = open_text(&path)?;
        let (mut table, report) = parse_hitran_par(reader, molecule.name)
            .with_context(|| format!("parsing {}", path.display()))?;
        if let Some(keep) = &self.isotopes {
            retain_isotopes(&mut table, keep);
        }
        Ok(Some((table, report)))
    }
}

/// Explicit per-molecule catalog files in any format [`load_line_table`]
/// understands, optionally backed by a HITRAN directory for the rest.
#[derive(Debug, Clone, Default)]
pub struct CatalogFiles {
    files: BTreeMap<String, PathBuf>,
    fallback: Option<HitranDirectory>,
    isotopes: Option<Vec<u8>>,
}

impl CatalogFiles {
    pub fn new(fallback: Option<HitranDirectory>) -> Self {
        Self {
            files: BTreeMap::new(),
            fallback,
            isotopes: None,
        }
    }

    /// Only keep rows of these isotope numbers, for explicit files and the
    /// fallback directory alike.
    pub fn with_isotopes(mut self, isotopes: Vec<u8>) -> Self {
        self.fallback = self.fallback.map(|dir| dir.with_isotopes(isotopes.clone()));
        self.isotopes = Some(isotopes);
        self
    }

    pub fn insert(&mut self, molecule: impl Into<String>, path: impl Into<PathBuf>) {
        self.files.insert(molecule.into(), path.into());
    }
}

impl LineSource for CatalogFiles {
    fn line_table(&self, molecule: &Molecule) -> Result<Option<(LineTable, LoadReport)>> {
        match self.files.get(molecule.name) {
            Some(path) if path.is_file() => {
                let (mut table, report) = load_line_table(path, molecule.name)?;
                if let Some(keep) = &self.isotopes {
                    retain_isotopes(&mut table, keep);
                }
                Ok(Some((table, report)))
            }
            Some(path) => {
                log::warn!("{}: catalog {} does not exist", molecule.name, path.display());
                Ok(None)
            }
            None => match &self.fallback {
                Some(dir) => dir.line_table(molecule),
                None => Ok(None),
            },
        }
    }
}

/// Drop rows whose isotope number is not in `keep`. Tables without isotope
/// columns (CSV, Parquet) are left whole, with a warning.
fn retain_isotopes(table: &mut LineTable, keep: &[u8]) {
    if table.lines.iter().all(|l| l.aux.is_none()) {
        if !table.is_empty() {
            log::warn!(
                "{}: table has no isotope column, isotopes {keep:?} not applied",
                table.molecule
            );
        }
        return;
    }
    table.lines.retain(|l| {
        l.aux
            .and_then(|a| a.isotope_num)
            .is_some_and(|iso| keep.contains(&iso))
    });
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a line table from a file. Dispatch by extension, `.gz` is peeled off
/// first.
///
/// Supported formats:
/// * `.par`     – HITRAN-2004 fixed-width records
/// * `.csv` / `.txt` – `wavenumber` and `intensity` columns, `#` comment lines
/// * `.parquet` – `wavenumber` and `intensity` float columns
pub fn load_line_table(path: &Path, molecule: &str) -> Result<(LineTable, LoadReport)> {
    match inner_extension(path).as_str() {
        "par" => parse_hitran_par(open_text(path)?, molecule),
        "csv" | "txt" => parse_csv_lines(open_text(path)?, molecule),
        "parquet" | "pq" => load_parquet_lines(path, molecule),
        other => bail!("Unsupported line table extension: .{other}"),
    }
}

/// Read back a table written by [`super::writer::write_abridged`].
pub fn load_abridged(path: &Path, molecule: &str) -> Result<LineTable> {
    let (table, report) = parse_csv_lines(open_text(path)?, molecule)
        .with_context(|| format!("reading abridged table {}", path.display()))?;
    if report.malformed_rows > 0 {
        log::warn!("{}: {report}", path.display());
    }
    Ok(table)
}

/// Open a file for line-oriented reading, gunzipping `.gz` files.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub(crate) fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

/// Extension ignoring a trailing `.gz`: `lines.par.gz` → `par`.
fn inner_extension(path: &Path) -> String {
    let path = if is_gzip(path) {
        Path::new(path.file_stem().unwrap_or_default())
    } else {
        path
    };
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// HITRAN fixed-width parser
// ---------------------------------------------------------------------------

/// Parse HITRAN `.par` records.
///
/// Only the leading fixed-width columns are read. Unparseable numeric
/// fields become NaN (or `None` for the integer ids) and the row is counted
/// as malformed; they never abort the load.
pub fn parse_hitran_par<R: BufRead>(
    mut reader: R,
    molecule: &str,
) -> Result<(LineTable, LoadReport)> {
    let mut lines = Vec::new();
    let mut report = LoadReport::default();
    let mut buf = Vec::new();

    for row_no in 0.. {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("reading record {row_no}"))?;
        if n == 0 {
            break;
        }
        let record = trim_newline(&buf);
        if record.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let fields = split_fixed(record);
        let molecule_num = parse_int(fields[0]);
        let isotope_num = parse_int(fields[1]);
        let mut malformed = molecule_num.is_none() || isotope_num.is_none();
        let mut float = |idx: usize| {
            let v = parse_float_bytes(fields[idx]);
            malformed |= v.is_nan();
            v
        };
        let wavenumber = float(2);
        let intensity = float(3);
        let aux = LineAux {
            molecule_num,
            isotope_num,
            weighted_transition: float(4),
            air_hwhm: float(5),
            self_hwhm: float(6),
            lower_energy: float(7),
            air_hwhm_temp_dependence: float(8),
            air_pressure_shift: float(9),
        };

        report.rows += 1;
        if malformed {
            report.malformed_rows += 1;
        }
        lines.push(SpectralLine {
            wavenumber,
            intensity,
            aux: Some(aux),
        });
    }

    Ok((LineTable::new(molecule, lines), report))
}

fn trim_newline(record: &[u8]) -> &[u8] {
    let record = record.strip_suffix(b"\n").unwrap_or(record);
    record.strip_suffix(b"\r").unwrap_or(record)
}

/// Cut a raw record into the [`HITRAN_WIDTHS`] fields by byte offset, so a
/// stray non-UTF-8 byte only spoils the field it sits in. Fields past the end
/// of a short record come back empty.
fn split_fixed(record: &[u8]) -> [&[u8]; HITRAN_WIDTHS.len()] {
    let mut fields: [&[u8]; HITRAN_WIDTHS.len()] = [&[]; HITRAN_WIDTHS.len()];
    let mut start = 0;
    for (slot, width) in fields.iter_mut().zip(HITRAN_WIDTHS) {
        let end = (start + width).min(record.len());
        *slot = record.get(start.min(end)..end).unwrap_or(&[]);
        start += width;
    }
    fields
}

fn parse_float_bytes(field: &[u8]) -> f64 {
    std::str::from_utf8(field).map_or(f64::NAN, parse_float)
}

fn parse_float(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_int(field: &[u8]) -> Option<u8> {
    std::str::from_utf8(field).ok()?.trim().parse::<u8>().ok()
}

// ---------------------------------------------------------------------------
// CSV line tables (also the abridged format)
// ---------------------------------------------------------------------------

fn parse_csv_lines<R: BufRead>(reader: R, molecule: &str) -> Result<(LineTable, LoadReport)> {
    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = reader.byte_headers().context("reading CSV headers")?.clone();
    let wn_idx = headers
        .iter()
        .position(|h| h == b"wavenumber")
        .context("CSV missing 'wavenumber' column")?;
    let int_idx = headers
        .iter()
        .position(|h| h == b"intensity")
        .context("CSV missing 'intensity' column")?;

    // Byte records: a cell that is not UTF-8 becomes NaN instead of failing
    // the whole table.
    let mut lines = Vec::new();
    let mut report = LoadReport::default();
    for (row_no, result) in reader.byte_records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let wavenumber = parse_float_bytes(record.get(wn_idx).unwrap_or_default());
        let intensity = parse_float_bytes(record.get(int_idx).unwrap_or_default());
        report.rows += 1;
        if wavenumber.is_nan() || intensity.is_nan() {
            report.malformed_rows += 1;
        }
        lines.push(SpectralLine::new(wavenumber, intensity));
    }
    Ok((LineTable::new(molecule, lines), report))
}

// ---------------------------------------------------------------------------
// Parquet line tables
// ---------------------------------------------------------------------------

/// Expected schema: `wavenumber` and `intensity` as Float64 or Float32.
/// Nulls become NaN; any other columns are ignored.
fn load_parquet_lines(path: &Path, molecule: &str) -> Result<(LineTable, LoadReport)> {
    let file = File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut lines = Vec::new();
    let mut report = LoadReport::default();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let wn_idx = schema
            .index_of("wavenumber")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'wavenumber' column"))?;
        let int_idx = schema
            .index_of("intensity")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'intensity' column"))?;

        let wn = extract_f64_column(batch.column(wn_idx)).context("reading 'wavenumber'")?;
        let intensity = extract_f64_column(batch.column(int_idx)).context("reading 'intensity'")?;

        for (w, i) in wn.into_iter().zip(intensity) {
            report.rows += 1;
            if w.is_nan() || i.is_nan() {
                report.malformed_rows += 1;
            }
            lines.push(SpectralLine::new(w, i));
        }
    }

    Ok((LineTable::new(molecule, lines), report))
}

fn extract_f64_column(col: &Arc<dyn Array>) -> Result<Vec<f64>> {
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect())
    } else {
        bail!("column type is {:?}, expected Float64 or Float32", col.data_type())
    }
}

// ---------------------------------------------------------------------------
// Reference spectrum and spectrometer orders
// ---------------------------------------------------------------------------

/// Load a tab-separated transmission model.
///
/// Layout: seven preamble lines, then a header whose first column is `# wn`
/// followed by one column per transmission curve. Rows whose wavenumber does
/// not parse are skipped; other unparseable cells become NaN.
pub fn load_reference_spectrum(path: &Path) -> Result<ReferenceSpectrum> {
    let mut reader = open_text(path)?;
    skip_lines(&mut reader, REFERENCE_PREAMBLE)
        .with_context(|| format!("reading preamble of {}", path.display()))?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers().context("reading reference header")?.clone();
    let wn_idx = headers.iter().position(|h| h == "# wn").unwrap_or(0);

    let mut spectrum = ReferenceSpectrum::default();
    let curve_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != wn_idx)
        .map(|(i, h)| (i, h.to_string()))
        .collect();
    let mut curves: BTreeMap<String, Vec<f64>> = curve_cols
        .iter()
        .map(|(_, name)| (name.clone(), Vec::new()))
        .collect();

    let mut skipped = 0usize;
    for (row_no, result) in csv_reader.records().enumerate() {
        let record = result.with_context(|| format!("reference row {row_no}"))?;
        let wn = parse_float(record.get(wn_idx).unwrap_or(""));
        if wn.is_nan() {
            skipped += 1;
            continue;
        }
        if spectrum.wavenumber.last().is_some_and(|&prev| wn < prev) {
            bail!("reference grid is not ascending at row {row_no} ({wn})");
        }
        spectrum.wavenumber.push(wn);
        for (idx, name) in &curve_cols {
            if let Some(curve) = curves.get_mut(name) {
                curve.push(parse_float(record.get(*idx).unwrap_or("")));
            }
        }
    }
    if skipped > 0 {
        log::warn!("{}: skipped {skipped} rows without a wavenumber", path.display());
    }
    spectrum.curves = curves;
    Ok(spectrum)
}

/// Load spectrometer order boundaries: three preamble lines, then
/// tab-separated `start end` pairs.
pub fn load_orders(path: &Path) -> Result<Vec<OrderBoundary>> {
    let mut reader = open_text(path)?;
    skip_lines(&mut reader, ORDERS_PREAMBLE)
        .with_context(|| format!("reading preamble of {}", path.display()))?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut orders = Vec::new();
    for (row_no, result) in csv_reader.records().enumerate() {
        let record = result.with_context(|| format!("orders row {row_no}"))?;
        if record.len() < 2 {
            bail!("orders row {row_no}: expected two columns, got {}", record.len());
        }
        orders.push(OrderBoundary {
            start: parse_float(&record[0]),
            end: parse_float(&record[1]),
        });
    }
    Ok(orders)
}

fn skip_lines(reader: &mut dyn BufRead, n: usize) -> std::io::Result<()> {
    let mut buf = String::new();
    for _ in 0..n {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use flate2::{Compression, write::GzEncoder};
    use std::io::{Cursor, Write};
    use tempfile::tempdir;

    // Two well-formed records and one with a garbled intensity.
    const PAR: &str = concat!(
        " 11 1000.200000 1.000E-20 2.000E-02.07500.350  100.00000.69-.002000\n",
        " 11 1000.300000garbage!!! 2.000E-02.07500.350  100.00000.69-.002000\n",
        " 12 1000.400000 5.000E-22 2.000E-02.07500.350  100.00000.69-.002000\n",
    );

    fn write_gzip(path: &Path, text: &str) {
        let file = File::create(path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn hitran_records_parse_with_nan_coercion() {
        let (table, report) = parse_hitran_par(Cursor::new(PAR), "H2O").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(report, LoadReport { rows: 3, malformed_rows: 1 });

        let first = table.lines[0];
        assert_relative_eq!(first.wavenumber, 1000.2);
        assert_relative_eq!(first.intensity, 1.0e-20);
        let aux = first.aux.unwrap();
        assert_eq!(aux.molecule_num, Some(1));
        assert_eq!(aux.isotope_num, Some(1));
        assert_relative_eq!(aux.lower_energy, 100.0);
        assert_relative_eq!(aux.air_hwhm_temp_dependence, 0.69);
        assert_relative_eq!(aux.air_pressure_shift, -0.002);

        assert!(table.lines[1].intensity.is_nan());
        assert_relative_eq!(table.lines[1].wavenumber, 1000.3);
        assert_eq!(table.lines[2].aux.unwrap().isotope_num, Some(2));
    }

    #[test]
    fn short_records_do_not_panic() {
        let (table, report) = parse_hitran_par(Cursor::new(" 11   1000.5\n"), "H2O").unwrap();
        assert_relative_eq!(table.lines[0].wavenumber, 1000.5);
        assert!(table.lines[0].intensity.is_nan());
        assert_eq!(report.malformed_rows, 1);
    }

    #[test]
    fn invalid_utf8_spoils_only_its_record() {
        let mut bytes = PAR.lines().next().unwrap().as_bytes().to_vec();
        bytes.push(b'\n');
        let mut bad = PAR.lines().nth(2).unwrap().as_bytes().to_vec();
        let len = bad.len();
        bad[len - 2..].copy_from_slice(b"\xff\xfe");
        bytes.extend_from_slice(&bad);
        bytes.extend_from_slice(b"\r\n");

        let (table, report) = parse_hitran_par(Cursor::new(bytes), "H2O").unwrap();
        assert_eq!(report, LoadReport { rows: 2, malformed_rows: 1 });
        assert_relative_eq!(table.lines[0].intensity, 1.0e-20);
        let second = table.lines[1];
        assert_relative_eq!(second.wavenumber, 1000.4);
        assert_relative_eq!(second.intensity, 5.0e-22);
        assert!(second.aux.unwrap().air_pressure_shift.is_nan());
    }

    #[test]
    fn hitran_directory_reports_missing_catalog() {
        let dir = tempdir().unwrap();
        let source = HitranDirectory::new(dir.path());
        let o3 = Molecule::by_name("O3").unwrap();
        assert!(source.line_table(&o3).unwrap().is_none());
    }

    #[test]
    fn hitran_directory_reads_gzip_and_filters_isotopes() {
        let dir = tempdir().unwrap();
        write_gzip(&dir.path().join("01_hit04.par.gz"), PAR);
        let h2o = Molecule::by_name("H2O").unwrap();

        let (all, _) = HitranDirectory::new(dir.path())
            .line_table(&h2o)
            .unwrap()
            .unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all.molecule, "H2O");

        let (main_iso, _) = HitranDirectory::new(dir.path())
            .with_isotopes(vec![1])
            .line_table(&h2o)
            .unwrap()
            .unwrap();
        assert_eq!(main_iso.len(), 2);
    }

    #[test]
    fn catalog_files_prefer_explicit_paths() {
        let dir = tempdir().unwrap();
        write_gzip(&dir.path().join("01_hit04.par.gz"), PAR);
        let csv_path = dir.path().join("h2o.csv");
        std::fs::write(&csv_path, "wavenumber,intensity\n1000.0,1.0\n").unwrap();

        let h2o = Molecule::by_name("H2O").unwrap();
        let co2 = Molecule::by_name("CO2").unwrap();
        let mut catalogs = CatalogFiles::new(Some(HitranDirectory::new(dir.path())));
        assert_eq!(catalogs.line_table(&h2o).unwrap().unwrap().0.len(), 3);

        catalogs.insert("H2O", &csv_path);
        catalogs.insert("CO2", dir.path().join("missing.csv"));
        assert_eq!(catalogs.line_table(&h2o).unwrap().unwrap().0.len(), 1);
        assert!(catalogs.line_table(&co2).unwrap().is_none());
    }

    #[test]
    fn csv_tables_skip_comments_and_coerce_bad_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lines.csv");
        std::fs::write(
            &path,
            "# comparison_range_halfwidth = 3.0\n# comparison_max_ratio = 0.01\n\
             wavenumber,intensity\n1000.2,10.0\n1000.3,n/a\n",
        )
        .unwrap();
        let (table, report) = load_line_table(&path, "CO2").unwrap();
        assert_eq!(table.len(), 2);
        assert_relative_eq!(table.lines[0].intensity, 10.0);
        assert!(table.lines[1].intensity.is_nan());
        assert_eq!(report.malformed_rows, 1);
    }

    #[test]
    fn csv_cells_with_invalid_utf8_become_nan() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lines.csv");
        std::fs::write(&path, b"wavenumber,intensity\n1000.2,10.0\n1000.3,1\xff\n").unwrap();
        let (table, report) = load_line_table(&path, "CO2").unwrap();
        assert_eq!(table.len(), 2);
        assert_relative_eq!(table.lines[1].wavenumber, 1000.3);
        assert!(table.lines[1].intensity.is_nan());
        assert_eq!(report.malformed_rows, 1);
    }

    #[test]
    fn catalog_files_filter_isotopes_where_known() {
        let dir = tempdir().unwrap();
        let par_path = dir.path().join("h2o.par");
        std::fs::write(&par_path, PAR).unwrap();
        let csv_path = dir.path().join("co2.csv");
        std::fs::write(&csv_path, "wavenumber,intensity\n1000.0,1.0\n1001.0,2.0\n").unwrap();

        let mut catalogs = CatalogFiles::new(None).with_isotopes(vec![2]);
        catalogs.insert("H2O", &par_path);
        catalogs.insert("CO2", &csv_path);

        let h2o = Molecule::by_name("H2O").unwrap();
        let (table, report) = catalogs.line_table(&h2o).unwrap().unwrap();
        assert_eq!(report.rows, 3);
        assert_eq!(table.len(), 1);
        assert_relative_eq!(table.lines[0].wavenumber, 1000.4);

        // No isotope column, so nothing can be filtered.
        let co2 = Molecule::by_name("CO2").unwrap();
        assert_eq!(catalogs.line_table(&co2).unwrap().unwrap().0.len(), 2);
    }

    #[test]
    fn catalog_isotopes_reach_the_fallback_directory() {
        let dir = tempdir().unwrap();
        write_gzip(&dir.path().join("01_hit04.par.gz"), PAR);
        let catalogs =
            CatalogFiles::new(Some(HitranDirectory::new(dir.path()))).with_isotopes(vec![1]);
        let h2o = Molecule::by_name("H2O").unwrap();
        assert_eq!(catalogs.line_table(&h2o).unwrap().unwrap().0.len(), 2);
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let err = load_line_table(Path::new("lines.xyz"), "CO2").unwrap_err();
        assert!(err.to_string().contains(".xyz"));
    }

    #[test]
    fn parquet_tables_load() {
        use arrow::datatypes::{DataType, Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let dir = tempdir().unwrap();
        let path = dir.path().join("o3.parquet");
        let schema = Arc::new(Schema::new(vec![
            Field::new("wavenumber", DataType::Float64, false),
            Field::new("intensity", DataType::Float32, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Float64Array::from(vec![1000.0, 1001.0])),
                Arc::new(Float32Array::from(vec![Some(2.5), None])),
            ],
        )
        .unwrap();
        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let (table, report) = load_line_table(&path, "O3").unwrap();
        assert_eq!(table.len(), 2);
        assert_relative_eq!(table.lines[0].intensity, 2.5);
        assert!(table.lines[1].intensity.is_nan());
        assert_eq!(report, LoadReport { rows: 2, malformed_rows: 1 });
    }

    #[test]
    fn reference_spectrum_skips_preamble() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("atmos.txt.gz");
        let mut text = String::new();
        for i in 0..REFERENCE_PREAMBLE {
            text.push_str(&format!("preamble {i}\n"));
        }
        text.push_str("# wn\ttrans1mm\ttrans4mm\n");
        text.push_str("1000.0\t0.9\t0.8\n1000.5\t0.95\t0.85\n1005.0\t0.5\t0.4\n");
        write_gzip(&path, &text);

        let spectrum = load_reference_spectrum(&path).unwrap();
        assert_eq!(spectrum.wavenumber, vec![1000.0, 1000.5, 1005.0]);
        assert_eq!(spectrum.curves.len(), 2);
        assert_relative_eq!(spectrum.curves["trans4mm"][2], 0.4);
    }

    #[test]
    fn descending_reference_grid_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("atmos.txt");
        let text = format!(
            "{}# wn\ttrans1mm\n1001.0\t0.9\n1000.0\t0.9\n",
            "x\n".repeat(REFERENCE_PREAMBLE)
        );
        std::fs::write(&path, text).unwrap();
        assert!(load_reference_spectrum(&path).is_err());
    }

    #[test]
    fn orders_are_pairs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.txt");
        std::fs::write(&path, "a\nb\nc\n990.1\t991.3\n992.0\t993.2\n").unwrap();
        let orders = load_orders(&path).unwrap();
        assert_eq!(orders.len(), 2);
        assert_relative_eq!(orders[1].start, 992.0);
        assert_relative_eq!(orders[1].end, 993.2);
    }
}
