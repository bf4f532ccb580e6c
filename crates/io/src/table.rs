use std::path::Path;

use groupsmith_recon::Table;

use crate::error::IoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Delimited text; the delimiter is sniffed.
    Csv,
    Tsv,
    /// Any workbook calamine opens (xlsx, xlsm, xlsb, xls, ods).
    Workbook,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(Self::Csv),
            "tsv" | "tab" => Some(Self::Tsv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }
}

/// Load a table from disk.
///
/// `sheet` selects a worksheet in a workbook; without it the sheet with the
/// most rows is used. It is ignored for delimited text.
pub fn load_table(path: &Path, sheet: Option<&str>) -> Result<Table, IoError> {
    let format = TableFormat::from_path(path).ok_or_else(|| IoError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let table = match format {
        TableFormat::Csv => crate::csv::import(path)?,
        TableFormat::Tsv => crate::csv::import_with_delimiter(path, b'\t')?,
        TableFormat::Workbook => crate::xlsx::import(path, sheet)?,
    };
    tracing::info!(
        path = %path.display(),
        table = %table.name,
        columns = table.headers.len(),
        rows = table.rows.len(),
        "table loaded"
    );
    Ok(table)
}

/// Collapse internal whitespace runs to one space and trim.
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build a table from a header row and data rows of raw text cells.
///
/// Headers are normalized, empty cells become missing, and rows with no
/// value at all are skipped.
pub(crate) fn table_from_records(
    name: String,
    header: Vec<String>,
    records: Vec<Vec<Option<String>>>,
) -> Table {
    let mut table = Table::new(name, header.iter().map(|h| normalize_header(h)).collect());
    for record in records {
        if record.iter().all(|c| c.as_deref().map_or(true, |v| v.trim().is_empty())) {
            continue;
        }
        table.rows.push(record);
    }
    table
}

/// Display name for a file: its stem, or the whole path when there is none.
pub(crate) fn file_label(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
