// Workbook import (xlsx, xlsm, xlsb, xls, ods)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use groupsmith_recon::Table;

use crate::error::IoError;
use crate::table::table_from_records;

/// Import one worksheet as a table.
///
/// With `sheet` the named worksheet is read. Otherwise every worksheet is
/// opened and the one with the most rows wins; ties go to the earlier sheet.
/// The first row of the sheet is the header row.
pub fn import(path: &Path, sheet: Option<&str>) -> Result<Table, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| IoError::Read {
        path: path.to_path_buf(),
        message: format!("failed to open workbook: {e}"),
    })?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(IoError::NoSheets {
            path: path.to_path_buf(),
        });
    }

    let (name, range) = match sheet {
        Some(wanted) => {
            let Some(found) = sheet_names.iter().find(|n| n.as_str() == wanted) else {
                return Err(IoError::SheetNotFound {
                    path: path.to_path_buf(),
                    sheet: wanted.to_string(),
                    available: sheet_names,
                });
            };
            let range = read_range(&mut workbook, path, found)?;
            (found.clone(), range)
        }
        None => {
            let mut best: Option<(String, Range<Data>)> = None;
            for name in &sheet_names {
                let range = read_range(&mut workbook, path, name)?;
                tracing::debug!(sheet = %name, rows = range.height(), "scanned sheet");
                if best.as_ref().map_or(true, |(_, b)| range.height() > b.height()) {
                    best = Some((name.clone(), range));
                }
            }
            match best {
                Some(found) => found,
                None => {
                    return Err(IoError::NoSheets {
                        path: path.to_path_buf(),
                    })
                }
            }
        }
    };

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Err(IoError::EmptyTable {
            path: path.to_path_buf(),
        });
    };
    let header: Vec<String> = header_row
        .iter()
        .map(|cell| cell_text(cell).unwrap_or_default())
        .collect();
    let records: Vec<Vec<Option<String>>> = rows
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    Ok(table_from_records(name, header, records))
}

fn read_range(
    workbook: &mut Sheets<std::io::BufReader<std::fs::File>>,
    path: &Path,
    name: &str,
) -> Result<Range<Data>, IoError> {
    workbook.worksheet_range(name).map_err(|e| IoError::Parse {
        path: path.to_path_buf(),
        message: format!("failed to read sheet '{name}': {e}"),
    })
}

/// Text of a cell as it would be shown, or `None` when the cell holds nothing usable.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Data::Float(n) => {
            // Integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                Some(format!("{}", *n as i64))
            } else {
                Some(format!("{}", n))
            }
        }
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        // #N/A, #REF! and friends carry no attribute value
        Data::Error(_) => None,
        Data::DateTime(dt) => Some(format!("{}", dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    #[test]
    fn test_cell_text_conversions() {
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::String("  HR ".into())), Some("HR".into()));
        assert_eq!(cell_text(&Data::String("   ".into())), None);
        assert_eq!(cell_text(&Data::Float(1042.0)), Some("1042".into()));
        assert_eq!(cell_text(&Data::Float(2.5)), Some("2.5".into()));
        assert_eq!(cell_text(&Data::Int(-7)), Some("-7".into()));
        assert_eq!(cell_text(&Data::Bool(true)), Some("TRUE".into()));
        assert_eq!(cell_text(&Data::Bool(false)), Some("FALSE".into()));
        assert_eq!(cell_text(&Data::Error(CellErrorType::NA)), None);
        assert_eq!(
            cell_text(&Data::DateTimeIso("2024-01-31".into())),
            Some("2024-01-31".into())
        );
    }

    #[test]
    fn test_missing_workbook_is_a_read_error() {
        let err = import(Path::new("/nonexistent/users.xlsx"), None).unwrap_err();
        assert!(matches!(err, IoError::Read { .. }));
    }

    #[test]
    fn test_garbage_workbook_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"definitely not a zip archive").unwrap();
        let err = import(&path, None).unwrap_err();
        assert!(matches!(err, IoError::Read { .. }));
    }
}
