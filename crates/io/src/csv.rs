// CSV/TSV import

use std::io::Read;
use std::path::Path;

use groupsmith_recon::Table;

use crate::error::IoError;
use crate::table::{file_label, table_from_records};

/// Import a delimited file, sniffing the delimiter from its first lines.
pub fn import(path: &Path) -> Result<Table, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    tracing::debug!(path = %path.display(), delimiter = ?(delimiter as char), "sniffed delimiter");
    parse(path, &content, delimiter)
}

pub fn import_with_delimiter(path: &Path, delimiter: u8) -> Result<Table, IoError> {
    let content = read_file_as_utf8(path)?;
    parse(path, &content, delimiter)
}

fn parse(path: &Path, content: &str, delimiter: u8) -> Result<Table, IoError> {
    let table = import_from_string(content, delimiter, file_label(path)).map_err(|message| {
        IoError::Parse {
            path: path.to_path_buf(),
            message,
        }
    })?;
    if table.headers.is_empty() {
        return Err(IoError::EmptyTable {
            path: path.to_path_buf(),
        });
    }
    Ok(table)
}

/// Fields on one line under `delimiter`, with quoting honoured.
fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(1, |record| record.len())
}

/// Guess the delimiter of an export from its header and first rows.
///
/// A candidate has to split the header. The winner is the one whose field
/// count matches the header on the most sampled lines, weighted by header
/// width; earlier candidates win ties. Comma when nothing splits.
fn sniff_delimiter(content: &str) -> u8 {
    const CANDIDATES: [u8; 4] = [b'\t', b';', b',', b'|'];
    let sample: Vec<&str> = content.lines().take(10).collect();
    let Some(header) = sample.first() else {
        return b',';
    };

    let mut best = (b',', 0usize);
    for delimiter in CANDIDATES {
        let width = field_count(header, delimiter);
        if width < 2 {
            continue;
        }
        let agreeing = sample
            .iter()
            .filter(|line| field_count(line, delimiter) == width)
            .count();
        if agreeing * width > best.1 {
            best = (delimiter, agreeing * width);
        }
    }
    best.0
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let read_err = |e: std::io::Error| IoError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let mut file = std::fs::File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            tracing::debug!(path = %path.display(), "not UTF-8, decoding as Windows-1252");
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

fn import_from_string(content: &str, delimiter: u8, name: String) -> Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header: Vec<String> = match records.next() {
        Some(result) => result.map_err(|e| e.to_string())?.iter().map(str::to_string).collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    for result in records {
        let record = result.map_err(|e| e.to_string())?;
        rows.push(
            record
                .iter()
                .map(|field| if field.is_empty() { None } else { Some(field.to_string()) })
                .collect(),
        );
    }

    Ok(table_from_records(name, header, rows))
}
