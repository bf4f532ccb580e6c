use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum IoError {
    /// File could not be opened or read.
    Read { path: PathBuf, message: String },
    /// File was read but its contents could not be parsed as a table.
    Parse { path: PathBuf, message: String },
    /// Extension is not a table format we load.
    UnsupportedFormat { path: PathBuf },
    /// Workbook has no worksheets.
    NoSheets { path: PathBuf },
    /// Requested worksheet does not exist.
    SheetNotFound { path: PathBuf, sheet: String, available: Vec<String> },
    /// Table has no header row.
    EmptyTable { path: PathBuf },
    /// Artifact could not be written.
    Write { path: PathBuf, message: String },
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::Parse { path, message } => write!(f, "cannot parse {}: {message}", path.display()),
            Self::UnsupportedFormat { path } => {
                write!(f, "{}: unsupported table format", path.display())
            }
            Self::NoSheets { path } => write!(f, "{}: workbook contains no sheets", path.display()),
            Self::SheetNotFound { path, sheet, available } => write!(
                f,
                "{}: no sheet named '{sheet}' (available: {})",
                path.display(),
                available.join(", ")
            ),
            Self::EmptyTable { path } => write!(f, "{}: no header row", path.display()),
            Self::Write { path, message } => write!(f, "cannot write {}: {message}", path.display()),
        }
    }
}

impl std::error::Error for IoError {}
