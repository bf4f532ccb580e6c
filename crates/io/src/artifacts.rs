// Run artifact writers: normalization map CSV, JSON documents, script text.

use std::fs;
use std::path::Path;

use groupsmith_recon::model::CanonicalizationRule;
use serde::Serialize;

use crate::error::IoError;

pub const NORMALIZATION_MAP: &str = "Attribute-Normalization-Map.csv";
pub const DYNAMIC_GROUPS: &str = "Dynamic-Groups.json";
pub const ACCESS_MODEL: &str = "App-Access-Model.json";

fn write_err(path: &Path) -> impl Fn(String) -> IoError + '_ {
    move |message| IoError::Write {
        path: path.to_path_buf(),
        message,
    }
}

/// Create the output directory (and parents) if needed.
pub fn ensure_dir(dir: &Path) -> Result<(), IoError> {
    fs::create_dir_all(dir).map_err(|e| write_err(dir)(e.to_string()))
}

/// Write the normalization map with the header `Attribute,FromValue,ToValue`.
///
/// The header is written even when there are no rules so downstream
/// consumers always see the expected columns.
pub fn write_normalization_csv(path: &Path, rules: &[CanonicalizationRule]) -> Result<(), IoError> {
    let err = write_err(path);
    let mut writer = csv::Writer::from_path(path).map_err(|e| err(e.to_string()))?;
    writer
        .write_record(["Attribute", "FromValue", "ToValue"])
        .map_err(|e| err(e.to_string()))?;
    for rule in rules {
        writer
            .write_record([rule.attribute.as_str(), rule.from_value.as_str(), rule.to_value.as_str()])
            .map_err(|e| err(e.to_string()))?;
    }
    writer.flush().map_err(|e| err(e.to_string()))?;
    tracing::debug!(path = %path.display(), rules = rules.len(), "wrote normalization map");
    Ok(())
}

/// Write any serializable value as pretty-printed JSON with a trailing newline.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), IoError> {
    let err = write_err(path);
    let mut text = serde_json::to_string_pretty(value).map_err(|e| err(e.to_string()))?;
    text.push('\n');
    fs::write(path, text).map_err(|e| err(e.to_string()))?;
    tracing::debug!(path = %path.display(), "wrote json");
    Ok(())
}

pub fn write_text(path: &Path, text: &str) -> Result<(), IoError> {
    fs::write(path, text).map_err(|e| write_err(path)(e.to_string()))?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "wrote text");
    Ok(())
}
