//! `groupsmith columns`: header diagnostics for one table.

use std::path::PathBuf;

use groupsmith_io::load_table;
use groupsmith_recon::access::discover_columns;
use groupsmith_recon::columns::resolve_columns;
use groupsmith_recon::model::{AccessColumns, AttributeKey, ColumnMapping, ColumnMatch};
use groupsmith_recon::EngineConfig;
use serde::Serialize;

use crate::exit_codes::EXIT_ERROR;
use crate::run::load_config;
use crate::CliError;

#[derive(Serialize)]
struct ColumnsReport<'a> {
    table: &'a str,
    rows: usize,
    headers: &'a [String],
    attributes: &'a ColumnMapping,
    unused_headers: Vec<&'a str>,
    access_columns: &'a AccessColumns,
}

pub fn cmd_columns(
    file: PathBuf,
    sheet: Option<String>,
    config_path: Option<PathBuf>,
    json_output: bool,
) -> Result<(), CliError> {
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };

    let table = load_table(&file, sheet.as_deref()).map_err(CliError::input)?;
    let mapping = resolve_columns(&table.headers, &config.columns.alias_table());
    let access = discover_columns(&table.headers, &config.access);

    let unused_headers: Vec<&str> = table
        .headers
        .iter()
        .map(String::as_str)
        .filter(|h| !mapping.columns.values().any(|m| m == h))
        .collect();

    if json_output {
        let report = ColumnsReport {
            table: &table.name,
            rows: table.len(),
            headers: &table.headers,
            attributes: &mapping,
            unused_headers,
            access_columns: &access,
        };
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    println!("table: {} ({} rows, {} columns)", table.name, table.len(), table.headers.len());
    println!();
    println!("attributes:");
    let width = AttributeKey::ALL.iter().map(|k| k.as_str().len()).max().unwrap_or(0);
    for key in AttributeKey::ALL {
        match mapping.header_for(key) {
            Some(header) => println!("  {:<width$}  <- {:?}", key.as_str(), header),
            None => println!("  {:<width$}  -", key.as_str()),
        }
    }
    if !unused_headers.is_empty() {
        println!();
        println!("unused headers: {}", unused_headers.join(", "));
    }

    println!();
    println!("access columns:");
    for (role, m) in [
        ("department", &access.department),
        ("resource", &access.resource),
        ("access", &access.access),
    ] {
        println!("  {:<10}  {}", role, describe(m.as_ref()));
    }
    Ok(())
}

fn describe(m: Option<&ColumnMatch>) -> String {
    match m {
        Some(m) => format!("<- {:?} (keyword {:?})", m.header, m.keyword),
        None => "-".to_string(),
    }
}
