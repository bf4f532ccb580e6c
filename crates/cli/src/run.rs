//! `groupsmith run` and `groupsmith validate`.

use std::path::{Path, PathBuf};

use groupsmith_io::artifacts::{self, ACCESS_MODEL, DYNAMIC_GROUPS, NORMALIZATION_MAP};
use groupsmith_io::load_table;
use groupsmith_recon::model::{AttributeKey, EngineInput, Notice, RunResult};
use groupsmith_recon::{EngineConfig, EngineError};

use crate::exit_codes::{EXIT_DEGRADED, EXIT_ERROR};
use crate::scripts;
use crate::CliError;

/// Read and validate a config file.
pub fn load_config(path: &Path) -> Result<EngineConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::config(format!("cannot read config {}: {e}", path.display())))?;
    EngineConfig::from_toml(&text).map_err(|e| {
        let hint = match &e {
            EngineError::UnknownAttribute { .. } => Some(format!(
                "known attributes: {}",
                AttributeKey::ALL.map(|k| k.as_str()).join(", ")
            )),
            _ => None,
        };
        let err = CliError::config(format!("{}: {e}", path.display()));
        match hint {
            Some(h) => err.with_hint(h),
            None => err,
        }
    })
}

/// Directory that relative paths in a config are resolved against.
fn config_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let base = config_dir(&config_path);

    eprintln!("config ok: {}", config.name);
    eprintln!("  users:    {}", base.join(&config.inputs.users).display());
    match &config.inputs.priority {
        Some(p) => eprintln!("  priority: {}", base.join(p).display()),
        None => eprintln!("  priority: (none, access model will be empty)"),
    }
    eprintln!("  output:   {}", base.join(&config.output.dir).display());
    Ok(())
}

pub fn cmd_run(
    config_path: PathBuf,
    output_dir: Option<PathBuf>,
    json_output: bool,
    no_scripts: bool,
    strict: bool,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    // Resolve file paths relative to config file's directory
    let base = config_dir(&config_path);

    let users_path = base.join(&config.inputs.users);
    let users = load_table(&users_path, config.inputs.users_sheet.as_deref())
        .map_err(CliError::input)?;
    let priority = match &config.inputs.priority {
        Some(p) => Some(
            load_table(&base.join(p), config.inputs.priority_sheet.as_deref())
                .map_err(CliError::input)?,
        ),
        None => None,
    };

    let input = EngineInput { users, priority };
    let result = groupsmith_recon::run(&config, &input).map_err(|e| CliError::config(e.to_string()))?;

    let out_dir = output_dir.unwrap_or_else(|| base.join(&config.output.dir));
    let written = write_artifacts(&out_dir, &result, &config, config.output.scripts && !no_scripts)?;

    if json_output {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    print_summary(&result);
    eprintln!("wrote {} files to {}", written.len(), out_dir.display());

    if strict && result.notices.iter().any(|n| n.degrades_output()) {
        return Err(CliError::new(EXIT_DEGRADED, "run degraded (--strict)")
            .with_hint("see the notices above; add column aliases or fix the input tables"));
    }
    Ok(())
}

/// Write every artifact into `dir`, returning the paths written.
fn write_artifacts(
    dir: &Path,
    result: &RunResult,
    config: &EngineConfig,
    with_scripts: bool,
) -> Result<Vec<PathBuf>, CliError> {
    artifacts::ensure_dir(dir).map_err(CliError::output)?;
    let mut written = Vec::new();

    let path = dir.join(NORMALIZATION_MAP);
    artifacts::write_normalization_csv(&path, &result.rules).map_err(CliError::output)?;
    written.push(path);

    let path = dir.join(DYNAMIC_GROUPS);
    artifacts::write_json(&path, &result.catalogs).map_err(CliError::output)?;
    written.push(path);

    let path = dir.join(ACCESS_MODEL);
    artifacts::write_json(&path, &result.access_model).map_err(CliError::output)?;
    written.push(path);

    if with_scripts {
        let rendered = [
            (scripts::CREATE_DYNAMIC_GROUPS, scripts::dynamic_groups_script(&result.catalogs)),
            (scripts::NORMALIZE_ATTRIBUTES, scripts::normalize_attributes_script()),
            (
                scripts::CREATE_APP_ROLE_GROUPS,
                scripts::app_role_groups_script(&result.access_model, &config.groups.security_prefix),
            ),
        ];
        for (name, text) in rendered {
            let path = dir.join(name);
            artifacts::write_text(&path, &text).map_err(CliError::output)?;
            written.push(path);
        }
    }

    tracing::info!(dir = %dir.display(), files = written.len(), "artifacts written");
    Ok(written)
}

fn print_summary(result: &RunResult) {
    let s = &result.summary;
    eprintln!(
        "{}: {} users from '{}', {} of {} attributes mapped",
        result.meta.config_name,
        s.users,
        result.meta.users_table,
        s.mapped_columns,
        AttributeKey::ALL.len(),
    );
    eprintln!("rules: {} canonicalization rules", s.canonicalization_rules);
    eprintln!(
        "groups: {} department, {} role, {} license{}",
        s.department_groups,
        s.role_groups,
        s.license_groups,
        if s.license_groups > 0 { " (manual enablement)" } else { "" },
    );
    match &result.meta.priority_table {
        Some(table) => eprintln!("access: {} entries from '{}'", s.access_entries, table),
        None => eprintln!("access: no priority table"),
    }
    let unmapped: Vec<&str> = result
        .notices
        .iter()
        .filter_map(|n| match n {
            Notice::MissingColumn { attribute } => Some(attribute.as_str()),
            _ => None,
        })
        .collect();
    if !unmapped.is_empty() {
        eprintln!("unmapped: {}", unmapped.join(", "));
    }
    for notice in &result.notices {
        if matches!(notice, Notice::MissingColumn { .. } | Notice::NoPriorityTable) {
            continue;
        }
        eprintln!("notice: {notice}");
    }
}
