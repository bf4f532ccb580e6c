use crate::access::{build_access_model, discover_columns};
use crate::canonicalize::canonicalization_rules;
use crate::columns::{normalize_users, resolve_columns, unmapped_attributes};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::groups::derive_catalogs;
use crate::model::{
    AccessColumns, AccessModel, EngineInput, Notice, RunMeta, RunResult, RunSummary,
};

/// Run one batch: resolve columns, profile variants, derive group catalogs
/// and build the access model.
///
/// Only an invalid config is an error. Missing columns and unusable priority
/// tables shrink the output and are listed in `notices`.
pub fn run(config: &EngineConfig, input: &EngineInput) -> Result<RunResult, EngineError> {
    config.validate()?;

    let mut notices = Vec::new();

    // Column resolution
    let aliases = config.columns.alias_table();
    let mapping = resolve_columns(&input.users.headers, &aliases);
    for attribute in unmapped_attributes(&mapping) {
        notices.push(Notice::MissingColumn { attribute });
    }
    let users = normalize_users(&input.users, &mapping);
    tracing::info!(
        table = %input.users.name,
        users = users.len(),
        mapped = mapping.len(),
        "users normalized"
    );

    // Canonicalization
    let mut attributes = Vec::new();
    for attribute in config.canonicalize.attribute_keys() {
        if mapping.contains(attribute) {
            attributes.push(attribute);
        } else {
            tracing::info!(%attribute, "attribute absent, skipping canonicalization");
            notices.push(Notice::MissingAttributeSet { attribute });
        }
    }
    let rules = canonicalization_rules(&users, &attributes, &config.canonicalize.acronyms);

    // Group catalogs
    let catalogs = derive_catalogs(&users, &mapping, &config.groups);

    // Access model
    let (access_columns, access_model) = match &input.priority {
        Some(table) => {
            let columns = discover_columns(&table.headers, &config.access);
            log_access_columns(&table.name, &columns);
            if columns.resource.is_none() {
                tracing::warn!(table = %table.name, "no resource-like column in priority table");
                notices.push(Notice::UnresolvableAccessColumns {
                    table: table.name.clone(),
                });
            }
            let model =
                build_access_model(table, &columns, &config.access, &config.groups.security_prefix);
            (columns, model)
        }
        None => {
            notices.push(Notice::NoPriorityTable);
            (AccessColumns::default(), AccessModel::default())
        }
    };

    let summary = RunSummary {
        users: users.len(),
        mapped_columns: mapping.len(),
        canonicalization_rules: rules.len(),
        department_groups: catalogs.department.len(),
        role_groups: catalogs.role.len(),
        license_groups: catalogs.license.len(),
        access_entries: access_model.items.len(),
        notices: notices.len(),
    };

    Ok(RunResult {
        meta: RunMeta {
            config_name: config.name.clone(),
            users_table: input.users.name.clone(),
            priority_table: input.priority.as_ref().map(|t| t.name.clone()),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        columns: mapping,
        access_columns,
        rules,
        catalogs,
        access_model,
        notices,
    })
}

fn log_access_columns(table: &str, columns: &AccessColumns) {
    for (role, m) in [
        ("department", &columns.department),
        ("resource", &columns.resource),
        ("access", &columns.access),
    ] {
        match m {
            Some(m) => tracing::info!(
                table,
                column = role,
                header = %m.header,
                keyword = %m.keyword,
                "priority column selected"
            ),
            None => tracing::info!(table, column = role, "no priority column matched"),
        }
    }
}
