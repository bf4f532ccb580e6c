use crate::config::AccessConfig;
use crate::model::{AccessColumns, AccessMapEntry, AccessModel, ColumnMatch, Table};
use crate::naming::{clean_value, synthesize};

/// First header (in table order) containing any keyword, ignoring case,
/// skipping headers already taken.
fn find_column(headers: &[String], keywords: &[String], taken: &[&str]) -> Option<ColumnMatch> {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|kw| kw.trim().to_lowercase())
        .filter(|kw| !kw.is_empty())
        .collect();
    headers.iter().find_map(|header| {
        if taken.contains(&header.as_str()) {
            return None;
        }
        let lowered = header.to_lowercase();
        keywords
            .iter()
            .find(|kw| lowered.contains(kw.as_str()))
            .map(|kw| ColumnMatch {
                header: header.clone(),
                keyword: kw.clone(),
            })
    })
}

/// Pick the department, resource and access columns of a priority table.
///
/// Columns are claimed in that order and a header is never used for two of
/// them.
pub fn discover_columns(headers: &[String], config: &AccessConfig) -> AccessColumns {
    let department = find_column(headers, &config.department_keywords, &[]);

    let mut taken: Vec<&str> = Vec::new();
    if let Some(ref m) = department {
        taken.push(&m.header);
    }
    let resource = find_column(headers, &config.resource_keywords, &taken);

    if let Some(ref m) = resource {
        taken.push(&m.header);
    }
    let access = find_column(headers, &config.access_keywords, &taken);

    AccessColumns {
        department,
        resource,
        access,
    }
}

/// Build the department → resource → role → group mapping.
///
/// Every row with a non-empty resource becomes one entry, duplicates
/// included. Rows with a blank resource are dropped. Without a resource
/// column the model is empty.
pub fn build_access_model(
    table: &Table,
    columns: &AccessColumns,
    config: &AccessConfig,
    group_prefix: &str,
) -> AccessModel {
    let mut model = AccessModel {
        generated_from: table.name.clone(),
        items: Vec::new(),
    };

    let Some(resource_idx) = columns
        .resource
        .as_ref()
        .and_then(|m| table.column_index(&m.header))
    else {
        return model;
    };
    let department_idx = columns
        .department
        .as_ref()
        .and_then(|m| table.column_index(&m.header));
    let access_idx = columns
        .access
        .as_ref()
        .and_then(|m| table.column_index(&m.header));

    let trimmed = |row: usize, idx: Option<usize>| -> String {
        idx.and_then(|i| table.cell(row, i))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };

    for row in 0..table.len() {
        let resource = trimmed(row, Some(resource_idx));
        if resource.is_empty() {
            tracing::trace!(row, "blank resource, row dropped");
            continue;
        }

        let department = trimmed(row, department_idx);
        let access = trimmed(row, access_idx);
        let access_role = if access.is_empty() {
            config.default_role.clone()
        } else {
            access
        };

        let scope = format!("App-{}", clean_value(&resource));
        let app_role_group = synthesize(group_prefix, &scope, &access_role);

        model.items.push(AccessMapEntry {
            department,
            resource,
            access_role,
            app_role_group,
        });
    }

    model
}
