use std::collections::{BTreeSet, HashSet};

use crate::config::GroupsConfig;
use crate::model::{
    AttributeKey, CatalogKind, ColumnMapping, GroupCatalog, GroupCatalogs, GroupDefinition,
    NormalizedUser,
};
use crate::naming::synthesize;

/// Escape a value for use inside a double-quoted membership rule literal.
///
/// The rule language escapes with a backtick: `"` becomes `` `" `` and a
/// literal backtick is doubled. Backslash is an ordinary character.
fn rule_literal(value: &str) -> String {
    value.replace('`', "``").replace('"', "`\"")
}

/// Distinct non-empty trimmed values of an attribute, sorted.
fn distinct_values(users: &[NormalizedUser], attribute: AttributeKey) -> BTreeSet<String> {
    users
        .iter()
        .filter_map(|u| u.get(attribute))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Append `def` unless a group with the same display name is already present.
fn push_unique(catalog: &mut GroupCatalog, seen: &mut HashSet<String>, def: GroupDefinition) {
    if seen.insert(def.display_name.clone()) {
        catalog.groups.push(def);
    } else {
        tracing::warn!(
            catalog = %catalog.kind,
            display_name = %def.display_name,
            "duplicate group name, keeping the first definition"
        );
    }
}

/// One group per distinct department, ascending, at most `department_cap`.
pub fn department_groups(users: &[NormalizedUser], config: &GroupsConfig) -> GroupCatalog {
    let mut catalog = GroupCatalog::empty(CatalogKind::Department);
    let values = distinct_values(users, AttributeKey::Department);
    if values.len() > config.department_cap {
        tracing::warn!(
            distinct = values.len(),
            cap = config.department_cap,
            "department count exceeds cap, extra departments get no group"
        );
    }

    let mut seen = HashSet::new();
    for dept in values.iter().take(config.department_cap) {
        let def = GroupDefinition::dynamic_security(
            synthesize(&config.security_prefix, "Dept", dept),
            format!("Department-scoped access for {dept}"),
            format!("(user.department -eq \"{}\")", rule_literal(dept)),
        );
        push_unique(&mut catalog, &mut seen, def);
    }
    catalog
}

/// One group per configured role keyword, whether or not any user matches.
pub fn role_groups(config: &GroupsConfig) -> GroupCatalog {
    let mut catalog = GroupCatalog::empty(CatalogKind::Role);
    let mut seen = HashSet::new();
    for keyword in &config.role_keywords {
        let keyword = keyword.trim();
        let def = GroupDefinition::dynamic_security(
            synthesize(&config.security_prefix, "Role", keyword),
            format!("Role-based access: {keyword}"),
            format!("(user.jobTitle -contains \"{}\")", rule_literal(keyword)),
        );
        push_unique(&mut catalog, &mut seen, def);
    }
    catalog
}

/// One group per distinct license SKU. Empty unless the license column was
/// resolved. The catalog is always flagged for manual enablement.
pub fn license_groups(
    users: &[NormalizedUser],
    mapping: &ColumnMapping,
    config: &GroupsConfig,
) -> GroupCatalog {
    let mut catalog = GroupCatalog::empty(CatalogKind::License);
    if !mapping.contains(AttributeKey::LicenseSku) {
        return catalog;
    }

    let mut seen = HashSet::new();
    for sku in distinct_values(users, AttributeKey::LicenseSku) {
        let def = GroupDefinition::dynamic_security(
            synthesize(&config.license_prefix, "License", &sku),
            format!("License assignment group for {sku}"),
            format!(
                "(user.assignedPlans -any (assignedPlan.service -eq \"{}\"))",
                rule_literal(&sku)
            ),
        );
        push_unique(&mut catalog, &mut seen, def);
    }
    catalog
}

pub fn derive_catalogs(
    users: &[NormalizedUser],
    mapping: &ColumnMapping,
    config: &GroupsConfig,
) -> GroupCatalogs {
    GroupCatalogs {
        department: department_groups(users, config),
        role: role_groups(config),
        license: license_groups(users, mapping, config),
    }
}
