use std::collections::HashSet;

use crate::config::AliasTable;
use crate::model::{AttributeKey, ColumnMapping, NormalizedUser, Table};

/// Map source headers to canonical attributes.
///
/// For each attribute (alias-table order), aliases are tried in priority
/// order and the first header equal to the alias, ignoring case, wins. A
/// header claimed by an earlier attribute is never assigned again.
pub fn resolve_columns(headers: &[String], aliases: &AliasTable) -> ColumnMapping {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let mut claimed: HashSet<usize> = HashSet::new();
    let mut mapping = ColumnMapping::default();

    for (key, key_aliases) in aliases {
        if mapping.contains(*key) {
            continue;
        }
        let found = key_aliases.iter().find_map(|alias| {
            lowered
                .iter()
                .enumerate()
                .find(|(idx, h)| *h == alias && !claimed.contains(idx))
                .map(|(idx, _)| idx)
        });
        match found {
            Some(idx) => {
                tracing::debug!(attribute = %key, header = %headers[idx], "column resolved");
                claimed.insert(idx);
                mapping.columns.insert(*key, headers[idx].clone());
            }
            None => tracing::debug!(attribute = %key, "no column matched"),
        }
    }

    mapping
}

/// Attributes with no matched column, in declaration order.
pub fn unmapped_attributes(mapping: &ColumnMapping) -> Vec<AttributeKey> {
    AttributeKey::ALL
        .iter()
        .copied()
        .filter(|k| !mapping.contains(*k))
        .collect()
}

/// Project every row through the mapping. Unmapped columns are discarded;
/// missing or whitespace-only cells leave the attribute absent.
pub fn normalize_users(table: &Table, mapping: &ColumnMapping) -> Vec<NormalizedUser> {
    let indices: Vec<(AttributeKey, usize)> = mapping
        .columns
        .iter()
        .filter_map(|(key, header)| table.column_index(header).map(|idx| (*key, idx)))
        .collect();

    (0..table.len())
        .map(|row| {
            let mut user = NormalizedUser::default();
            for (key, idx) in &indices {
                if let Some(value) = table.cell(row, *idx) {
                    if !value.trim().is_empty() {
                        user.attributes.insert(*key, value.to_string());
                    }
                }
            }
            user
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnsConfig;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_case_insensitively() {
        let h = headers(&["Email", "Full Name", "DEPT", "Job Title", "Office"]);
        let m = resolve_columns(&h, &ColumnsConfig::default().alias_table());
        assert_eq!(m.header_for(AttributeKey::UserPrincipalName), Some("Email"));
        assert_eq!(m.header_for(AttributeKey::DisplayName), Some("Full Name"));
        assert_eq!(m.header_for(AttributeKey::Department), Some("DEPT"));
        assert_eq!(m.header_for(AttributeKey::OfficeLocation), Some("Office"));
        // "job title" is not an alias; no fuzzy matching.
        assert_eq!(m.header_for(AttributeKey::JobTitle), None);
    }

    #[test]
    fn alias_priority_beats_header_order() {
        // "upn" is a higher-priority alias than "email" even though the
        // email column comes first.
        let h = headers(&["email", "UPN"]);
        let m = resolve_columns(&h, &ColumnsConfig::default().alias_table());
        assert_eq!(m.header_for(AttributeKey::UserPrincipalName), Some("UPN"));
    }

    #[test]
    fn first_matching_header_wins() {
        let h = headers(&["Department", "department"]);
        let m = resolve_columns(&h, &ColumnsConfig::default().alias_table());
        assert_eq!(m.header_for(AttributeKey::Department), Some("Department"));
    }

    #[test]
    fn header_is_not_claimed_twice() {
        let aliases = vec![
            (AttributeKey::JobTitle, vec!["role".to_string()]),
            (AttributeKey::EmployeeType, vec!["role".to_string()]),
        ];
        let m = resolve_columns(&headers(&["Role"]), &aliases);
        assert_eq!(m.header_for(AttributeKey::JobTitle), Some("Role"));
        assert_eq!(m.header_for(AttributeKey::EmployeeType), None);
    }

    #[test]
    fn unmapped_keys_are_absent() {
        let m = resolve_columns(&headers(&["Department"]), &ColumnsConfig::default().alias_table());
        assert_eq!(m.len(), 1);
        let missing = unmapped_attributes(&m);
        assert_eq!(missing.len(), AttributeKey::ALL.len() - 1);
        assert!(!missing.contains(&AttributeKey::Department));
    }

    #[test]
    fn normalize_drops_unmapped_and_missing() {
        let table = Table::from_rows(
            "Users",
            &["UPN", "Department", "Favourite Colour"],
            &[
                vec!["a@x.com", "Finance", "blue"],
                vec!["b@x.com", "", "green"],
                vec!["c@x.com", "   ", ""],
            ],
        );
        let m = resolve_columns(&table.headers, &ColumnsConfig::default().alias_table());
        let users = normalize_users(&table, &m);
        assert_eq!(users.len(), 3);
        assert_eq!(users[0].get(AttributeKey::Department), Some("Finance"));
        assert_eq!(users[0].attributes.len(), 2);
        assert_eq!(users[1].get(AttributeKey::Department), None);
        assert_eq!(users[2].get(AttributeKey::Department), None);
        assert_eq!(users[2].get(AttributeKey::UserPrincipalName), Some("c@x.com"));
    }

    #[test]
    fn short_rows_leave_trailing_attributes_absent() {
        let mut table = Table::new("Users", headers(&["UPN", "Department"]));
        table.rows.push(vec![Some("a@x.com".into())]);
        let m = resolve_columns(&table.headers, &ColumnsConfig::default().alias_table());
        let users = normalize_users(&table, &m);
        assert_eq!(users[0].get(AttributeKey::Department), None);
    }
}
