use std::collections::{BTreeMap, BTreeSet};

use crate::model::{AttributeKey, CanonicalizationRule, NormalizedUser, VariantGroup};

/// Group the observed spellings of one attribute by their case-insensitive
/// key, keeping only keys seen with more than one distinct spelling.
///
/// Values are trimmed before comparison; empty values are ignored. Groups and
/// their spellings come back sorted.
pub fn variant_groups(users: &[NormalizedUser], attribute: AttributeKey) -> Vec<VariantGroup> {
    let mut by_key: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for value in users.iter().filter_map(|u| u.get(attribute)) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        by_key
            .entry(trimmed.to_lowercase())
            .or_default()
            .insert(trimmed.to_string());
    }

    by_key
        .into_iter()
        .filter(|(_, spellings)| spellings.len() > 1)
        .map(|(key, spellings)| VariantGroup {
            attribute,
            key,
            spellings: spellings.into_iter().collect(),
        })
        .collect()
}

/// Canonical spelling for a lowercase variant key.
///
/// Tokens equal to an acronym (ignoring case) are written as the acronym;
/// every other token gets an upper-case first character and lower-case rest.
pub fn canonical_spelling(key: &str, acronyms: &[String]) -> String {
    key.split_whitespace()
        .map(|token| {
            match acronyms.iter().find(|a| a.to_lowercase() == token.to_lowercase()) {
                Some(acronym) => acronym.clone(),
                None => capitalize(token),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Canonicalization rules for the given attributes, deduplicated and sorted
/// by (attribute name, from value).
///
/// The canonical spelling itself never produces a rule.
pub fn canonicalization_rules(
    users: &[NormalizedUser],
    attributes: &[AttributeKey],
    acronyms: &[String],
) -> Vec<CanonicalizationRule> {
    let mut rules: BTreeSet<(&'static str, String, String, AttributeKey)> = BTreeSet::new();

    for &attribute in attributes {
        for group in variant_groups(users, attribute) {
            let canonical = canonical_spelling(&group.key, acronyms);
            for spelling in group.spellings {
                if spelling != canonical {
                    rules.insert((attribute.as_str(), spelling, canonical.clone(), attribute));
                }
            }
        }
    }

    rules
        .into_iter()
        .map(|(_, from_value, to_value, attribute)| CanonicalizationRule {
            attribute,
            from_value,
            to_value,
        })
        .collect()
}
