use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A fully materialized input table.
///
/// `name` is the provenance label (sheet name or file stem). Each row is
/// aligned with `headers`; a `None` cell means the value was missing in the
/// source. Rows may be shorter than `headers`, trailing cells count as missing.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Convenience constructor for tables built in code. Empty strings become
    /// missing cells.
    pub fn from_rows<H, C>(name: impl Into<String>, headers: &[H], rows: &[Vec<C>]) -> Self
    where
        H: AsRef<str>,
        C: AsRef<str>,
    {
        let headers = headers.iter().map(|h| h.as_ref().to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| {
                        let c = c.as_ref();
                        if c.is_empty() { None } else { Some(c.to_string()) }
                    })
                    .collect()
            })
            .collect();
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell at (row, column index), `None` when missing or out of range.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_deref())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Tables handed to a run. The priority table is optional; without it the
/// access model is empty.
#[derive(Debug, Clone)]
pub struct EngineInput {
    pub users: Table,
    pub priority: Option<Table>,
}

// ---------------------------------------------------------------------------
// Canonical attributes
// ---------------------------------------------------------------------------

/// The closed set of directory attributes the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeKey {
    UserPrincipalName,
    DisplayName,
    GivenName,
    Surname,
    Department,
    JobTitle,
    OfficeLocation,
    EmployeeType,
    Manager,
    EmployeeId,
    CompanyName,
    City,
    State,
    Country,
    UsageLocation,
    MobilePhone,
    LicenseSku,
}

impl AttributeKey {
    /// Declaration order. Column resolution claims headers in this order.
    pub const ALL: [AttributeKey; 17] = [
        Self::UserPrincipalName,
        Self::DisplayName,
        Self::GivenName,
        Self::Surname,
        Self::Department,
        Self::JobTitle,
        Self::OfficeLocation,
        Self::EmployeeType,
        Self::Manager,
        Self::EmployeeId,
        Self::CompanyName,
        Self::City,
        Self::State,
        Self::Country,
        Self::UsageLocation,
        Self::MobilePhone,
        Self::LicenseSku,
    ];

    /// Directory property name, as used in filter rules and output files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserPrincipalName => "userPrincipalName",
            Self::DisplayName => "displayName",
            Self::GivenName => "givenName",
            Self::Surname => "surname",
            Self::Department => "department",
            Self::JobTitle => "jobTitle",
            Self::OfficeLocation => "officeLocation",
            Self::EmployeeType => "employeeType",
            Self::Manager => "manager",
            Self::EmployeeId => "employeeId",
            Self::CompanyName => "companyName",
            Self::City => "city",
            Self::State => "state",
            Self::Country => "country",
            Self::UsageLocation => "usageLocation",
            Self::MobilePhone => "mobilePhone",
            Self::LicenseSku => "licenseSku",
        }
    }

    /// Case-insensitive lookup by property name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user record keyed only by canonical attributes. Missing attributes are
/// absent from the map, never defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedUser {
    pub attributes: BTreeMap<AttributeKey, String>,
}

impl NormalizedUser {
    pub fn get(&self, key: AttributeKey) -> Option<&str> {
        self.attributes.get(&key).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// Canonical key → matched source header.
///
/// Keys without a match are absent. No header appears twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    pub columns: BTreeMap<AttributeKey, String>,
}

impl ColumnMapping {
    pub fn header_for(&self, key: AttributeKey) -> Option<&str> {
        self.columns.get(&key).map(String::as_str)
    }

    pub fn contains(&self, key: AttributeKey) -> bool {
        self.columns.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Canonicalization
// ---------------------------------------------------------------------------

/// Distinct trimmed spellings of one attribute value that share a
/// case-insensitive key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantGroup {
    pub attribute: AttributeKey,
    pub key: String,
    pub spellings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CanonicalizationRule {
    pub attribute: AttributeKey,
    pub from_value: String,
    pub to_value: String,
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

pub const DYNAMIC_MEMBERSHIP: &str = "DynamicMembership";

/// A dynamic-membership security group as the identity platform expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupDefinition {
    pub display_name: String,
    pub description: String,
    pub rule: String,
    pub security_enabled: bool,
    pub mail_enabled: bool,
    pub group_types: Vec<String>,
}

impl GroupDefinition {
    pub fn dynamic_security(
        display_name: String,
        description: String,
        rule: String,
    ) -> Self {
        Self {
            display_name,
            description,
            rule,
            security_enabled: true,
            mail_enabled: false,
            group_types: vec![DYNAMIC_MEMBERSHIP.to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Department,
    Role,
    License,
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Department => write!(f, "department"),
            Self::Role => write!(f, "role"),
            Self::License => write!(f, "license"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCatalog {
    pub kind: CatalogKind,
    /// Groups in this catalog must not be enabled automatically downstream.
    pub manual_enablement: bool,
    pub groups: Vec<GroupDefinition>,
}

impl GroupCatalog {
    pub fn empty(kind: CatalogKind) -> Self {
        Self {
            kind,
            manual_enablement: kind == CatalogKind::License,
            groups: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupCatalogs {
    pub department: GroupCatalog,
    pub role: GroupCatalog,
    pub license: GroupCatalog,
}

// ---------------------------------------------------------------------------
// Access model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccessMapEntry {
    pub department: String,
    pub resource: String,
    pub access_role: String,
    pub app_role_group: String,
}

/// The header chosen for one logical column and the keyword that matched it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMatch {
    pub header: String,
    pub keyword: String,
}

/// Which priority-table headers were taken as department/resource/access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessColumns {
    pub department: Option<ColumnMatch>,
    pub resource: Option<ColumnMatch>,
    pub access: Option<ColumnMatch>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessModel {
    pub generated_from: String,
    pub items: Vec<AccessMapEntry>,
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

/// Non-fatal degradations. A run that records notices still produces a
/// valid, smaller output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// No header matched any alias of this attribute.
    MissingColumn { attribute: AttributeKey },
    /// An attribute slated for canonicalization is absent from the table.
    MissingAttributeSet { attribute: AttributeKey },
    /// The priority table has no resource-like column.
    UnresolvableAccessColumns { table: String },
    /// No priority table was supplied.
    NoPriorityTable,
}

impl Notice {
    /// True when the notice means configured output could not be produced.
    ///
    /// Unmatched optional columns and an absent priority table are normal
    /// for partial exports and do not count.
    pub fn degrades_output(&self) -> bool {
        matches!(
            self,
            Self::MissingAttributeSet { .. } | Self::UnresolvableAccessColumns { .. }
        )
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingColumn { attribute } => {
                write!(f, "no column matched attribute '{attribute}'")
            }
            Self::MissingAttributeSet { attribute } => {
                write!(f, "attribute '{attribute}' not present, skipped canonicalization")
            }
            Self::UnresolvableAccessColumns { table } => {
                write!(f, "table '{table}': no resource-like column, access model is empty")
            }
            Self::NoPriorityTable => write!(f, "no priority table supplied, access model is empty"),
        }
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub users: usize,
    pub mapped_columns: usize,
    pub canonicalization_rules: usize,
    pub department_groups: usize,
    pub role_groups: usize,
    pub license_groups: usize,
    pub access_entries: usize,
    pub notices: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub users_table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_table: Option<String>,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub meta: RunMeta,
    pub summary: RunSummary,
    pub columns: ColumnMapping,
    pub access_columns: AccessColumns,
    pub rules: Vec<CanonicalizationRule>,
    pub catalogs: GroupCatalogs,
    pub access_model: AccessModel,
    pub notices: Vec<Notice>,
}
