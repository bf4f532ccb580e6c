use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::EngineError;
use crate::model::AttributeKey;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// One batch run: where the tables come from, where artifacts go, and every
/// policy knob the engine applies.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub inputs: InputsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub columns: ColumnsConfig,
    #[serde(default)]
    pub canonicalize: CanonicalizeConfig,
    #[serde(default)]
    pub groups: GroupsConfig,
    #[serde(default)]
    pub access: AccessConfig,
}

fn default_name() -> String {
    "groupsmith".into()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            inputs: InputsConfig::default(),
            output: OutputConfig::default(),
            columns: ColumnsConfig::default(),
            canonicalize: CanonicalizeConfig::default(),
            groups: GroupsConfig::default(),
            access: AccessConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs + Output
// ---------------------------------------------------------------------------

/// Table references. Paths are resolved by the caller, relative to the
/// config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputsConfig {
    pub users: String,
    #[serde(default)]
    pub users_sheet: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub priority_sheet: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default = "default_true")]
    pub scripts: bool,
}

fn default_output_dir() -> String {
    "out".into()
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            scripts: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Column aliases
// ---------------------------------------------------------------------------

/// Built-in alias table, in priority order per attribute.
pub fn default_aliases(key: AttributeKey) -> &'static [&'static str] {
    match key {
        AttributeKey::UserPrincipalName => {
            &["userprincipalname", "upn", "email", "signin name", "user name", "user"]
        }
        AttributeKey::DisplayName => &["displayname", "name", "full name"],
        AttributeKey::GivenName => &["givenname", "first name", "firstname"],
        AttributeKey::Surname => &["surname", "last name", "lastname", "familyname"],
        AttributeKey::Department => &["department", "dept"],
        AttributeKey::JobTitle => &["jobtitle", "title", "position", "role"],
        AttributeKey::OfficeLocation => &["officelocation", "location", "office", "site"],
        AttributeKey::EmployeeType => &["employeetype", "type", "worker type", "classification"],
        AttributeKey::Manager => &["manager", "manager upn", "manager email", "reports to"],
        AttributeKey::EmployeeId => &["employeeid", "id", "worker id", "personnel number"],
        AttributeKey::CompanyName => &["company", "companyname", "tenant"],
        AttributeKey::City => &["city", "town"],
        AttributeKey::State => &["state", "province", "region"],
        AttributeKey::Country => &["country", "country/region", "countryregion"],
        AttributeKey::UsageLocation => &["usagelocation", "m365 usage location"],
        AttributeKey::MobilePhone => &["mobilephone", "mobile", "phone", "phone number"],
        AttributeKey::LicenseSku => &["licensesku", "sku", "license", "assigned license"],
    }
}

/// Canonical key → ordered lowercase aliases, in [`AttributeKey::ALL`] order.
pub type AliasTable = Vec<(AttributeKey, Vec<String>)>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnsConfig {
    /// Per-attribute replacement of the built-in alias list. An empty list
    /// disables the attribute.
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

impl ColumnsConfig {
    /// Built-in aliases merged with overrides. Unknown attribute names are
    /// ignored here; [`EngineConfig::validate`] rejects them.
    pub fn alias_table(&self) -> AliasTable {
        let mut overrides: BTreeMap<AttributeKey, &Vec<String>> = BTreeMap::new();
        for (name, aliases) in &self.aliases {
            if let Some(key) = AttributeKey::parse(name) {
                overrides.insert(key, aliases);
            }
        }

        AttributeKey::ALL
            .iter()
            .map(|&key| {
                let aliases = match overrides.get(&key) {
                    Some(list) => list.iter().map(|a| a.trim().to_lowercase()).collect(),
                    None => default_aliases(key).iter().map(|a| a.to_string()).collect(),
                };
                (key, aliases)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Canonicalization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanonicalizeConfig {
    #[serde(default = "default_canonical_attributes")]
    pub attributes: Vec<String>,
    /// Tokens written verbatim instead of being capitalized.
    #[serde(default = "default_acronyms")]
    pub acronyms: Vec<String>,
}

fn default_canonical_attributes() -> Vec<String> {
    ["department", "jobTitle", "officeLocation", "employeeType"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_acronyms() -> Vec<String> {
    ["HR", "IT", "R&D", "QA"].iter().map(|s| s.to_string()).collect()
}

impl Default for CanonicalizeConfig {
    fn default() -> Self {
        Self {
            attributes: default_canonical_attributes(),
            acronyms: default_acronyms(),
        }
    }
}

impl CanonicalizeConfig {
    /// Configured attributes that name a canonical key, in config order,
    /// without repeats.
    pub fn attribute_keys(&self) -> Vec<AttributeKey> {
        let mut keys = Vec::new();
        for key in self.attributes.iter().filter_map(|a| AttributeKey::parse(a)) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupsConfig {
    /// Upper bound on department groups. Guards against runaway group counts
    /// when the department column is noisy.
    #[serde(default = "default_department_cap")]
    pub department_cap: usize,
    #[serde(default = "default_role_keywords")]
    pub role_keywords: Vec<String>,
    #[serde(default = "default_security_prefix")]
    pub security_prefix: String,
    #[serde(default = "default_license_prefix")]
    pub license_prefix: String,
}

fn default_department_cap() -> usize {
    100
}

fn default_role_keywords() -> Vec<String> {
    [
        "Analyst",
        "Manager",
        "Director",
        "Engineer",
        "Specialist",
        "Assistant",
        "Intern",
        "Contractor",
        "Consultant",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_security_prefix() -> String {
    "SG".into()
}

fn default_license_prefix() -> String {
    "LG".into()
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            department_cap: default_department_cap(),
            role_keywords: default_role_keywords(),
            security_prefix: default_security_prefix(),
            license_prefix: default_license_prefix(),
        }
    }
}

// ---------------------------------------------------------------------------
// Access model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessConfig {
    /// Role used when a row has no access value.
    #[serde(default = "default_access_role")]
    pub default_role: String,
    #[serde(default = "default_department_keywords")]
    pub department_keywords: Vec<String>,
    #[serde(default = "default_resource_keywords")]
    pub resource_keywords: Vec<String>,
    #[serde(default = "default_access_keywords")]
    pub access_keywords: Vec<String>,
}

fn default_access_role() -> String {
    "Users".into()
}

fn default_department_keywords() -> Vec<String> {
    vec!["department".into(), "dept".into()]
}

fn default_resource_keywords() -> Vec<String> {
    ["application", "resource", "system", "app", "saas", "sharepoint", "drive"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_access_keywords() -> Vec<String> {
    ["access", "role", "permission", "entitlement"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            default_role: default_access_role(),
            department_keywords: default_department_keywords(),
            resource_keywords: default_resource_keywords(),
            access_keywords: default_access_keywords(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl EngineConfig {
    pub fn from_toml(input: &str) -> Result<Self, EngineError> {
        let mut config: EngineConfig =
            toml::from_str(input).map_err(|e| EngineError::ConfigParse(e.to_string()))?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Lowercase and trim every keyword list the engine matches against.
    pub fn normalize(&mut self) {
        for aliases in self.columns.aliases.values_mut() {
            for alias in aliases.iter_mut() {
                *alias = alias.trim().to_lowercase();
            }
            aliases.retain(|a| !a.is_empty());
        }
        for list in [
            &mut self.access.department_keywords,
            &mut self.access.resource_keywords,
            &mut self.access.access_keywords,
        ] {
            for kw in list.iter_mut() {
                *kw = kw.trim().to_lowercase();
            }
            list.retain(|k| !k.is_empty());
        }
        for acronym in self.canonicalize.acronyms.iter_mut() {
            *acronym = acronym.trim().to_string();
        }
        self.canonicalize.acronyms.retain(|a| !a.is_empty());
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for name in self.columns.aliases.keys() {
            if AttributeKey::parse(name).is_none() {
                return Err(EngineError::UnknownAttribute {
                    section: "columns.aliases".into(),
                    name: name.clone(),
                });
            }
        }

        for name in &self.canonicalize.attributes {
            if AttributeKey::parse(name).is_none() {
                return Err(EngineError::UnknownAttribute {
                    section: "canonicalize".into(),
                    name: name.clone(),
                });
            }
        }

        if self.canonicalize.acronyms.iter().any(|a| a.contains(char::is_whitespace)) {
            return Err(EngineError::ConfigValidation(
                "canonicalize.acronyms entries must be single tokens".into(),
            ));
        }

        if self.groups.department_cap == 0 {
            return Err(EngineError::ConfigValidation(
                "groups.department_cap must be at least 1".into(),
            ));
        }

        for (field, prefix) in [
            ("security_prefix", &self.groups.security_prefix),
            ("license_prefix", &self.groups.license_prefix),
        ] {
            if prefix.trim().is_empty() {
                return Err(EngineError::ConfigValidation(format!(
                    "groups.{field} must not be empty"
                )));
            }
        }

        if self.groups.role_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(EngineError::ConfigValidation(
                "groups.role_keywords must not contain empty entries".into(),
            ));
        }

        if self.access.resource_keywords.is_empty() {
            return Err(EngineError::ConfigValidation(
                "access.resource_keywords must not be empty".into(),
            ));
        }

        if self.access.default_role.trim().is_empty() {
            return Err(EngineError::ConfigValidation(
                "access.default_role must not be empty".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
