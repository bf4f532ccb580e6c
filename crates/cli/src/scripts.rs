//! PowerShell provisioning scripts rendered from a run result.
//!
//! Each script is a fixed template; only quoted literals and the generated
//! call lists vary. The scripts talk to Microsoft Graph and are meant to be
//! reviewed and run by an administrator, never by this tool.

use std::collections::BTreeMap;

use groupsmith_io::artifacts::{ACCESS_MODEL, NORMALIZATION_MAP};
use groupsmith_recon::model::{AccessModel, GroupCatalog, GroupCatalogs, GroupDefinition};
use groupsmith_recon::synthesize;

pub const CREATE_DYNAMIC_GROUPS: &str = "Create-Dynamic-Groups.ps1";
pub const NORMALIZE_ATTRIBUTES: &str = "Normalize-Attributes.ps1";
pub const CREATE_APP_ROLE_GROUPS: &str = "Create-App-Role-Groups.ps1";

/// Single-quoted PowerShell literal. Embedded single quotes are doubled.
pub fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn connect_block(scopes: &str) -> String {
    format!(
        r#"Import-Module Microsoft.Graph.Authentication

if ($TenantId) {{
    Connect-MgGraph -TenantId $TenantId -Scopes {scopes} -NoWelcome
}} else {{
    Connect-MgGraph -Scopes {scopes} -NoWelcome
}}
"#
    )
}

fn ensure_call(group: &GroupDefinition) -> String {
    format!(
        "Ensure-DynamicGroup -DisplayName {} -Description {} -Rule {}",
        ps_quote(&group.display_name),
        ps_quote(&group.description),
        ps_quote(&group.rule),
    )
}

fn push_catalog(out: &mut String, title: &str, catalog: &GroupCatalog) {
    out.push_str(&format!("\n# {title} ({})\n", catalog.len()));
    for group in &catalog.groups {
        if catalog.manual_enablement {
            out.push_str("# ");
        }
        out.push_str(&ensure_call(group));
        out.push('\n');
    }
}

/// Create or update every dynamic group. License groups are written
/// commented out so they stay off until someone enables them by hand.
pub fn dynamic_groups_script(catalogs: &GroupCatalogs) -> String {
    let mut out = String::from(
        r#"<#
Creates or updates dynamic security groups in Microsoft Entra ID.
Requires: Microsoft.Graph (Install-Module Microsoft.Graph)
#>

param(
    [Parameter(Mandatory=$false)][string]$TenantId
)

"#,
    );
    out.push_str(&connect_block(r#""Group.ReadWrite.All","Directory.ReadWrite.All""#));
    out.push_str(
        r#"
function Ensure-DynamicGroup {
    param(
        [string]$DisplayName,
        [string]$Description,
        [string]$Rule
    )

    $filter = "displayName eq '{0}'" -f ($DisplayName -replace "'", "''")
    $existing = Get-MgGroup -Filter $filter -ConsistencyLevel eventual -CountVariable count | Select-Object -First 1
    if ($existing) {
        Write-Host "Updating group: $DisplayName"
        Update-MgGroup -GroupId $existing.Id -Description $Description -MembershipRule $Rule -MembershipRuleProcessingState "On"
    } else {
        Write-Host "Creating group: $DisplayName"
        $nick = ($DisplayName -replace '[^A-Za-z0-9]', '')
        if ($nick.Length -gt 64) { $nick = $nick.Substring(0, 64) }
        New-MgGroup -DisplayName $DisplayName -Description $Description -MailEnabled:$false -MailNickname $nick `
            -SecurityEnabled:$true -GroupTypes @("DynamicMembership") `
            -MembershipRule $Rule -MembershipRuleProcessingState "On" | Out-Null
    }
}
"#,
    );

    push_catalog(&mut out, "Department groups", &catalogs.department);
    push_catalog(&mut out, "Role groups", &catalogs.role);
    if !catalogs.license.is_empty() {
        out.push_str("\n# License groups are disabled by default. Uncomment to enable.");
        push_catalog(&mut out, "License groups", &catalogs.license);
    }

    out.push_str("\nWrite-Host 'Done.'\n");
    out
}

/// Apply the normalization map to live user objects.
pub fn normalize_attributes_script() -> String {
    let mut out = format!(
        r#"<#
Normalizes user attribute spellings using {NORMALIZATION_MAP}.
CSV columns: Attribute,FromValue,ToValue
Requires: Microsoft.Graph (Install-Module Microsoft.Graph)
#>

param(
    [Parameter(Mandatory=$false)][string]$CsvPath = (Join-Path $PSScriptRoot {csv}),
    [Parameter(Mandatory=$false)][string]$TenantId,
    [switch]$DryRun
)

"#,
        csv = ps_quote(NORMALIZATION_MAP),
    );
    out.push_str(&connect_block(r#""User.ReadWrite.All","Directory.Read.All""#));
    out.push_str(
        r#"
$map = Import-Csv -Path $CsvPath

foreach ($pair in $map) {
    $attr = $pair.Attribute
    $from = $pair.FromValue
    $to = $pair.ToValue
    if ([string]::IsNullOrWhiteSpace($from) -or [string]::IsNullOrWhiteSpace($to)) { continue }

    Write-Host "Normalizing ${attr}: '$from' -> '$to'"
    $filter = "{0} eq '{1}'" -f $attr, ($from -replace "'", "''")
    $users = Get-MgUser -All -Filter $filter -ConsistencyLevel eventual -CountVariable count -Property "id,userPrincipalName,$attr"

    foreach ($u in $users) {
        # Directory filters are case-insensitive; only touch the exact spelling.
        if ($u.$attr -cne $from) { continue }
        if ($DryRun) {
            Write-Host "  Would update: $($u.UserPrincipalName)"
            continue
        }
        try {
            Update-MgUser -UserId $u.Id -BodyParameter @{ $attr = $to }
            Write-Host "  Updated: $($u.UserPrincipalName)"
        } catch {
            Write-Warning "  Failed: $($u.UserPrincipalName) - $($_.Exception.Message)"
        }
    }
}

Write-Host 'Normalization pass complete.'
"#,
    );
    out
}

/// Department → feeder group name, for every department the access model
/// mentions.
pub fn feeder_groups(model: &AccessModel, security_prefix: &str) -> BTreeMap<String, String> {
    model
        .items
        .iter()
        .filter(|item| !item.department.is_empty())
        .map(|item| {
            (
                item.department.clone(),
                synthesize(security_prefix, "Dept", &item.department),
            )
        })
        .collect()
}

/// Create app-role groups from the access model and nest each department's
/// feeder group into the app-role groups its rows name.
pub fn app_role_groups_script(model: &AccessModel, security_prefix: &str) -> String {
    let mut out = format!(
        r#"<#
Creates app-role security groups listed in {ACCESS_MODEL} and links
department feeder groups into them.
Generated from: {source}
Requires: Microsoft.Graph
#>

param(
    [Parameter(Mandatory=$false)][string]$ModelPath = (Join-Path $PSScriptRoot {json}),
    [Parameter(Mandatory=$false)][string]$TenantId
)

"#,
        source = model.generated_from,
        json = ps_quote(ACCESS_MODEL),
    );
    out.push_str(&connect_block(r#""Group.ReadWrite.All","Directory.ReadWrite.All""#));

    // Hash literals fold key case; departments that differ only by case
    // each have their own feeder group.
    out.push_str("\n$feeders = New-Object 'System.Collections.Hashtable' ([StringComparer]::Ordinal)\n");
    for (department, group) in feeder_groups(model, security_prefix) {
        out.push_str(&format!("$feeders[{}] = {}\n", ps_quote(&department), ps_quote(&group)));
    }

    out.push_str(
        r#"
function Find-Group {
    param([string]$DisplayName)
    $filter = "displayName eq '{0}'" -f ($DisplayName -replace "'", "''")
    return Get-MgGroup -Filter $filter -ConsistencyLevel eventual -CountVariable count | Select-Object -First 1
}

function Get-OrCreate-Group {
    param([string]$DisplayName, [string]$Description)
    $g = Find-Group -DisplayName $DisplayName
    if ($g) { return $g }
    Write-Host "Creating group: $DisplayName"
    $nick = ($DisplayName -replace '[^A-Za-z0-9]', '')
    if ($nick.Length -gt 64) { $nick = $nick.Substring(0, 64) }
    return New-MgGroup -DisplayName $DisplayName -Description $Description -MailEnabled:$false -MailNickname $nick -SecurityEnabled:$true
}

$model = Get-Content -Raw -Path $ModelPath | ConvertFrom-Json
$items = $model.items | Sort-Object Resource, AccessRole, Department

$appGroups = @{}
foreach ($grp in ($items | Group-Object AppRoleGroup)) {
    $first = $grp.Group[0]
    $desc = "Application role group: {0} ({1})" -f $first.Resource, $first.AccessRole
    $appGroups[$grp.Name] = Get-OrCreate-Group -DisplayName $grp.Name -Description $desc
}

foreach ($item in $items) {
    if ([string]::IsNullOrWhiteSpace($item.Department)) { continue }
    $feederName = $feeders[$item.Department]
    if (-not $feederName) { continue }
    $feeder = Find-Group -DisplayName $feederName
    if (-not $feeder) {
        Write-Warning "Feeder group not found: $feederName (run Create-Dynamic-Groups.ps1 first)"
        continue
    }
    $target = $appGroups[$item.AppRoleGroup]
    $members = Get-MgGroupMember -GroupId $target.Id -All | Select-Object -ExpandProperty Id
    if ($members -contains $feeder.Id) { continue }
    Write-Host "Linking $feederName -> $($item.AppRoleGroup)"
    New-MgGroupMember -GroupId $target.Id -DirectoryObjectId $feeder.Id
}

Write-Host 'Done.'
"#,
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupsmith_recon::model::{AccessMapEntry, CatalogKind};

    fn group(name: &str, rule: &str) -> GroupDefinition {
        GroupDefinition::dynamic_security(name.into(), format!("About {name}"), rule.into())
    }

    fn catalogs() -> GroupCatalogs {
        let mut department = GroupCatalog::empty(CatalogKind::Department);
        department
            .groups
            .push(group("SG-Dept-O'Neil-Lab", r#"(user.department -eq "O'Neil Lab")"#));
        let mut role = GroupCatalog::empty(CatalogKind::Role);
        role.groups
            .push(group("SG-Role-Analyst", r#"(user.jobTitle -contains "Analyst")"#));
        let mut license = GroupCatalog::empty(CatalogKind::License);
        license.groups.push(group(
            "LG-License-SPE_E3",
            r#"(user.assignedPlans -any (assignedPlan.service -eq "SPE_E3"))"#,
        ));
        GroupCatalogs { department, role, license }
    }

    #[test]
    fn quote_doubles_single_quotes() {
        assert_eq!(ps_quote("plain"), "'plain'");
        assert_eq!(ps_quote("O'Neil"), "'O''Neil'");
        assert_eq!(ps_quote(""), "''");
    }

    #[test]
    fn dynamic_groups_script_comments_out_license_groups() {
        let script = dynamic_groups_script(&catalogs());
        assert!(script.contains(
            "\nEnsure-DynamicGroup -DisplayName 'SG-Dept-O''Neil-Lab' -Description 'About SG-Dept-O''Neil-Lab' -Rule '(user.department -eq \"O''Neil Lab\")'\n"
        ));
        assert!(script.contains("\nEnsure-DynamicGroup -DisplayName 'SG-Role-Analyst'"));
        assert!(script.contains("\n# Ensure-DynamicGroup -DisplayName 'LG-License-SPE_E3'"));
        assert!(!script.contains("\nEnsure-DynamicGroup -DisplayName 'LG-License"));
        assert!(script.ends_with("Write-Host 'Done.'\n"));
    }

    #[test]
    fn dynamic_groups_script_without_licenses_has_no_license_section() {
        let mut c = catalogs();
        c.license.groups.clear();
        let script = dynamic_groups_script(&c);
        assert!(!script.contains("License groups"));
    }

    #[test]
    fn normalize_script_reads_the_map() {
        let script = normalize_attributes_script();
        assert!(script.contains("(Join-Path $PSScriptRoot 'Attribute-Normalization-Map.csv')"));
        assert!(script.contains("Import-Csv -Path $CsvPath"));
        assert!(script.contains("Update-MgUser"));
    }

    #[test]
    fn app_role_script_embeds_feeder_table() {
        let model = AccessModel {
            generated_from: "Apps".into(),
            items: vec![
                AccessMapEntry {
                    department: "R&D / Labs".into(),
                    resource: "Jira".into(),
                    access_role: "Users".into(),
                    app_role_group: "SG-App-Jira-Users".into(),
                },
                AccessMapEntry {
                    department: String::new(),
                    resource: "Wiki".into(),
                    access_role: "Users".into(),
                    app_role_group: "SG-App-Wiki-Users".into(),
                },
            ],
        };
        let feeders = feeder_groups(&model, "SG");
        assert_eq!(feeders.len(), 1);
        assert_eq!(feeders["R&D / Labs"], "SG-Dept-R&D-Labs");

        let script = app_role_groups_script(&model, "SG");
        assert!(script.contains("\n$feeders['R&D / Labs'] = 'SG-Dept-R&D-Labs'\n"));
        assert!(script.contains("Generated from: Apps"));
        assert!(script.contains("(Join-Path $PSScriptRoot 'App-Access-Model.json')"));
        assert!(script.contains("New-MgGroupMember"));
    }

    fn entry(department: &str, resource: &str) -> AccessMapEntry {
        AccessMapEntry {
            department: department.into(),
            resource: resource.into(),
            access_role: "Users".into(),
            app_role_group: format!("SG-App-{resource}-Users"),
        }
    }

    #[test]
    fn feeder_table_keeps_departments_differing_only_by_case() {
        let model = AccessModel {
            generated_from: "Apps".into(),
            items: vec![entry("HR", "Workday"), entry("hr", "Workday")],
        };
        let feeders = feeder_groups(&model, "SG");
        assert_eq!(feeders.len(), 2);

        let script = app_role_groups_script(&model, "SG");
        assert!(script.contains(
            "\n$feeders = New-Object 'System.Collections.Hashtable' ([StringComparer]::Ordinal)\n"
        ));
        assert!(script.contains("\n$feeders['HR'] = 'SG-Dept-HR'\n"));
        assert!(script.contains("\n$feeders['hr'] = 'SG-Dept-hr'\n"));
        // A hash literal would reject these keys as duplicates.
        assert!(!script.contains("$feeders = @{"));
    }
}
