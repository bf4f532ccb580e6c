// End-to-end tests for the groupsmith binary.
//
// Run with: cargo test -p groupsmith-cli --test cli_tests -- --nocapture

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn groupsmith() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_groupsmith"));
    cmd.env_remove("GROUPSMITH_LOG");
    cmd
}

const USERS_CSV: &str = "\
User Name,First Name,Last Name,Department,Title,Office,Assigned License
ann@contoso.com,Ann,Lee,hr,HR Analyst,london,SPE_E5
bo@contoso.com,Bo,Diaz,HR,Manager,London,SPE_E3
cy@contoso.com,Cy,Wu,Finance,Engineer,Paris,
di@contoso.com,Di,O'Neil,R&D / Labs,Intern,Paris,SPE_E5
";

const PRIORITY_CSV: &str = "\
#;Department;Application / System;Access Level
1;Finance;Budgets;Editor
2;Finance;;Editor
3;HR;Workday;
";

/// Write the fixture tables and a config into a fresh directory.
fn fixture(config_extra: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("users.csv"), USERS_CSV).unwrap();
    fs::write(dir.path().join("priority.csv"), PRIORITY_CSV).unwrap();
    fs::write(
        dir.path().join("contoso.groupsmith.toml"),
        format!(
            "name = \"Contoso\"\n\n[inputs]\nusers = \"users.csv\"\npriority = \"priority.csv\"\n{config_extra}"
        ),
    )
    .unwrap();
    dir
}

/// Canonicalize only attributes the fixture users table has.
const NO_EMPLOYEE_TYPE: &str = "\n[canonicalize]\nattributes = [\"department\", \"officeLocation\"]\n";

fn config_path(dir: &TempDir) -> String {
    dir.path().join("contoso.groupsmith.toml").to_str().unwrap().to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

// ===========================================================================
// groupsmith run
// ===========================================================================

#[test]
fn run_writes_all_artifacts() {
    let dir = fixture("");
    let output = groupsmith().args(["run", &config_path(&dir)]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = dir.path().join("out");
    for name in [
        "Attribute-Normalization-Map.csv",
        "Dynamic-Groups.json",
        "App-Access-Model.json",
        "Create-Dynamic-Groups.ps1",
        "Normalize-Attributes.ps1",
        "Create-App-Role-Groups.ps1",
    ] {
        assert!(out.join(name).is_file(), "missing {name}");
    }

    let csv = read(&out.join("Attribute-Normalization-Map.csv"));
    assert_eq!(
        csv,
        "Attribute,FromValue,ToValue\ndepartment,hr,HR\nofficeLocation,london,London\n"
    );

    let model: serde_json::Value =
        serde_json::from_str(&read(&out.join("App-Access-Model.json"))).unwrap();
    assert_eq!(model["generatedFrom"], "priority");
    assert_eq!(model["items"].as_array().unwrap().len(), 2);
    assert_eq!(model["items"][0]["AppRoleGroup"], "SG-App-Budgets-Editor");
    assert_eq!(model["items"][1]["AppRoleGroup"], "SG-App-Workday-Users");

    let groups: serde_json::Value =
        serde_json::from_str(&read(&out.join("Dynamic-Groups.json"))).unwrap();
    assert_eq!(groups["department"]["groups"].as_array().unwrap().len(), 4);
    assert_eq!(groups["role"]["groups"].as_array().unwrap().len(), 9);
    assert_eq!(groups["license"]["manual_enablement"], true);

    let script = read(&out.join("Create-Dynamic-Groups.ps1"));
    assert!(script.contains("Ensure-DynamicGroup -DisplayName 'SG-Dept-R&D-Labs'"));
    assert!(script.contains("# Ensure-DynamicGroup -DisplayName 'LG-License-SPE_E3'"));

    let err = stderr(&output);
    assert!(err.contains("Contoso: 4 users from 'users'"), "stderr: {err}");
    assert!(err.contains("wrote 6 files"), "stderr: {err}");
}

#[test]
fn run_json_prints_one_document() {
    let dir = fixture("");
    let output = groupsmith()
        .args(["run", &config_path(&dir), "--json", "--no-scripts"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let val: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(val["meta"]["config_name"], "Contoso");
    assert_eq!(val["meta"]["priority_table"], "priority");
    assert_eq!(val["summary"]["users"], 4);
    assert_eq!(val["summary"]["canonicalization_rules"], 2);
    assert_eq!(val["summary"]["license_groups"], 2);
    assert_eq!(val["columns"]["columns"]["department"], "Department");
    assert_eq!(val["access_columns"]["resource"]["header"], "Application / System");

    assert!(!dir.path().join("out").join("Create-Dynamic-Groups.ps1").exists());
    assert!(dir.path().join("out").join("Dynamic-Groups.json").exists());
}

#[test]
fn run_honours_output_dir_flag_and_config_scripts_switch() {
    let dir = fixture("\n[output]\nscripts = false\n");
    let target = dir.path().join("build");
    let output = groupsmith()
        .args(["run", &config_path(&dir), "--output-dir", target.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(target.join("Attribute-Normalization-Map.csv").is_file());
    assert!(!target.join("Normalize-Attributes.ps1").exists());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn strict_fails_when_priority_table_has_no_resource_column() {
    let dir = fixture(NO_EMPLOYEE_TYPE);
    fs::write(dir.path().join("priority.csv"), "Ticket,Owner\n1,Ann\n").unwrap();

    let lenient = groupsmith().args(["run", &config_path(&dir)]).output().unwrap();
    assert!(lenient.status.success(), "stderr: {}", stderr(&lenient));
    assert!(stderr(&lenient).contains("no resource-like column"));

    let strict = groupsmith().args(["run", &config_path(&dir), "--strict"]).output().unwrap();
    assert_eq!(strict.status.code(), Some(6), "stderr: {}", stderr(&strict));
}

#[test]
fn strict_counts_missing_canonical_attributes_but_not_unmapped_columns() {
    let dir = fixture("");
    let output = groupsmith().args(["run", &config_path(&dir), "--strict"]).output().unwrap();
    // employeeType is a default canonicalization attribute and the fixture has no such column.
    assert_eq!(output.status.code(), Some(6), "stderr: {}", stderr(&output));

    let dir = fixture(NO_EMPLOYEE_TYPE);
    let output = groupsmith().args(["run", &config_path(&dir), "--strict"]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("unmapped: displayName"));
}

#[test]
fn missing_users_table_is_an_input_error() {
    let dir = fixture("");
    fs::remove_file(dir.path().join("users.csv")).unwrap();
    let output = groupsmith().args(["run", &config_path(&dir)]).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("users.csv"));
}

#[test]
fn unwritable_output_is_an_output_error() {
    let dir = fixture("");
    // A regular file where the output directory should go.
    fs::write(dir.path().join("out"), "not a directory").unwrap();
    let output = groupsmith().args(["run", &config_path(&dir)]).output().unwrap();
    assert_eq!(output.status.code(), Some(5), "stderr: {}", stderr(&output));
}

// ===========================================================================
// groupsmith validate
// ===========================================================================

#[test]
fn validate_accepts_good_config() {
    let dir = fixture("");
    let output = groupsmith().args(["validate", &config_path(&dir)]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("config ok: Contoso"));
}

#[test]
fn validate_rejects_unknown_attribute_with_hint() {
    let dir = fixture("\n[columns.aliases]\nfavouriteColour = [\"colour\"]\n");
    let output = groupsmith().args(["validate", &config_path(&dir)]).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    let err = stderr(&output);
    assert!(err.contains("favouriteColour"), "stderr: {err}");
    assert!(err.contains("hint:  known attributes: userPrincipalName"), "stderr: {err}");
}

#[test]
fn validate_rejects_missing_config() {
    let output = groupsmith()
        .args(["validate", "/nonexistent/contoso.groupsmith.toml"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn bad_arguments_are_usage_errors() {
    let output = groupsmith().args(["run"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ===========================================================================
// groupsmith columns
// ===========================================================================

#[test]
fn columns_json_reports_resolution() {
    let dir = fixture("");
    let users = dir.path().join("users.csv");
    let output = groupsmith()
        .args(["columns", users.to_str().unwrap(), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let val: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    assert_eq!(val["table"], "users");
    assert_eq!(val["rows"], 4);
    assert_eq!(val["attributes"]["columns"]["userPrincipalName"], "User Name");
    assert_eq!(val["attributes"]["columns"]["licenseSku"], "Assigned License");
    assert_eq!(val["unused_headers"], serde_json::json!([]));
    assert_eq!(val["access_columns"]["department"]["header"], "Department");
}

#[test]
fn columns_human_listing_shows_access_columns() {
    let dir = fixture("");
    let priority = dir.path().join("priority.csv");
    let output = groupsmith()
        .args(["columns", priority.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("table: priority (3 rows, 4 columns)"), "stdout: {stdout}");
    assert!(stdout.contains("resource    <- \"Application / System\" (keyword \"application\")"), "stdout: {stdout}");
    assert!(stdout.contains("access      <- \"Access Level\" (keyword \"access\")"), "stdout: {stdout}");
}

#[test]
fn version_names_the_binary() {
    let output = groupsmith().arg("--version").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("groupsmith "), "stdout: {stdout}");
}
