use std::{fs, path::Path, process::Command};

fn bragi(args: &[&str], dir: &Path) -> std::process::Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bragi"));
    cmd.args(args);
    cmd.current_dir(dir);
    cmd.env("NO_COLOR", "1");
    cmd.env("TERM", "dumb");
    cmd.env("RUST_BACKTRACE", "0");
    cmd.output().expect("bragi should spawn")
}

fn write_blueprint(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).expect("blueprint written");
    path.to_string_lossy().into_owned()
}

const WEB_BLUEPRINT: &str = r#"{
    "resources": [
        { "kind": "appServicePlan", "name": "plan1", "config": { "sku": "B1" } },
        { "kind": "appService", "name": "web1", "config": { "plan": "plan1" } }
    ]
}"#;

#[test]
fn build_emits_a_template_with_resolved_depends_on() {
    let dir = tempfile::tempdir().unwrap();
    let blueprint = write_blueprint(dir.path(), "web.json", WEB_BLUEPRINT);

    let output = bragi(&["build", &blueprint], dir.path());
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let document: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    let resources = document["resources"].as_array().unwrap();
    assert_eq!(resources[0]["name"], "plan1");
    assert_eq!(resources[1]["name"], "web1");
    assert_eq!(
        resources[1]["dependsOn"][0],
        "[resourceId('Microsoft.Web/serverfarms', 'plan1')]"
    );
}

#[test]
fn build_output_is_stable_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let blueprint = write_blueprint(dir.path(), "web.json", WEB_BLUEPRINT);

    let first = bragi(&["build", &blueprint], dir.path());
    let second = bragi(&["build", &blueprint], dir.path());
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn check_fails_on_a_dangling_reference() {
    let dir = tempfile::tempdir().unwrap();
    let blueprint = write_blueprint(
        dir.path(),
        "broken.json",
        r#"{
            "resources": [
                { "kind": "appService", "name": "web1", "config": { "plan": "plan9" } }
            ]
        }"#,
    );

    let output = bragi(&["check", &blueprint], dir.path());
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("plan9"), "stderr: {stderr}");
}

#[test]
fn check_reports_every_problem_at_once() {
    let dir = tempfile::tempdir().unwrap();
    let blueprint = write_blueprint(
        dir.path(),
        "broken.json",
        r#"{
            "resources": [
                { "kind": "storageAccount", "name": "store1", "config": {} },
                { "kind": "redisCache", "name": "cache1", "config": { "sku": "Gold" } }
            ]
        }"#,
    );

    let output = bragi(&["check", &blueprint], dir.path());
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("store1"), "stderr: {stderr}");
    assert!(stderr.contains("cache1"), "stderr: {stderr}");
}

#[test]
fn denied_warnings_fail_an_otherwise_clean_check() {
    let dir = tempfile::tempdir().unwrap();
    let blueprint = write_blueprint(
        dir.path(),
        "unused.json",
        r#"{
            "parameters": { "unusedEnv": { "type": "string" } },
            "resources": [
                { "kind": "storageAccount", "name": "logs", "config": { "sku": "Standard_LRS" } }
            ]
        }"#,
    );

    let clean = bragi(&["check", &blueprint], dir.path());
    assert!(clean.status.success(), "warnings alone must not fail");

    let denied = bragi(&["check", "-D", "warnings", &blueprint], dir.path());
    assert!(!denied.status.success());
    let stderr = String::from_utf8_lossy(&denied.stderr);
    assert!(stderr.contains("unusedEnv"), "stderr: {stderr}");
}

#[test]
fn estimate_prints_a_monthly_total() {
    let dir = tempfile::tempdir().unwrap();
    let blueprint = write_blueprint(dir.path(), "web.json", WEB_BLUEPRINT);

    let output = bragi(&["estimate", &blueprint], dir.path());
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("App Service Plan (plan1): $13.00/month"), "stdout: {stdout}");
    assert!(stdout.contains("total: $13.00/month"), "stdout: {stdout}");
}

#[test]
fn scaffold_output_builds_without_edits() {
    let dir = tempfile::tempdir().unwrap();

    let scaffold = bragi(
        &["scaffold", "--size", "medium", "--prefix", "data"],
        dir.path(),
    );
    assert!(scaffold.status.success());
    let blueprint_path = dir.path().join("scaffold.json");
    fs::write(&blueprint_path, &scaffold.stdout).unwrap();

    let build = bragi(
        &["build", blueprint_path.to_str().unwrap()],
        dir.path(),
    );
    assert!(
        build.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&build.stderr)
    );
    let document: serde_json::Value = serde_json::from_slice(&build.stdout).unwrap();
    assert_eq!(document["resources"].as_array().unwrap().len(), 6);
    assert!(document["parameters"]["sqlAdminPassword"].is_object());
}

#[test]
fn scaffold_rejects_an_unknown_size() {
    let dir = tempfile::tempdir().unwrap();
    let output = bragi(&["scaffold", "--size", "xlarge"], dir.path());
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("xlarge"), "stderr: {stderr}");
}

#[test]
fn catalog_lists_the_supported_kinds() {
    let dir = tempfile::tempdir().unwrap();
    let output = bragi(&["catalog"], dir.path());
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for kind in ["appServicePlan", "storageAccount", "sqlDatabase", "keyVault"] {
        assert!(stdout.contains(kind), "missing {kind}");
    }
    assert!(stdout.contains("Microsoft.Web/serverfarms"));
}
