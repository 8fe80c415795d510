//! CLI integration tests
//!
//! These tests verify the CLI commands work correctly by running the binary.

#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::{Command, Output};

fn sdf_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_sdf"))
}

fn fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path.to_string_lossy().into_owned()
}

fn run(args: &[&str]) -> Output {
    Command::new(sdf_bin())
        .args(args)
        .env_remove("SDF_PATH")
        .env_remove("SDF_VERSION")
        .env_remove("SDF_LOG")
        .output()
        .expect("Failed to execute command")
}

fn check(name: &str) -> Output {
    run(&["check", &fixture(name), "--force-version", "1.7"])
}

// ============================================================================
// Check Command Tests
// ============================================================================

#[test]
fn test_cli_check_valid_documents() {
    for name in [
        "box_plane_low_friction_test.world",
        "model_box.sdf",
        "link_duplicate_cousin_collisions.sdf",
        "link_duplicate_cousin_visuals.sdf",
        "invalid_sdf_in_plugin.sdf",
        "invalid_sdf_in_namespaced_elements.sdf",
    ] {
        let output = check(name);
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(output.status.success(), "{} should be valid", name);
        assert_eq!(stdout, "Valid.\n");
    }
}

#[test]
fn test_cli_check_reports_errors() {
    let cases = [
        ("box_bad_test.world", "Required attribute"),
        ("world_duplicate.sdf", "Error: World with name[default] already exists."),
        ("world_sibling_same_names.sdf", "Error: non-unique names"),
        ("model_duplicate_links.sdf", "Error: link with name[link] already exists."),
        ("model_duplicate_joints.sdf", "Error: joint with name[joint] already exists."),
        ("model_link_joint_same_name.sdf", "Error: non-unique names"),
        (
            "link_duplicate_sibling_collisions.sdf",
            "Error: collision with name[collision] already exists.",
        ),
        (
            "link_duplicate_sibling_visuals.sdf",
            "Error: visual with name[visual] already exists.",
        ),
    ];

    for (name, expected) in cases {
        let output = check(name);
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(!output.status.success(), "{} should be invalid", name);
        assert!(stderr.contains(expected), "{}: {}", name, stderr);
        assert!(output.stdout.is_empty(), "{} should print nothing on stdout", name);
    }
}

#[test]
fn test_cli_check_reserved_names() {
    let output = check("model_invalid_reserved_names.sdf");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    for expected in [
        "Error: The supplied link name [world] is reserved.",
        "Error: The supplied link name [__link__] is reserved.",
        "Error: The supplied visual name [__visual__] is reserved.",
        "Error: The supplied collision name [__collision__] is reserved.",
        "Error: The supplied joint name [__joint__] is reserved.",
    ] {
        assert!(stderr.contains(expected), "missing '{}' in {}", expected, stderr);
    }
}

#[test]
fn test_cli_check_json_output() {
    let output = run(&["check", "--json", &fixture("model_duplicate_links.sdf")]);
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("Output should be valid JSON");

    assert_eq!(json["valid"], false);
    assert_eq!(json["version"], "1.7");
    assert_eq!(json["errors"].as_array().unwrap().len(), 1);
    assert_eq!(json["errors"][0]["kind"], "DuplicateNameSingleType");
    assert_eq!(json["errors"][0]["path"], "/sdf/model[model_duplicate_links]");
}

#[test]
fn test_cli_check_missing_file() {
    let output = run(&["check", &fixture("does_not_exist.sdf")]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.starts_with("Error: "), "{}", stderr);
    assert!(stderr.contains("does_not_exist.sdf"), "{}", stderr);
}

#[test]
fn test_cli_check_unsupported_version() {
    let output = run(&["check", &fixture("model_box.sdf"), "--force-version", "0.9"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("unsupported SDFormat version [0.9]"), "{}", stderr);
}

#[test]
fn test_cli_check_extra_schema_path() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("9.0.xml"),
        r#"<schema version="9.0" root="sdf">
  <element name="sdf">
    <attribute name="version" type="string" default="9.0" required="1"/>
  </element>
</schema>"#,
    )
    .unwrap();

    let output = run(&[
        "check",
        &fixture("model_box.sdf"),
        "--force-version",
        "9.0",
        "--schema-path",
        dir.path().to_str().unwrap(),
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(
        stderr.contains("Error: XML Element[model], child of element[sdf], not defined in SDF."),
        "{}",
        stderr
    );
}

// ============================================================================
// Describe Command Tests
// ============================================================================

#[test]
fn test_cli_describe() {
    for version in ["1.6", "1.7"] {
        let output = run(&["describe", "--force-version", version]);
        let stdout = String::from_utf8_lossy(&output.stdout);

        assert!(output.status.success());
        assert!(!stdout.is_empty());
        assert!(stdout.starts_with("<element name ='sdf' required ='1'"), "{}", stdout);
    }
}

// ============================================================================
// Print Command Tests
// ============================================================================

#[test]
fn test_cli_print_valid_document() {
    let path = fixture("box_plane_low_friction_test.world");
    let output = run(&["print", &path, "--force-version", "1.7"]);
    assert!(output.status.success());

    let registry = sdformat::SchemaRegistry::builtin().unwrap();
    let schema = registry.get("1.7").unwrap();
    let tree = sdformat::Loader::new().load_tree(&path).unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, schema.render(&tree));
}

#[test]
fn test_cli_print_invalid_document() {
    let output = run(&["print", &fixture("box_bad_test.world"), "--force-version", "1.7"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("Required attribute"), "{}", stderr);
}
