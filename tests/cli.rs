use std::path::PathBuf;
use std::process::Command;

fn polyjson() -> Command {
    Command::new(env!("CARGO_BIN_EXE_polyjson"))
}

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("polyjson-cli-{}-{name}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

const SOURCE: &str = r#"
use polyjson::Poly;

pub trait Shape: polyjson::Discriminated {}

/// polyjson:marshal
pub struct Drawing {
    /// polyjson:poly true
    pub shapes: Vec<Poly<dyn Shape>>,
}
"#;

#[test]
fn generate_writes_companion_next_to_input() {
    let dir = scratch("generate");
    let input = dir.join("drawing.rs");
    std::fs::write(&input, SOURCE).unwrap();
    std::fs::write(dir.join("plain.rs"), "pub struct Plain;").unwrap();

    let pattern = dir.join("*.rs");
    let status = polyjson()
        .args(["generate", "-i", pattern.to_str().unwrap()])
        .status()
        .unwrap();
    assert!(status.success());

    let companion = std::fs::read_to_string(dir.join("drawing.polyjson.rs")).unwrap();
    assert!(companion.starts_with("// @generated by polyjson. DO NOT EDIT."));
    assert!(companion.contains("pub struct DrawingShadow {"));
    assert!(!dir.join("plain.polyjson.rs").exists());

    // A second run over the same glob must skip the companion it just wrote.
    let status = polyjson()
        .args(["generate", "-i", pattern.to_str().unwrap()])
        .status()
        .unwrap();
    assert!(status.success());
    assert!(!dir.join("drawing.polyjson.polyjson.rs").exists());
}

#[test]
fn unknown_module_fails_the_run() {
    let dir = scratch("unknown");
    let input = dir.join("bad.rs");
    std::fs::write(&input, "/// polyjson:marshal\npub struct Bad { at: chrono::NaiveDate }").unwrap();

    let output = polyjson()
        .args(["generate", "--stdout", "-i", input.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown module `chrono`"), "{stderr}");

    let output = polyjson()
        .args(["generate", "--stdout", "--extern", "chrono", "-i", input.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("at: chrono::NaiveDate,"));
}

#[test]
fn describe_prints_json() {
    let dir = scratch("describe");
    let input = dir.join("drawing.rs");
    std::fs::write(&input, SOURCE).unwrap();

    let output = polyjson()
        .args(["describe", "-i", input.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let decls = &json[input.to_str().unwrap()]["decls"];
    assert_eq!(decls[0]["name"], "Drawing");
    assert_eq!(decls[0]["kind"]["kind"], "record");
    assert_eq!(decls[0]["kind"]["fields"][0]["shape"]["shape"], "sequence");
}
