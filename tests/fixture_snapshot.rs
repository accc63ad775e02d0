//! The committed companion of the dev-test-runner fixture must be what the
//! generator produces today.
use std::path::PathBuf;

use polyjson::Options;
use pretty_assertions::assert_eq;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("dev-test-runner")
        .join("src")
        .join(name)
}

/// Line-by-line, ignoring trailing whitespace and line endings.
fn normalize(text: &str) -> Vec<String> {
    text.lines().map(|line| line.trim_end().to_owned()).collect()
}

#[test]
fn committed_companion_is_up_to_date() {
    let options = Options::default();
    let input = fixture("example.rs");
    let source = std::fs::read_to_string(&input).unwrap();
    let generated = polyjson::generate(&source, &options)
        .unwrap()
        .expect("fixture has marshalled types");

    let committed_path = options.output_path(&input);
    assert_eq!(committed_path, fixture("example.polyjson.rs"));
    let committed = std::fs::read_to_string(&committed_path).unwrap();
    assert_eq!(normalize(&generated), normalize(&committed));
}

#[test]
fn fixture_description_lists_every_directive() {
    let source = std::fs::read_to_string(fixture("example.rs")).unwrap();
    let module = polyjson::describe(&source, &Options::default()).unwrap();
    let names: Vec<_> = module.decls.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["B", "C", "Level", "Example", "Items", "Catalog"]);
    assert_eq!(
        module.decls[1].capabilities,
        vec!["dyn Described", "dyn Labeled", "dyn Labeled + Send"]
    );
    assert_eq!(
        module.imports.into_iter().collect::<Vec<_>>(),
        vec![(String::from("collections"), String::from("std::collections"))]
    );
}
