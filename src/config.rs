//! Generator options: JSON config file, then CLI overrides.
use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What to do with a declaration or field whose type cannot be classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SkipPolicy {
    /// Leave it untouched without a word.
    #[default]
    Silent,
    /// Leave it untouched and log a warning.
    Warn,
    /// Fail generation for the whole file.
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Appended to a declaration's name to name its shadow type.
    pub shadow_suffix: String,
    /// Path under which generated code reaches the runtime.
    pub runtime_path: String,
    /// Middle extension of generated files: `foo.rs` → `foo.<suffix>.rs`.
    pub output_suffix: String,
    /// Crate names that may appear as a path root without a `use`.
    pub extern_crates: BTreeSet<String>,
    pub skip_policy: SkipPolicy,
}

impl Default for Options {
    fn default() -> Self {
        let runtime_path = String::from("polyjson");
        let extern_crates = ["serde", "serde_json", runtime_path.as_str()]
            .into_iter()
            .map(String::from)
            .collect();
        Self {
            shadow_suffix: String::from("Shadow"),
            output_suffix: String::from("polyjson"),
            runtime_path,
            extern_crates,
            skip_policy: SkipPolicy::Silent,
        }
    }
}

impl Options {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source, path)
    }

    /// `origin` only labels errors.
    pub fn parse(source: &str, origin: &Path) -> Result<Self, ConfigError> {
        let de = &mut serde_json::Deserializer::from_str(source);
        serde_path_to_error::deserialize(de).map_err(|err| ConfigError::Parse {
            path: origin.to_path_buf(),
            at: err.path().to_string(),
            source: err.into_inner(),
        })
    }

    pub fn shadow_name(&self, name: &str) -> String {
        format!("{name}{}", self.shadow_suffix)
    }

    /// `src/foo.rs` → `src/foo.polyjson.rs`.
    pub fn output_path(&self, input: &Path) -> std::path::PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        input.with_file_name(format!("{stem}.{}.rs", self.output_suffix))
    }

    pub fn is_output(&self, input: &Path) -> bool {
        input
            .to_string_lossy()
            .ends_with(&format!(".{}.rs", self.output_suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn partial_config_keeps_defaults() {
        let options =
            Options::parse(r#"{ "skip_policy": "warn" }"#, Path::new("polyjson.json")).unwrap();
        assert_eq!(options.skip_policy, SkipPolicy::Warn);
        assert_eq!(options.shadow_suffix, "Shadow");
        assert!(options.extern_crates.contains("polyjson"));
    }

    #[test]
    fn errors_name_the_failing_key() {
        match Options::parse(r#"{ "skip_policy": "loud" }"#, Path::new("polyjson.json")) {
            Err(ConfigError::Parse { path, at, source }) => {
                assert_eq!(path, PathBuf::from("polyjson.json"));
                assert_eq!(at, "skip_policy");
                assert!(source.to_string().contains("loud"), "{source}");
            }
            other => panic!("{other:?}"),
        }

        let err = Options::parse(r#"{ "skip": 1 }"#, Path::new("polyjson.json")).unwrap_err();
        assert!(err.to_string().contains("unknown field `skip`"), "{err}");
    }

    #[test]
    fn output_lands_next_to_input() {
        let options = Options::default();
        let out = options.output_path(Path::new("src/model/example.rs"));
        assert_eq!(out, PathBuf::from("src/model/example.polyjson.rs"));
        assert!(options.is_output(&out));
        assert!(!options.is_output(Path::new("src/model/example.rs")));
    }
}
