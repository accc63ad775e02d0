//! Minimal CLI: source files → (describe | generate)
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indexmap::IndexMap;
use rayon::prelude::*;

use polyjson::{Options, SkipPolicy};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate serde companions for Rust types with polymorphic (`Poly<dyn Trait>`) fields
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the JSON debug view of every declaration the generator would handle
    Describe(DescribeOut),
    /// write `<stem>.polyjson.rs` next to each input that has something to emit
    Generate(GenerateOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON config file; CLI flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// extra crate names allowed as path roots without a `use`
    #[arg(long = "extern", value_name = "CRATE")]
    extern_crates: Vec<String>,

    /// what to do with declarations or fields that cannot be classified
    #[arg(long, value_enum)]
    skip_policy: Option<SkipPolicy>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct DescribeOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// print generated modules instead of writing them
    #[arg(long)]
    stdout: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn options(&self) -> anyhow::Result<Options> {
        let mut options = match &self.config {
            Some(path) => Options::load(path)?,
            None => Options::default(),
        };
        options.extern_crates.extend(self.extern_crates.iter().cloned());
        if let Some(policy) = self.skip_policy {
            options.skip_policy = policy;
        }
        Ok(options)
    }

    /// Input files in argument order, minus our own outputs.
    fn source_paths(&self, options: &Options) -> anyhow::Result<Vec<PathBuf>> {
        let paths = resolve_file_path_patterns(&self.input)?;
        Ok(paths
            .into_iter()
            .filter(|path| {
                let generated = options.is_output(path);
                if generated {
                    tracing::debug!(path = %path.display(), "ignoring generated file");
                }
                !generated
            })
            .collect())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Describe(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let options = target.input_settings.options()?;
                let paths = target.input_settings.source_paths(&options)?;

                let mut modules = IndexMap::new();
                for path in paths {
                    let source = read_source(&path)?;
                    let module = polyjson::describe(&source, &options)
                        .with_context(|| format!("failed to describe {}", path.display()))?;
                    modules.insert(path.to_string_lossy().into_owned(), module);
                }
                let json = serde_json::to_string_pretty(&modules)?;
                match target.out.as_ref() {
                    Some(out) => write_file(out, &json)?,
                    None => println!("{json}"),
                }
                Ok(())
            }
            Command::Generate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let options = target.input_settings.options()?;
                let paths = target.input_settings.source_paths(&options)?;

                // Every file is independent; the first failure aborts the run.
                let outputs = paths
                    .par_iter()
                    .map(|path| -> anyhow::Result<(PathBuf, Option<String>)> {
                        let source = read_source(path)?;
                        let generated = polyjson::generate(&source, &options)
                            .with_context(|| format!("failed to generate for {}", path.display()))?;
                        Ok((path.clone(), generated))
                    })
                    .collect::<anyhow::Result<Vec<_>>>()?;

                for (path, generated) in outputs {
                    let Some(generated) = generated else {
                        eprintln!("{} {}", "nothing to do".dimmed(), path.display());
                        continue;
                    };
                    if target.stdout {
                        println!("{generated}");
                        continue;
                    }
                    let out = options.output_path(&path);
                    write_file(&out, &generated)?;
                    eprintln!("{} {}", "generated".green().bold(), out.display());
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read source file {}", path.display()))
}

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
