use std::path::{Path, PathBuf};

use acu::{Config, Source, Validation};
use clap::Parser;
use tracing::instrument;
use walkdir::WalkDir;

use super::terminal::{Palette, Style};

#[derive(Debug, Parser)]
pub struct Check {
    /// Files or directories to check
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, serde::Serialize)]
struct Entry<'a> {
    path: &'a Path,
    #[serde(flatten)]
    validation: &'a Validation,
}

impl Check {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let files = collect_files(&self.paths);
        if files.is_empty() {
            anyhow::bail!("no .acu files found");
        }

        let sources: Vec<Source> = files
            .into_iter()
            .map(|path| {
                let text = std::fs::read_to_string(&path).map_err(|e| e.to_string());
                Source { path, text }
            })
            .collect();
        let results = acu::validate_many(&sources, config);

        match self.output {
            OutputFormat::Pretty => print!("{}", pretty(&results, Palette::detect())),
            OutputFormat::Json => {
                let entries: Vec<Entry<'_>> = results
                    .iter()
                    .map(|(path, validation)| Entry { path, validation })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            }
        }

        let invalid = results.iter().filter(|(_, v)| !v.valid).count();
        if invalid > 0 {
            anyhow::bail!("{invalid} of {} files failed to parse", results.len());
        }
        Ok(())
    }
}

/// Expands directories into the `*.acu` files below them, sorted by path.
/// Paths naming files are kept as given, whatever their extension.
fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .map(walkdir::DirEntry::into_path)
                .filter(|path| path.extension().is_some_and(|ext| ext == "acu"))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn pretty(results: &[(PathBuf, Validation)], palette: Palette) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    for (path, validation) in results {
        let path = path.display();
        if validation.valid {
            let _ = writeln!(out, "{} {path}", palette.paint(Style::Ok, "ok"));
        } else {
            let message = validation.message.as_deref().unwrap_or_default();
            let _ = writeln!(out, "{} {path}: {message}", palette.paint(Style::Error, "error"));
        }
        for warning in &validation.warnings {
            let _ = writeln!(out, "  {} {warning}", palette.paint(Style::Warning, "warning:"));
        }
    }
    out
}
