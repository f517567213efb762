use std::path::{Path, PathBuf};

mod check;
mod export;
mod fmt;
mod store;
mod terminal;
mod tree;

use acu::{Config, ParsedDocument};
use anyhow::Context;
use check::Check;
use clap::ArgAction;
use export::Export;
use fmt::Fmt;
use store::{Restore, Store};
use tree::Tree;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => Config::default(),
        };

        self.command.run(&config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Check that ACU files parse
    ///
    /// Directories are searched recursively for `*.acu` files.
    Check(Check),

    /// Show the cost outline of a budget
    Tree(Tree),

    /// Rewrite a budget in canonical form
    Fmt(Fmt),

    /// Print a parsed budget as JSON or YAML
    Export(Export),

    /// Save a parsed budget to a document store
    Store(Store),

    /// Print a stored budget as ACU text
    Restore(Restore),
}

impl Command {
    fn run(self, config: &Config) -> anyhow::Result<()> {
        match self {
            Self::Check(command) => command.run(config)?,
            Self::Tree(command) => command.run(config)?,
            Self::Fmt(command) => command.run(config)?,
            Self::Export(command) => command.run(config)?,
            Self::Store(command) => command.run(config)?,
            Self::Restore(command) => command.run(config)?,
        }
        Ok(())
    }
}

/// Reads and parses an ACU file.
fn read_document(path: &Path, config: &Config) -> anyhow::Result<ParsedDocument> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    acu::parse_with_config(&source, config)
        .with_context(|| format!("failed to parse {}", path.display()))
}
