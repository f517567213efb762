use std::path::PathBuf;

use acu::{BudgetTree, Config, CostRollup, Summary};
use clap::Parser;
use serde::Serialize;
use tracing::instrument;

#[derive(Debug, Parser)]
pub struct Export {
    /// The ACU file to export
    file: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "json")]
    format: Format,

    /// Export the cost summary instead of the parsed document
    #[arg(long)]
    summary: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    fn render<T: Serialize>(self, value: &T) -> anyhow::Result<String> {
        Ok(match self {
            Self::Json => serde_json::to_string_pretty(value)? + "\n",
            Self::Yaml => serde_yaml::to_string(value)?,
        })
    }
}

impl Export {
    #[instrument(level = "debug", skip(self, config), fields(file = %self.file.display()))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let document = super::read_document(&self.file, config)?;

        let output = if self.summary {
            let tree = BudgetTree::assemble(&document)?;
            let costs = CostRollup::compute(&tree)?;
            self.format.render(&Summary::new(&document, &costs))?
        } else {
            self.format.render(&document)?
        };
        print!("{output}");
        Ok(())
    }
}
