use std::path::PathBuf;

use acu::{Config, JsonStore, PersistenceSink, Writer};
use clap::Parser;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Parser)]
pub struct Store {
    /// The ACU file to store
    file: PathBuf,

    /// Directory of the document store
    #[arg(long)]
    dir: PathBuf,
}

impl Store {
    #[instrument(level = "debug", skip(self, config), fields(file = %self.file.display()))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let document = super::read_document(&self.file, config)?;
        let id = JsonStore::new(self.dir).persist(&document)?;
        println!("{id}");
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Restore {
    /// Id printed by `store`
    id: Uuid,

    /// Directory of the document store
    #[arg(long)]
    dir: PathBuf,
}

impl Restore {
    #[instrument(level = "debug", skip(self, config), fields(id = %self.id))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let stored = JsonStore::new(self.dir).load(self.id)?;
        tracing::info!(created = %stored.created, "restored document");
        print!("{}", Writer::new(&stored.document, config));
        Ok(())
    }
}
