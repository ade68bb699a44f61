use atende_common::config::Database;
use atende_common::db;
use std::process::ExitCode;

#[derive(clap::Args, Debug)]
pub struct Run {
    #[command(subcommand)]
    pub(crate) command: Command,
    #[command(flatten)]
    pub(crate) database: Database,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Drop and re-create the database, then apply all migrations
    Create,
    /// Apply pending migrations
    Migrate,
    /// Roll back all migrations and re-apply them
    Refresh,
}

impl Run {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        use Command::*;
        match self.command {
            Create => self.config(db::CreationMode::Bootstrap).await,
            Migrate => self.config(db::CreationMode::Default).await,
            Refresh => self.config(db::CreationMode::RefreshSchema).await,
        }
    }

    async fn config(self, mode: db::CreationMode) -> anyhow::Result<ExitCode> {
        db::Database::with_external_config(&self.database, mode).await?;
        Ok(ExitCode::SUCCESS)
    }
}
