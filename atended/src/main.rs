use atende_common::config::Database;
use atende_common::db::CreationMode;
use atende_infrastructure::{app::http::HttpServerConfig, InfrastructureConfig};
use clap::Parser;
use postgresql_embedded::{PostgreSQL, Settings};
use std::env;
use std::process::{ExitCode, Termination};
use tokio::task::JoinSet;

mod db;

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Manage the database schema
    Db(db::Run),
}

#[derive(clap::Parser, Debug)]
#[command(
    author,
    version = env!("CARGO_PKG_VERSION"),
    about = "atended",
    long_about = None
)]
pub struct Atended {
    #[command(subcommand)]
    pub(crate) command: Option<Command>,

    /// The database creation mode
    #[arg(long, env, value_enum, default_value_t = CreationMode::Default)]
    pub creation: CreationMode,

    /// Run with a managed, embedded database instance
    #[arg(long, env)]
    pub devmode: bool,

    #[command(flatten)]
    pub database: Database,

    #[command(flatten)]
    pub infra: InfrastructureConfig,

    #[command(flatten)]
    pub http: HttpServerConfig,
}

impl Atended {
    async fn run(self) -> ExitCode {
        match self.run_command().await {
            Ok(code) => code,
            Err(err) => {
                log::error!("Error: {err}");
                for (n, err) in err.chain().skip(1).enumerate() {
                    if n == 0 {
                        log::error!("Caused by:");
                    }
                    log::error!("\t{err}");
                }

                ExitCode::FAILURE
            }
        }
    }

    async fn run_command(mut self) -> anyhow::Result<ExitCode> {
        if let Some(command) = self.command {
            return match command {
                Command::Db(run) => run.run().await,
            };
        }

        // to keep in scope while running.
        let mut managed_db = None;

        if self.devmode {
            println!("setting up managed DB");

            let current_dir = env::current_dir()?;
            let work_dir = current_dir.join(".atende");
            let db_dir = work_dir.join("postgres");
            let settings = Settings {
                username: self.database.username.clone(),
                password: self.database.password.clone(),
                temporary: false,
                installation_dir: db_dir.clone(),
                data_dir: db_dir.join("data"),
                ..Default::default()
            };

            let mut postgresql = PostgreSQL::new(settings);
            postgresql.setup().await?;
            postgresql.start().await?;

            let port = postgresql.settings().port;
            self.database.port = port;
            self.creation = CreationMode::Bootstrap;

            managed_db.replace(postgresql);

            println!("postgresql installed under {:?}", db_dir);
            println!("running on port {}", port);
        }

        let mut handles = JoinSet::new();

        let http = atende_server::Run {
            creation: self.creation,
            database: self.database.clone(),
            infra: self.infra.clone(),
            http: self.http.clone(),
        };

        handles.spawn_local(http.run());

        while let Some(result) = handles.join_next().await {
            match result {
                Ok(result) => match result {
                    Ok(_) => {}
                    Err(err) => {
                        log::error!("error {:?}", err);
                    }
                },
                Err(err) => {
                    log::error!("fundamental error {:?}", err);
                }
            }
        }

        if let Some(postgresql) = managed_db.take() {
            postgresql.stop().await?;
        }

        Ok(ExitCode::SUCCESS)
    }
}

#[actix_web::main]
async fn main() -> impl Termination {
    Atended::parse().run().await
}
