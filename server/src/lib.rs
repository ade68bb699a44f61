use actix_web::{middleware::Logger, App, HttpServer};
use atende_common::{config, db};
use atende_infrastructure::{
    app::http::HttpServerConfig,
    health::{checks::Local, Check},
    Infrastructure, InfrastructureConfig, InitContext,
};
use std::{process::ExitCode, time::Duration};
use utoipa::OpenApi;
use utoipa_actix_web::AppExt;
use utoipa_rapidoc::RapiDoc;

pub mod openapi;

const SERVICE_ID: &str = "atende";

/// Run the API server
#[derive(clap::Args, Debug)]
pub struct Run {
    /// The database creation mode
    #[arg(long, env, value_enum, default_value_t = db::CreationMode::Default)]
    pub creation: db::CreationMode,

    /// Database configuration
    #[command(flatten)]
    pub database: config::Database,

    #[command(flatten)]
    pub infra: InfrastructureConfig,

    #[command(flatten)]
    pub http: HttpServerConfig,
}

struct InitData {
    db: db::Database,
    http: HttpServerConfig,
}

impl Run {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        // logging is only active once the infrastructure run method has been called
        Infrastructure::from(self.infra.clone())
            .run(
                SERVICE_ID,
                { |context| async move { InitData::new(context, self).await } },
                |context| async move { context.init_data.run().await },
            )
            .await?;

        Ok(ExitCode::SUCCESS)
    }
}

/// A common database check
pub fn spawn_db_check(db: db::Database) -> anyhow::Result<impl Check> {
    Local::spawn_periodic("no database connection", Duration::from_secs(1), {
        let db = db.clone();
        move || {
            let db = db.clone();
            async move {
                tokio::time::timeout(
                    Duration::from_secs(5),
                    async move { db.ping().await.is_ok() },
                )
                .await
                .unwrap_or(false)
            }
        }
    })
}

impl InitData {
    async fn new(context: InitContext, run: Run) -> anyhow::Result<Self> {
        let db = db::Database::with_external_config(&run.database, run.creation).await?;

        context
            .health
            .readiness
            .register("database", spawn_db_check(db.clone())?)
            .await;

        Ok(InitData { db, http: run.http })
    }

    async fn run(self) -> anyhow::Result<()> {
        let db = self.db;

        let mut http = HttpServer::new(move || {
            App::new()
                .into_utoipa_app()
                .openapi(openapi::ApiDoc::openapi())
                .map(|app| app.wrap(Logger::default()))
                .configure(|svc| atende_module_chat::endpoints::configure(svc, db.clone()))
                .openapi_service(|api| RapiDoc::with_openapi("/openapi.json", api).path("/docs"))
                .into_app()
        });

        if let Some(workers) = self.http.http_server_workers {
            http = http.workers(workers);
        }

        let http = http.bind(&self.http.http_server_bind_addr)?;

        log::info!("listening on {}", self.http.http_server_bind_addr);
        http.run().await?;

        Ok(())
    }
}
