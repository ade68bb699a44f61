#![allow(clippy::expect_used)]

pub mod call;

use atende_common as common;
use atende_common::db;
use postgresql_embedded::PostgreSQL;
use std::env;
use test_context::AsyncTestContext;
use tracing::instrument;

/// A database-backed test environment.
///
/// Uses an embedded PostgreSQL instance by default; set `EXTERNAL_TEST_DB`
/// to run against an already provisioned database from the `DB_*` env vars.
pub struct AtendeContext {
    pub db: common::db::Database,
    postgresql: Option<PostgreSQL>,
}

impl AtendeContext {
    async fn new(db: common::db::Database, postgresql: impl Into<Option<PostgreSQL>>) -> Self {
        Self {
            db,
            postgresql: postgresql.into(),
        }
    }
}

impl AsyncTestContext for AtendeContext {
    #[instrument]
    #[allow(clippy::expect_used)]
    async fn setup() -> AtendeContext {
        if env::var("EXTERNAL_TEST_DB").is_ok() {
            log::warn!("Using external database from 'DB_*' env vars");
            let config = common::config::Database::from_env().expect("DB config from env");

            let db = if env::var("EXTERNAL_TEST_DB_BOOTSTRAP").is_ok() {
                common::db::Database::bootstrap(&config).await
            } else {
                common::db::Database::new(&config).await
            }
            .expect("Configuring the database");

            return AtendeContext::new(db, None).await;
        }

        let (db, postgresql) = db::embedded::create()
            .await
            .expect("Create an embedded database");

        AtendeContext::new(db, postgresql).await
    }

    async fn teardown(self) {
        // the embedded instance is temporary; dropping it tears the cluster down
        drop(self.postgresql);
    }
}
