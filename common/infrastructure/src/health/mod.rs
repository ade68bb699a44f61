pub mod checks;

use serde::Serialize;
use std::{collections::BTreeMap, fmt::Display, future::Future, pin::Pin, sync::Arc};
use tokio::sync::RwLock;

/// A single health check.
pub trait Check: Send + Sync + 'static {
    type Error: Display;

    fn run(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Object-safe adapter over [`Check`], so a registry can hold mixed check types.
trait ErasedCheck: Send + Sync {
    fn run(&self) -> Pin<Box<dyn Future<Output = Option<String>> + Send + '_>>;
}

impl<C: Check> ErasedCheck for C {
    fn run(&self) -> Pin<Box<dyn Future<Output = Option<String>> + Send + '_>> {
        Box::pin(async move { Check::run(self).await.err().map(|err| err.to_string()) })
    }
}

/// The outcome of running a set of checks. `None` means "up".
#[derive(Clone, Debug, Default, Serialize)]
pub struct CheckResults {
    pub results: BTreeMap<String, Option<String>>,
}

impl CheckResults {
    pub fn all_up(&self) -> bool {
        self.results.values().all(Option::is_none)
    }
}

/// A named set of checks which run together.
#[derive(Default)]
pub struct Checks {
    checks: RwLock<BTreeMap<String, Arc<dyn ErasedCheck>>>,
}

impl Checks {
    pub async fn register(&self, name: impl Into<String>, check: impl Check) {
        let mut checks = self.checks.write().await;
        checks.insert(name.into(), Arc::new(check));
    }

    pub async fn run(&self) -> CheckResults {
        let checks = self.checks.read().await;

        let mut results = BTreeMap::new();
        for (name, check) in checks.iter() {
            results.insert(name.clone(), check.run().await);
        }

        CheckResults { results }
    }
}

/// The probe groups served by the infrastructure endpoint.
#[derive(Default)]
pub struct HealthChecks {
    pub startup: Checks,
    pub liveness: Checks,
    pub readiness: Checks,
}
