use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use grantflow::config::PaymentConfig;
use grantflow::lifecycle::memory::{
    InMemoryApplicationStore, InMemoryCheckoutGateway, InMemoryUserDirectory,
};
use grantflow::lifecycle::{LifecycleEngine, PaymentSettings, Role};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type ApiEngine =
    LifecycleEngine<InMemoryApplicationStore, InMemoryUserDirectory, InMemoryCheckoutGateway>;

pub(crate) fn payment_settings(config: &PaymentConfig) -> PaymentSettings {
    PaymentSettings {
        currency: config.currency.clone(),
        success_url: config.success_url.clone(),
        cancel_url: config.cancel_url.clone(),
    }
}

/// Assemble the engine over in-memory collaborators, optionally seeding a
/// bootstrap admin so a fresh deployment can promote further users.
pub(crate) fn build_engine(
    payments: PaymentSettings,
    bootstrap_admin: Option<&str>,
) -> (Arc<ApiEngine>, Arc<InMemoryCheckoutGateway>) {
    let store = Arc::new(InMemoryApplicationStore::default());
    let directory = Arc::new(InMemoryUserDirectory::default());
    let gateway = Arc::new(InMemoryCheckoutGateway::default());

    if let Some(email) = bootstrap_admin {
        directory.seed_role(email, Role::Admin);
    }

    let engine = Arc::new(LifecycleEngine::new(
        store,
        directory.clone(),
        gateway.clone(),
        payments,
    ));
    (engine, gateway)
}
