//! Reconciliation of the provisioning document against a live Kong.
//!
//! Runs three phases in order, each a single forward pass over a snapshot
//! taken at the start of the phase:
//! - APIs missing from the gateway are created
//! - Clients without a gateway consumer are registered with key-auth credentials
//! - Plugins are attached per API, globally or per consumer

mod apis;
mod consumers;
mod plugins;

pub use apis::{api_payload, reconcile_apis};
pub use consumers::reconcile_consumers;
pub use plugins::{plugin_payload, prefix_config_keys, reconcile_plugins};

use crate::client::KongClient;
use crate::config::ProvisionConfig;
use crate::error::Result;
use crate::store::EnterpriseStore;

/// What a run created, by phase.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub apis: Vec<String>,
    pub consumers: Vec<String>,
    /// `plugin@api` or `plugin@api/client`.
    pub plugins: Vec<String>,
}

pub async fn reconcile(
    client: &KongClient,
    store: &dyn EnterpriseStore,
    config: &ProvisionConfig,
) -> Result<ReconcileReport> {
    let apis = reconcile_apis(client, &config.apis).await?;
    let consumers = reconcile_consumers(client, store, &config.clients).await?;
    let plugins = reconcile_plugins(client, config).await?;

    Ok(ReconcileReport {
        apis,
        consumers,
        plugins,
    })
}
