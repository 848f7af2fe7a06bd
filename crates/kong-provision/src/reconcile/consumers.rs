use std::collections::HashSet;

use time::OffsetDateTime;

use crate::client::KongClient;
use crate::config::ClientSpec;
use crate::credentials::{generate_api_key, generate_password};
use crate::error::Result;
use crate::output::{print_skip, print_step};
use crate::store::{Authorization, Enterprise, EnterpriseStore};

/// Register a gateway consumer with key-auth credentials for every client
/// the gateway does not know yet.
///
/// Existence is decided by an exact username match against the live
/// consumer list. Credentials come from the store when the enterprise was
/// provisioned before, and are generated and persisted otherwise.
pub async fn reconcile_consumers(
    client: &KongClient,
    store: &dyn EnterpriseStore,
    clients: &[ClientSpec],
) -> Result<Vec<String>> {
    let mut live: HashSet<String> = client
        .consumers()
        .await?
        .into_iter()
        .filter_map(|c| c.username)
        .collect();

    let mut created = Vec::new();
    for spec in clients {
        if live.contains(&spec.name) {
            print_skip(&format!("Consumer {} already exists", spec.name));
            continue;
        }

        let (enterprise, authorization) = credentials_for(store, spec).await?;

        print_step(&format!("Creating consumer {}", spec.name));
        client
            .create_consumer(&enterprise.name, &enterprise.id.to_string())
            .await?;
        client
            .create_key_auth(&enterprise.name, &authorization.apikey)
            .await?;

        tracing::info!(
            consumer = %enterprise.name,
            enterprise_id = %enterprise.id,
            "Created consumer with key-auth credential"
        );
        live.insert(spec.name.clone());
        created.push(spec.name.clone());
    }

    Ok(created)
}

/// Stored enterprise and authorization for `spec`, created on first use.
async fn credentials_for(
    store: &dyn EnterpriseStore,
    spec: &ClientSpec,
) -> Result<(Enterprise, Authorization)> {
    let enterprise = match store.find_enterprise(&spec.name).await? {
        Some(existing) => existing,
        None => {
            let enterprise = Enterprise::new(&spec.name);
            store.save_enterprise(&enterprise).await?;
            enterprise
        }
    };

    if let Some(authorization) = store.find_authorization(enterprise.id).await? {
        tracing::debug!(consumer = %spec.name, "Reusing stored credentials");
        return Ok((enterprise, authorization));
    }

    let authorization = Authorization {
        enterprise_id: enterprise.id,
        username: enterprise.name.clone(),
        email: spec.email.clone(),
        apikey: generate_api_key(),
        password: generate_password(None)?,
        created_at: OffsetDateTime::now_utc(),
    };
    store.save_authorization(&authorization).await?;
    Ok((enterprise, authorization))
}
