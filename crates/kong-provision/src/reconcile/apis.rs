use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::client::KongClient;
use crate::config::ApiSpec;
use crate::error::Result;
use crate::output::print_step;

/// Create every API whose name the gateway does not know yet.
///
/// Returns the names created, in document order.
pub async fn reconcile_apis(client: &KongClient, apis: &[ApiSpec]) -> Result<Vec<String>> {
    let live: HashSet<String> = client.api_names().await?.into_iter().collect();

    let mut seen = HashSet::new();
    let mut created = Vec::new();
    for api in apis {
        if live.contains(&api.name) || !seen.insert(api.name.as_str()) {
            continue;
        }

        print_step(&format!("Creating API {}", api.name));
        let response = client.create_api(&api_payload(api)).await?;
        tracing::info!(api = %api.name, response = %response, "Created API");
        created.push(api.name.clone());
    }

    Ok(created)
}

/// Defaults with the API's own attributes merged over them.
pub fn api_payload(api: &ApiSpec) -> Value {
    let mut payload = Map::new();
    payload.insert("strip_request_path".to_string(), Value::Bool(true));
    payload.insert("preserve_host".to_string(), Value::Bool(false));
    payload.extend(api.attributes.clone());
    payload.insert("name".to_string(), Value::String(api.name.clone()));
    Value::Object(payload)
}
