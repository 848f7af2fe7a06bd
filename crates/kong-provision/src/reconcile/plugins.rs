use serde_json::{Map, Value};

use crate::client::{Consumer, KongClient};
use crate::config::{ClientSelector, ProvisionConfig};
use crate::error::{LookupError, Result};
use crate::output::print_step;

/// Attach every configured plugin to its target APIs.
///
/// A plugin targeting `all` clients is attached once per API. A plugin
/// targeting named clients is attached once per (API, client) pair, bound to
/// the client's consumer id and using the client's own config for the plugin
/// when it has one.
pub async fn reconcile_plugins(
    client: &KongClient,
    config: &ProvisionConfig,
) -> Result<Vec<String>> {
    let consumers = client.consumers().await?;

    let mut created = Vec::new();
    for (plugin, spec) in &config.plugins {
        for api in &spec.apis {
            match &spec.clients {
                ClientSelector::All => {
                    print_step(&format!("Adding plugin {plugin} for API {api}"));
                    let payload = plugin_payload(plugin, None, &spec.config);
                    client.create_plugin(api, &payload).await?;
                    tracing::info!(%plugin, %api, "Added plugin");
                    created.push(format!("{plugin}@{api}"));
                }
                ClientSelector::Named(names) => {
                    for name in names {
                        let lookup = |client: &str| (plugin.clone(), client.to_string());
                        let Some(client_spec) = config.client(name) else {
                            let (plugin, client) = lookup(name);
                            return Err(LookupError::UnknownClient { plugin, client }.into());
                        };
                        // The consumer was registered under the document's spelling.
                        let username = &client_spec.name;
                        let Some(consumer) = find_consumer(&consumers, username) else {
                            let (plugin, client) = lookup(name);
                            return Err(LookupError::ConsumerNotFound { plugin, client }.into());
                        };
                        let plugin_config = match client_spec.plugin_config(plugin) {
                            Some(own) => own,
                            None => &spec.config,
                        };

                        let step = format!("Adding plugin {plugin} for API {api} and {username}");
                        print_step(&step);
                        let payload = plugin_payload(plugin, Some(&consumer.id), plugin_config);
                        client.create_plugin(api, &payload).await?;
                        let consumer_id = consumer.id.as_str();
                        tracing::info!(%plugin, %api, consumer_id, "Added plugin");
                        created.push(format!("{plugin}@{api}/{username}"));
                    }
                }
            }
        }
    }

    Ok(created)
}

/// Consumer registered under `name`.
///
/// An exact username match wins. Otherwise the first case-insensitive match
/// is used, with a warning, since Kong usernames are case-sensitive.
fn find_consumer<'a>(consumers: &'a [Consumer], name: &str) -> Option<&'a Consumer> {
    let exact = consumers
        .iter()
        .find(|c| c.username.as_deref() == Some(name));
    if exact.is_some() {
        return exact;
    }
    let fallback = consumers.iter().find(|c| {
        c.username
            .as_deref()
            .is_some_and(|u| u.eq_ignore_ascii_case(name))
    })?;
    tracing::warn!(
        client = name,
        consumer = fallback.username.as_deref(),
        "No consumer with the exact username; using a case-insensitive match"
    );
    Some(fallback)
}

/// Rename every key `k` to `config.k`, the form Kong expects for nested
/// plugin settings.
pub fn prefix_config_keys(config: &Map<String, Value>) -> Map<String, Value> {
    config
        .iter()
        .map(|(key, value)| (format!("config.{key}"), value.clone()))
        .collect()
}

pub fn plugin_payload(
    plugin: &str,
    consumer_id: Option<&str>,
    config: &Map<String, Value>,
) -> Value {
    let mut payload = Map::new();
    payload.insert("name".to_string(), Value::String(plugin.to_string()));
    if let Some(id) = consumer_id {
        payload.insert("consumer_id".to_string(), Value::String(id.to_string()));
    }
    payload.extend(prefix_config_keys(config));
    Value::Object(payload)
}
