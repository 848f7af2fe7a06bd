use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// File looked up next to the executable before falling back to the CLI argument.
pub const DEFAULT_CONFIG_FILE: &str = "kong_config.yaml";

/// Keyword selecting every consumer for a plugin.
pub const ALL_CLIENTS: &str = "all";

/// Provisioning document: what the gateway should contain after a run.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionConfig {
    /// Base URL of the Kong admin API.
    pub kong: String,
    pub apis: Vec<ApiSpec>,
    #[serde(default)]
    pub clients: Vec<ClientSpec>,
    #[serde(default)]
    pub plugins: IndexMap<String, PluginSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSpec {
    pub name: String,
    /// Routing attributes passed through to `PUT /apis` untouched.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSpec {
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Remaining keys; a mapping under a plugin's name overrides that plugin's config.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PluginSpec {
    pub apis: Vec<String>,
    pub clients: ClientSelector,
    #[serde(default)]
    pub config: Map<String, Value>,
}

/// Which consumers a plugin is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawSelector")]
pub enum ClientSelector {
    All,
    Named(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSelector {
    Keyword(String),
    Names(Vec<String>),
}

impl TryFrom<RawSelector> for ClientSelector {
    type Error = String;

    fn try_from(raw: RawSelector) -> Result<Self, Self::Error> {
        match raw {
            RawSelector::Keyword(k) if k == ALL_CLIENTS => Ok(Self::All),
            RawSelector::Keyword(other) => Err(format!(
                "clients must be \"{ALL_CLIENTS}\" or a list of client names, got \"{other}\""
            )),
            RawSelector::Names(names) => Ok(Self::Named(names)),
        }
    }
}

impl ProvisionConfig {
    /// Replace the gateway URL from the document (CLI flag or env var).
    pub fn with_gateway_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.kong = url;
        }
        self
    }

    /// First client whose name matches case-insensitively.
    pub fn client(&self, name: &str) -> Option<&ClientSpec> {
        self.clients
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

impl ClientSpec {
    pub fn plugin_config(&self, plugin: &str) -> Option<&Map<String, Value>> {
        self.extra.get(plugin).and_then(Value::as_object)
    }
}

pub fn load_config(path: &Path) -> Result<ProvisionConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `kong_config.yaml` beside the executable wins; otherwise the CLI argument.
pub fn resolve_config_path(arg: Option<&Path>) -> Option<PathBuf> {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_CONFIG_FILE)));
    resolve_from(beside_exe.as_deref(), arg)
}

fn resolve_from(conventional: Option<&Path>, arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = conventional.filter(|p| p.exists()) {
        return Some(path.to_path_buf());
    }
    arg.map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
kong: http://localhost:8001
apis:
  - name: orders
    request_path: /orders
    upstream_url: http://orders.internal
clients:
  - name: Acme
    email: a@acme.com
    rate-limiting:
      minute: 100
plugins:
  key-auth:
    apis: [orders]
    clients: all
  rate-limiting:
    apis: [orders]
    clients: [acme]
    config:
      minute: 10
"#;

    #[test]
    fn test_parse_document() {
        let cfg: ProvisionConfig = serde_yaml::from_str(DOC).unwrap();

        assert_eq!(cfg.kong, "http://localhost:8001");
        assert_eq!(cfg.apis.len(), 1);
        assert_eq!(cfg.apis[0].name, "orders");
        assert_eq!(cfg.apis[0].attributes["request_path"], "/orders");
        assert!(!cfg.apis[0].attributes.contains_key("name"));

        let plugins: Vec<&str> = cfg.plugins.keys().map(String::as_str).collect();
        assert_eq!(plugins, ["key-auth", "rate-limiting"]);
        assert_eq!(cfg.plugins["key-auth"].clients, ClientSelector::All);
        assert!(cfg.plugins["key-auth"].config.is_empty());
        assert_eq!(
            cfg.plugins["rate-limiting"].clients,
            ClientSelector::Named(vec!["acme".to_string()])
        );
        assert_eq!(cfg.plugins["rate-limiting"].config["minute"], 10);
    }

    #[test]
    fn test_client_lookup_is_case_insensitive() {
        let cfg: ProvisionConfig = serde_yaml::from_str(DOC).unwrap();

        let client = cfg.client("ACME").expect("client should resolve");
        assert_eq!(client.email, "a@acme.com");
        let override_config = client.plugin_config("rate-limiting").unwrap();
        assert_eq!(override_config["minute"], 100);
        assert!(client.plugin_config("key-auth").is_none());
        assert!(cfg.client("globex").is_none());
    }

    #[test]
    fn test_unknown_selector_keyword_is_rejected() {
        let doc = r#"
kong: http://localhost:8001
apis: []
plugins:
  cors:
    apis: [orders]
    clients: everyone
"#;
        let err = serde_yaml::from_str::<ProvisionConfig>(doc).unwrap_err();
        assert!(err.to_string().contains("everyone"));
    }

    #[test]
    fn test_missing_clients_and_plugins_default_to_empty() {
        let doc = "kong: http://kong:8001\napis:\n  - name: orders\n";
        let cfg: ProvisionConfig = serde_yaml::from_str(doc).unwrap();
        assert!(cfg.clients.is_empty());
        assert!(cfg.plugins.is_empty());
    }

    #[test]
    fn test_gateway_url_override() {
        let cfg: ProvisionConfig = serde_yaml::from_str(DOC).unwrap();
        let cfg = cfg.with_gateway_url(None);
        assert_eq!(cfg.kong, "http://localhost:8001");
        let cfg = cfg.with_gateway_url(Some("http://kong:8001".into()));
        assert_eq!(cfg.kong, "http://kong:8001");
    }

    #[test]
    fn test_load_config_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.yaml");
        let err = load_config(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let broken = dir.path().join("broken.yaml");
        fs::write(&broken, "kong: [unterminated").unwrap();
        let err = load_config(&broken).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let valid = dir.path().join("kong_config.yaml");
        fs::write(&valid, DOC).unwrap();
        assert_eq!(load_config(&valid).unwrap().apis[0].name, "orders");
    }

    #[test]
    fn test_resolve_prefers_conventional_file() {
        let dir = tempfile::tempdir().unwrap();
        let conventional = dir.path().join(DEFAULT_CONFIG_FILE);
        let arg = PathBuf::from("other.yaml");
        let conventional_path = Some(conventional.as_path());

        let resolved = resolve_from(conventional_path, Some(arg.as_path()));
        assert_eq!(resolved, Some(arg.clone()));
        assert_eq!(resolve_from(conventional_path, None), None);

        fs::write(&conventional, DOC).unwrap();
        let resolved = resolve_from(conventional_path, Some(arg.as_path()));
        assert_eq!(resolved, Some(conventional.clone()));
    }
}
