use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::GatewayError;

/// A consumer as listed by `GET /consumers/`.
#[derive(Debug, Clone, Deserialize)]
pub struct Consumer {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub custom_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiEntry {
    name: String,
}

/// Thin client for the Kong admin API.
pub struct KongClient {
    http: reqwest::Client,
    base_url: String,
}

impl KongClient {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request and parse the response body as JSON.
    ///
    /// `PUT` and `POST` carry `payload` (or `{}`) as a JSON body. The status
    /// code is not checked: Kong answers errors with JSON bodies, which are
    /// returned to the caller like any other response.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Value, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .http
            .request(method.clone(), &url)
            .header("Accept", "application/json");
        if method == Method::PUT || method == Method::POST {
            let empty = json!({});
            req = req
                .header("Content-Type", "application/json")
                .json(payload.unwrap_or(&empty));
        }

        let resp = req.send().await.map_err(|source| GatewayError::Transport {
            method: method.clone(),
            url: url.clone(),
            source,
        })?;
        let status = resp.status();
        let code = status.as_u16();
        tracing::debug!(%method, %url, status = code, "Kong admin request");
        if !status.is_success() {
            tracing::warn!(%method, %url, status = code, "Kong returned an error status");
        }

        let body = resp.text().await.map_err(|source| GatewayError::Transport {
            method: method.clone(),
            url: url.clone(),
            source,
        })?;
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => Ok(value),
            Err(_) => Err(GatewayError::InvalidJson {
                method,
                url,
                status: code,
                body,
            }),
        }
    }

    pub async fn api_names(&self) -> Result<Vec<String>, GatewayError> {
        let apis: Vec<ApiEntry> = self.list("/apis").await?;
        Ok(apis.into_iter().map(|a| a.name).collect())
    }

    pub async fn create_api(&self, payload: &Value) -> Result<Value, GatewayError> {
        self.request(Method::PUT, "/apis", Some(payload)).await
    }

    pub async fn consumers(&self) -> Result<Vec<Consumer>, GatewayError> {
        self.list("/consumers/").await
    }

    pub async fn create_consumer(
        &self,
        username: &str,
        custom_id: &str,
    ) -> Result<Value, GatewayError> {
        let body = json!({ "username": username, "custom_id": custom_id });
        self.request(Method::PUT, "/consumers/", Some(&body)).await
    }

    pub async fn create_key_auth(&self, username: &str, key: &str) -> Result<Value, GatewayError> {
        let path = format!("/consumers/{}/key-auth", path_segment(username));
        let body = json!({ "key": key });
        self.request(Method::POST, &path, Some(&body)).await
    }

    pub async fn create_plugin(&self, api: &str, payload: &Value) -> Result<Value, GatewayError> {
        let path = format!("/apis/{}/plugins", path_segment(api));
        self.request(Method::PUT, &path, Some(payload)).await
    }

    /// The `data` array of a collection response.
    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, GatewayError> {
        let mut value = self.request(Method::GET, path, None).await?;
        let Some(data) = value.get_mut("data").map(Value::take) else {
            return Err(unexpected_shape(path, "missing `data`"));
        };
        // Kong encodes an empty collection as `{}`.
        if data.as_object().is_some_and(|map| map.is_empty()) {
            return Ok(Vec::new());
        }
        serde_json::from_value(data)
            .map_err(|e| unexpected_shape(path, &e.to_string()))
    }
}

fn unexpected_shape(path: &str, message: &str) -> GatewayError {
    GatewayError::UnexpectedShape {
        path: path.to_string(),
        message: message.to_string(),
    }
}

/// Percent-encode a name for use as a single URL path segment.
fn path_segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
