use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the provisioning document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors raised while talking to the Kong admin API.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Request {method} {url} failed: {source}")]
    Transport {
        method: reqwest::Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Response to {method} {url} is not valid JSON (HTTP {status}): {body}")]
    InvalidJson {
        method: reqwest::Method,
        url: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected response shape from {path}: {message}")]
    UnexpectedShape { path: String, message: String },
}

/// Errors raised when a plugin target cannot be resolved.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Plugin {plugin} targets client {client}, which is not listed under clients")]
    UnknownClient { plugin: String, client: String },

    #[error("Plugin {plugin} targets client {client}, which has no consumer in Kong")]
    ConsumerNotFound { plugin: String, client: String },
}

/// Errors raised by the local enterprise store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Enterprise store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Enterprise store {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to hash password: {0}")]
    Hash(argon2::password_hash::Error),
}

/// Top-level error for a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

pub type Result<T, E = ProvisionError> = std::result::Result<T, E>;
