//! Provision a Kong gateway from a declarative YAML document.
//!
//! A run loads [`config::ProvisionConfig`], then [`reconcile::reconcile`]
//! creates the APIs, consumers and plugins the gateway is missing. Nothing is
//! updated or deleted, and a failure aborts the run without rolling back.

pub mod cli;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod observability;
pub mod output;
pub mod reconcile;
pub mod store;

pub use client::KongClient;
pub use config::{ProvisionConfig, load_config};
pub use error::{ProvisionError, Result};
pub use reconcile::{ReconcileReport, reconcile};
pub use store::{EnterpriseStore, FileStore, MemoryStore};
