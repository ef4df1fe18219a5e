// Configuration management module
// This file loads the service settings from environment variables
// (APP__NAMESPACE, APP__METRICS_PATH, APP__LISTEN_ADDR)
//
// Numan Thabit 2025 Nov

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Prefix applied to every instrument name, e.g. `shop` -> `shop_http_requests_total`
    #[serde(default)]
    pub namespace: String,
    /// Scrape path served by the exposition router
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
    /// Address the HTTP server binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: config::Config) -> Result<Self> {
        let parsed: Self = cfg.try_deserialize().context("deserialize configuration")?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.metrics_path.starts_with('/') {
            bail!("metrics path must start with '/': {}", self.metrics_path);
        }
        if !is_valid_namespace(&self.namespace) {
            bail!("invalid metrics namespace: {:?}", self.namespace);
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .parse()
            .with_context(|| format!("invalid listen address: {}", self.listen_addr))
    }
}

/// Empty, or a valid Prometheus metric name prefix. Checked here so a bad
/// value is reported as a config error before any instrument is built.
fn is_valid_namespace(ns: &str) -> bool {
    let mut chars = ns.chars();
    match chars.next() {
        None => true,
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        Some(_) => false,
    }
}
