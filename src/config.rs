//! Configuration loading for the ServiceNow alert forwarder
//!
//! Settings are read once per invocation from a YAML file
//! (`./conf/config.yaml` by default). Unknown keys are ignored so the file
//! can carry platform-side options the forwarder does not care about.

use serde::Deserialize;
use std::path::Path;

use crate::error::{AlertError, Result};

/// Top-level configuration for one invocation
#[derive(Debug, Clone, Deserialize)]
pub struct Configuration {
    /// ServiceNow instance connection settings
    #[serde(rename = "serviceNow")]
    pub service_now: ServiceNowSettings,

    /// Optional HTTP proxy settings
    #[serde(default)]
    pub proxy: Option<ProxySettings>,

    /// Static incident fields forwarded verbatim on every alert.
    /// Order matters: later entries with the same name override earlier ones.
    #[serde(default)]
    pub fields: Vec<Field>,

    /// Incident closure field values, applied when an update closes
    #[serde(default)]
    pub closure: ClosureSettings,
}

/// ServiceNow instance connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceNowSettings {
    pub host: String,

    #[serde(default)]
    pub port: Option<u16>,

    /// `http` or `https`
    pub protocol: String,

    pub username: String,
    pub password: String,
}

/// Outbound HTTP proxy settings
#[derive(Debug, Clone, Deserialize)]
pub struct ProxySettings {
    pub host: String,
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

/// A static `(name, value)` incident field from configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// Field values stamped onto the payload when closing an incident.
///
/// Defaults follow ServiceNow's standard resolution semantics
/// (state 6 = Resolved).
#[derive(Debug, Clone, Deserialize)]
pub struct ClosureSettings {
    #[serde(default = "default_close_state")]
    pub state: String,

    #[serde(rename = "closeCode", default = "default_close_code")]
    pub close_code: String,

    #[serde(rename = "closeNotes", default = "default_close_notes")]
    pub close_notes: String,
}

fn default_close_state() -> String {
    "6".to_string()
}

fn default_close_code() -> String {
    "Closed/Resolved by Caller".to_string()
}

fn default_close_notes() -> String {
    "Closed by monitoring platform on policy resolution".to_string()
}

impl Default for ClosureSettings {
    fn default() -> Self {
        Self {
            state: default_close_state(),
            close_code: default_close_code(),
            close_notes: default_close_notes(),
        }
    }
}

impl Configuration {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AlertError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Configuration = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Base URL of the ServiceNow instance, `protocol://host[:port]`
    pub fn base_url(&self) -> String {
        match self.service_now.port {
            Some(port) => format!(
                "{}://{}:{}",
                self.service_now.protocol, self.service_now.host, port
            ),
            None => format!("{}://{}", self.service_now.protocol, self.service_now.host),
        }
    }
}

impl ProxySettings {
    /// Proxy URL in the form `http://host:port`
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
