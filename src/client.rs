//! ServiceNow Table API client
//!
//! One `reqwest` client per invocation: basic auth, rustls TLS, optional
//! authenticated proxy, a single 30 s timeout, and no retries. Create goes
//! through `POST /api/now/table/incident`; updates address the record by
//! sys_id with `PUT`.

use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::alert::Alert;
use crate::config::{ClosureSettings, Configuration};
use crate::error::{AlertError, Result};
use crate::store::IdStore;

/// Connect+read timeout for every request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const INCIDENT_TABLE_PATH: &str = "/api/now/table/incident";

/// Client for incident create and update calls
pub struct ServiceNowClient {
    base_url: String,
    username: String,
    password: String,
    client: reqwest::Client,
    closure: ClosureSettings,
}

impl ServiceNowClient {
    /// Build a client from the loaded configuration
    pub fn new(config: &Configuration) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(REQUEST_TIMEOUT);

        if let Some(ref proxy) = config.proxy {
            let mut p = reqwest::Proxy::all(proxy.url())?;
            if let (Some(user), Some(pass)) = (&proxy.username, &proxy.password) {
                p = p.basic_auth(user, pass);
            }
            builder = builder.proxy(p);
            debug!(proxy = %proxy.url(), "routing requests through proxy");
        }

        Ok(Self {
            base_url: config.base_url(),
            username: config.service_now.username.clone(),
            password: config.service_now.password.clone(),
            client: builder.build()?,
            closure: config.closure.clone(),
        })
    }

    /// Create a new incident. On success the returned sys_id is bound to the
    /// upstream incident id in the store before returning.
    pub async fn post_alert(
        &self,
        alert: &Alert,
        incident_id: &str,
        store: &dyn IdStore,
    ) -> Result<()> {
        let url = format!("{}{}", self.base_url, INCIDENT_TABLE_PATH);
        debug!(incident_id, %url, "creating incident");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&alert.to_json())
            .send()
            .await
            .map_err(|e| AlertError::transport(format!("create request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(incident_id, %status, "incident create rejected");
            return Err(AlertError::transport(format!(
                "create returned {}: {}",
                status, body
            )));
        }

        let created: CreateResponse = response.json().await.map_err(|e| {
            AlertError::ResponseParse(format!("create response is not valid JSON: {}", e))
        })?;
        let sys_id = created.result.and_then(|r| r.sys_id).ok_or_else(|| {
            AlertError::ResponseParse("create response is missing result.sys_id".to_string())
        })?;

        info!(incident_id, sys_id, "incident created");

        // The remote incident exists at this point; a store failure only
        // risks a duplicate create on the next event, which is accepted.
        if let Err(e) = store.put(incident_id, &sys_id) {
            warn!(incident_id, sys_id, "could not persist sys_id binding: {}", e);
        }
        Ok(())
    }

    /// Update an existing incident, optionally marking it resolved
    pub async fn update_alert(
        &self,
        alert: &Alert,
        incident_id: &str,
        sys_id: &str,
        close: bool,
    ) -> Result<()> {
        let url = format!("{}{}/{}", self.base_url, INCIDENT_TABLE_PATH, sys_id);
        debug!(incident_id, sys_id, close, %url, "updating incident");

        let body = if close {
            alert.to_update_json(Some(&self.closure))
        } else {
            alert.to_update_json(None)
        };

        let response = self
            .client
            .put(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| AlertError::transport(format!("update request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(incident_id, sys_id, %status, "incident update rejected");
            return Err(AlertError::transport(format!(
                "update returned {}: {}",
                status, body
            )));
        }

        info!(incident_id, sys_id, close, "incident updated");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    result: Option<CreateResult>,
}

#[derive(Debug, Deserialize)]
struct CreateResult {
    sys_id: Option<String>,
}
