//! Top-level event processing flow
//!
//! Decode the argument vector, build the payload, consult the id store, and
//! dispatch exactly one create or update call. Every `(event shape, store
//! lookup, event type)` combination maps to exactly one action.

use tracing::{debug, info, warn};

use crate::alert::Alert;
use crate::client::ServiceNowClient;
use crate::config::Configuration;
use crate::error::{AlertError, Result};
use crate::event::{self, MonitoringEvent};
use crate::store::IdStore;

/// Event-type prefixes that mark the end of an incident lifecycle
const POLICY_CLOSE: &str = "POLICY_CLOSE";
const POLICY_CANCELED: &str = "POLICY_CANCELED";

/// True when the event signals that the upstream incident is over
pub fn should_resolve(event_type: &str) -> bool {
    event_type.starts_with(POLICY_CLOSE) || event_type.starts_with(POLICY_CANCELED)
}

/// Process one invocation's argument vector end to end
pub async fn run(config: &Configuration, args: &[String], store: &dyn IdStore) -> Result<()> {
    debug!(slots = args.len(), "decoding argument vector");

    let violation = match event::decode(args)? {
        MonitoringEvent::HealthRuleViolation(v) => v,
        MonitoringEvent::Other(other) => {
            warn!(
                event_name = %other.event_name,
                app = %other.app_name,
                "not a health-rule violation event, skipping"
            );
            return Err(AlertError::UnsupportedEvent(other.event_name));
        }
    };

    info!(
        incident_id = %violation.incident_id,
        event_type = %violation.event_type,
        policy = %violation.health_rule_name,
        "processing health-rule violation"
    );

    let alert = Alert::build(&violation, &config.fields);
    let client = ServiceNowClient::new(config)?;

    match store.get(&violation.incident_id)? {
        None => {
            client
                .post_alert(&alert, &violation.incident_id, store)
                .await
        }
        Some(sys_id) => {
            let close = should_resolve(&violation.event_type);
            client
                .update_alert(&alert, &violation.incident_id, &sys_id, close)
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_resolve_prefixes() {
        assert!(should_resolve("POLICY_CLOSE"));
        assert!(should_resolve("POLICY_CLOSE_WARNING"));
        assert!(should_resolve("POLICY_CANCELED"));
        assert!(should_resolve("POLICY_CANCELED_CRITICAL"));
        assert!(!should_resolve("POLICY_OPEN_WARNING"));
        assert!(!should_resolve("POLICY_CONTINUES_CRITICAL"));
        assert!(!should_resolve(""));
    }
}
