//! Incident payload construction
//!
//! Translates a decoded health-rule violation into the JSON body sent to the
//! ServiceNow incident table. The `comments` field is a line-oriented summary
//! whose layout is byte-compatible with the original template renderer,
//! including the `Incident URL:` line repeated per triggered condition with
//! no trailing newline.

use serde_json::{Map, Value};

use crate::config::{ClosureSettings, Field};
use crate::event::HealthRuleViolationEvent;

/// Wire payload for incident create and update calls
#[derive(Debug, Clone)]
pub struct Alert {
    /// ServiceNow impact axis, "1" (high) to "3" (low)
    pub impact: String,
    /// Monitoring priority, passed through verbatim
    pub priority: String,
    pub short_description: String,
    pub comments: String,
    /// Configured static fields, in configuration order
    dynamic_fields: Vec<(String, String)>,
}

impl Alert {
    /// Build the payload for a violation event plus configured static fields
    pub fn build(event: &HealthRuleViolationEvent, fields: &[Field]) -> Self {
        let dynamic_fields = fields
            .iter()
            .filter(|f| !f.value.is_empty())
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect();

        Self {
            impact: impact_for(&event.severity).to_string(),
            priority: event.priority.clone(),
            short_description: short_description(event),
            comments: summary(event),
            dynamic_fields,
        }
    }

    /// Serialize to the JSON object sent on create. Dynamic fields are
    /// spliced at the top level; a later field with the same name overrides
    /// an earlier one.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("impact".to_string(), Value::String(self.impact.clone()));
        body.insert("priority".to_string(), Value::String(self.priority.clone()));
        body.insert(
            "short_description".to_string(),
            Value::String(self.short_description.clone()),
        );
        body.insert("comments".to_string(), Value::String(self.comments.clone()));
        for (name, value) in &self.dynamic_fields {
            body.insert(name.clone(), Value::String(value.clone()));
        }
        Value::Object(body)
    }

    /// Serialize for an update, adding resolution fields when closing
    pub fn to_update_json(&self, close: Option<&ClosureSettings>) -> Value {
        let mut value = self.to_json();
        if let (Some(closure), Some(body)) = (close, value.as_object_mut()) {
            body.insert("state".to_string(), Value::String(closure.state.clone()));
            body.insert(
                "close_code".to_string(),
                Value::String(closure.close_code.clone()),
            );
            body.insert(
                "close_notes".to_string(),
                Value::String(closure.close_notes.clone()),
            );
        }
        value
    }
}

/// Map monitoring severity onto the ServiceNow impact axis
fn impact_for(severity: &str) -> &'static str {
    match severity {
        "ERROR" => "1",
        "WARN" => "2",
        _ => "3",
    }
}

fn short_description(event: &HealthRuleViolationEvent) -> String {
    format!(
        "Policy {} for {} violated",
        event.health_rule_name, event.affected_entity_name
    )
}

/// Render the multi-line incident body. Layout is fixed by the upstream
/// template contract; do not reorder or reformat lines.
fn summary(event: &HealthRuleViolationEvent) -> String {
    let mut out = String::new();
    out.push_str(&format!("Application Name:{}\n", event.app_name));
    out.push_str(&format!(
        "Policy Violation Alert Time:{}\n",
        event.pvn_alert_time
    ));
    out.push_str(&format!("Severity:{}\n", event.severity));
    out.push_str(&format!(
        "Name of Violated Policy:{}\n",
        event.health_rule_name
    ));
    out.push_str(&format!(
        "Affected Entity Type:{}\n",
        event.affected_entity_type
    ));
    out.push_str(&format!(
        "Name of Affected Entity:{}\n",
        event.affected_entity_name
    ));

    for (i, entity) in event.evaluation_entities.iter().enumerate() {
        out.push_str(&format!("EVALUATION ENTITY #{}:\n", i + 1));
        out.push_str(&format!("Evaluation Entity:{}\n", entity.entity_type));
        out.push_str(&format!("Evaluation Entity Name:{}\n", entity.name));

        for (j, condition) in entity.triggered_conditions.iter().enumerate() {
            out.push_str(&format!("Triggered Condition #{}:\n\n", j + 1));
            out.push_str(&format!("Scope Type:{}\n", condition.scope_type));
            out.push_str(&format!("Scope Name:{}\n", condition.scope_name));

            if condition.is_baseline() {
                out.push_str(&format!(
                    "Is Default Baseline?{}\n",
                    if condition.use_default_baseline {
                        "true"
                    } else {
                        "false"
                    }
                ));
                if !condition.use_default_baseline {
                    out.push_str(&format!(
                        "Baseline Name:{}\n",
                        condition.baseline_name.as_deref().unwrap_or("")
                    ));
                }
            }

            out.push_str(&format!(
                "{}{}{}\n",
                condition.condition_name, condition.operator, condition.threshold_value
            ));
            out.push_str(&format!("Violation Value:{}\n\n", condition.observed_value));
            // Emitted once per triggered condition, with no newline after the
            // URL. Byte-compatible with the upstream renderer.
            out.push_str(&format!("Incident URL:{}", event.incident_url));
        }
    }
    out
}
