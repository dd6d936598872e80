//! Monitoring event types and the positional argument decoder
//!
//! The monitoring platform invokes the forwarder with one positional
//! argument per template parameter. The health-rule violation template has a
//! fixed 13-slot prefix, a count-driven block of evaluation entities and
//! triggered conditions, and a fixed 4-slot suffix. All other templates are
//! decoded as [`OtherEvent`] and skipped by the orchestrator.
//!
//! Slot 12 is the discriminator: it holds the evaluation-entity count in the
//! violation template and a non-numeric value in every other template.

use crate::error::{AlertError, Result};

/// Slot index holding the evaluation-entity count in the violation template
const DISCRIMINATOR_SLOT: usize = 12;

/// Minimum argument count shared by all templates
const OTHER_EVENT_MIN_ARGS: usize = 7;

/// A decoded monitoring event
#[derive(Debug, Clone)]
pub enum MonitoringEvent {
    /// A health-rule violation, the only shape this forwarder handles
    HealthRuleViolation(HealthRuleViolationEvent),
    /// Any other well-formed event template
    Other(OtherEvent),
}

/// A health-rule violation event as rendered by the alert template
#[derive(Debug, Clone)]
pub struct HealthRuleViolationEvent {
    pub app_name: String,
    pub app_id: String,
    pub pvn_alert_time: String,
    pub priority: String,
    pub severity: String,
    pub tag: String,
    pub health_rule_name: String,
    pub health_rule_id: String,
    pub pvn_time_period_in_minutes: String,
    pub affected_entity_type: String,
    pub affected_entity_name: String,
    pub affected_entity_id: String,
    pub evaluation_entities: Vec<EvaluationEntity>,
    pub summary_message: String,
    /// Stable upstream identifier, shared by every event of one incident
    pub incident_id: String,
    /// Deep link into the monitoring platform
    pub incident_url: String,
    /// e.g. `POLICY_OPEN_WARNING`, `POLICY_CLOSE`, `POLICY_CANCELED_CRITICAL`
    pub event_type: String,
}

/// The object a policy was evaluated against (tier, node, transaction, ...)
#[derive(Debug, Clone)]
pub struct EvaluationEntity {
    pub entity_type: String,
    pub name: String,
    pub id: String,
    pub triggered_conditions: Vec<TriggerCondition>,
}

/// A metric comparison that crossed its threshold
#[derive(Debug, Clone)]
pub struct TriggerCondition {
    pub scope_type: String,
    pub scope_name: String,
    pub scope_id: String,
    pub condition_name: String,
    pub condition_id: String,
    pub operator: String,
    pub condition_unit_type: Option<String>,
    pub use_default_baseline: bool,
    pub baseline_name: Option<String>,
    pub baseline_id: Option<String>,
    pub threshold_value: String,
    pub observed_value: String,
}

impl TriggerCondition {
    /// Whether the condition carries baseline slots in the template
    pub fn is_baseline(&self) -> bool {
        is_baseline_unit(self.condition_unit_type.as_deref())
    }
}

/// A well-formed event of any non-violation template
#[derive(Debug, Clone)]
pub struct OtherEvent {
    pub app_name: String,
    pub app_id: String,
    pub event_time: String,
    pub priority: String,
    pub severity: String,
    pub tag: String,
    pub event_name: String,
    /// Template-specific remainder, retained for logging only
    pub rest: Vec<String>,
}

/// True when the unit type marks a baseline condition (template contract:
/// the unit-type string upper-cased starts with `BASELINE`)
pub fn is_baseline_unit(unit_type: Option<&str>) -> bool {
    unit_type
        .map(|u| u.to_uppercase().starts_with("BASELINE"))
        .unwrap_or(false)
}

/// Decode a positional argument vector into a tagged event
pub fn decode(args: &[String]) -> Result<MonitoringEvent> {
    if args.len() < OTHER_EVENT_MIN_ARGS {
        return Err(AlertError::decode(format!(
            "argument vector too short: {} slots, need at least {}",
            args.len(),
            OTHER_EVENT_MIN_ARGS
        )));
    }

    let is_violation = args
        .get(DISCRIMINATOR_SLOT)
        .map(|s| s.parse::<i64>().is_ok())
        .unwrap_or(false);

    if is_violation {
        decode_violation(args).map(MonitoringEvent::HealthRuleViolation)
    } else {
        decode_other(args).map(MonitoringEvent::Other)
    }
}

fn decode_violation(args: &[String]) -> Result<HealthRuleViolationEvent> {
    let mut cursor = ArgCursor::new(args);

    let app_name = cursor.next("appName")?;
    let app_id = cursor.next("appId")?;
    let pvn_alert_time = cursor.next("pvnAlertTime")?;
    let priority = cursor.next("priority")?;
    let severity = cursor.next("severity")?;
    let tag = cursor.next("tag")?;
    let health_rule_name = cursor.next("healthRuleName")?;
    let health_rule_id = cursor.next("healthRuleId")?;
    let pvn_time_period_in_minutes = cursor.next("pvnTimePeriodInMinutes")?;
    let affected_entity_type = cursor.next("affectedEntityType")?;
    let affected_entity_name = cursor.next("affectedEntityName")?;
    let affected_entity_id = cursor.next("affectedEntityId")?;

    let entity_count = cursor.next_count("numberOfEvaluationEntities")?;
    let mut evaluation_entities = Vec::with_capacity(entity_count);
    for _ in 0..entity_count {
        evaluation_entities.push(decode_entity(&mut cursor)?);
    }

    let summary_message = cursor.next("summaryMessage")?;
    let incident_id = cursor.next("incidentID")?;
    let incident_url = cursor.next("incidentUrl")?;
    let event_type = cursor.next("eventType")?;

    Ok(HealthRuleViolationEvent {
        app_name,
        app_id,
        pvn_alert_time,
        priority,
        severity,
        tag,
        health_rule_name,
        health_rule_id,
        pvn_time_period_in_minutes,
        affected_entity_type,
        affected_entity_name,
        affected_entity_id,
        evaluation_entities,
        summary_message,
        incident_id,
        incident_url,
        event_type,
    })
}

fn decode_entity(cursor: &mut ArgCursor<'_>) -> Result<EvaluationEntity> {
    let entity_type = cursor.next("evaluationEntityType")?;
    let name = cursor.next("evaluationEntityName")?;
    let id = cursor.next("evaluationEntityId")?;

    let condition_count = cursor.next_count("numberOfTriggeredConditions")?;
    let mut triggered_conditions = Vec::with_capacity(condition_count);
    for _ in 0..condition_count {
        triggered_conditions.push(decode_condition(cursor)?);
    }

    Ok(EvaluationEntity {
        entity_type,
        name,
        id,
        triggered_conditions,
    })
}

fn decode_condition(cursor: &mut ArgCursor<'_>) -> Result<TriggerCondition> {
    let scope_type = cursor.next("scopeType")?;
    let scope_name = cursor.next("scopeName")?;
    let scope_id = cursor.next("scopeId")?;
    let condition_name = cursor.next("conditionName")?;
    let condition_id = cursor.next("conditionId")?;
    let operator = cursor.next("operator")?;
    let condition_unit_type = cursor.next_optional("conditionUnitType")?;

    // Baseline slots exist in the vector only for baseline unit types, and
    // the name/id slots only when the default baseline is not used.
    let mut use_default_baseline = false;
    let mut baseline_name = None;
    let mut baseline_id = None;
    if is_baseline_unit(condition_unit_type.as_deref()) {
        let flag = cursor.next("useDefaultBaseline")?;
        use_default_baseline = flag.eq_ignore_ascii_case("true");
        if !use_default_baseline {
            baseline_name = cursor.next_optional("baselineName")?;
            baseline_id = cursor.next_optional("baselineId")?;
        }
    }

    let threshold_value = cursor.next("thresholdValue")?;
    let observed_value = cursor.next("observedValue")?;

    Ok(TriggerCondition {
        scope_type,
        scope_name,
        scope_id,
        condition_name,
        condition_id,
        operator,
        condition_unit_type,
        use_default_baseline,
        baseline_name,
        baseline_id,
        threshold_value,
        observed_value,
    })
}

fn decode_other(args: &[String]) -> Result<OtherEvent> {
    let mut cursor = ArgCursor::new(args);

    let app_name = cursor.next("appName")?;
    let app_id = cursor.next("appId")?;
    let event_time = cursor.next("eventTime")?;
    let priority = cursor.next("priority")?;
    let severity = cursor.next("severity")?;
    let tag = cursor.next("tag")?;
    let event_name = cursor.next("eventName")?;
    let rest = cursor.remainder();

    Ok(OtherEvent {
        app_name,
        app_id,
        event_time,
        priority,
        severity,
        tag,
        event_name,
        rest,
    })
}

/// Sequential reader over the argument vector with named-slot errors
struct ArgCursor<'a> {
    args: &'a [String],
    pos: usize,
}

impl<'a> ArgCursor<'a> {
    fn new(args: &'a [String]) -> Self {
        Self { args, pos: 0 }
    }

    /// Consume the next slot. Empty strings are preserved as empty.
    fn next(&mut self, field: &str) -> Result<String> {
        match self.args.get(self.pos) {
            Some(value) => {
                self.pos += 1;
                Ok(value.clone())
            }
            None => Err(AlertError::decode(format!(
                "argument vector ended at slot {} before {}",
                self.pos, field
            ))),
        }
    }

    /// Consume an optional slot: an empty string becomes `None`
    fn next_optional(&mut self, field: &str) -> Result<Option<String>> {
        let value = self.next(field)?;
        if value.is_empty() {
            Ok(None)
        } else {
            Ok(Some(value))
        }
    }

    /// Consume a non-negative integer count slot
    fn next_count(&mut self, field: &str) -> Result<usize> {
        let pos = self.pos;
        let value = self.next(field)?;
        let count: i64 = value.parse().map_err(|_| {
            AlertError::decode(format!(
                "slot {} ({}) is not an integer: {:?}",
                pos, field, value
            ))
        })?;
        if count < 0 {
            return Err(AlertError::decode(format!(
                "slot {} ({}) is negative: {}",
                pos, field, count
            )));
        }
        // A count cannot exceed the slots left in the vector; rejecting it
        // here also keeps the promised allocation bounded.
        let remaining = self.args.len() - self.pos;
        if count as u64 > remaining as u64 {
            return Err(AlertError::decode(format!(
                "slot {} ({}) promises {} blocks but only {} slots remain",
                pos, field, count, remaining
            )));
        }
        Ok(count as usize)
    }

    /// Remaining unconsumed slots
    fn remainder(&self) -> Vec<String> {
        self.args[self.pos..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_args(slots: &[&str]) -> Vec<String> {
        slots.iter().map(|s| s.to_string()).collect()
    }

    fn violation_prefix() -> Vec<&'static str> {
        vec![
            "ECommerce",     // appName
            "42",            // appId
            "Mon Aug 24 10:00:00", // pvnAlertTime
            "1",             // priority
            "ERROR",         // severity
            "",              // tag
            "CPU High",      // healthRuleName
            "7",             // healthRuleId
            "30",            // pvnTimePeriodInMinutes
            "APPLICATION_COMPONENT_NODE", // affectedEntityType
            "host-7",        // affectedEntityName
            "11",            // affectedEntityId
        ]
    }

    fn violation_suffix() -> Vec<&'static str> {
        vec![
            "summary text",                  // summaryMessage
            "INC-1",                         // incidentID
            "https://controller/incident/1", // incidentUrl
            "POLICY_OPEN_WARNING",           // eventType
        ]
    }

    #[test]
    fn test_decode_violation_no_entities() {
        let mut slots = violation_prefix();
        slots.push("0");
        slots.extend(violation_suffix());

        let event = match decode(&to_args(&slots)).unwrap() {
            MonitoringEvent::HealthRuleViolation(e) => e,
            other => panic!("expected violation, got {:?}", other),
        };

        assert_eq!(event.app_name, "ECommerce");
        assert_eq!(event.severity, "ERROR");
        assert_eq!(event.health_rule_name, "CPU High");
        assert_eq!(event.affected_entity_name, "host-7");
        assert_eq!(event.incident_id, "INC-1");
        assert_eq!(event.event_type, "POLICY_OPEN_WARNING");
        assert!(event.evaluation_entities.is_empty());
        // empty tag slot stays empty, never "null"
        assert_eq!(event.tag, "");
    }

    #[test]
    fn test_decode_violation_with_conditions() {
        let mut slots = violation_prefix();
        slots.push("1"); // one evaluation entity
        slots.extend(vec![
            "NODE", "node-1", "3", // entity type/name/id
            "2",                   // two triggered conditions
            // condition 1, absolute unit type
            "NODE", "node-1", "3", "CPU Used %", "9", ">", "ABSOLUTE", "90", "97",
            // condition 2, baseline with non-default baseline
            "NODE", "node-1", "3", "Resp Time", "10", ">", "BASELINE_STANDARD_DEVIATION",
            "false", "Weekly Trend", "5", "3", "12",
        ]);
        slots.extend(violation_suffix());

        let event = match decode(&to_args(&slots)).unwrap() {
            MonitoringEvent::HealthRuleViolation(e) => e,
            other => panic!("expected violation, got {:?}", other),
        };

        let entity = &event.evaluation_entities[0];
        assert_eq!(entity.entity_type, "NODE");
        assert_eq!(entity.triggered_conditions.len(), 2);

        let first = &entity.triggered_conditions[0];
        assert_eq!(first.condition_unit_type.as_deref(), Some("ABSOLUTE"));
        assert!(!first.is_baseline());
        assert_eq!(first.threshold_value, "90");
        assert_eq!(first.observed_value, "97");

        let second = &entity.triggered_conditions[1];
        assert!(second.is_baseline());
        assert!(!second.use_default_baseline);
        assert_eq!(second.baseline_name.as_deref(), Some("Weekly Trend"));
        assert_eq!(second.threshold_value, "3");
        assert_eq!(second.observed_value, "12");
    }

    #[test]
    fn test_decode_default_baseline_has_no_name_slots() {
        let mut slots = violation_prefix();
        slots.push("1");
        slots.extend(vec![
            "NODE", "node-1", "3",
            "1",
            "NODE", "node-1", "3", "Resp Time", "10", ">", "BASELINE_DAILY",
            "true", // default baseline: no name/id slots follow
            "3", "12",
        ]);
        slots.extend(violation_suffix());

        let event = match decode(&to_args(&slots)).unwrap() {
            MonitoringEvent::HealthRuleViolation(e) => e,
            other => panic!("expected violation, got {:?}", other),
        };

        let condition = &event.evaluation_entities[0].triggered_conditions[0];
        assert!(condition.use_default_baseline);
        assert!(condition.baseline_name.is_none());
        assert_eq!(condition.observed_value, "12");
    }

    #[test]
    fn test_decode_negative_entity_count_fails() {
        let mut slots = violation_prefix();
        slots.push("-1");
        slots.extend(violation_suffix());

        let err = decode(&to_args(&slots)).unwrap_err();
        assert!(matches!(err, AlertError::Decode(_)));
    }

    #[test]
    fn test_decode_absurd_entity_count_fails() {
        // i64::MAX parses as a non-negative count but can never be satisfied
        // by the vector; must fail decoding, not abort on allocation
        let mut slots = violation_prefix();
        slots.push("9223372036854775807");
        slots.extend(violation_suffix());

        let err = decode(&to_args(&slots)).unwrap_err();
        assert!(matches!(err, AlertError::Decode(_)));
    }

    #[test]
    fn test_decode_absurd_condition_count_fails() {
        let mut slots = violation_prefix();
        slots.push("1");
        slots.extend(vec!["NODE", "node-1", "3", "4000000000"]);
        slots.extend(violation_suffix());

        let err = decode(&to_args(&slots)).unwrap_err();
        assert!(matches!(err, AlertError::Decode(_)));
    }

    #[test]
    fn test_decode_non_numeric_condition_count_fails() {
        let mut slots = violation_prefix();
        slots.push("1");
        slots.extend(vec!["NODE", "node-1", "3", "many"]);
        slots.extend(violation_suffix());

        let err = decode(&to_args(&slots)).unwrap_err();
        assert!(matches!(err, AlertError::Decode(_)));
    }

    #[test]
    fn test_decode_truncated_vector_fails() {
        let mut slots = violation_prefix();
        slots.push("1");
        slots.extend(vec!["NODE", "node-1"]); // entity block cut short

        let err = decode(&to_args(&slots)).unwrap_err();
        assert!(matches!(err, AlertError::Decode(_)));
    }

    #[test]
    fn test_decode_other_event() {
        // slot 12 non-numeric -> other-event template
        let slots = vec![
            "ECommerce", "42", "Mon Aug 24", "1", "INFO", "", "Custom Event",
            "9", "url", "x", "y", "z", "not-a-count",
        ];

        let event = match decode(&to_args(&slots)).unwrap() {
            MonitoringEvent::Other(e) => e,
            other => panic!("expected other, got {:?}", other),
        };
        assert_eq!(event.event_name, "Custom Event");
        assert_eq!(event.rest.len(), 6);
    }

    #[test]
    fn test_decode_short_other_event() {
        // fewer than 13 slots but a valid other-event prefix
        let slots = vec!["App", "1", "t", "1", "INFO", "", "Deploy Marker"];
        assert!(matches!(
            decode(&to_args(&slots)).unwrap(),
            MonitoringEvent::Other(_)
        ));
    }

    #[test]
    fn test_decode_too_short_fails() {
        let err = decode(&to_args(&["a", "b", "c"])).unwrap_err();
        assert!(matches!(err, AlertError::Decode(_)));
    }

    #[test]
    fn test_is_baseline_unit() {
        assert!(is_baseline_unit(Some("BASELINE_STANDARD_DEVIATION")));
        assert!(is_baseline_unit(Some("baseline_percentage")));
        assert!(!is_baseline_unit(Some("ABSOLUTE")));
        assert!(!is_baseline_unit(None));
    }
}
