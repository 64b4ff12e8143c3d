//! Assembly of a validated [`ActionPlan`] from a raw model response.
//!
//! The builder composes extraction, per-field normalization, and typed
//! construction. Malformed individual fields are absorbed via defaults and
//! logged; only a malformed overall structure surfaces an error. The three
//! variants of [`BuildError`] are the only errors this module raises.

use crate::dice::DiceFormula;
use crate::extract::{extract_json, ExtractError};
use crate::normalize::normalize;
use crate::plan::{
    ActionPlan, ActionType, Operation, Outcomes, RollSpec, RollType, StateChange, DEFAULT_DICE,
    DEFAULT_THRESHOLD,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors the builder may surface. Everything below these in severity
/// (missing optional fields, unrecognized labels, bad individual dice
/// formulas) is absorbed via defaults, never raised.
#[derive(Debug, Error)]
pub enum BuildError {
    /// No parseable JSON anywhere in the response.
    #[error(transparent)]
    JsonExtraction(#[from] ExtractError),

    /// Structure was found but is not shaped like an action plan.
    #[error("action plan validation failed: {0}")]
    ValidationFailed(String),

    /// Catch-all for unexpected failures during field assembly.
    #[error("failed to parse action plan: {0}")]
    Parse(String),
}

/// Build a validated `ActionPlan` from a raw model response.
pub fn build(raw: &str) -> Result<ActionPlan, BuildError> {
    let value = extract_json(raw)?;
    build_from_value(&value)
}

/// Build from an already-extracted JSON value.
pub fn build_from_value(value: &Value) -> Result<ActionPlan, BuildError> {
    let object = value.as_object().ok_or_else(|| {
        BuildError::ValidationFailed(format!(
            "expected a JSON object, got {}",
            json_type_name(value)
        ))
    })?;

    let required_rolls = parse_roll_list(field(object, "required_rolls"), "required_rolls");
    let conditional_rolls =
        parse_conditional_rolls(field(object, "conditional_rolls"), required_rolls.len());

    Ok(ActionPlan {
        action_type: parse_action_type(field(object, "action_type")),
        actor_id: coerce_string(field(object, "actor_id"), "actor_id"),
        target_ids: coerce_string_list(field(object, "target_ids"), "target_ids"),
        required_rolls,
        conditional_rolls,
        potential_reactions: coerce_string_list(
            field(object, "potential_reactions"),
            "potential_reactions",
        ),
        narrative_context: coerce_string(field(object, "narrative_context"), "narrative_context"),
    })
}

/// The model's own validity verdict: `Some(reason)` when the payload
/// declares the action impossible with `"valid": false`.
pub fn declared_invalid(value: &Value) -> Option<String> {
    match value.get("valid") {
        Some(Value::Bool(false)) => Some(
            value
                .get("invalid_reason")
                .and_then(Value::as_str)
                .unwrap_or("the action is not possible right now")
                .to_string(),
        ),
        _ => None,
    }
}

fn field<'a>(object: &'a Map<String, Value>, name: &str) -> &'a Value {
    object.get(name).unwrap_or(&Value::Null)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse_action_type(value: &Value) -> ActionType {
    let raw = coerce_string(value, "action_type");
    match normalize::<ActionType>(&raw) {
        Some(action_type) => action_type,
        None => {
            if !raw.is_empty() {
                tracing::warn!("unrecognized action_type {:?}; falling back to other", raw);
            }
            ActionType::Other
        }
    }
}

fn parse_roll_list(value: &Value, context: &str) -> Vec<RollSpec> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(object) => Some(parse_roll_spec(object)),
                other => {
                    tracing::warn!(
                        "skipping {} entry: expected an object, got {}",
                        context,
                        json_type_name(other)
                    );
                    None
                }
            })
            .collect(),
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(
                "{} should be an array, got {}; treating as empty",
                context,
                json_type_name(other)
            );
            Vec::new()
        }
    }
}

fn parse_roll_spec(object: &Map<String, Value>) -> RollSpec {
    let roll_type_raw = coerce_string(field(object, "type"), "roll type");
    let roll_type = match normalize::<RollType>(&roll_type_raw) {
        Some(roll_type) => roll_type,
        None => {
            if !roll_type_raw.is_empty() {
                tracing::warn!(
                    "unrecognized roll type {:?}; falling back to check_roll",
                    roll_type_raw
                );
            }
            RollType::default()
        }
    };

    RollSpec {
        made_by: coerce_string(field(object, "made_by"), "made_by"),
        roll_type,
        dice: coerce_dice(field(object, "dice")),
        threshold: coerce_threshold(field(object, "threshold")),
        advantage: coerce_bool(field(object, "advantage"), "advantage"),
        disadvantage: coerce_bool(field(object, "disadvantage"), "disadvantage"),
        outcomes: parse_outcomes(field(object, "outcomes")),
        explanation: coerce_string(field(object, "explanation"), "explanation"),
    }
}

/// A dice formula that fails to parse constructs with the default rather
/// than failing the roll, let alone the plan.
fn coerce_dice(value: &Value) -> String {
    let raw = coerce_string(value, "dice");
    if raw.is_empty() {
        return DEFAULT_DICE.to_string();
    }
    match DiceFormula::parse(&raw) {
        Ok(_) => raw,
        Err(_) => {
            tracing::warn!("unparsable dice formula {:?}; using {}", raw, DEFAULT_DICE);
            DEFAULT_DICE.to_string()
        }
    }
}

fn coerce_threshold(value: &Value) -> i32 {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                v as i32
            } else {
                let v = n.as_f64().unwrap_or(DEFAULT_THRESHOLD as f64) as i32;
                tracing::warn!("non-integer threshold {}; truncating to {}", n, v);
                v
            }
        }
        Value::String(s) => match s.trim().parse::<i32>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    "unparsable threshold {:?}; using {}",
                    s,
                    DEFAULT_THRESHOLD
                );
                DEFAULT_THRESHOLD
            }
        },
        Value::Null => DEFAULT_THRESHOLD,
        other => {
            tracing::warn!(
                "threshold should be a number, got {}; using {}",
                json_type_name(other),
                DEFAULT_THRESHOLD
            );
            DEFAULT_THRESHOLD
        }
    }
}

fn coerce_bool(value: &Value, name: &str) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        other => {
            tracing::warn!(
                "{} should be a boolean, got {}; using false",
                name,
                json_type_name(other)
            );
            false
        }
    }
}

fn coerce_string(value: &Value, name: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => {
            tracing::warn!(
                "{} should be a string, got {}; using empty",
                name,
                json_type_name(other)
            );
            String::new()
        }
    }
}

fn coerce_string_list(value: &Value, name: &str) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(|v| coerce_string(v, name)).collect(),
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(
                "{} should be an array, got {}; treating as empty",
                name,
                json_type_name(other)
            );
            Vec::new()
        }
    }
}

/// Both branch keys are guaranteed present in the result, upper-cased,
/// regardless of how the source spelled or omitted them.
fn parse_outcomes(value: &Value) -> Outcomes {
    let mut outcomes = Outcomes::default();
    match value {
        Value::Object(object) => {
            for (key, changes) in object {
                match key.trim().to_uppercase().as_str() {
                    "SUCCESS" => outcomes.success = parse_state_changes(changes),
                    "FAILURE" => outcomes.failure = parse_state_changes(changes),
                    other => {
                        tracing::warn!("dropping unknown outcomes key {:?}", other);
                    }
                }
            }
        }
        Value::Null => {}
        other => {
            tracing::warn!(
                "outcomes should be an object, got {}; using empty branches",
                json_type_name(other)
            );
        }
    }
    outcomes
}

fn parse_state_changes(value: &Value) -> Vec<StateChange> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(object) => Some(parse_state_change(object)),
                other => {
                    tracing::warn!(
                        "skipping state change: expected an object, got {}",
                        json_type_name(other)
                    );
                    None
                }
            })
            .collect(),
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(
                "state changes should be an array, got {}; treating as empty",
                json_type_name(other)
            );
            Vec::new()
        }
    }
}

fn parse_state_change(object: &Map<String, Value>) -> StateChange {
    let operation_raw = coerce_string(field(object, "operation"), "operation");
    let operation = match normalize::<Operation>(&operation_raw) {
        Some(operation) => operation,
        None => {
            if !operation_raw.is_empty() {
                tracing::warn!(
                    "unrecognized operation {:?}; falling back to set",
                    operation_raw
                );
            }
            Operation::default()
        }
    };

    StateChange {
        target_id: coerce_string(field(object, "target_id"), "target_id"),
        attribute: coerce_string(field(object, "attribute"), "attribute"),
        operation,
        value: field(object, "value").clone(),
    }
}

/// Keys are coerced to integers; non-integer or out-of-range keys are
/// dropped with a warning, never fatal.
fn parse_conditional_rolls(
    value: &Value,
    required_count: usize,
) -> BTreeMap<usize, Vec<RollSpec>> {
    let mut result = BTreeMap::new();
    match value {
        Value::Object(object) => {
            for (key, rolls) in object {
                let Ok(index) = key.trim().parse::<usize>() else {
                    tracing::warn!("invalid conditional roll key {:?}, skipping", key);
                    continue;
                };
                if index >= required_count {
                    tracing::warn!(
                        "conditional roll key {} has no matching required roll, skipping",
                        index
                    );
                    continue;
                }
                let specs = parse_roll_list(rolls, "conditional_rolls");
                if !specs.is_empty() {
                    result.insert(index, specs);
                }
            }
        }
        Value::Null => {}
        other => {
            tracing::warn!(
                "conditional_rolls should be an object, got {}; treating as empty",
                json_type_name(other)
            );
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attack_payload() -> Value {
        json!({
            "action_type": "Attack",
            "actor_id": "player",
            "target_ids": ["goblin_1"],
            "required_rolls": [{
                "made_by": "player",
                "type": "attack",
                "dice": "1d20+5",
                "threshold": 13,
                "outcomes": {
                    "SUCCESS": [{
                        "target_id": "goblin_1",
                        "attribute": "hp",
                        "operation": "add",
                        "value": -8
                    }]
                }
            }],
            "conditional_rolls": {},
            "potential_reactions": [],
            "narrative_context": "swing"
        })
    }

    #[test]
    fn builds_well_formed_payload_field_for_field() {
        let plan = build_from_value(&attack_payload()).unwrap();
        assert_eq!(plan.action_type, ActionType::Attack);
        assert_eq!(plan.actor_id, "player");
        assert_eq!(plan.target_ids, vec!["goblin_1".to_string()]);
        assert_eq!(plan.required_rolls.len(), 1);
        assert_eq!(plan.narrative_context, "swing");

        let roll = &plan.required_rolls[0];
        assert_eq!(roll.roll_type, RollType::AttackRoll);
        assert_eq!(roll.dice, "1d20+5");
        assert_eq!(roll.threshold, 13);
        assert!(!roll.advantage);
        assert_eq!(roll.outcomes.success.len(), 1);
        // FAILURE was absent in the source but is present and empty.
        assert!(roll.outcomes.failure.is_empty());
    }

    #[test]
    fn builds_from_prose_wrapped_code_block() {
        let raw = format!(
            "The attack succeeds!\n```json\n{}\n```",
            attack_payload()
        );
        let plan = build(&raw).unwrap();
        assert_eq!(plan, build_from_value(&attack_payload()).unwrap());
    }

    #[test]
    fn unrecognized_action_type_falls_back_to_other() {
        let plan = build_from_value(&json!({"action_type": "pirouette"})).unwrap();
        assert_eq!(plan.action_type, ActionType::Other);
    }

    #[test]
    fn malformed_dice_defaults_instead_of_failing() {
        let plan = build_from_value(&json!({
            "required_rolls": [{"type": "damage", "dice": "3d6+"}]
        }))
        .unwrap();
        assert_eq!(plan.required_rolls[0].dice, DEFAULT_DICE);
        assert_eq!(plan.required_rolls[0].roll_type, RollType::DamageRoll);
    }

    #[test]
    fn missing_roll_fields_take_defaults() {
        let plan = build_from_value(&json!({"required_rolls": [{}]})).unwrap();
        let roll = &plan.required_rolls[0];
        assert_eq!(roll.roll_type, RollType::CheckRoll);
        assert_eq!(roll.dice, DEFAULT_DICE);
        assert_eq!(roll.threshold, DEFAULT_THRESHOLD);
        assert!(!roll.advantage && !roll.disadvantage);
        assert!(roll.made_by.is_empty());
    }

    #[test]
    fn threshold_accepts_numeric_strings() {
        let plan = build_from_value(&json!({
            "required_rolls": [{"threshold": "15"}]
        }))
        .unwrap();
        assert_eq!(plan.required_rolls[0].threshold, 15);
    }

    #[test]
    fn non_integer_conditional_keys_are_dropped() {
        let plan = build_from_value(&json!({
            "required_rolls": [{}],
            "conditional_rolls": {
                "abc": [{"type": "damage"}],
                "0": [{"type": "damage", "dice": "1d8+3"}]
            }
        }))
        .unwrap();
        assert_eq!(plan.conditional_rolls.len(), 1);
        assert_eq!(plan.conditional_rolls[&0][0].dice, "1d8+3");
    }

    #[test]
    fn out_of_range_conditional_keys_are_dropped() {
        let plan = build_from_value(&json!({
            "required_rolls": [{}],
            "conditional_rolls": {"3": [{"type": "damage"}]}
        }))
        .unwrap();
        assert!(plan.conditional_rolls.is_empty());
    }

    #[test]
    fn outcome_keys_match_case_insensitively() {
        let plan = build_from_value(&json!({
            "required_rolls": [{
                "outcomes": {
                    "success": [{"target_id": "t", "attribute": "hp", "value": 1}],
                    "Failure": [{"target_id": "t", "attribute": "hp", "value": 2}]
                }
            }]
        }))
        .unwrap();
        let outcomes = &plan.required_rolls[0].outcomes;
        assert_eq!(outcomes.success.len(), 1);
        assert_eq!(outcomes.failure.len(), 1);
    }

    #[test]
    fn unknown_operation_defaults_to_set() {
        let plan = build_from_value(&json!({
            "required_rolls": [{
                "outcomes": {
                    "SUCCESS": [{"target_id": "t", "attribute": "hp", "operation": "multiply", "value": 2}]
                }
            }]
        }))
        .unwrap();
        assert_eq!(
            plan.required_rolls[0].outcomes.success[0].operation,
            Operation::Set
        );
    }

    #[test]
    fn non_object_payload_is_validation_failure() {
        let err = build("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, BuildError::ValidationFailed(_)));
    }

    #[test]
    fn unparseable_response_is_extraction_failure() {
        let err = build("I cannot answer that, brave adventurer.").unwrap_err();
        assert!(matches!(err, BuildError::JsonExtraction(_)));
    }

    #[test]
    fn declared_invalid_reads_the_valid_gate() {
        let value = json!({"valid": false, "invalid_reason": "the door is sealed"});
        assert_eq!(declared_invalid(&value).as_deref(), Some("the door is sealed"));

        assert!(declared_invalid(&json!({"valid": true})).is_none());
        assert!(declared_invalid(&json!({})).is_none());
    }
}
