//! Opaque game-entity records and state-change application.
//!
//! Entities are deliberately schema-free: the canonical game-entity shape
//! belongs to the surrounding system, and this core only addresses
//! entities by id and mutates free-form scalar attributes. The reference
//! applier here serializes changes in the order the resolution produced
//! them; a concurrent host must keep that single-writer discipline.

use crate::plan::{Operation, StateChange};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A game entity addressed by identifier, with free-form attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub attributes: HashMap<String, Value>,
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Numeric view of an attribute, if it holds a number.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(Value::as_f64)
    }
}

/// Everything the interpreter gets told about the current scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameContext {
    /// Description of where the action takes place.
    pub location: String,
    pub player: Entity,
    /// Nearby entities the action could involve.
    pub entities: Vec<Entity>,
    /// Names of the player's equipped items.
    pub equipment: Vec<String>,
}

impl GameContext {
    /// One-paragraph summary used by the refusal-explanation prompt.
    pub fn summary(&self) -> String {
        let hp = self
            .player
            .number("hp")
            .map(|v| format!("{v} HP"))
            .unwrap_or_else(|| "unknown HP".to_string());
        let nearby: Vec<&str> = self.entities.iter().map(|e| e.name.as_str()).collect();
        format!(
            "Location: {}. Player: {} ({}). Nearby: {}.",
            self.location,
            self.player.name,
            hp,
            if nearby.is_empty() {
                "no one".to_string()
            } else {
                nearby.join(", ")
            }
        )
    }
}

/// Apply state changes, in order, to a set of entities keyed by id.
///
/// `set` replaces the attribute; `add` requires numbers on both sides and
/// otherwise degrades to `set` with a warning. Changes addressed to
/// unknown entities are dropped with a warning.
pub fn apply_state_changes(entities: &mut HashMap<String, Entity>, changes: &[StateChange]) {
    for change in changes {
        let Some(entity) = entities.get_mut(&change.target_id) else {
            tracing::warn!(
                "state change for unknown entity {:?} dropped",
                change.target_id
            );
            continue;
        };
        match change.operation {
            Operation::Set => {
                entity
                    .attributes
                    .insert(change.attribute.clone(), change.value.clone());
            }
            Operation::Add => {
                let current = entity.attributes.get(&change.attribute);
                let new_value = add_values(current, &change.value);
                if new_value.is_none() {
                    tracing::warn!(
                        "non-numeric add to {}.{}; treating as set",
                        change.target_id,
                        change.attribute
                    );
                }
                entity.attributes.insert(
                    change.attribute.clone(),
                    new_value.unwrap_or_else(|| change.value.clone()),
                );
            }
        }
    }
}

/// Numeric sum of an existing attribute and a delta; integer math is
/// preserved when both sides are integers. `None` when either side is
/// missing or non-numeric.
fn add_values(current: Option<&Value>, delta: &Value) -> Option<Value> {
    let current = current?;
    if let (Some(a), Some(b)) = (current.as_i64(), delta.as_i64()) {
        return Some(Value::from(a + b));
    }
    match (current.as_f64(), delta.as_f64()) {
        (Some(a), Some(b)) => Some(Value::from(a + b)),
        _ => None,
    }
}
