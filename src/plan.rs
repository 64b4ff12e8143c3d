//! The validated action-plan data model.
//!
//! An [`ActionPlan`] is built once per player intent, is immutable after
//! construction, and is consumed by the resolution engine to produce one
//! trace of rolls and state changes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Dice formula used when the interpreter's formula is absent or unparsable.
pub const DEFAULT_DICE: &str = "1d20";

/// DC/AC used when the interpreter's threshold is absent or unparsable.
pub const DEFAULT_THRESHOLD: i32 = 10;

/// What kind of action the player is attempting.
///
/// Unrecognized labels normalize to [`ActionType::Other`]; one drifted
/// label never discards an otherwise-usable plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Attack,
    Cast,
    Skill,
    Interact,
    Move,
    Dialogue,
    Free,
    #[default]
    Other,
}

/// What a single die roll is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RollType {
    AttackRoll,
    DamageRoll,
    SaveRoll,
    #[default]
    CheckRoll,
}

/// How a state change is applied to an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    #[default]
    Set,
    Add,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(crate::normalize::Canonical::value(self))
    }
}

impl fmt::Display for RollType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(crate::normalize::Canonical::value(self))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(crate::normalize::Canonical::value(self))
    }
}

/// One atomic mutation to apply to an entity's attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub target_id: String,
    pub attribute: String,
    pub operation: Operation,
    /// Numeric or opaque scalar; carried through as-is.
    pub value: Value,
}

/// Branch outcomes of a roll. Both branches are always present, defaulting
/// to empty, even when the source payload named only one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Outcomes {
    #[serde(rename = "SUCCESS")]
    pub success: Vec<StateChange>,
    #[serde(rename = "FAILURE")]
    pub failure: Vec<StateChange>,
}

impl Outcomes {
    /// The state changes for one branch of the roll.
    pub fn branch(&self, success: bool) -> &[StateChange] {
        if success {
            &self.success
        } else {
            &self.failure
        }
    }
}

/// A single requested dice roll with threshold and branch outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollSpec {
    /// Entity making the roll; empty when the interpreter left it unknown.
    pub made_by: String,
    #[serde(rename = "type")]
    pub roll_type: RollType,
    /// Formula string; the builder guarantees it parses.
    pub dice: String,
    /// DC/AC the total is compared against; total >= threshold succeeds.
    pub threshold: i32,
    pub advantage: bool,
    pub disadvantage: bool,
    pub outcomes: Outcomes,
    pub explanation: String,
}

impl Default for RollSpec {
    fn default() -> Self {
        Self {
            made_by: String::new(),
            roll_type: RollType::default(),
            dice: DEFAULT_DICE.to_string(),
            threshold: DEFAULT_THRESHOLD,
            advantage: false,
            disadvantage: false,
            outcomes: Outcomes::default(),
            explanation: String::new(),
        }
    }
}

/// Validated, structured description of an action and the rolls needed to
/// resolve it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ActionPlan {
    pub action_type: ActionType,
    pub actor_id: String,
    pub target_ids: Vec<String>,
    /// Rolls evaluated in declared order.
    pub required_rolls: Vec<RollSpec>,
    /// Rolls fired only when the required roll at the keyed index succeeds.
    /// The builder guarantees every key is a valid `required_rolls` index.
    pub conditional_rolls: BTreeMap<usize, Vec<RollSpec>>,
    /// Entity ids that might react to this action.
    pub potential_reactions: Vec<String>,
    pub narrative_context: String,
}
