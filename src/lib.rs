//! LLM-mediated tabletop RPG action interpretation and dice resolution.
//!
//! This crate turns an untrusted, unstructured model response into a
//! validated [`ActionPlan`] and deterministically resolves it into a
//! [`Resolution`]: an ordered trace of dice rolls plus the state changes
//! to apply to game entities.
//!
//! The pipeline: raw model text → JSON extraction → per-field
//! normalization → typed plan → seeded dice resolution. Malformed
//! individual fields are absorbed via defaults; only a malformed overall
//! structure surfaces an error.
//!
//! # Quick start
//!
//! ```
//! use dungeon_core::{builder, ActionType, Dice};
//!
//! let raw = r#"The goblin is in range!
//! {"action_type": "attack", "actor_id": "player", "target_ids": ["goblin_1"],
//!  "required_rolls": [{"made_by": "player", "type": "attack", "dice": "1d20+5",
//!                      "threshold": 13,
//!                      "outcomes": {"SUCCESS": [{"target_id": "goblin_1",
//!                                                "attribute": "hp",
//!                                                "operation": "add",
//!                                                "value": -8}]}}],
//!  "conditional_rolls": {}, "potential_reactions": [], "narrative_context": "swing"}"#;
//!
//! let plan = builder::build(raw)?;
//! assert_eq!(plan.action_type, ActionType::Attack);
//!
//! let resolution = plan.resolve(&mut Dice::from_seed(7))?;
//! assert_eq!(resolution.rolls.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod dice;
pub mod extract;
pub mod normalize;
pub mod oracle;
pub mod plan;
pub mod resolve;
pub mod testing;
pub mod world;

// Primary public API
pub use builder::{build, BuildError};
pub use dice::{Dice, DiceError, DiceFormula, DieType};
pub use extract::{extract_json, ExtractError};
pub use oracle::{
    GameMaster, GenerateRequest, GmConfig, Interpretation, InterpretError, Oracle, OracleError,
};
pub use plan::{
    ActionPlan, ActionType, Operation, Outcomes, RollSpec, RollType, StateChange,
};
pub use resolve::{Advantage, Resolution, RollResult};
pub use testing::MockOracle;
pub use world::{apply_state_changes, Entity, GameContext};
