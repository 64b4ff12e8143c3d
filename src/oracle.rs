//! The model-call seam and the game-master prompts built over it.
//!
//! The core never talks to a model directly; it hands a
//! [`GenerateRequest`] to whatever implements [`Oracle`] and gets raw text
//! back. Retries, timeouts, and transport belong to that implementation.

use crate::builder::{self, BuildError};
use crate::extract::extract_json;
use crate::plan::ActionPlan;
use crate::resolve::RollResult;
use crate::world::{Entity, GameContext};
use thiserror::Error;

/// Error from the external model call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("oracle call failed: {0}")]
pub struct OracleError(pub String);

/// A single generation request handed to the model client.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    /// Model override; `None` means the client's default.
    pub model: Option<String>,
    pub max_tokens: usize,
    pub temperature: f32,
}

/// The external language-model seam.
pub trait Oracle {
    fn generate(&mut self, request: &GenerateRequest) -> Result<String, OracleError>;
}

/// Configuration for the game master, passed in explicitly; there is no
/// global settings object.
#[derive(Debug, Clone, PartialEq)]
pub struct GmConfig {
    /// Model override for interpretation calls.
    pub model: Option<String>,
    pub max_tokens: usize,
    pub temperature: f32,
    /// Replacement for the built-in interpretation system prompt.
    pub custom_system_prompt: Option<String>,
}

impl Default for GmConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 4096,
            temperature: 0.7,
            custom_system_prompt: None,
        }
    }
}

/// Outcome of interpreting a player intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    /// The model produced a usable plan.
    Plan(ActionPlan),
    /// The model declared the action impossible, with its reason.
    Invalid { reason: String },
}

/// Errors from an interpretation round trip.
#[derive(Debug, Error)]
pub enum InterpretError {
    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("build error: {0}")]
    Build(#[from] BuildError),
}

const INTERPRET_SYSTEM_PROMPT: &str = "You are the Dungeon Master. You interpret player \
intents into structured action plans and never refuse to answer in character.";

/// Interprets player intents into action plans through an [`Oracle`].
pub struct GameMaster<O: Oracle> {
    oracle: O,
    config: GmConfig,
}

impl<O: Oracle> GameMaster<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            config: GmConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GmConfig) -> Self {
        self.config = config;
        self
    }

    /// Ask the model to interpret a player's intent into an action plan.
    ///
    /// A `valid: false` verdict in the payload short-circuits to
    /// [`Interpretation::Invalid`] before any plan assembly.
    pub fn interpret_action(
        &mut self,
        intent: &str,
        context: &GameContext,
    ) -> Result<Interpretation, InterpretError> {
        let prompt = interpretation_prompt(intent, context);
        let raw = self.oracle.generate(&self.request(prompt))?;
        let value = extract_json(&raw).map_err(BuildError::from)?;

        if let Some(reason) = builder::declared_invalid(&value) {
            tracing::warn!("model declared intent invalid: {}", reason);
            return Ok(Interpretation::Invalid { reason });
        }

        Ok(Interpretation::Plan(builder::build_from_value(&value)?))
    }

    /// Ask the model to explain, in character, why an action can't be done.
    pub fn explain_invalid_action(
        &mut self,
        intent: &str,
        context: &GameContext,
    ) -> Result<String, OracleError> {
        let prompt = format!(
            "The player tried to: \"{intent}\"\n\
             But this isn't possible because of the current situation:\n{}\n\n\
             Respond in-character as a Dungeon Master explaining why they can't do this.\n\
             Be helpful and suggest alternatives if appropriate.\n\
             Keep it brief (2-3 sentences).",
            context.summary()
        );
        self.oracle.generate(&self.request(prompt))
    }

    /// Ask the model what an entity does in reaction to the player's action.
    /// The reply is a plain intent sentence fed back through
    /// [`GameMaster::interpret_action`].
    pub fn describe_reaction(
        &mut self,
        entity: &Entity,
        triggering_intent: &str,
        last_roll: Option<&RollResult>,
    ) -> Result<String, OracleError> {
        let outcome = match last_roll {
            Some(result) if result.success => "Success",
            Some(_) => "Failure",
            None => "No roll was made",
        };
        let prompt = format!(
            "An entity is reacting to the player's action.\n\n\
             ENTITY: {}\n\
             PLAYER'S ACTION: {triggering_intent}\n\
             OUTCOME: {outcome}\n\n\
             What does {} do in response? Describe their reaction as a simple action intent.\n\
             Example: \"The goblin snarls and swings its rusty scimitar at the player\"\n\n\
             Respond with just the action description, nothing else.",
            entity.name, entity.name
        );
        self.oracle.generate(&self.request(prompt))
    }

    fn request(&self, prompt: String) -> GenerateRequest {
        GenerateRequest {
            prompt,
            system_prompt: Some(
                self.config
                    .custom_system_prompt
                    .clone()
                    .unwrap_or_else(|| INTERPRET_SYSTEM_PROMPT.to_string()),
            ),
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }
}

/// The interpretation prompt: scene context, the player's intent, and the
/// JSON reply shape the builder expects.
pub fn interpretation_prompt(intent: &str, context: &GameContext) -> String {
    let nearby: Vec<&str> = context.entities.iter().map(|e| e.name.as_str()).collect();
    let hp = context
        .player
        .number("hp")
        .map(|v| v.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!(
        r#"You are the Dungeon Master. Interpret the player's intended action
and determine what dice rolls are required to resolve it.

CURRENT SITUATION:
- Location: {location}
- Player: {player}, {hp} HP
- Nearby entities: {nearby:?}
- Player's equipment: {equipment:?}

PLAYER'S ACTION: "{intent}"

Determine:
1. What type of action is this? (ATTACK, CAST, SKILL, INTERACT, MOVE, DIALOGUE, FREE)
2. Who/what is the target?
3. What rolls are needed? For each roll, specify:
   - Roll type (ATTACK_ROLL, DAMAGE_ROLL, SAVE_ROLL, CHECK_ROLL)
   - Dice formula (e.g., "1d20+5")
   - Target DC or AC as "threshold"
   - Any advantage/disadvantage
   - State changes under "outcomes" for SUCCESS and FAILURE
4. Are there conditional rolls? (e.g., "if attack hits, roll damage")
5. What entities might react to this action?

If this action is impossible or doesn't make sense, respond with
"valid": false and explain why in "invalid_reason".

Respond in the following JSON format:
{{
    "valid": true,
    "action_type": "attack",
    "actor_id": "player",
    "target_ids": ["goblin_1"],
    "required_rolls": [
        {{
            "made_by": "player",
            "type": "attack_roll",
            "dice": "1d20+5",
            "threshold": 13,
            "advantage": false,
            "disadvantage": false,
            "outcomes": {{
                "SUCCESS": [
                    {{"target_id": "goblin_1", "attribute": "hp", "operation": "add", "value": -8}}
                ],
                "FAILURE": []
            }},
            "explanation": "Sword attack against Goblin"
        }}
    ],
    "conditional_rolls": {{
        "0": [
            {{"made_by": "player", "type": "damage_roll", "dice": "1d8+3", "threshold": 0,
              "outcomes": {{"SUCCESS": [], "FAILURE": []}}, "explanation": "Longsword damage"}}
        ]
    }},
    "potential_reactions": ["goblin_1"],
    "narrative_context": "Player swings their longsword at the goblin"
}}"#,
        location = context.location,
        player = context.player.name,
        hp = hp,
        nearby = nearby,
        equipment = context.equipment,
        intent = intent,
    )
}
