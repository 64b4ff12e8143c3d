//! Deterministic resolution of an action plan into an ordered roll trace
//! and a flattened list of state changes.
//!
//! Required rolls are evaluated in declared order, depth-first: a roll
//! that succeeds fires its conditional rolls immediately, before the next
//! required roll. The flattened state-change order follows the trace, so
//! later changes may depend on entity state mutated by earlier ones.

use crate::dice::{Dice, DiceError, DiceFormula};
use crate::plan::{ActionPlan, RollSpec, StateChange};
use serde::{Deserialize, Serialize};

/// Advantage state actually applied to a roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Advantage {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

/// One resolved roll: the spec it answers, the total, and the state
/// changes its outcome triggered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollResult {
    pub spec: RollSpec,
    pub total: i32,
    pub advantage: Advantage,
    pub success: bool,
    pub state_changes: Vec<StateChange>,
}

impl RollResult {
    /// Mechanical one-line summary, e.g. `[SUCCESS] attack_roll 1d20+5 = 18 vs DC 13`.
    pub fn summary(&self) -> String {
        format!(
            "[{}] {} {} = {} vs DC {}",
            if self.success { "SUCCESS" } else { "FAILURE" },
            self.spec.roll_type,
            self.spec.dice,
            self.total,
            self.spec.threshold
        )
    }
}

/// Ordered trace of resolved rolls plus the flattened state changes to
/// hand to the state-application collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Resolution {
    pub rolls: Vec<RollResult>,
    pub state_changes: Vec<StateChange>,
}

impl ActionPlan {
    /// Resolve this plan against a dice source.
    ///
    /// The builder already defaults malformed formulas, so a
    /// [`DiceError`] here means a hand-built plan broke that invariant;
    /// it is surfaced, never swallowed, and no partial trace is returned.
    pub fn resolve(&self, dice: &mut Dice) -> Result<Resolution, DiceError> {
        resolve(self, dice)
    }
}

/// Resolve a plan against a dice source. See [`ActionPlan::resolve`].
pub fn resolve(plan: &ActionPlan, dice: &mut Dice) -> Result<Resolution, DiceError> {
    let mut resolution = Resolution::default();
    for (index, spec) in plan.required_rolls.iter().enumerate() {
        let success = resolve_roll(spec, dice, &mut resolution)?;
        if success {
            if let Some(children) = plan.conditional_rolls.get(&index) {
                for child in children {
                    resolve_roll(child, dice, &mut resolution)?;
                }
            }
        }
    }
    Ok(resolution)
}

fn resolve_roll(
    spec: &RollSpec,
    dice: &mut Dice,
    resolution: &mut Resolution,
) -> Result<bool, DiceError> {
    let formula = DiceFormula::parse(&spec.dice)?;

    // When the interpreter set both flags, advantage wins; the inputs come
    // from an unreliable source and a deterministic precedence beats
    // cancellation.
    let (total, advantage) = if spec.advantage {
        let first = dice.evaluate(&formula);
        let second = dice.evaluate(&formula);
        (first.max(second), Advantage::Advantage)
    } else if spec.disadvantage {
        let first = dice.evaluate(&formula);
        let second = dice.evaluate(&formula);
        (first.min(second), Advantage::Disadvantage)
    } else {
        (dice.evaluate(&formula), Advantage::Normal)
    };

    let success = total >= spec.threshold;
    let state_changes = spec.outcomes.branch(success).to_vec();
    resolution.state_changes.extend(state_changes.iter().cloned());
    resolution.rolls.push(RollResult {
        spec: spec.clone(),
        total,
        advantage,
        success,
        state_changes,
    });
    Ok(success)
}
