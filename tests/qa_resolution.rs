//! End-to-end resolution tests: plan in, trace and applied state out.

use dungeon_core::testing::sample_context;
use dungeon_core::{apply_state_changes, builder, Dice, Entity};
use std::collections::HashMap;

const ATTACK_THEN_DAMAGE: &str = r#"```json
{
    "action_type": "attack",
    "actor_id": "player",
    "target_ids": ["goblin_1"],
    "required_rolls": [
        {
            "made_by": "player", "type": "attack", "dice": "1d20+5", "threshold": 13,
            "outcomes": {
                "SUCCESS": [
                    {"target_id": "goblin_1", "attribute": "hp", "operation": "add", "value": -8}
                ],
                "FAILURE": []
            }
        }
    ],
    "conditional_rolls": {
        "0": [
            {
                "made_by": "player", "type": "damage", "dice": "1d6", "threshold": 0,
                "outcomes": {
                    "SUCCESS": [
                        {"target_id": "goblin_1", "attribute": "hp", "operation": "add", "value": -2}
                    ]
                }
            }
        ]
    },
    "potential_reactions": ["goblin_1"],
    "narrative_context": "swing"
}
```"#;

fn scene_entities() -> HashMap<String, Entity> {
    sample_context()
        .entities
        .into_iter()
        .map(|e| (e.id.clone(), e))
        .collect()
}

#[test]
fn hit_or_miss_state_matches_the_replayed_dice() {
    let plan = builder::build(ATTACK_THEN_DAMAGE).unwrap();

    for seed in 0..16 {
        // Replay the seed to learn whether this attack roll hits.
        let hits = Dice::from_seed(seed).evaluate_str("1d20+5").unwrap() >= 13;

        let resolution = plan.resolve(&mut Dice::from_seed(seed)).unwrap();
        let mut entities = scene_entities();
        apply_state_changes(&mut entities, &resolution.state_changes);
        let hp = entities["goblin_1"].number("hp").unwrap();

        if hits {
            // Attack outcome and the conditional damage roll both land.
            assert_eq!(resolution.rolls.len(), 2);
            assert_eq!(hp, 12.0 - 8.0 - 2.0, "seed {seed}");
        } else {
            assert_eq!(resolution.rolls.len(), 1);
            assert_eq!(hp, 12.0, "seed {seed}");
        }
    }
}

#[test]
fn trace_order_is_required_roll_then_its_children() {
    let plan = builder::build(ATTACK_THEN_DAMAGE).unwrap();

    // Seed chosen by replay: any seed that hits exercises the child roll.
    let seed = (0..64)
        .find(|&s| Dice::from_seed(s).evaluate_str("1d20+5").unwrap() >= 13)
        .expect("some seed under 64 must hit AC 13");

    let resolution = plan.resolve(&mut Dice::from_seed(seed)).unwrap();
    assert!(resolution.rolls[0].success);
    assert_eq!(resolution.rolls[0].spec.dice, "1d20+5");
    assert_eq!(resolution.rolls[1].spec.dice, "1d6");

    // Flattened changes preserve evaluation order: attack's -8, then damage's -2.
    let values: Vec<i64> = resolution
        .state_changes
        .iter()
        .map(|c| c.value.as_i64().unwrap())
        .collect();
    assert_eq!(values, vec![-8, -2]);
}

#[test]
fn resolving_the_same_plan_twice_is_idempotent() {
    let plan = builder::build(ATTACK_THEN_DAMAGE).unwrap();
    let first = plan.resolve(&mut Dice::from_seed(1234)).unwrap();
    let second = plan.resolve(&mut Dice::from_seed(1234)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn roll_summaries_describe_the_trace() {
    let plan = builder::build(ATTACK_THEN_DAMAGE).unwrap();
    let resolution = plan.resolve(&mut Dice::from_seed(5)).unwrap();
    let summary = resolution.rolls[0].summary();
    assert!(summary.contains("attack_roll 1d20+5"));
    assert!(summary.contains("vs DC 13"));
}
