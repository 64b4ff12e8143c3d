//! Tolerant mapping of model-emitted labels onto closed vocabularies.
//!
//! The interpreter cannot be made to emit a closed vocabulary reliably, so
//! matching is case-insensitive and whitespace-trimmed, checks both the
//! canonical wire value and the variant name, and then falls through a
//! per-domain alias table. Normalization itself never fails: an unresolved
//! label comes back as `None` and the caller falls back to the domain's
//! default member instead of rejecting the whole plan.

use crate::plan::{ActionType, Operation, RollType};

/// A closed vocabulary the interpreter's loose strings are matched against.
pub trait Canonical: Sized + Copy + 'static {
    /// Every member of the vocabulary.
    const VARIANTS: &'static [Self];

    /// Per-domain aliases, lower-case, mapping drifted labels to members.
    const ALIASES: &'static [(&'static str, Self)];

    /// Canonical wire value, e.g. `"attack_roll"`.
    fn value(&self) -> &'static str;

    /// Display name as the prompt spells it, e.g. `"ATTACK_ROLL"`.
    fn display_name(&self) -> &'static str;
}

/// Map a loose label onto a vocabulary member, or `None` if nothing matched.
pub fn normalize<T: Canonical>(raw: &str) -> Option<T> {
    let needle = raw.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    for member in T::VARIANTS {
        if member.value() == needle || member.display_name().to_lowercase() == needle {
            return Some(*member);
        }
    }
    T::ALIASES
        .iter()
        .find(|(alias, _)| *alias == needle)
        .map(|(_, member)| *member)
}

impl Canonical for ActionType {
    const VARIANTS: &'static [Self] = &[
        ActionType::Attack,
        ActionType::Cast,
        ActionType::Skill,
        ActionType::Interact,
        ActionType::Move,
        ActionType::Dialogue,
        ActionType::Free,
        ActionType::Other,
    ];

    const ALIASES: &'static [(&'static str, Self)] = &[
        ("spell", ActionType::Cast),
        ("cast_spell", ActionType::Cast),
        ("skill_check", ActionType::Skill),
        ("check", ActionType::Skill),
        ("interaction", ActionType::Interact),
        ("use", ActionType::Interact),
        ("movement", ActionType::Move),
        ("talk", ActionType::Dialogue),
        ("speak", ActionType::Dialogue),
        ("conversation", ActionType::Dialogue),
        ("freeform", ActionType::Free),
        ("free_action", ActionType::Free),
    ];

    fn value(&self) -> &'static str {
        match self {
            ActionType::Attack => "attack",
            ActionType::Cast => "cast",
            ActionType::Skill => "skill",
            ActionType::Interact => "interact",
            ActionType::Move => "move",
            ActionType::Dialogue => "dialogue",
            ActionType::Free => "free",
            ActionType::Other => "other",
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            ActionType::Attack => "ATTACK",
            ActionType::Cast => "CAST",
            ActionType::Skill => "SKILL",
            ActionType::Interact => "INTERACT",
            ActionType::Move => "MOVE",
            ActionType::Dialogue => "DIALOGUE",
            ActionType::Free => "FREE",
            ActionType::Other => "OTHER",
        }
    }
}

impl Canonical for RollType {
    const VARIANTS: &'static [Self] = &[
        RollType::AttackRoll,
        RollType::DamageRoll,
        RollType::SaveRoll,
        RollType::CheckRoll,
    ];

    const ALIASES: &'static [(&'static str, Self)] = &[
        ("attack", RollType::AttackRoll),
        ("damage", RollType::DamageRoll),
        ("save", RollType::SaveRoll),
        ("saving", RollType::SaveRoll),
        ("saving_throw", RollType::SaveRoll),
        ("check", RollType::CheckRoll),
        ("ability_check", RollType::CheckRoll),
        ("skill_check", RollType::CheckRoll),
    ];

    fn value(&self) -> &'static str {
        match self {
            RollType::AttackRoll => "attack_roll",
            RollType::DamageRoll => "damage_roll",
            RollType::SaveRoll => "save_roll",
            RollType::CheckRoll => "check_roll",
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            RollType::AttackRoll => "ATTACK_ROLL",
            RollType::DamageRoll => "DAMAGE_ROLL",
            RollType::SaveRoll => "SAVE_ROLL",
            RollType::CheckRoll => "CHECK_ROLL",
        }
    }
}

impl Canonical for Operation {
    const VARIANTS: &'static [Self] = &[Operation::Set, Operation::Add];

    const ALIASES: &'static [(&'static str, Self)] = &[
        ("assign", Operation::Set),
        ("increment", Operation::Add),
        ("increase", Operation::Add),
    ];

    fn value(&self) -> &'static str {
        match self {
            Operation::Set => "set",
            Operation::Add => "add",
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            Operation::Set => "SET",
            Operation::Add => "ADD",
        }
    }
}
