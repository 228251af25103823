//! Server-authoritative packet validation (spec §4.2): movement plausibility,
//! action-budget rate limiting, and the anti-cheat flag/escalation ledger
//! that consumes both.

pub mod action;
pub mod anticheat;
pub mod movement;

pub use action::ActionBudget;
pub use anticheat::{EnforcementTier, FlagHistory, Severity, TimingAnalyzer};
pub use movement::MovementValidator;

use crate::ids::CharacterId;
use rustc_hash::FxHashMap;

/// Per-character validation state, keyed by character so each character's
/// checks run against its own history without locking a shared map entry
/// per packet — consistent with the single-writer-per-character discipline
/// in the concurrency model.
#[derive(Debug)]
pub struct ValidationState {
    pub movement: MovementValidator,
    pub actions: ActionBudget,
    pub flags: FlagHistory,
    pub timing: TimingAnalyzer,
}

impl ValidationState {
    pub fn new(position_history_samples: usize) -> Self {
        Self {
            movement: MovementValidator::new(position_history_samples),
            actions: ActionBudget::new(),
            flags: FlagHistory::new(),
            timing: TimingAnalyzer::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ValidationRegistry {
    states: FxHashMap<CharacterId, ValidationState>,
}

impl ValidationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&mut self, character: CharacterId, position_history_samples: usize) -> &mut ValidationState {
        self.states
            .entry(character)
            .or_insert_with(|| ValidationState::new(position_history_samples))
    }

    pub fn remove(&mut self, character: CharacterId) {
        self.states.remove(&character);
    }
}
