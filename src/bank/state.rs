//! Participant Leg States
//!
//! ```text
//! Idle → Prepared → Committed
//!           ↓
//!        Released
//! ```
//!
//! `Idle` is implicit: a leg with no entry has never been prepared.

use std::fmt;

/// State of one transaction leg (`tx_id` + kind) at this participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegState {
    /// Account locked, funds validated, nothing mutated yet
    Prepared,

    /// Terminal: balance mutated and lock released
    Committed,

    /// Terminal: lock cleared without mutation (counterpart leg failed)
    Released,
}

impl LegState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, LegState::Committed | LegState::Released)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: LegState) -> bool {
        matches!(
            (self, next),
            (LegState::Prepared, LegState::Committed) | (LegState::Prepared, LegState::Released)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LegState::Prepared => "PREPARED",
            LegState::Committed => "COMMITTED",
            LegState::Released => "RELEASED",
        }
    }
}

impl fmt::Display for LegState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(LegState::Committed.is_terminal());
        assert!(LegState::Released.is_terminal());
        assert!(!LegState::Prepared.is_terminal());
    }

    #[test]
    fn test_transitions() {
        assert!(LegState::Prepared.can_transition_to(LegState::Committed));
        assert!(LegState::Prepared.can_transition_to(LegState::Released));
        assert!(!LegState::Committed.can_transition_to(LegState::Released));
        assert!(!LegState::Released.can_transition_to(LegState::Committed));
        assert!(!LegState::Prepared.can_transition_to(LegState::Prepared));
    }
}
