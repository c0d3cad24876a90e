use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a payment.
///
/// Persisted by its stable numeric id, displayed by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum State {
    Pending,
    Succeeded,
    Rejected,
    Refunded,
}

impl State {
    pub fn id(&self) -> u8 {
        match self {
            State::Pending => 1,
            State::Succeeded => 2,
            State::Rejected => 3,
            State::Refunded => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            State::Pending => "Pending",
            State::Succeeded => "Succeeded",
            State::Rejected => "Rejected",
            State::Refunded => "Refunded",
        }
    }
}

impl TryFrom<u8> for State {
    type Error = PaymentError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(State::Pending),
            2 => Ok(State::Succeeded),
            3 => Ok(State::Rejected),
            4 => Ok(State::Refunded),
            other => Err(PaymentError::ValidationError(format!(
                "Unknown payment state id {other}"
            ))),
        }
    }
}

impl From<State> for u8 {
    fn from(state: State) -> Self {
        state.id()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered, append-only record of every status a payment has passed through.
///
/// Always starts with `Pending`; the last entry is the current status.
/// Only the owning `Payment` can append to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<State>", into = "Vec<State>")]
pub struct StateHistory(Vec<State>);

impl StateHistory {
    pub(crate) fn new() -> Self {
        Self(vec![State::Pending])
    }

    pub(crate) fn push(&mut self, state: State) {
        self.0.push(state);
    }

    pub fn current(&self) -> State {
        // never empty: construction and deserialization both guarantee a Pending head
        self.0.last().copied().unwrap_or(State::Pending)
    }

    pub fn contains(&self, state: State) -> bool {
        self.0.contains(&state)
    }

    pub fn count(&self, state: State) -> usize {
        self.0.iter().filter(|s| **s == state).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = State> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[State] {
        &self.0
    }

    /// True when `self` is `earlier` with zero or more entries appended.
    pub fn extends(&self, earlier: &StateHistory) -> bool {
        self.0.starts_with(&earlier.0)
    }
}

impl TryFrom<Vec<State>> for StateHistory {
    type Error = PaymentError;

    fn try_from(states: Vec<State>) -> Result<Self, Self::Error> {
        match states.first() {
            Some(State::Pending) => Ok(Self(states)),
            _ => Err(PaymentError::ValidationError(
                "State history must start with Pending".to_string(),
            )),
        }
    }
}

impl From<StateHistory> for Vec<State> {
    fn from(history: StateHistory) -> Self {
        history.0
    }
}

impl fmt::Display for StateHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(State::name).collect();
        f.write_str(&names.join(">"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_ids_are_stable() {
        for (state, id) in [
            (State::Pending, 1),
            (State::Succeeded, 2),
            (State::Rejected, 3),
            (State::Refunded, 4),
        ] {
            assert_eq!(state.id(), id);
            assert_eq!(State::try_from(id).unwrap(), state);
        }
        assert!(State::try_from(9).is_err());
    }

    #[test]
    fn test_history_starts_pending() {
        let history = StateHistory::new();
        assert_eq!(history.current(), State::Pending);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_history_serializes_numeric_ids() {
        let mut history = StateHistory::new();
        history.push(State::Succeeded);
        history.push(State::Refunded);
        assert_eq!(serde_json::to_string(&history).unwrap(), "[1,2,4]");
        assert_eq!(history.to_string(), "Pending>Succeeded>Refunded");
    }

    #[test]
    fn test_history_deserialization_requires_pending_head() {
        assert!(serde_json::from_str::<StateHistory>("[1,3]").is_ok());
        assert!(serde_json::from_str::<StateHistory>("[2]").is_err());
        assert!(serde_json::from_str::<StateHistory>("[]").is_err());
    }

    #[test]
    fn test_extends() {
        let base = StateHistory::new();
        let mut longer = base.clone();
        longer.push(State::Rejected);
        assert!(longer.extends(&base));
        assert!(!base.extends(&longer));

        let mut diverged = StateHistory::new();
        diverged.push(State::Succeeded);
        assert!(!diverged.extends(&longer));
    }
}
