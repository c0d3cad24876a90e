use super::money::Amount;
use super::state::{State, StateHistory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A merchant's request to be paid a fixed amount, tracked through its lifecycle.
///
/// The amount and owning merchant are fixed at creation. The card reference is
/// attached when a capture is attempted and may change when a rejected capture
/// is retried with another card. The state history only grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    id: Uuid,
    amount: Amount,
    card_number: Option<String>,
    merchant_id: u32,
    states: StateHistory,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(merchant_id: u32, amount: Amount) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            amount,
            card_number: None,
            merchant_id,
            states: StateHistory::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn card_number(&self) -> Option<&str> {
        self.card_number.as_deref()
    }

    pub fn merchant_id(&self) -> u32 {
        self.merchant_id
    }

    pub fn history(&self) -> &StateHistory {
        &self.states
    }

    pub fn status(&self) -> State {
        self.states.current()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(crate) fn attach_card(&mut self, number: &str) {
        self.card_number = Some(number.to_string());
        self.updated_at = Utc::now();
    }

    pub(crate) fn record(&mut self, state: State) {
        self.states.push(state);
        self.updated_at = Utc::now();
    }
}
