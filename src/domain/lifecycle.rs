//! Payment state machine.
//!
//! Legal transitions are `Pending -> Succeeded | Rejected` on capture and
//! `Succeeded -> Refunded` on refund. Checks look at the whole history rather
//! than only the last entry, so a payment that was ever refunded can never be
//! captured or refunded again, whatever gets appended after it.

use super::state::{State, StateHistory};
use crate::error::{PaymentError, Result};

/// Ledger operation requested against a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Capture,
    Refund,
}

/// A payment can be captured until it has succeeded (or been refunded).
/// A rejected payment stays capturable so it can be retried with another card.
pub fn can_capture(history: &StateHistory) -> bool {
    !history.contains(State::Succeeded) && !history.contains(State::Refunded)
}

pub fn can_refund(history: &StateHistory) -> bool {
    history.contains(State::Succeeded) && !history.contains(State::Refunded)
}

pub fn is_allowed(history: &StateHistory, operation: Operation) -> bool {
    match operation {
        Operation::Capture => can_capture(history),
        Operation::Refund => can_refund(history),
    }
}

pub fn ensure_allowed(history: &StateHistory, operation: Operation) -> Result<()> {
    if is_allowed(history, operation) {
        Ok(())
    } else {
        Err(PaymentError::InvalidStateTransition {
            current: history.current(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(states: &[State]) -> StateHistory {
        let mut history = StateHistory::new();
        for state in states {
            history.push(*state);
        }
        history
    }

    #[test]
    fn test_pending_is_capturable_not_refundable() {
        let h = history(&[]);
        assert!(can_capture(&h));
        assert!(!can_refund(&h));
    }

    #[test]
    fn test_rejected_can_be_retried() {
        let h = history(&[State::Rejected]);
        assert!(can_capture(&h));
        assert!(!can_refund(&h));

        let h = history(&[State::Rejected, State::Rejected]);
        assert!(can_capture(&h));
    }

    #[test]
    fn test_succeeded_blocks_capture_allows_refund() {
        let h = history(&[State::Rejected, State::Succeeded]);
        assert!(!can_capture(&h));
        assert!(can_refund(&h));
    }

    #[test]
    fn test_refunded_is_final() {
        let h = history(&[State::Succeeded, State::Refunded]);
        assert!(!can_capture(&h));
        assert!(!can_refund(&h));
    }

    #[test]
    fn test_checks_whole_history_not_last_entry() {
        // a non-terminal entry appended after Refunded must not reopen the payment
        let h = history(&[State::Succeeded, State::Refunded, State::Pending]);
        assert!(!can_capture(&h));
        assert!(!can_refund(&h));

        let h = history(&[State::Succeeded, State::Pending]);
        assert!(!can_capture(&h));
        assert!(can_refund(&h));
    }

    #[test]
    fn test_ensure_allowed_reports_current_state() {
        let h = history(&[State::Rejected]);
        let err = ensure_allowed(&h, Operation::Refund).unwrap_err();
        assert!(matches!(
            err,
            PaymentError::InvalidStateTransition {
                current: State::Rejected
            }
        ));

        let h = history(&[State::Succeeded, State::Refunded]);
        assert!(matches!(
            ensure_allowed(&h, Operation::Capture),
            Err(PaymentError::InvalidStateTransition {
                current: State::Refunded
            })
        ));
        assert!(ensure_allowed(&history(&[]), Operation::Capture).is_ok());
    }
}
