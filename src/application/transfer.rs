//! The simulated bank: the only code that moves money between cards and merchants.

use crate::domain::card::Card;
use crate::domain::lifecycle::Operation;
use crate::domain::locks::LockKey;
use crate::domain::merchant::Merchant;
use crate::domain::money::Balance;
use crate::domain::payment::Payment;
use crate::domain::ports::{LedgerCommit, Stores};
use crate::domain::state::State;
use crate::error::{Entity, PaymentError, Result};
use tracing::{info, warn};

/// Balances a transfer would leave behind, or why it cannot happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Accepted {
        card_balance: Balance,
        merchant_balance: Balance,
    },
    /// Capture against a card that cannot cover the amount.
    InsufficientCardFunds,
    /// Refund the merchant cannot cover.
    InsufficientMerchantFunds,
}

/// Computes the outcome of moving `amount` for `operation` without touching anything.
///
/// Accepted settlements always move exactly `amount` from one side to the other.
pub fn settle(operation: Operation, amount: Balance, card: Balance, merchant: Balance) -> Settlement {
    match operation {
        Operation::Capture => {
            let card_balance = card - amount;
            if card_balance.is_negative() {
                Settlement::InsufficientCardFunds
            } else {
                Settlement::Accepted {
                    card_balance,
                    merchant_balance: merchant + amount,
                }
            }
        }
        Operation::Refund => {
            let merchant_balance = merchant - amount;
            if merchant_balance.is_negative() {
                Settlement::InsufficientMerchantFunds
            } else {
                Settlement::Accepted {
                    card_balance: card + amount,
                    merchant_balance,
                }
            }
        }
    }
}

/// Applies captures and refunds to the ledger.
///
/// Callers are expected to hold the payment's lock and to have checked the
/// transition with [`crate::domain::lifecycle`]; the engine takes the card and
/// merchant locks from [`Stores::locks`] itself.
#[derive(Clone)]
pub struct TransferEngine {
    stores: Stores,
}

impl TransferEngine {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Moves the payment's amount and records the outcome, returning the
    /// canonical payment as persisted.
    ///
    /// A capture the card cannot cover is not an error: the payment is marked
    /// `Rejected` and balances stay untouched. A refund the merchant cannot
    /// cover fails with `RefundProcessingError` and persists nothing.
    pub async fn apply(&self, mut payment: Payment, operation: Operation) -> Result<Payment> {
        let card_number = payment
            .card_number()
            .ok_or_else(|| PaymentError::LedgerEntityMissing {
                entity: Entity::Card,
                id: "<none>".to_string(),
                payment: payment.id(),
            })?
            .to_string();

        let locks = &self.stores.locks;
        let _card_guard = locks.acquire(LockKey::Card(card_number.clone())).await;
        let _merchant_guard = locks
            .acquire(LockKey::Merchant(payment.merchant_id()))
            .await;

        let (mut card, mut merchant) = self.load_ledger(&payment, &card_number).await?;
        let amount: Balance = payment.amount().into();

        match settle(operation, amount, card.balance, merchant.balance) {
            Settlement::Accepted {
                card_balance,
                merchant_balance,
            } => {
                let card_before = card.balance;
                let merchant_before = merchant.balance;
                card.balance = card_balance;
                merchant.balance = merchant_balance;
                payment.record(match operation {
                    Operation::Capture => State::Succeeded,
                    Operation::Refund => State::Refunded,
                });
                let committed = self
                    .stores
                    .ledger
                    .commit_transfer(LedgerCommit {
                        card,
                        merchant,
                        payment,
                        card_before,
                        merchant_before,
                    })
                    .await?;
                info!(
                    payment = %committed.id(),
                    card = %card_number,
                    merchant = committed.merchant_id(),
                    amount = %amount,
                    state = %committed.status(),
                    "ledger transfer committed"
                );
                Ok(committed)
            }
            Settlement::InsufficientCardFunds => {
                warn!(
                    payment = %payment.id(),
                    card = %card_number,
                    balance = %card.balance,
                    amount = %amount,
                    "capture rejected: insufficient card funds"
                );
                payment.record(State::Rejected);
                self.stores.payments.save(payment).await
            }
            Settlement::InsufficientMerchantFunds => {
                warn!(
                    payment = %payment.id(),
                    merchant = merchant.id,
                    balance = %merchant.balance,
                    amount = %amount,
                    "refund refused: merchant balance cannot cover it"
                );
                Err(PaymentError::RefundProcessingError {
                    payment: payment.id(),
                    merchant: merchant.id,
                    amount: amount.value(),
                    balance: merchant.balance.value(),
                })
            }
        }
    }

    async fn load_ledger(&self, payment: &Payment, card_number: &str) -> Result<(Card, Merchant)> {
        let card = self
            .stores
            .cards
            .get_by_number(card_number)
            .await?
            .ok_or_else(|| PaymentError::LedgerEntityMissing {
                entity: Entity::Card,
                id: card_number.to_string(),
                payment: payment.id(),
            })?;
        let merchant = self
            .stores
            .merchants
            .get(payment.merchant_id())
            .await?
            .ok_or_else(|| PaymentError::LedgerEntityMissing {
                entity: Entity::Merchant,
                id: payment.merchant_id().to_string(),
                payment: payment.id(),
            })?;
        Ok((card, merchant))
    }
}
