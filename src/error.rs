use crate::domain::state::State;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, PaymentError>;

/// Kind of record a lookup or ledger reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Payment,
    Card,
    Merchant,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Entity::Payment => "payment",
            Entity::Card => "card",
            Entity::Merchant => "merchant",
        })
    }
}

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: String },
    #[error("Invalid payment state for processing ({current})")]
    InvalidStateTransition { current: State },
    #[error(
        "Refund of {amount} for payment {payment} cannot be processed: merchant {merchant} holds {balance}"
    )]
    RefundProcessingError {
        payment: Uuid,
        merchant: u32,
        amount: Decimal,
        balance: Decimal,
    },
    #[error("Merchant {caller} does not own payment {payment}")]
    AuthorizationMismatch { payment: Uuid, caller: u32 },
    #[error("Invalid merchant credentials")]
    InvalidCredentials,
    #[error("{entity} {id} referenced by payment {payment} is missing from the ledger")]
    LedgerEntityMissing {
        entity: Entity,
        id: String,
        payment: Uuid,
    },
    #[error("Payment {payment} was modified concurrently")]
    StaleSnapshot { payment: Uuid },
    #[error("Persistence error: {0}")]
    PersistenceError(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PaymentError {
    pub fn not_found(entity: Entity, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::PersistenceError(message.into().into())
    }

    /// Infrastructure and referential-integrity failures. Callers may retry
    /// these; everything else needs corrected input or is a final answer.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PersistenceError(_) | Self::LedgerEntityMissing { .. } | Self::StaleSnapshot { .. }
        )
    }
}

impl From<serde_json::Error> for PaymentError {
    fn from(err: serde_json::Error) -> Self {
        Self::PersistenceError(Box::new(err))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PaymentError {
    fn from(err: rocksdb::Error) -> Self {
        Self::PersistenceError(Box::new(err))
    }
}
