use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Merchant signup.
    Merchant,
    /// Create a pending payment.
    Create,
    /// Capture a payment from a card.
    Process,
    Refund,
}

/// One row of an operation script.
///
/// Only the columns an operation needs have to be filled in; trailing
/// columns may be omitted.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Operation {
    pub op: OperationType,
    pub merchant: String,
    pub secret: Option<String>,
    /// Script-local payment label, bound by `create`.
    pub payment: Option<String>,
    pub amount: Option<Decimal>,
    pub card: Option<String>,
    /// `MM/YY`
    pub expiry: Option<String>,
    pub cvv: Option<String>,
    pub holder_id: Option<u32>,
    pub holder: Option<String>,
    pub balance: Option<Decimal>,
}

/// Reads operations from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<Operation>`.
/// It handles whitespace trimming and flexible record lengths automatically.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    /// Creates a new `OperationReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes operations.
    pub fn operations(self) -> impl Iterator<Item = Result<Operation>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
