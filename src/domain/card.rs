use super::money::Balance;
use crate::error::PaymentError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Card expiry as printed on the card: month 1..=12, two-digit year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expiry {
    pub month: u8,
    pub year: u8,
}

impl Expiry {
    pub fn new(month: u8, year: u8) -> Result<Self, PaymentError> {
        if !(1..=12).contains(&month) {
            return Err(PaymentError::ValidationError(format!(
                "Expiry month {month} is out of range"
            )));
        }
        if year > 99 {
            return Err(PaymentError::ValidationError(format!(
                "Expiry year {year} is out of range"
            )));
        }
        Ok(Self { month, year })
    }
}

impl std::str::FromStr for Expiry {
    type Err = PaymentError;

    /// Parses `MM/YY`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PaymentError::ValidationError(format!("Invalid expiry '{s}'"));
        let (month, year) = s.trim().split_once('/').ok_or_else(invalid)?;
        let month = month.parse::<u8>().map_err(|_| invalid())?;
        let year = year.parse::<u8>().map_err(|_| invalid())?;
        Self::new(month, year)
    }
}

/// A customer card in the simulated bank ledger.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Card {
    /// Unique card number, 16 digits.
    pub number: String,
    pub holder_id: u32,
    pub holder_name: String,
    pub expiry: Expiry,
    pub balance: Balance,
}

/// Card data supplied by the customer when paying.
///
/// The security code is checked and dropped; it never reaches a store.
#[derive(Debug, Clone, PartialEq)]
pub struct CardDetails {
    pub number: String,
    pub code: String,
    pub expiry: Expiry,
    pub holder_id: u32,
    pub holder_name: String,
    /// Funds the simulated card starts with when it is first registered.
    pub opening_balance: Decimal,
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

impl CardDetails {
    pub fn validate(&self) -> Result<(), PaymentError> {
        if !is_digits(&self.number, 16) {
            return Err(PaymentError::ValidationError(
                "Card number must be 16 digits".to_string(),
            ));
        }
        if !is_digits(&self.code, 3) {
            return Err(PaymentError::ValidationError(
                "Card security code must be 3 digits".to_string(),
            ));
        }
        // Expiry fields are public, so re-check them here
        Expiry::new(self.expiry.month, self.expiry.year)?;
        if self.holder_id == 0 {
            return Err(PaymentError::ValidationError(
                "Card holder id is required".to_string(),
            ));
        }
        if self.holder_name.trim().is_empty() {
            return Err(PaymentError::ValidationError(
                "Card holder name is required".to_string(),
            ));
        }
        if self.opening_balance < Decimal::ZERO {
            return Err(PaymentError::ValidationError(
                "Card opening balance cannot be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the ledger card this registration would create.
    pub fn to_card(&self) -> Card {
        Card {
            number: self.number.clone(),
            holder_id: self.holder_id,
            holder_name: self.holder_name.trim().to_string(),
            expiry: self.expiry,
            balance: Balance::new(self.opening_balance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn details() -> CardDetails {
        CardDetails {
            number: "4111111111111111".to_string(),
            code: "123".to_string(),
            expiry: Expiry { month: 12, year: 29 },
            holder_id: 42,
            holder_name: "Ada Lovelace".to_string(),
            opening_balance: dec!(150),
        }
    }

    #[test]
    fn test_valid_details() {
        assert!(details().validate().is_ok());
        let card = details().to_card();
        assert_eq!(card.balance, Balance::new(dec!(150)));
        assert_eq!(card.holder_name, "Ada Lovelace");
    }

    #[test]
    fn test_rejects_malformed_number_and_code() {
        let mut d = details();
        d.number = "4111-1111-1111-11".to_string();
        assert!(matches!(d.validate(), Err(PaymentError::ValidationError(_))));

        let mut d = details();
        d.code = "12a".to_string();
        assert!(matches!(d.validate(), Err(PaymentError::ValidationError(_))));
    }

    #[test]
    fn test_rejects_bad_expiry_and_holder() {
        let mut d = details();
        d.expiry = Expiry { month: 13, year: 29 };
        assert!(d.validate().is_err());

        let mut d = details();
        d.holder_id = 0;
        assert!(d.validate().is_err());

        let mut d = details();
        d.holder_name = "  ".to_string();
        assert!(d.validate().is_err());

        let mut d = details();
        d.opening_balance = dec!(-0.01);
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_expiry_parsing() {
        assert_eq!("03/27".parse::<Expiry>().unwrap(), Expiry { month: 3, year: 27 });
        assert!("00/27".parse::<Expiry>().is_err());
        assert!("0327".parse::<Expiry>().is_err());
        assert!("03/100".parse::<Expiry>().is_err());
    }
}
