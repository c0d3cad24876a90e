use super::money::Balance;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Salted SHA-256 digest of a merchant secret, stored as `salt$digest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretHash(String);

impl SecretHash {
    pub fn generate(secret: &str) -> Self {
        let salt = Uuid::new_v4().simple().to_string();
        Self::with_salt(&salt, secret)
    }

    fn with_salt(salt: &str, secret: &str) -> Self {
        let digest = sha256::digest(format!("{salt}:{secret}"));
        Self(format!("{salt}${digest}"))
    }

    pub fn verify(&self, secret: &str) -> bool {
        match self.0.split_once('$') {
            Some((salt, _)) => Self::with_salt(salt, secret) == *self,
            None => false,
        }
    }
}

/// A merchant account: receives captured funds and pays out refunds.
///
/// Payments owned by a merchant are looked up through
/// `PaymentStore::list_by_merchant` rather than embedded here.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Merchant {
    /// Store-assigned numeric id; zero until the merchant is persisted.
    pub id: u32,
    /// Unique merchant name.
    pub name: String,
    pub secret: SecretHash,
    pub balance: Balance,
}

impl Merchant {
    pub fn new(name: &str, secret: &str) -> Self {
        Self {
            id: 0,
            name: name.trim().to_string(),
            secret: SecretHash::generate(secret),
            balance: Balance::ZERO,
        }
    }
}
