use super::card::Card;
use super::locks::EntityLocks;
use super::merchant::Merchant;
use super::money::Balance;
use super::payment::Payment;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn create(&self, payment: Payment) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Payment>>;
    /// Overwrites the stored payment and returns the canonical post-write copy.
    ///
    /// Fails with `StaleSnapshot` unless the incoming history extends the stored one.
    async fn save(&self, payment: Payment) -> Result<Payment>;
    /// Payments owned by a merchant, oldest first.
    async fn list_by_merchant(&self, merchant_id: u32) -> Result<Vec<Payment>>;
}

#[async_trait]
pub trait CardStore: Send + Sync {
    /// Inserts the card unless its number is already registered.
    /// Returns the stored card either way.
    async fn create_if_absent(&self, card: Card) -> Result<Card>;
    async fn get_by_number(&self, number: &str) -> Result<Option<Card>>;
    async fn all(&self) -> Result<Vec<Card>>;
}

#[async_trait]
pub trait MerchantStore: Send + Sync {
    /// Assigns the next id and inserts the merchant. Names are unique.
    async fn create(&self, merchant: Merchant) -> Result<Merchant>;
    async fn get(&self, id: u32) -> Result<Option<Merchant>>;
    async fn get_by_name(&self, name: &str) -> Result<Option<Merchant>>;
    async fn all(&self) -> Result<Vec<Merchant>>;
}

/// A balance movement ready to be written.
///
/// `card_before` and `merchant_before` are the balances the new rows were
/// computed from; the store refuses the commit if either row moved since.
#[derive(Debug, Clone)]
pub struct LedgerCommit {
    pub card: Card,
    pub merchant: Merchant,
    pub payment: Payment,
    pub card_before: Balance,
    pub merchant_before: Balance,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Writes both balance rows and the payment in one all-or-nothing unit.
    ///
    /// Fails with `StaleSnapshot` if a stored balance differs from the one the
    /// commit was computed from, or if the payment write would be refused by
    /// `PaymentStore::save`. Nothing is written on failure.
    async fn commit_transfer(&self, commit: LedgerCommit) -> Result<Payment>;
}

pub type PaymentStoreRef = Arc<dyn PaymentStore>;
pub type CardStoreRef = Arc<dyn CardStore>;
pub type MerchantStoreRef = Arc<dyn MerchantStore>;
pub type LedgerStoreRef = Arc<dyn LedgerStore>;

/// Handles to every store the services need, plus the entity locks that
/// serialize work against them.
///
/// Backends usually implement all four traits on one type so a ledger commit
/// can span every table; `shared` hands out clones of that one instance.
/// Every service built from clones of one `Stores` shares the same locks.
#[derive(Clone)]
pub struct Stores {
    pub payments: PaymentStoreRef,
    pub cards: CardStoreRef,
    pub merchants: MerchantStoreRef,
    pub ledger: LedgerStoreRef,
    pub locks: EntityLocks,
}

impl Stores {
    pub fn shared<S>(store: S) -> Self
    where
        S: PaymentStore + CardStore + MerchantStore + LedgerStore + 'static,
    {
        let store = Arc::new(store);
        Self {
            payments: store.clone(),
            cards: store.clone(),
            merchants: store.clone(),
            ledger: store,
            locks: EntityLocks::new(),
        }
    }
}
