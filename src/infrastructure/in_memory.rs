use crate::domain::card::Card;
use crate::domain::merchant::Merchant;
use crate::domain::payment::Payment;
use crate::domain::ports::{CardStore, LedgerCommit, LedgerStore, MerchantStore, PaymentStore};
use crate::error::{Entity, PaymentError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    payments: HashMap<uuid::Uuid, Payment>,
    cards: BTreeMap<String, Card>,
    merchants: BTreeMap<u32, Merchant>,
    last_merchant_id: u32,
}

impl Tables {
    fn check_extends(&self, payment: &Payment) -> Result<()> {
        match self.payments.get(&payment.id()) {
            Some(stored) if payment.history().extends(stored.history()) => Ok(()),
            Some(_) => Err(PaymentError::StaleSnapshot {
                payment: payment.id(),
            }),
            None => Err(PaymentError::not_found(Entity::Payment, payment.id())),
        }
    }
}

/// A thread-safe in-memory store for payments, cards and merchants.
///
/// All tables sit behind one `Arc<RwLock<..>>`, so a ledger commit touching
/// a card, a merchant and a payment happens under a single write guard.
/// Ideal for testing or runs where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn create(&self, payment: Payment) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.payments.contains_key(&payment.id()) {
            return Err(PaymentError::persistence(format!(
                "Payment {} already exists",
                payment.id()
            )));
        }
        tables.payments.insert(payment.id(), payment);
        Ok(())
    }

    async fn get(&self, id: uuid::Uuid) -> Result<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables.payments.get(&id).cloned())
    }

    async fn save(&self, payment: Payment) -> Result<Payment> {
        let mut tables = self.tables.write().await;
        tables.check_extends(&payment)?;
        tables.payments.insert(payment.id(), payment.clone());
        Ok(payment)
    }

    async fn list_by_merchant(&self, merchant_id: u32) -> Result<Vec<Payment>> {
        let tables = self.tables.read().await;
        let mut payments: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| p.merchant_id() == merchant_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| (p.created_at(), p.id()));
        Ok(payments)
    }
}

#[async_trait]
impl CardStore for InMemoryStore {
    async fn create_if_absent(&self, card: Card) -> Result<Card> {
        let mut tables = self.tables.write().await;
        let stored = tables.cards.entry(card.number.clone()).or_insert(card);
        Ok(stored.clone())
    }

    async fn get_by_number(&self, number: &str) -> Result<Option<Card>> {
        let tables = self.tables.read().await;
        Ok(tables.cards.get(number).cloned())
    }

    async fn all(&self) -> Result<Vec<Card>> {
        let tables = self.tables.read().await;
        Ok(tables.cards.values().cloned().collect())
    }
}

#[async_trait]
impl MerchantStore for InMemoryStore {
    async fn create(&self, mut merchant: Merchant) -> Result<Merchant> {
        let mut tables = self.tables.write().await;
        if tables.merchants.values().any(|m| m.name == merchant.name) {
            return Err(PaymentError::ValidationError(format!(
                "Merchant name '{}' is already registered",
                merchant.name
            )));
        }
        tables.last_merchant_id += 1;
        merchant.id = tables.last_merchant_id;
        tables.merchants.insert(merchant.id, merchant.clone());
        Ok(merchant)
    }

    async fn get(&self, id: u32) -> Result<Option<Merchant>> {
        let tables = self.tables.read().await;
        Ok(tables.merchants.get(&id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Merchant>> {
        let tables = self.tables.read().await;
        Ok(tables.merchants.values().find(|m| m.name == name).cloned())
    }

    async fn all(&self) -> Result<Vec<Merchant>> {
        let tables = self.tables.read().await;
        Ok(tables.merchants.values().cloned().collect())
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn commit_transfer(&self, commit: LedgerCommit) -> Result<Payment> {
        let LedgerCommit {
            card,
            merchant,
            payment,
            card_before,
            merchant_before,
        } = commit;
        let mut tables = self.tables.write().await;
        // validate every row before touching any of them
        let stored_card = match tables.cards.get(&card.number) {
            Some(stored) => stored.balance,
            None => {
                return Err(PaymentError::LedgerEntityMissing {
                    entity: Entity::Card,
                    id: card.number,
                    payment: payment.id(),
                });
            }
        };
        let stored_merchant = match tables.merchants.get(&merchant.id) {
            Some(stored) => stored.balance,
            None => {
                return Err(PaymentError::LedgerEntityMissing {
                    entity: Entity::Merchant,
                    id: merchant.id.to_string(),
                    payment: payment.id(),
                });
            }
        };
        if stored_card != card_before || stored_merchant != merchant_before {
            return Err(PaymentError::StaleSnapshot {
                payment: payment.id(),
            });
        }
        tables.check_extends(&payment)?;

        tables.cards.insert(card.number.clone(), card);
        tables.merchants.insert(merchant.id, merchant);
        tables.payments.insert(payment.id(), payment.clone());
        Ok(payment)
    }
}
