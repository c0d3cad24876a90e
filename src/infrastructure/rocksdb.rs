use crate::domain::card::Card;
use crate::domain::merchant::Merchant;
use crate::domain::payment::Payment;
use crate::domain::ports::{CardStore, LedgerCommit, LedgerStore, MerchantStore, PaymentStore};
use crate::error::{Entity, PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Column Family for payment aggregates, keyed by payment id.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family indexing payments by owner: merchant id ++ payment id.
pub const CF_MERCHANT_PAYMENTS: &str = "merchant_payments";
/// Column Family for cards, keyed by card number.
pub const CF_CARDS: &str = "cards";
/// Column Family for merchants, keyed by merchant id.
pub const CF_MERCHANTS: &str = "merchants";
/// Column Family mapping merchant names to ids.
pub const CF_MERCHANT_NAMES: &str = "merchant_names";
/// Column Family for counters.
pub const CF_META: &str = "meta";

const LAST_MERCHANT_ID: &[u8] = b"last_merchant_id";

/// A persistent store implementation using RocksDB.
///
/// Every entity lives in its own Column Family; a ledger commit writes the
/// card, the merchant and the payment in one `WriteBatch`, so it lands whole
/// or not at all.
///
/// Check-then-write sequences (optimistic saves, idempotent card creation,
/// merchant id allocation) run under a shared write lock. Clones share both
/// the `Arc<DB>` and that lock.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

fn merchant_key(id: u32) -> [u8; 4] {
    id.to_be_bytes()
}

fn ownership_key(merchant_id: u32, payment_id: Uuid) -> Vec<u8> {
    let mut key = merchant_key(merchant_id).to_vec();
    key.extend_from_slice(payment_id.as_bytes());
    key
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that every required column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [
            CF_PAYMENTS,
            CF_MERCHANT_PAYMENTS,
            CF_CARDS,
            CF_MERCHANTS,
            CF_MERCHANT_NAMES,
            CF_META,
        ]
        .into_iter()
        .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| PaymentError::persistence(format!("Column family '{name}' not found")))
    }

    fn read<T: DeserializeOwned>(&self, cf: &str, key: impl AsRef<[u8]>) -> Result<Option<T>> {
        match self.db.get_cf(self.cf(cf)?, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn read_all<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for item in self.db.iterator_cf(self.cf(cf)?, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }

    fn stage<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        cf: &str,
        key: impl AsRef<[u8]>,
        value: &T,
    ) -> Result<()> {
        batch.put_cf(self.cf(cf)?, key, serde_json::to_vec(value)?);
        Ok(())
    }

    /// Refuses a write whose history does not extend the stored one.
    fn check_extends(&self, payment: &Payment) -> Result<()> {
        let stored: Payment = self
            .read(CF_PAYMENTS, payment.id().as_bytes())?
            .ok_or_else(|| PaymentError::not_found(Entity::Payment, payment.id()))?;
        if payment.history().extends(stored.history()) {
            Ok(())
        } else {
            Err(PaymentError::StaleSnapshot {
                payment: payment.id(),
            })
        }
    }
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn create(&self, payment: Payment) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.db.get_pinned_cf(self.cf(CF_PAYMENTS)?, payment.id().as_bytes())?.is_some() {
            return Err(PaymentError::persistence(format!(
                "Payment {} already exists",
                payment.id()
            )));
        }

        let mut batch = WriteBatch::default();
        self.stage(&mut batch, CF_PAYMENTS, payment.id().as_bytes(), &payment)?;
        batch.put_cf(
            self.cf(CF_MERCHANT_PAYMENTS)?,
            ownership_key(payment.merchant_id(), payment.id()),
            b"",
        );
        self.db.write(&batch)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payment>> {
        self.read(CF_PAYMENTS, id.as_bytes())
    }

    async fn save(&self, payment: Payment) -> Result<Payment> {
        let _guard = self.write_lock.lock().await;
        self.check_extends(&payment)?;
        let mut batch = WriteBatch::default();
        self.stage(&mut batch, CF_PAYMENTS, payment.id().as_bytes(), &payment)?;
        self.db.write(&batch)?;

        self.read(CF_PAYMENTS, payment.id().as_bytes())?
            .ok_or_else(|| PaymentError::not_found(Entity::Payment, payment.id()))
    }

    async fn list_by_merchant(&self, merchant_id: u32) -> Result<Vec<Payment>> {
        let prefix = merchant_key(merchant_id);
        let index = self
            .db
            .iterator_cf(self.cf(CF_MERCHANT_PAYMENTS)?, IteratorMode::From(&prefix[..], Direction::Forward));

        let mut payments = Vec::new();
        for item in index {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            if let Some(payment) = self.read::<Payment>(CF_PAYMENTS, &key[prefix.len()..])? {
                payments.push(payment);
            }
        }
        payments.sort_by_key(|p| (p.created_at(), p.id()));
        Ok(payments)
    }
}

#[async_trait]
impl CardStore for RocksDBStore {
    async fn create_if_absent(&self, card: Card) -> Result<Card> {
        let _guard = self.write_lock.lock().await;
        if let Some(existing) = self.read::<Card>(CF_CARDS, card.number.as_bytes())? {
            return Ok(existing);
        }
        self.db.put_cf(
            self.cf(CF_CARDS)?,
            card.number.as_bytes(),
            serde_json::to_vec(&card)?,
        )?;
        Ok(card)
    }

    async fn get_by_number(&self, number: &str) -> Result<Option<Card>> {
        self.read(CF_CARDS, number.as_bytes())
    }

    async fn all(&self) -> Result<Vec<Card>> {
        self.read_all(CF_CARDS)
    }
}

#[async_trait]
impl MerchantStore for RocksDBStore {
    async fn create(&self, mut merchant: Merchant) -> Result<Merchant> {
        let _guard = self.write_lock.lock().await;
        if self
            .db
            .get_pinned_cf(self.cf(CF_MERCHANT_NAMES)?, merchant.name.as_bytes())?
            .is_some()
        {
            return Err(PaymentError::ValidationError(format!(
                "Merchant name '{}' is already registered",
                merchant.name
            )));
        }

        let last: u32 = self.read(CF_META, LAST_MERCHANT_ID)?.unwrap_or(0);
        merchant.id = last + 1;

        let mut batch = WriteBatch::default();
        self.stage(&mut batch, CF_MERCHANTS, merchant_key(merchant.id), &merchant)?;
        self.stage(&mut batch, CF_MERCHANT_NAMES, merchant.name.as_bytes(), &merchant.id)?;
        self.stage(&mut batch, CF_META, LAST_MERCHANT_ID, &merchant.id)?;
        self.db.write(&batch)?;
        Ok(merchant)
    }

    async fn get(&self, id: u32) -> Result<Option<Merchant>> {
        self.read(CF_MERCHANTS, merchant_key(id))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Merchant>> {
        match self.read::<u32>(CF_MERCHANT_NAMES, name.as_bytes())? {
            Some(id) => self.read(CF_MERCHANTS, merchant_key(id)),
            None => Ok(None),
        }
    }

    async fn all(&self) -> Result<Vec<Merchant>> {
        self.read_all(CF_MERCHANTS)
    }
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn commit_transfer(&self, commit: LedgerCommit) -> Result<Payment> {
        let LedgerCommit {
            card,
            merchant,
            payment,
            card_before,
            merchant_before,
        } = commit;
        let _guard = self.write_lock.lock().await;
        let Some(stored_card) = self.read::<Card>(CF_CARDS, card.number.as_bytes())? else {
            return Err(PaymentError::LedgerEntityMissing {
                entity: Entity::Card,
                id: card.number,
                payment: payment.id(),
            });
        };
        let Some(stored_merchant) = self.read::<Merchant>(CF_MERCHANTS, merchant_key(merchant.id))?
        else {
            return Err(PaymentError::LedgerEntityMissing {
                entity: Entity::Merchant,
                id: merchant.id.to_string(),
                payment: payment.id(),
            });
        };
        if stored_card.balance != card_before || stored_merchant.balance != merchant_before {
            return Err(PaymentError::StaleSnapshot {
                payment: payment.id(),
            });
        }
        self.check_extends(&payment)?;

        let mut batch = WriteBatch::default();
        self.stage(&mut batch, CF_CARDS, card.number.as_bytes(), &card)?;
        self.stage(&mut batch, CF_MERCHANTS, merchant_key(merchant.id), &merchant)?;
        self.stage(&mut batch, CF_PAYMENTS, payment.id().as_bytes(), &payment)?;
        self.db.write(&batch)?;

        self.read(CF_PAYMENTS, payment.id().as_bytes())?
            .ok_or_else(|| PaymentError::not_found(Entity::Payment, payment.id()))
    }
}
