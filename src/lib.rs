//! Card payment processing with a simulated bank ledger.
//!
//! Merchants create payments, customers pay them with a card, and merchants
//! refund them. Each payment carries an append-only state history
//! (`Pending`, then `Succeeded` or `Rejected`, then possibly `Refunded`), and
//! every capture or refund moves exactly the payment amount between a card
//! balance and a merchant balance in the same commit that records the state.
//!
//! - [`domain`] - data model, the payment state machine and the store ports
//! - [`application`] - payment and merchant services and the ledger transfer engine
//! - [`infrastructure`] - in-memory and (with `storage-rocksdb`) RocksDB stores
//! - [`interfaces`] - CSV operation scripts and the ledger report

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod telemetry;
