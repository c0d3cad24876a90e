//! Application layer containing the use-case orchestration.
//!
//! [`payments::PaymentService`] is the entry point for creating, capturing and
//! refunding payments; it delegates every balance change to
//! [`transfer::TransferEngine`]. Work on the same payment, card or merchant is
//! serialized through the [`crate::domain::locks::EntityLocks`] carried by
//! [`crate::domain::ports::Stores`], so concurrent callers cannot
//! interleave a read-modify-write.

pub mod merchants;
pub mod payments;
pub mod transfer;
