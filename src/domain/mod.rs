//! Domain model: payments, cards, merchants, money and the payment lifecycle.
//!
//! Nothing here performs I/O; storage is reached through the traits in [`ports`].

pub mod card;
pub mod lifecycle;
pub mod locks;
pub mod merchant;
pub mod money;
pub mod payment;
pub mod ports;
pub mod state;
