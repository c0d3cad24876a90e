use super::transfer::TransferEngine;
use crate::config::ServiceContext;
use crate::domain::card::CardDetails;
use crate::domain::lifecycle::{self, Operation};
use crate::domain::locks::LockKey;
use crate::domain::money::Amount;
use crate::domain::payment::Payment;
use crate::domain::ports::Stores;
use crate::error::{Entity, PaymentError, Result};
use rust_decimal::Decimal;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Use-case entry points for creating, capturing, refunding and reading payments.
///
/// This is the only surface the CLI (or any other transport) talks to. Every
/// mutating call either commits its ledger change and state entry together or
/// leaves the stores untouched.
#[derive(Clone)]
pub struct PaymentService {
    stores: Stores,
    transfers: TransferEngine,
    context: ServiceContext,
}

impl PaymentService {
    /// Services built over clones of the same `Stores` share its entity locks.
    pub fn new(stores: Stores, context: ServiceContext) -> Self {
        Self {
            transfers: TransferEngine::new(stores.clone()),
            stores,
            context,
        }
    }

    /// Creates a `Pending` payment owned by `merchant_id`.
    #[instrument(skip(self), fields(app = %self.context.app_name, env = %self.context.environment))]
    pub async fn create(&self, merchant_id: u32, amount: Decimal) -> Result<Payment> {
        let amount = Amount::new(amount)?;
        if self.stores.merchants.get(merchant_id).await?.is_none() {
            return Err(PaymentError::not_found(Entity::Merchant, merchant_id));
        }

        let payment = Payment::new(merchant_id, amount);
        self.stores
            .payments
            .create(payment.clone())
            .await
            .inspect_err(|e| error!(error = %e, "failed to create payment"))?;
        info!(payment = %payment.id(), %amount, "payment created");
        Ok(payment)
    }

    /// Attempts to capture the payment from the given card.
    ///
    /// Registers the card on first use, then reloads the payment so only its id
    /// is taken from the caller. Insufficient card funds come back as `Ok` with
    /// the payment `Rejected`.
    ///
    /// Registration happens before the payment lookup and the transition check,
    /// so a valid card is kept even when the capture itself is refused.
    #[instrument(skip(self, card), fields(app = %self.context.app_name, env = %self.context.environment))]
    pub async fn process_payment(&self, payment_id: Uuid, card: CardDetails) -> Result<Payment> {
        card.validate()?;
        self.stores
            .cards
            .create_if_absent(card.to_card())
            .await
            .inspect_err(|e| error!(error = %e, "failed to register card"))?;

        let _guard = self.stores.locks.acquire(LockKey::Payment(payment_id)).await;
        let mut payment = self.load(payment_id).await?;
        lifecycle::ensure_allowed(payment.history(), Operation::Capture)?;
        payment.attach_card(&card.number);

        self.transfers
            .apply(payment, Operation::Capture)
            .await
            .inspect_err(|e| log_failure(e, "capture failed"))
    }

    /// Refunds a succeeded payment back to its card on behalf of the owning merchant.
    #[instrument(skip(self), fields(app = %self.context.app_name, env = %self.context.environment))]
    pub async fn process_refund(&self, payment_id: Uuid, merchant_id: u32) -> Result<()> {
        let _guard = self.stores.locks.acquire(LockKey::Payment(payment_id)).await;
        let payment = self.load(payment_id).await?;
        if payment.merchant_id() != merchant_id {
            return Err(PaymentError::AuthorizationMismatch {
                payment: payment_id,
                caller: merchant_id,
            });
        }
        lifecycle::ensure_allowed(payment.history(), Operation::Refund)?;

        self.transfers
            .apply(payment, Operation::Refund)
            .await
            .inspect_err(|e| log_failure(e, "refund failed"))?;
        Ok(())
    }

    pub async fn get_by_id(&self, payment_id: Uuid) -> Result<Payment> {
        self.load(payment_id).await
    }

    async fn load(&self, payment_id: Uuid) -> Result<Payment> {
        self.stores
            .payments
            .get(payment_id)
            .await?
            .ok_or_else(|| PaymentError::not_found(Entity::Payment, payment_id))
    }
}

fn log_failure(err: &PaymentError, message: &str) {
    if err.is_retryable() {
        error!(error = %err, "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::Expiry;
    use crate::domain::merchant::Merchant;
    use crate::domain::money::Balance;
    use crate::domain::state::State;
    use crate::infrastructure::in_memory::InMemoryStore;
    use rust_decimal_macros::dec;

    const CARD: &str = "4111111111111111";

    fn card(number: &str, opening_balance: Decimal) -> CardDetails {
        CardDetails {
            number: number.to_string(),
            code: "123".to_string(),
            expiry: Expiry { month: 12, year: 29 },
            holder_id: 1,
            holder_name: "Customer".to_string(),
            opening_balance,
        }
    }

    async fn service() -> (PaymentService, Stores, u32) {
        let stores = Stores::shared(InMemoryStore::new());
        let merchant = stores
            .merchants
            .create(Merchant::new("m", "pw"))
            .await
            .unwrap();
        (
            PaymentService::new(stores.clone(), ServiceContext::default()),
            stores,
            merchant.id,
        )
    }

    async fn balances(stores: &Stores, number: &str, merchant_id: u32) -> (Balance, Balance) {
        (
            stores.cards.get_by_number(number).await.unwrap().unwrap().balance,
            stores.merchants.get(merchant_id).await.unwrap().unwrap().balance,
        )
    }

    #[tokio::test]
    async fn test_capture_and_refund_scenario() {
        let (service, stores, m) = service().await;
        let payment = service.create(m, dec!(100)).await.unwrap();
        assert_eq!(payment.status(), State::Pending);

        let captured = service
            .process_payment(payment.id(), card(CARD, dec!(150)))
            .await
            .unwrap();
        assert_eq!(captured.status(), State::Succeeded);
        assert_eq!(
            balances(&stores, CARD, m).await,
            (Balance::new(dec!(50)), Balance::new(dec!(100)))
        );

        service.process_refund(payment.id(), m).await.unwrap();
        let refunded = service.get_by_id(payment.id()).await.unwrap();
        assert_eq!(refunded.status(), State::Refunded);
        assert_eq!(
            balances(&stores, CARD, m).await,
            (Balance::new(dec!(150)), Balance::ZERO)
        );

        assert!(matches!(
            service.process_refund(payment.id(), m).await,
            Err(PaymentError::InvalidStateTransition {
                current: State::Refunded
            })
        ));
    }

    #[tokio::test]
    async fn test_insufficient_funds_then_retry_with_other_card() {
        let (service, stores, m) = service().await;
        let payment = service.create(m, dec!(100)).await.unwrap();

        let rejected = service
            .process_payment(payment.id(), card(CARD, dec!(50)))
            .await
            .unwrap();
        assert_eq!(rejected.status(), State::Rejected);
        assert_eq!(
            balances(&stores, CARD, m).await,
            (Balance::new(dec!(50)), Balance::ZERO)
        );

        let other = "5500000000000004";
        let retried = service
            .process_payment(payment.id(), card(other, dec!(500)))
            .await
            .unwrap();
        assert_eq!(
            retried.history().as_slice(),
            &[State::Pending, State::Rejected, State::Succeeded]
        );
        assert_eq!(retried.card_number(), Some(other));
        assert_eq!(
            balances(&stores, other, m).await,
            (Balance::new(dec!(400)), Balance::new(dec!(100)))
        );
    }

    #[tokio::test]
    async fn test_double_capture_is_refused() {
        let (service, stores, m) = service().await;
        let payment = service.create(m, dec!(10)).await.unwrap();
        service
            .process_payment(payment.id(), card(CARD, dec!(100)))
            .await
            .unwrap();

        let err = service
            .process_payment(payment.id(), card(CARD, dec!(100)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PaymentError::InvalidStateTransition {
                current: State::Succeeded
            }
        ));
        assert_eq!(
            balances(&stores, CARD, m).await,
            (Balance::new(dec!(90)), Balance::new(dec!(10)))
        );
    }

    #[tokio::test]
    async fn test_refund_before_success_is_refused() {
        let (service, _stores, m) = service().await;
        let payment = service.create(m, dec!(100)).await.unwrap();
        assert!(matches!(
            service.process_refund(payment.id(), m).await,
            Err(PaymentError::InvalidStateTransition {
                current: State::Pending
            })
        ));

        service
            .process_payment(payment.id(), card(CARD, dec!(50)))
            .await
            .unwrap();
        assert!(matches!(
            service.process_refund(payment.id(), m).await,
            Err(PaymentError::InvalidStateTransition {
                current: State::Rejected
            })
        ));
    }

    #[tokio::test]
    async fn test_refund_by_other_merchant_is_refused() {
        let (service, stores, m) = service().await;
        let other = stores
            .merchants
            .create(Merchant::new("other", "pw"))
            .await
            .unwrap();
        let payment = service.create(m, dec!(10)).await.unwrap();
        service
            .process_payment(payment.id(), card(CARD, dec!(100)))
            .await
            .unwrap();

        assert!(matches!(
            service.process_refund(payment.id(), other.id).await,
            Err(PaymentError::AuthorizationMismatch { .. })
        ));
        assert_eq!(
            service.get_by_id(payment.id()).await.unwrap().status(),
            State::Succeeded
        );
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (service, _stores, m) = service().await;
        assert!(matches!(
            service.create(m, dec!(0)).await,
            Err(PaymentError::ValidationError(_))
        ));
        assert!(matches!(
            service.create(m + 100, dec!(10)).await,
            Err(PaymentError::NotFound {
                entity: Entity::Merchant,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_unknown_payment_and_invalid_card() {
        let (service, stores, m) = service().await;
        assert!(matches!(
            service.get_by_id(Uuid::new_v4()).await,
            Err(PaymentError::NotFound {
                entity: Entity::Payment,
                ..
            })
        ));
        assert!(matches!(
            service
                .process_payment(Uuid::new_v4(), card("5500000000000004", dec!(10)))
                .await,
            Err(PaymentError::NotFound { .. })
        ));

        let payment = service.create(m, dec!(10)).await.unwrap();
        let mut bad = card(CARD, dec!(10));
        bad.code = "1".to_string();
        assert!(matches!(
            service.process_payment(payment.id(), bad).await,
            Err(PaymentError::ValidationError(_))
        ));
        // validation happens before registration
        assert!(stores.cards.get_by_number(CARD).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refused_capture_still_registers_card() {
        let (service, stores, m) = service().await;
        let payment = service.create(m, dec!(10)).await.unwrap();
        service
            .process_payment(payment.id(), card(CARD, dec!(100)))
            .await
            .unwrap();

        let other = "4000000000000002";
        assert!(matches!(
            service.process_payment(payment.id(), card(other, dec!(20))).await,
            Err(PaymentError::InvalidStateTransition { .. })
        ));
        let registered = stores.cards.get_by_number(other).await.unwrap().unwrap();
        assert_eq!(registered.balance, Balance::new(dec!(20)));
        assert_eq!(
            service.get_by_id(payment.id()).await.unwrap().card_number(),
            Some(CARD)
        );
    }
}
