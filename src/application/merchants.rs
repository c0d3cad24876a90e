use crate::domain::merchant::Merchant;
use crate::domain::payment::Payment;
use crate::domain::ports::Stores;
use crate::error::{Entity, PaymentError, Result};
use tracing::info;

/// Merchant signup, credential checks and account lookups.
#[derive(Clone)]
pub struct MerchantService {
    stores: Stores,
}

impl MerchantService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Registers a merchant with a zero balance. Names are unique.
    pub async fn sign_up(&self, name: &str, secret: &str) -> Result<Merchant> {
        if name.trim().is_empty() {
            return Err(PaymentError::ValidationError(
                "Merchant name is required".to_string(),
            ));
        }
        if secret.is_empty() {
            return Err(PaymentError::ValidationError(
                "Merchant secret is required".to_string(),
            ));
        }

        let merchant = self
            .stores
            .merchants
            .create(Merchant::new(name, secret))
            .await?;
        info!(merchant = merchant.id, name = %merchant.name, "merchant registered");
        Ok(merchant)
    }

    /// Unknown names and wrong secrets are indistinguishable to the caller.
    pub async fn authenticate(&self, name: &str, secret: &str) -> Result<Merchant> {
        match self.stores.merchants.get_by_name(name.trim()).await? {
            Some(merchant) if merchant.secret.verify(secret) => Ok(merchant),
            _ => Err(PaymentError::InvalidCredentials),
        }
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Merchant> {
        self.stores
            .merchants
            .get_by_name(name.trim())
            .await?
            .ok_or_else(|| PaymentError::not_found(Entity::Merchant, name.trim()))
    }

    pub async fn all(&self) -> Result<Vec<Merchant>> {
        self.stores.merchants.all().await
    }

    /// Payments owned by the merchant, oldest first.
    pub async fn payments(&self, merchant_id: u32) -> Result<Vec<Payment>> {
        self.stores.payments.list_by_merchant(merchant_id).await
    }
}
