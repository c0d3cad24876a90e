use super::csv::operation_reader::{Operation, OperationType};
use super::csv::report_writer::ReportRow;
use crate::application::merchants::MerchantService;
use crate::application::payments::PaymentService;
use crate::domain::card::{CardDetails, Expiry};
use crate::domain::ports::Stores;
use crate::error::{PaymentError, Result};
use std::collections::HashMap;
use uuid::Uuid;

/// Drives the payment services from operation-script rows.
///
/// Stands in for the transport layer: it authenticates merchants by name and
/// secret, maps script labels to payment ids and turns rows into service calls.
/// It never makes business decisions of its own.
pub struct ScriptRunner {
    payments: PaymentService,
    merchants: MerchantService,
    stores: Stores,
    labels: HashMap<String, Uuid>,
}

fn required<'a, T>(value: &'a Option<T>, column: &str) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| PaymentError::ValidationError(format!("Missing '{column}' column")))
}

impl ScriptRunner {
    pub fn new(payments: PaymentService, merchants: MerchantService, stores: Stores) -> Self {
        Self {
            payments,
            merchants,
            stores,
            labels: HashMap::new(),
        }
    }

    pub async fn run(&mut self, op: Operation) -> Result<()> {
        match op.op {
            OperationType::Merchant => {
                self.merchants
                    .sign_up(&op.merchant, required(&op.secret, "secret")?)
                    .await?;
            }
            OperationType::Create => {
                let label = required(&op.payment, "payment")?;
                if self.labels.contains_key(label) {
                    return Err(PaymentError::ValidationError(format!(
                        "Payment label '{label}' is already bound"
                    )));
                }
                let merchant = self
                    .merchants
                    .authenticate(&op.merchant, required(&op.secret, "secret")?)
                    .await?;
                let payment = self
                    .payments
                    .create(merchant.id, *required(&op.amount, "amount")?)
                    .await?;
                self.labels.insert(label.clone(), payment.id());
            }
            OperationType::Process => {
                let id = self.resolve(required(&op.payment, "payment")?)?;
                let card = CardDetails {
                    number: required(&op.card, "card")?.clone(),
                    code: required(&op.cvv, "cvv")?.clone(),
                    expiry: required(&op.expiry, "expiry")?.parse::<Expiry>()?,
                    holder_id: *required(&op.holder_id, "holder_id")?,
                    holder_name: required(&op.holder, "holder")?.clone(),
                    opening_balance: op.balance.unwrap_or_default(),
                };
                self.payments.process_payment(id, card).await?;
            }
            OperationType::Refund => {
                let id = self.resolve(required(&op.payment, "payment")?)?;
                let merchant = self
                    .merchants
                    .authenticate(&op.merchant, required(&op.secret, "secret")?)
                    .await?;
                self.payments.process_refund(id, merchant.id).await?;
            }
        }
        Ok(())
    }

    fn resolve(&self, label: &str) -> Result<Uuid> {
        self.labels.get(label).copied().ok_or_else(|| {
            PaymentError::ValidationError(format!("Unknown payment label '{label}'"))
        })
    }

    /// Every payment grouped by merchant, then every card, then every merchant balance.
    pub async fn report(&self) -> Result<Vec<ReportRow>> {
        let merchants = self.merchants.all().await?;
        let labels: HashMap<Uuid, &str> = self
            .labels
            .iter()
            .map(|(label, id)| (*id, label.as_str()))
            .collect();
        let mut rows = Vec::new();

        for merchant in &merchants {
            for payment in self.merchants.payments(merchant.id).await? {
                rows.push(ReportRow {
                    entity: "payment",
                    key: labels
                        .get(&payment.id())
                        .map(|label| label.to_string())
                        .unwrap_or_else(|| payment.id().to_string()),
                    status: Some(payment.status().to_string()),
                    value: payment.amount().value(),
                });
            }
        }
        for card in self.stores.cards.all().await? {
            rows.push(ReportRow {
                entity: "card",
                key: card.number,
                status: None,
                value: card.balance.value(),
            });
        }
        for merchant in merchants {
            rows.push(ReportRow {
                entity: "merchant",
                key: merchant.name,
                status: None,
                value: merchant.balance.value(),
            });
        }
        Ok(rows)
    }
}
