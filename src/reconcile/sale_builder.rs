use chrono::{DateTime, Duration, Utc};

use crate::config::AccountingConfig;
use crate::models::{
    Installment, PaymentMethod, PurchaseEvent, SaleDocument, SaleItem, SalePayment,
};

/// Payment types that settle within days; everything else settles in a month.
const FAST_SETTLEMENT_TYPES: &[&str] = &["PIX", "BILLET", "DIRECT_DEBIT", "DIRECT_BANK_TRANSFER"];
const FAST_SETTLEMENT_DAYS: i64 = 3;
const SLOW_SETTLEMENT_DAYS: i64 = 30;

pub const NOTE_PREFIX: &str = "Hotmart transaction: ";

/// Maps a purchase event and its resolved customer/service into the sale
/// document. Pure: no I/O, same inputs give the same document.
#[derive(Debug, Clone)]
pub struct SaleBuilder {
    home_currency: String,
    home_financial_account_id: String,
    foreign_financial_account_id: String,
}

impl SaleBuilder {
    pub fn new(config: &AccountingConfig) -> Self {
        Self {
            home_currency: config.home_currency.clone(),
            home_financial_account_id: config.home_financial_account_id.clone(),
            foreign_financial_account_id: config.foreign_financial_account_id.clone(),
        }
    }

    fn is_home_currency(&self, currency: &str) -> bool {
        currency.eq_ignore_ascii_case(&self.home_currency)
    }

    /// Rate that converts the charged amount into home currency.
    ///
    /// Home-currency purchases use 1. Foreign ones use the offer's list price
    /// over the amount actually charged, but only when that list price is in
    /// home currency.
    pub fn exchange_rate(&self, event: &PurchaseEvent) -> f64 {
        let purchase = &event.purchase;
        if self.is_home_currency(purchase.currency()) {
            return 1.0;
        }
        match &purchase.original_offer_price {
            Some(list) if !self.is_home_currency(&list.currency_value) => {
                tracing::warn!(
                    transaction = %purchase.transaction_id,
                    currency = %purchase.currency(),
                    list_currency = %list.currency_value,
                    "List price is not in home currency, not converting"
                );
                1.0
            }
            Some(list) if list.value > 0.0 && purchase.amount() > 0.0 => {
                list.value / purchase.amount()
            }
            _ => {
                tracing::warn!(
                    transaction = %purchase.transaction_id,
                    currency = %purchase.currency(),
                    "Foreign-currency purchase without a usable list price, not converting"
                );
                1.0
            }
        }
    }

    pub fn build_sale(
        &self,
        event: &PurchaseEvent,
        customer_id: &str,
        service_id: &str,
    ) -> SaleDocument {
        let purchase = &event.purchase;
        let value = round_cents(purchase.amount() * self.exchange_rate(event));
        let ordered_at = purchase.order_timestamp();
        let payment_type = purchase.payment.payment_type.as_str();

        let financial_account_id = if self.is_home_currency(purchase.currency()) {
            self.home_financial_account_id.clone()
        } else {
            self.foreign_financial_account_id.clone()
        };

        SaleDocument {
            emission: ordered_at,
            status: "COMMITTED".to_string(),
            customer_id: customer_id.to_string(),
            services: vec![SaleItem {
                quantity: 1,
                service_id: service_id.to_string(),
                value,
            }],
            notes: format!("{}{}", NOTE_PREFIX, purchase.transaction_id),
            payment: SalePayment {
                payment_type: "CASH".to_string(),
                method: PaymentMethod::from_payment_type(payment_type),
                installments: vec![Installment {
                    number: 1,
                    value,
                    due_date: due_date(ordered_at, payment_type),
                    status: "PENDING".to_string(),
                    has_billet: payment_type == "BILLET",
                }],
                financial_account_id,
            },
        }
    }
}

/// Order time plus the settlement delay of the payment type.
pub fn due_date(ordered_at: DateTime<Utc>, payment_type: &str) -> DateTime<Utc> {
    let days = if FAST_SETTLEMENT_TYPES.contains(&payment_type) {
        FAST_SETTLEMENT_DAYS
    } else {
        SLOW_SETTLEMENT_DAYS
    };
    ordered_at + Duration::days(days)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
