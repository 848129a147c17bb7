use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accounting-side payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    BankingBillet,
    InstantPayment,
    DebitCard,
    CreditCard,
    DigitalWallet,
    BankingTransfer,
    Cash,
    Other,
}

impl PaymentMethod {
    /// Maps a platform payment type; unknown types become `Other`.
    pub fn from_payment_type(payment_type: &str) -> Self {
        match payment_type {
            "BILLET" => PaymentMethod::BankingBillet,
            "PIX" => PaymentMethod::InstantPayment,
            "DIRECT_DEBIT" => PaymentMethod::DebitCard,
            "CREDIT_CARD" | "PAYPAL" | "PAYPAL_INTERNACIONAL" | "GOOGLE_PAY" | "HOTCARD"
            | "PICPAY" | "SAMSUNG_PAY" => PaymentMethod::CreditCard,
            "WALLET" => PaymentMethod::DigitalWallet,
            "DIRECT_BANK_TRANSFER" | "MANUAL_TRANSFER" => PaymentMethod::BankingTransfer,
            "CASH_PAYMENT" => PaymentMethod::Cash,
            _ => PaymentMethod::Other,
        }
    }
}

/// Body of `POST /v1/sales`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleDocument {
    pub emission: DateTime<Utc>,
    pub status: String,
    pub customer_id: String,
    pub services: Vec<SaleItem>,
    pub notes: String,
    pub payment: SalePayment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    pub quantity: u32,
    pub service_id: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalePayment {
    #[serde(rename = "type")]
    pub payment_type: String,
    pub method: PaymentMethod,
    pub installments: Vec<Installment>,
    pub financial_account_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub number: u32,
    pub value: f64,
    pub due_date: DateTime<Utc>,
    pub status: String,
    #[serde(rename = "hasBillet")]
    pub has_billet: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: String,
}
