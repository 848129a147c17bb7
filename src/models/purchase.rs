use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// The only webhook event type that is reconciled.
pub const PURCHASE_COMPLETE: &str = "PURCHASE_COMPLETE";

/// Outer webhook body. `data` stays raw until the event type is known to be
/// one we process, since other events carry different shapes.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl WebhookEnvelope {
    pub fn is_purchase_complete(&self) -> bool {
        self.event == PURCHASE_COMPLETE
    }
}

/// A completed purchase as delivered by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseEvent {
    pub product: Product,
    pub buyer: Buyer,
    pub purchase: Purchase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Platform product id; doubles as the accounting service `code`
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buyer {
    pub name: String,
    pub email: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub document: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub checkout_phone: Option<String>,
    #[serde(default)]
    pub address: Option<BuyerAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuyerAddress {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub zipcode: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub number: Option<String>,
    #[serde(default)]
    pub complement: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub country_iso: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    #[serde(rename = "transaction")]
    pub transaction_id: String,
    /// Unix timestamp in milliseconds
    pub order_date: i64,
    /// Amount actually charged, in the purchase currency
    pub price: Price,
    /// List price of the offer, in home currency
    #[serde(default)]
    pub original_offer_price: Option<Price>,
    pub payment: Payment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub value: f64,
    pub currency_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "type")]
    pub payment_type: String,
}

impl Purchase {
    pub fn amount(&self) -> f64 {
        self.price.value
    }

    pub fn currency(&self) -> &str {
        &self.price.currency_value
    }

    pub fn original_offer_amount(&self) -> Option<f64> {
        self.original_offer_price.as_ref().map(|p| p.value)
    }

    /// Price the service is listed at: the offer's list price when known.
    pub fn list_price(&self) -> f64 {
        self.original_offer_amount().unwrap_or(self.price.value)
    }

    /// `order_date` as a UTC timestamp. Out-of-range values clamp to the epoch.
    pub fn order_timestamp(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.order_date).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

fn value_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    value_to_string(value).ok_or_else(|| serde::de::Error::custom("expected a string or number"))
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_string(value).filter(|s| !s.trim().is_empty()))
}
