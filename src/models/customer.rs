use serde::{Deserialize, Serialize};

use crate::config::DefaultAddress;

/// Tax classification of a customer, derived from the document length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PersonType {
    Natural,
    Legal,
}

impl PersonType {
    /// 11 digits (CPF) is a natural person, 14 digits (CNPJ) a legal one.
    pub fn from_document(document: &str) -> Option<Self> {
        match document.chars().filter(char::is_ascii_digit).count() {
            11 => Some(PersonType::Natural),
            14 => Some(PersonType::Legal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonType::Natural => "NATURAL",
            PersonType::Legal => "LEGAL",
        }
    }
}

/// Customer as returned by the accounting API search/create endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAddress {
    pub zip_code: String,
    pub street: String,
    pub number: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

impl From<&DefaultAddress> for CustomerAddress {
    fn from(default: &DefaultAddress) -> Self {
        Self {
            zip_code: default.zip_code.clone(),
            street: default.street.clone(),
            number: default.number.clone(),
            complement: String::new(),
            neighborhood: default.neighborhood.clone(),
            city: default.city.clone(),
            state: default.state.clone(),
        }
    }
}

/// Body of `POST /v1/customers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub document: String,
    pub person_type: PersonType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_phone: Option<String>,
    pub address: CustomerAddress,
}
