use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of `POST /v1/services`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewService {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub code: String,
    pub value: f64,
    pub cost: f64,
}

impl NewService {
    /// A service we provide, keyed by the platform product id, with no cost.
    pub fn provided(code: &str, name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            service_type: "PROVIDED".to_string(),
            code: code.to_string(),
            value,
            cost: 0.0,
        }
    }
}
