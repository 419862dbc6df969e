//! TTN e-invoicing consult request and response.

use serde::{Deserialize, Serialize};

/// Search criteria for `/ttn/consult`. Blank values are never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_save_efact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ConsultCriteria {
    /// Drop empty and whitespace-only values.
    pub fn normalized(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }
        Self {
            id_save_efact: keep(self.id_save_efact),
            generated_ref: keep(self.generated_ref),
            date_from: keep(self.date_from),
            date_to: keep(self.date_to),
            status: keep(self.status),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsultRequest {
    pub criteria: ConsultCriteria,
}

/// One invoice found in TTN. Extra backend fields are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsultResponse {
    pub success: bool,
    pub count: usize,
    pub invoices: Vec<Invoice>,
    pub raw_response: String,
    pub error: Option<String>,
}
