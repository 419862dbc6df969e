//! Signing certificate setup info.

use serde::{Deserialize, Serialize};

/// Signing certificate setup reported by `/certificates/info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateInfo {
    pub default_path: String,
    #[serde(default)]
    pub available_certificates: Vec<String>,
    #[serde(default)]
    pub supported_formats: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

impl CertificateInfo {
    /// Used when the backend cannot be reached.
    pub fn fallback() -> Self {
        Self {
            default_path: "classpath:certificates/icone.crt".to_string(),
            available_certificates: Vec::new(),
            supported_formats: vec![".crt".to_string(), ".pem".to_string(), ".cer".to_string()],
            instructions: vec![
                "Place your certificate file in src/main/resources/certificates/".to_string(),
                "The default certificate must be named icone.crt".to_string(),
            ],
        }
    }
}
