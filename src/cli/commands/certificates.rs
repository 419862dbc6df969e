//! Signing certificate setup.

use anyhow::Result;
use clap::Args;

use crate::cli::context::AppContext;
use crate::cli::display::{output, CommandOutput, DetailView};
use crate::domain::models::CertificateInfo;

#[derive(Args, Debug)]
pub struct CertificatesArgs {}

#[derive(Debug, serde::Serialize)]
pub struct CertificatesOutput {
    #[serde(flatten)]
    pub info: CertificateInfo,
}

impl CommandOutput for CertificatesOutput {
    fn to_human(&self) -> String {
        let mut view = DetailView::new("Signing certificates")
            .field("Default path", &self.info.default_path)
            .field("Formats", self.info.supported_formats.join(" "))
            .section("Available");
        if self.info.available_certificates.is_empty() {
            view = view.item("none found");
        }
        for cert in &self.info.available_certificates {
            view = view.item(cert);
        }
        view = view.section("Setup");
        for step in &self.info.instructions {
            view = view.item(step);
        }
        view.render()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(_args: CertificatesArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let info = ctx.ttn_service()?.certificate_info().await;
    output(&CertificatesOutput { info }, json_mode);
    Ok(())
}
