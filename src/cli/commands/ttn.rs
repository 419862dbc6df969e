//! TTN e-invoicing lookups.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use crate::cli::context::AppContext;
use crate::cli::display::{colorize_status, list_table, or_dash, output, render_list, CommandOutput};
use crate::domain::models::{ConsultCriteria, ConsultResponse};

#[derive(Args, Debug)]
pub struct TtnArgs {
    #[command(subcommand)]
    pub command: TtnCommands,
}

#[derive(Subcommand, Debug)]
pub enum TtnCommands {
    /// Search invoices filed with TTN
    Consult {
        /// Identifier returned by the e-fact save call
        #[arg(long)]
        id_save_efact: Option<String>,
        /// Generated reference
        #[arg(long)]
        generated_ref: Option<String>,
        /// Start of the date range (YYYY-MM-DD)
        #[arg(long)]
        date_from: Option<String>,
        /// End of the date range (YYYY-MM-DD)
        #[arg(long)]
        date_to: Option<String>,
        /// Invoice status
        #[arg(long)]
        status: Option<String>,
        /// Print the raw TTN response instead of the table
        #[arg(long)]
        raw: bool,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct ConsultOutput {
    #[serde(flatten)]
    pub response: ConsultResponse,
    #[serde(skip)]
    pub raw: bool,
}

impl CommandOutput for ConsultOutput {
    fn to_human(&self) -> String {
        if self.raw {
            return self.response.raw_response.clone();
        }
        let mut table = list_table(&["Id", "Reference", "Status", "Date", "Amount"]);
        for invoice in &self.response.invoices {
            table.add_row(vec![
                or_dash(Some(&invoice.id)),
                or_dash(Some(&invoice.reference)),
                colorize_status(&invoice.status).to_string(),
                or_dash(Some(&invoice.date)),
                invoice
                    .amount
                    .map_or_else(|| "-".to_string(), |a| format!("{a:.3}")),
            ]);
        }
        render_list("invoice", table, self.response.invoices.len())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: TtnArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let service = ctx.ttn_service()?;

    match args.command {
        TtnCommands::Consult {
            id_save_efact,
            generated_ref,
            date_from,
            date_to,
            status,
            raw,
        } => {
            let criteria = ConsultCriteria {
                id_save_efact,
                generated_ref,
                date_from,
                date_to,
                status,
            };
            let response = service.consult(criteria).await?;
            if !response.success {
                bail!(
                    "{}",
                    response
                        .error
                        .unwrap_or_else(|| "Consultation failed".to_string())
                );
            }
            output(&ConsultOutput { response, raw }, json_mode);
        }
    }

    Ok(())
}
