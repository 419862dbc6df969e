//! Signature validation of signed invoices.

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

use super::{stat_files, write_output};
use crate::cli::context::AppContext;
use crate::cli::display::{
    action_warning, colorize_status, list_table, or_dash, output, render_list, truncate_ellipsis,
    CommandOutput,
};
use crate::domain::models::{ActivityKind, ActivityRecord, ValidationOutcome};
use crate::services::IntakePolicy;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Signed XML documents to validate
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Write each validation report as <name>.report.txt into this directory
    #[arg(short, long)]
    pub report_dir: Option<PathBuf>,
}

#[derive(Debug, serde::Serialize)]
pub struct ValidateOutput {
    pub results: Vec<ValidationOutcome>,
    pub reports: Vec<PathBuf>,
}

impl ValidateOutput {
    fn invalid_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_valid).count()
    }
}

impl CommandOutput for ValidateOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["File", "Result", "Error"]);
        for result in &self.results {
            let status = if result.is_valid { "valid" } else { "invalid" };
            table.add_row(vec![
                truncate_ellipsis(&result.file_name, 40),
                colorize_status(status).to_string(),
                truncate_ellipsis(&or_dash(result.error.as_deref()), 60),
            ]);
        }
        let mut lines = vec![render_list("result", table, self.results.len())];
        for path in &self.reports {
            lines.push(format!("Report written to {}", path.display()));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ValidateArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let service = ctx.batch_sign_service()?;
    let outcome = IntakePolicy::batch_sign(&ctx.config.intake).partition(stat_files(&args.files).await?);
    for reason in outcome.diagnostics() {
        eprintln!("{}", action_warning(reason));
    }
    if outcome.accepted.is_empty() {
        bail!("No valid XML files to validate");
    }

    let mut results = Vec::with_capacity(outcome.accepted.len());
    let mut reports = Vec::new();
    for file in outcome.accepted.into_iter().map(|f| f.file) {
        ctx.activity
            .track(
                ActivityRecord::new(ActivityKind::Validation, "file_selected")
                    .with_file(&file.name, file.size),
            )
            .await;
        ctx.activity
            .track(
                ActivityRecord::new(ActivityKind::Validation, "validation_started")
                    .with_file(&file.name, file.size),
            )
            .await;

        let result = service.validate_file(&file).await?;
        let record = if result.is_valid {
            ActivityRecord::new(ActivityKind::Validation, "validation_success")
        } else {
            ActivityRecord::new(ActivityKind::Validation, "validation_error").with_error(
                result
                    .error
                    .clone()
                    .unwrap_or_else(|| "Signature is not valid".to_string()),
            )
        };
        ctx.activity
            .track(record.with_file(&file.name, file.size))
            .await;

        if let (Some(dir), Some(report)) = (&args.report_dir, &result.report) {
            let name = format!("{}.report.txt", file.name);
            reports.push(write_output(dir, &name, report.as_bytes()).await?);
            ctx.activity
                .track(
                    ActivityRecord::new(ActivityKind::Validation, "report_downloaded")
                        .with_file(name, report.len() as u64),
                )
                .await;
        }
        results.push(result);
    }

    let out = ValidateOutput { results, reports };
    output(&out, json_mode);

    let invalid = out.invalid_count();
    if invalid > 0 {
        bail!("{invalid} document(s) failed validation");
    }
    Ok(())
}
