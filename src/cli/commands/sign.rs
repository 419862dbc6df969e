//! Simple-sign pipeline: sign, file with TTN, validate, package.

use anyhow::{bail, Result};
use clap::Args;
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::time::Instant;

use super::{stat_files, write_output};
use crate::cli::context::AppContext;
use crate::cli::display::{
    action_failure, action_success, action_warning, colorize_bool, count_label, list_table, or_dash,
    output, render_list, truncate_ellipsis, CommandOutput,
};
use crate::cli::output::{create_spinner, ProgressBarExt};
use crate::domain::models::{ActivityKind, ActivityRecord, BatchSignResult, BatchSummary};
use crate::services::{sign_package, IntakePolicy};

#[derive(Args, Debug)]
pub struct SignArgs {
    /// XML invoices to sign
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Write each signed document as signed-<name> into this directory,
    /// plus a zip package with validation reports and a run summary
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, serde::Serialize)]
pub struct SignRow {
    pub file: String,
    pub signed: bool,
    pub saved: bool,
    pub valid: bool,
    pub error: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct SignOutput {
    pub summary: BatchSummary,
    pub files: Vec<SignRow>,
    pub download_url: Option<String>,
    pub written: Vec<PathBuf>,
    pub package: Option<PathBuf>,
}

/// One row per submitted file, joining the three step results by name.
pub fn rows(names: &[String], result: &BatchSignResult) -> Vec<SignRow> {
    names
        .iter()
        .map(|name| {
            let signed = result.signed_files.iter().find(|f| &f.filename == name);
            let saved = result.ttn_results.iter().find(|r| &r.file_name == name);
            let validated = result.validation_results.iter().find(|r| &r.file_name == name);
            let error = signed
                .and_then(|f| f.error.clone())
                .or_else(|| saved.and_then(|r| r.error.clone()))
                .or_else(|| validated.and_then(|r| r.error.clone()));
            SignRow {
                file: name.clone(),
                signed: signed.is_some_and(|f| f.is_usable()),
                saved: saved.is_some_and(|r| r.success),
                valid: validated.is_some_and(|r| r.is_valid),
                error,
            }
        })
        .collect()
}

impl CommandOutput for SignOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["File", "Signed", "Saved", "Valid", "Error"]);
        for row in &self.files {
            table.add_row(vec![
                truncate_ellipsis(&row.file, 40),
                colorize_bool(row.signed).to_string(),
                colorize_bool(row.saved).to_string(),
                colorize_bool(row.valid).to_string(),
                truncate_ellipsis(&or_dash(row.error.as_deref()), 50),
            ]);
        }

        let s = &self.summary;
        let line = format!(
            "{} total, {} signed, {} saved, {} validated, {} failed",
            s.total, s.signed, s.saved, s.validated, s.failed
        );
        let mut lines = vec![
            render_list("file", table, self.files.len()),
            String::new(),
            if s.failed == 0 {
                action_success(&line)
            } else {
                action_failure(&line)
            },
        ];
        for path in &self.written {
            lines.push(format!("Wrote {}", path.display()));
        }
        if let Some(path) = &self.package {
            lines.push(format!("Saved package {}", path.display()));
        }
        if let Some(url) = &self.download_url {
            lines.push(format!("Package: {url}"));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: SignArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let service = ctx.batch_sign_service()?;
    let outcome = IntakePolicy::batch_sign(&ctx.config.intake).partition(stat_files(&args.files).await?);
    for reason in outcome.diagnostics() {
        eprintln!("{}", action_warning(reason));
    }
    if outcome.accepted.is_empty() {
        bail!("No valid XML files to sign");
    }

    let handles: Vec<_> = outcome.accepted.into_iter().map(|f| f.file).collect();
    let names: Vec<String> = handles.iter().map(|h| h.name.clone()).collect();
    let total_size: u64 = handles.iter().map(|h| h.size).sum();
    for handle in &handles {
        ctx.activity
            .track(
                ActivityRecord::new(ActivityKind::SimpleSign, "file_selected")
                    .with_file(&handle.name, handle.size),
            )
            .await;
    }
    ctx.activity
        .track(
            ActivityRecord::new(ActivityKind::SimpleSign, "signing_started")
                .with_files(names.clone(), total_size),
        )
        .await;

    let spinner = if json_mode {
        ProgressBar::hidden()
    } else {
        create_spinner(format!(
            "Signing {}...",
            count_label(handles.len(), "file", "files")
        ))
    };
    let started = Instant::now();
    let result = match service.process(&handles).await {
        Ok(result) => {
            spinner.finish_and_clear();
            result
        }
        Err(e) => {
            spinner.finish_error("signing failed");
            ctx.activity
                .track(
                    ActivityRecord::new(ActivityKind::SimpleSign, "signing_error")
                        .with_files(names, total_size)
                        .with_error(e.to_string()),
                )
                .await;
            return Err(e.into());
        }
    };
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    for signed in &result.signed_files {
        let size = handles
            .iter()
            .find(|h| h.name == signed.filename)
            .map_or(0, |h| h.size);
        let record = if signed.is_usable() {
            ActivityRecord::new(ActivityKind::SimpleSign, "signing_success")
        } else {
            ActivityRecord::new(ActivityKind::SimpleSign, "signing_error").with_error(
                signed
                    .error
                    .clone()
                    .unwrap_or_else(|| "Signing failed".to_string()),
            )
        };
        ctx.activity
            .track(
                record
                    .with_file(&signed.filename, size)
                    .with_duration_ms(elapsed_ms),
            )
            .await;
    }

    let mut written = Vec::new();
    let mut package = None;
    if let Some(dir) = &args.output {
        for signed in result.signed_files.iter().filter(|f| f.is_usable()) {
            let name = format!("signed-{}", signed.filename);
            let path = write_output(dir, &name, signed.signed_xml.as_bytes()).await?;
            ctx.activity
                .track(
                    ActivityRecord::new(ActivityKind::SimpleSign, "signed_file_downloaded")
                        .with_file(name, signed.signed_xml.len() as u64),
                )
                .await;
            written.push(path);
        }

        let path = sign_package::write_package(&result, dir).await?;
        let size = tokio::fs::metadata(&path).await.map_or(0, |m| m.len());
        let name = path
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        ctx.activity
            .track(
                ActivityRecord::new(ActivityKind::SimpleSign, "signed_file_downloaded")
                    .with_file(name, size),
            )
            .await;
        package = Some(path);
    }

    let out = SignOutput {
        summary: result.summary,
        files: rows(&names, &result),
        download_url: result.download_url.clone(),
        written,
        package,
    };
    output(&out, json_mode);

    if out.summary.failed > 0 {
        bail!(
            "{} of {} file(s) did not clear every step",
            out.summary.failed,
            out.summary.total
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{SaveOutcome, SignedFile, ValidationOutcome};

    #[test]
    fn test_rows_join_step_results_by_name() {
        let result = BatchSignResult {
            signed_files: vec![
                SignedFile {
                    filename: "a.xml".to_string(),
                    success: true,
                    signed_xml: "<A/>".to_string(),
                    error: None,
                },
                SignedFile {
                    filename: "b.xml".to_string(),
                    success: false,
                    signed_xml: String::new(),
                    error: Some("bad certificate".to_string()),
                },
            ],
            validation_results: vec![ValidationOutcome::failed("a.xml", "timeout")],
            ttn_results: vec![SaveOutcome {
                file_name: "a.xml".to_string(),
                success: true,
                response: None,
                error: None,
            }],
            download_url: None,
            summary: BatchSummary::compute(2, 1, 1, 0),
        };

        let rows = rows(&["a.xml".to_string(), "b.xml".to_string()], &result);
        assert!(rows[0].signed && rows[0].saved && !rows[0].valid);
        assert_eq!(rows[0].error.as_deref(), Some("timeout"));
        assert!(!rows[1].signed);
        assert_eq!(rows[1].error.as_deref(), Some("bad certificate"));
    }
}
