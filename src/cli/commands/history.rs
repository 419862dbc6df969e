//! Local activity history.

use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;

use crate::cli::context::AppContext;
use crate::cli::display::{
    format_duration_ms, format_timestamp, format_timestamp_opt, list_table, or_dash, output,
    render_list, truncate_ellipsis, CommandOutput,
};
use crate::domain::models::{action_label, ActivityFilter, ActivityKind, DateWindow};
use crate::services::HistoryView;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Only this tool: quicksign, simplesign or validation
    #[arg(short = 't', long = "type")]
    pub kind: Option<String>,

    /// Only this action, e.g. signing_success
    #[arg(short, long)]
    pub action: Option<String>,

    /// Case-insensitive match on file names and action labels
    #[arg(short, long)]
    pub search: Option<String>,

    /// today, week, month or all
    #[arg(long, default_value = "all")]
    pub since: String,

    /// Maximum rows to show
    #[arg(short, long, default_value = "50")]
    pub limit: usize,
}

impl HistoryArgs {
    pub fn filter(&self) -> Result<ActivityFilter> {
        let kind = self
            .kind
            .as_deref()
            .map(str::parse::<ActivityKind>)
            .transpose()
            .map_err(|e| anyhow!(e))?;
        let window = self.since.parse::<DateWindow>().map_err(|e| anyhow!(e))?;
        Ok(ActivityFilter {
            kind,
            action: self.action.clone(),
            search: self.search.clone(),
            window,
        })
    }
}

#[derive(Debug, serde::Serialize)]
pub struct HistoryOutput {
    #[serde(flatten)]
    pub view: HistoryView,
}

impl CommandOutput for HistoryOutput {
    fn to_human(&self) -> String {
        let s = &self.view.summary;
        let mut lines = vec![
            format!(
                "{} {} quick-sign sessions, {} simple-sign runs, {} validations, {} files signed",
                "Summary:".bold(),
                s.total_quicksign_sessions,
                s.total_simplesign_operations,
                s.total_validation_operations,
                s.total_files_signed
            ),
            format!(
                "{} {}  {} {}",
                "Last activity:".bold(),
                format_timestamp_opt(s.last_activity.as_ref()),
                "Avg. time:".bold(),
                format_duration_ms(s.avg_processing_time_ms)
            ),
            String::new(),
        ];

        let mut table = list_table(&["When", "Type", "Action", "Files", "Result"]);
        for record in &self.view.records {
            let result = match (&record.error_message, record.success_count) {
                (Some(error), _) => truncate_ellipsis(error, 40).red().to_string(),
                (None, Some(ok)) => format!("{ok} ok / {} failed", record.error_count.unwrap_or(0)),
                (None, None) => or_dash(None),
            };
            table.add_row(vec![
                format_timestamp(&record.timestamp),
                record.kind.label().to_string(),
                action_label(&record.action).to_string(),
                truncate_ellipsis(&record.file_info(), 32),
                result,
            ]);
        }
        lines.push(render_list("activity", table, self.view.records.len()));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: HistoryArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let filter = args.filter()?;
    let view = ctx.activity.history(&filter, args.limit).await?;
    output(&HistoryOutput { view }, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(kind: Option<&str>, since: &str) -> HistoryArgs {
        HistoryArgs {
            kind: kind.map(str::to_string),
            action: None,
            search: Some("facture".to_string()),
            since: since.to_string(),
            limit: 10,
        }
    }

    #[test]
    fn test_filter_from_args() {
        let filter = args(Some("SimpleSign"), "week").filter().unwrap();
        assert_eq!(filter.kind, Some(ActivityKind::SimpleSign));
        assert_eq!(filter.window, DateWindow::Week);
        assert_eq!(filter.search.as_deref(), Some("facture"));
    }

    #[test]
    fn test_filter_rejects_unknown_values() {
        assert!(args(Some("fax"), "all").filter().is_err());
        assert!(args(None, "yesterday").filter().is_err());
    }
}
