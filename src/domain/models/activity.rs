//! Recorded user actions and the history filter.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Which tool produced the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// Batch upload through the process workflow.
    QuickSign,
    /// Direct signing.
    SimpleSign,
    Validation,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QuickSign => "quicksign",
            Self::SimpleSign => "simplesign",
            Self::Validation => "validation",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::QuickSign => "Quick sign",
            Self::SimpleSign => "Simple sign",
            Self::Validation => "Validation",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quicksign" => Ok(Self::QuickSign),
            "simplesign" => Ok(Self::SimpleSign),
            "validation" => Ok(Self::Validation),
            other => Err(format!(
                "unknown activity type '{other}' (expected quicksign, simplesign or validation)"
            )),
        }
    }
}

/// Action names as stored, with their display labels.
pub const ACTION_LABELS: [(&str, &str); 14] = [
    ("files_uploaded", "Files uploaded"),
    ("process_started", "Process started"),
    ("process_completed", "Process completed"),
    ("process_error", "Process error"),
    ("results_downloaded", "Results downloaded"),
    ("file_selected", "File selected"),
    ("signing_started", "Signing started"),
    ("signing_success", "Signing succeeded"),
    ("signing_error", "Signing error"),
    ("signed_file_downloaded", "Signed file downloaded"),
    ("validation_started", "Validation started"),
    ("validation_success", "Validation succeeded"),
    ("validation_error", "Validation error"),
    ("report_downloaded", "Report downloaded"),
];

/// Human label for an action name; unknown actions pass through.
pub fn action_label(action: &str) -> &str {
    ACTION_LABELS
        .iter()
        .find(|(name, _)| *name == action)
        .map_or(action, |(_, label)| label)
}

/// One row of the activity history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ActivityRecord {
    pub fn new(kind: ActivityKind, action: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            action: action.into(),
            file_name: None,
            file_names: Vec::new(),
            file_count: None,
            file_size: None,
            total_size: None,
            success_count: None,
            error_count: None,
            processing_time_ms: None,
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_file(mut self, name: impl Into<String>, size: u64) -> Self {
        self.file_name = Some(name.into());
        self.file_size = Some(size);
        self
    }

    pub fn with_files(mut self, names: Vec<String>, total_size: u64) -> Self {
        self.file_count = Some(names.len());
        self.file_names = names;
        self.total_size = Some(total_size);
        self
    }

    pub fn with_counts(mut self, file_count: usize, success: usize, errors: usize) -> Self {
        self.file_count = Some(file_count);
        self.success_count = Some(success);
        self.error_count = Some(errors);
        self
    }

    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.processing_time_ms = Some(ms);
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Short description of the files involved.
    pub fn file_info(&self) -> String {
        match self.file_names.as_slice() {
            [single] => return single.clone(),
            [] => {}
            many => return format!("{} files", many.len()),
        }
        if let Some(name) = &self.file_name {
            return name.clone();
        }
        match self.file_count {
            Some(count) => format!("{count} files"),
            None => "-".to_string(),
        }
    }
}

/// Time window for the history view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateWindow {
    Today,
    Week,
    Month,
    #[default]
    All,
}

impl DateWindow {
    /// Earliest timestamp included, relative to `now`.
    pub fn start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Today => now.date_naive().and_hms_opt(0, 0, 0).map(|d| d.and_utc()),
            Self::Week => Some(now - Duration::days(7)),
            Self::Month => now.checked_sub_months(chrono::Months::new(1)),
            Self::All => None,
        }
    }
}

impl FromStr for DateWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" => Ok(Self::All),
            other => Err(format!("unknown window '{other}' (expected today, week, month or all)")),
        }
    }
}

/// Local filter over fetched history rows.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub kind: Option<ActivityKind>,
    pub action: Option<String>,
    pub search: Option<String>,
    pub window: DateWindow,
}

impl ActivityFilter {
    pub fn matches(&self, record: &ActivityRecord, now: DateTime<Utc>) -> bool {
        if self.kind.is_some_and(|kind| kind != record.kind) {
            return false;
        }
        if self.action.as_deref().is_some_and(|a| a != record.action) {
            return false;
        }
        if let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            let hit = record
                .file_name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&term))
                || record
                    .file_names
                    .iter()
                    .any(|n| n.to_lowercase().contains(&term))
                || action_label(&record.action).to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }
        match self.window.start(now) {
            Some(start) => record.timestamp >= start,
            None => true,
        }
    }

    pub fn apply<'a>(&self, records: &'a [ActivityRecord], now: DateTime<Utc>) -> Vec<&'a ActivityRecord> {
        records.iter().filter(|r| self.matches(r, now)).collect()
    }
}

/// Aggregate figures shown above the history table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub total_quicksign_sessions: usize,
    pub total_files_signed: usize,
    pub total_simplesign_operations: usize,
    pub total_validation_operations: usize,
    pub last_activity: Option<DateTime<Utc>>,
    pub avg_processing_time_ms: u64,
}

impl ActivitySummary {
    pub fn from_records(records: &[ActivityRecord]) -> Self {
        let mut summary = Self::default();
        let mut timed = Vec::new();

        for record in records {
            match (record.kind, record.action.as_str()) {
                (ActivityKind::QuickSign, "process_started") => summary.total_quicksign_sessions += 1,
                (ActivityKind::QuickSign, "process_completed") => {
                    summary.total_files_signed += record.success_count.unwrap_or(0);
                }
                (ActivityKind::SimpleSign, "signing_started") => {
                    summary.total_simplesign_operations += 1;
                }
                (ActivityKind::SimpleSign, "signing_success") => summary.total_files_signed += 1,
                (ActivityKind::Validation, "validation_started") => {
                    summary.total_validation_operations += 1;
                }
                _ => {}
            }
            if let Some(ms) = record.processing_time_ms {
                timed.push(ms);
            }
            if summary.last_activity.map_or(true, |last| record.timestamp > last) {
                summary.last_activity = Some(record.timestamp);
            }
        }

        if !timed.is_empty() {
            summary.avg_processing_time_ms = timed.iter().sum::<u64>() / timed.len() as u64;
        }
        summary
    }
}
