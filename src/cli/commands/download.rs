//! Fetch a results archive by URL.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::context::AppContext;
use crate::cli::display::{action_success, output, CommandOutput};
use crate::domain::models::{ActivityKind, ActivityRecord};
use crate::services::ArchiveDownloader;

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Archive URL, absolute or relative to the API base
    pub url: String,

    /// Directory to save into
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct DownloadOutput {
    pub url: String,
    pub path: PathBuf,
}

impl CommandOutput for DownloadOutput {
    fn to_human(&self) -> String {
        action_success(&format!("Archive saved to {}", self.path.display()))
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: DownloadArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let downloader = ArchiveDownloader::new(ctx.client()?);
    let path = downloader.download(&args.url, &args.output).await?;

    let size = tokio::fs::metadata(&path).await.map_or(0, |m| m.len());
    let name = path
        .file_name()
        .map_or_else(|| args.url.clone(), |n| n.to_string_lossy().into_owned());
    ctx.activity
        .track(
            ActivityRecord::new(ActivityKind::QuickSign, "results_downloaded")
                .with_file(name, size),
        )
        .await;

    output(
        &DownloadOutput {
            url: args.url,
            path,
        },
        json_mode,
    );
    Ok(())
}
