//! One module per subcommand, each exposing `execute`.

pub mod auth;
pub mod certificates;
pub mod download;
pub mod history;
pub mod process;
pub mod progress;
pub mod sign;
pub mod ttn;
pub mod validate;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::domain::models::FileHandle;

/// Stat every path given on the command line.
pub(crate) async fn stat_files(paths: &[PathBuf]) -> Result<Vec<FileHandle>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = FileHandle::from_path(path)
            .await
            .with_context(|| format!("Cannot read {}", path.display()))?;
        files.push(file);
    }
    Ok(files)
}

/// Write `contents` to `dir/name`, creating `dir` first.
pub(crate) async fn write_output(dir: &Path, name: &str, contents: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(name);
    tokio::fs::write(&path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
