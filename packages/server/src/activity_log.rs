use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tokio::io::AsyncWriteExt;

/// Flat-file audit trail for mutating operations.
///
/// Lines are formatted `[YYYY-MM-DD HH:MM:SS] ACTION: details`. Concurrent
/// writers may interleave lines; the file is a human-readable trail, not a
/// machine-parsed format. Append failures are logged and never fail the
/// surrounding request.
#[derive(Clone)]
pub struct ActivityLog {
    path: Arc<PathBuf>,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. Best-effort: failures are reported via `tracing`.
    pub async fn append(&self, action: &str, details: &str) {
        let line = format!(
            "[{}] {}: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            action,
            details
        );

        if let Err(e) = self.try_append(&line).await {
            tracing::warn!("Failed to write activity log entry: {}", e);
        }
    }

    async fn try_append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.as_ref())
            .await?;
        file.write_all(line.as_bytes()).await?;
        // tokio buffers writes; without this the entry may still be in
        // memory when a reader (or process exit) comes along.
        file.flush().await?;
        Ok(())
    }

    /// All entries, newest first. A missing file reads as no entries.
    pub async fn entries(&self) -> std::io::Result<Vec<String>> {
        match tokio::fs::read_to_string(self.path.as_ref()).await {
            Ok(content) => {
                let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
                lines.reverse();
                Ok(lines)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Raw file contents, oldest first (for download).
    pub async fn raw(&self) -> std::io::Result<String> {
        match tokio::fs::read_to_string(self.path.as_ref()).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e),
        }
    }

    /// Truncate the log file.
    pub async fn clear(&self) -> std::io::Result<()> {
        match tokio::fs::remove_file(self.path.as_ref()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
