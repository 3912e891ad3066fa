use std::path::{Path, PathBuf};

use async_trait::async_trait;
use readdon_core::ports::ActionLog;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Append-only text log of account actions, one `[tag] message` line per event.
///
/// Each line is also echoed to stdout unless echo is turned off.
pub struct FileActionLog {
    path: PathBuf,
    echo: bool,
}

impl FileActionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            echo: true,
        }
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

fn format_line(tag: &str, message: &str) -> String {
    format!("[{}] {}", tag, message)
}

#[async_trait]
impl ActionLog for FileActionLog {
    async fn record(&self, tag: &str, message: &str) {
        let line = format_line(tag, message);
        debug!(tag, message, "action");

        if let Err(e) = self.append(&format!("{}\n", line)).await {
            warn!(path = %self.path.display(), error = %e, "failed to append to action log");
        }

        if self.echo {
            println!("{}", line);
        }
    }
}
