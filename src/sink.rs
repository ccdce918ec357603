use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;

/// Append-only text log of every relayed line.
/// The file is opened and closed on each write.
#[derive(Debug, Clone)]
pub struct MessageLog {
    path: PathBuf,
}

impl MessageLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, line: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create directories: {}", parent.display())
            })?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open log file: {}", self.path.display()))?;

        file.write_all(format!("{}\n", line).as_bytes())
            .await
            .with_context(|| format!("Failed to write log file: {}", self.path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("Failed to flush log file: {}", self.path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_creates_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let log = MessageLog::new(dir.path().join("messages_log.txt"));

        log.append("[t1] A: first").await.unwrap();
        log.append("[t2] B: second").await.unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content, "[t1] A: first\n[t2] B: second\n");
    }

    #[tokio::test]
    async fn test_append_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(&path, "older line\n").unwrap();

        MessageLog::new(&path).append("newer line").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "older line\nnewer line\n");
    }

    #[tokio::test]
    async fn test_append_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let log = MessageLog::new(dir.path().join("nested/deeper/log.txt"));
        log.append("x").await.unwrap();
        assert!(log.path().exists());
    }

    #[tokio::test]
    async fn test_append_to_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let log = MessageLog::new(dir.path());
        assert!(log.append("x").await.is_err());
    }
}
