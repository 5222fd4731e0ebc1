use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use parking_lot::Mutex;

use super::AuditObserver;
use crate::audit::AuditEvent;
use crate::errors::{Result, TinylinkError};

/// 追加写 JSON Lines 文件，每个事件一行
pub struct FileObserver {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileObserver {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                TinylinkError::file_operation(format!(
                    "Failed to open audit file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditObserver for FileObserver {
    fn name(&self) -> &str {
        "file"
    }

    fn send(&self, event: &AuditEvent) -> anyhow::Result<()> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        self.file
            .lock()
            .write_all(&line)
            .with_context(|| format!("write to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_appends_one_json_object_per_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.log");

        let observer = FileObserver::open(&path).unwrap();
        observer.send(&AuditEvent::shorten("u1", "https://a.io")).unwrap();
        observer.send(&AuditEvent::follow("", "https://a.io")).unwrap();
        drop(observer);

        // 重新打开后继续追加
        let observer = FileObserver::open(&path).unwrap();
        observer.send(&AuditEvent::follow("u2", "https://b.io")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let events: Vec<AuditEvent> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].user_id.as_deref(), Some("u1"));
        assert_eq!(events[1].user_id, None);
        assert_eq!(events[2].url, "https://b.io");
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        let dir = TempDir::new().unwrap();
        let err = FileObserver::open(dir.path().join("missing/audit.log"))
            .err()
            .unwrap();
        assert!(matches!(err, TinylinkError::FileOperation(_)));
    }
}
