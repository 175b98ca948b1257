//! JSON Lines sent-event store
//!
//! Every insert appends one JSON object and a newline to the file, so a run
//! marking n events writes n lines. On open the lines are folded into a map;
//! a key that appears more than once keeps its last entry.

use super::traits::SentEventStorage;
use crate::core::state::sent::{SentEventEntry, SentKey};
use crate::domain::{LoaderError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Sent-event store persisted as one JSON object per line
#[derive(Debug)]
pub struct JsonFileSentEventStorage {
    path: PathBuf,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    entries: BTreeMap<SentKey, SentEventEntry>,
    /// Opened on the first insert
    file: Option<File>,
}

impl JsonFileSentEventStorage {
    /// Open a store, loading existing entries if the file exists
    ///
    /// # Errors
    ///
    /// Returns `LoaderError::State` if the file exists but cannot be read or
    /// has a line that is not a sent-event entry.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => parse_lines(&path, &contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(LoaderError::State(format!(
                    "Failed to read sent-event file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::debug!(
            path = %path.display(),
            entries = entries.len(),
            "Opened sent-event file"
        );

        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                entries,
                file: None,
            }),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open_for_append(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    LoaderError::State(format!(
                        "Failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                LoaderError::State(format!("Failed to open {}: {}", self.path.display(), e))
            })
    }
}

fn parse_lines(path: &Path, contents: &str) -> Result<BTreeMap<SentKey, SentEventEntry>> {
    let mut entries = BTreeMap::new();
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: SentEventEntry = serde_json::from_str(line).map_err(|e| {
            LoaderError::State(format!(
                "Failed to parse sent-event file {} at line {}: {}",
                path.display(),
                index + 1,
                e
            ))
        })?;
        entries.insert(entry.key.clone(), entry);
    }
    Ok(entries)
}

#[async_trait]
impl SentEventStorage for JsonFileSentEventStorage {
    async fn contains(&self, key: &SentKey) -> Result<bool> {
        Ok(self.inner.lock().await.entries.contains_key(key))
    }

    async fn insert(&self, entry: SentEventEntry) -> Result<()> {
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut inner = self.inner.lock().await;
        if inner.file.is_none() {
            inner.file = Some(self.open_for_append().await?);
        }
        if let Some(file) = inner.file.as_mut() {
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
        }

        inner.entries.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn all_entries(&self) -> Result<Vec<SentEventEntry>> {
        Ok(self.inner.lock().await.entries.values().cloned().collect())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventName, FormName, SubjectId};
    use tempfile::TempDir;

    fn key(subject: &str, form: &str, event: &str) -> SentKey {
        SentKey::new(
            SubjectId::new(subject).unwrap(),
            FormName::new(form).unwrap(),
            EventName::new(event).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileSentEventStorage::open(dir.path().join("sent.jsonl"))
            .await
            .unwrap();
        assert!(store.all_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("sent.jsonl");

        let store = JsonFileSentEventStorage::open(&path).await.unwrap();
        store
            .insert(SentEventEntry::now(key("S1", "cbc", "E1")))
            .await
            .unwrap();
        store
            .insert(SentEventEntry::now(key("S1", "chem", "E1")))
            .await
            .unwrap();
        drop(store);

        let reopened = JsonFileSentEventStorage::open(&path).await.unwrap();
        assert!(reopened.contains(&key("S1", "cbc", "E1")).await.unwrap());
        assert!(reopened.contains(&key("S1", "chem", "E1")).await.unwrap());
        assert!(!reopened.contains(&key("S2", "cbc", "E1")).await.unwrap());
        assert_eq!(reopened.all_entries().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_state_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sent.jsonl");
        std::fs::write(&path, "{not json").unwrap();

        let result = JsonFileSentEventStorage::open(&path).await;
        assert!(matches!(result, Err(LoaderError::State(_))));
    }

    #[tokio::test]
    async fn test_corrupt_line_is_state_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sent.jsonl");

        let store = JsonFileSentEventStorage::open(&path).await.unwrap();
        store
            .insert(SentEventEntry::now(key("S1", "cbc", "E1")))
            .await
            .unwrap();
        drop(store);

        let mut contents = std::fs::read_to_string(&path).unwrap();
        contents.push_str("{\"subject_id\":\"S2\"\n");
        std::fs::write(&path, contents).unwrap();

        match JsonFileSentEventStorage::open(&path).await {
            Err(LoaderError::State(message)) => assert!(message.contains("line 2"), "{message}"),
            other => panic!("Expected state error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_many_entries_append_one_line_each() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sent.jsonl");

        let store = JsonFileSentEventStorage::open(&path).await.unwrap();
        for i in 0..500 {
            store
                .insert(SentEventEntry::now(key(&format!("S{i}"), "cbc", "E1")))
                .await
                .unwrap();
        }
        // Marking a key again appends; the reopened store keeps one entry
        store
            .insert(SentEventEntry::now(key("S0", "cbc", "E1")))
            .await
            .unwrap();
        drop(store);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 501);

        let reopened = JsonFileSentEventStorage::open(&path).await.unwrap();
        assert_eq!(reopened.all_entries().await.unwrap().len(), 500);
        assert!(reopened.contains(&key("S499", "cbc", "E1")).await.unwrap());

        reopened
            .insert(SentEventEntry::now(key("S500", "cbc", "E1")))
            .await
            .unwrap();
        drop(reopened);
        let again = JsonFileSentEventStorage::open(&path).await.unwrap();
        assert_eq!(again.all_entries().await.unwrap().len(), 501);
    }

    #[tokio::test]
    async fn test_empty_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sent.jsonl");
        std::fs::write(&path, "").unwrap();

        let store = JsonFileSentEventStorage::open(&path).await.unwrap();
        assert!(store.all_entries().await.unwrap().is_empty());
    }
}
