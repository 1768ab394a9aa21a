//! Generated deck files: naming, writing and retention.

use crate::deck::Deck;
use crate::error::{Error, Result};
use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

/// Prefix of every generated file name.
pub const FILE_PREFIX: &str = "generated_ppt_";
/// Extension of every generated file name.
pub const FILE_EXTENSION: &str = "pptx";

/// What happens to a generated file after it has been served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionPolicy {
    /// Files stay on disk.
    Keep,
    /// A file is removed once its bytes are loaded for the response.
    #[default]
    DeleteAfterSend,
    /// Files older than the given age are swept at startup and before each
    /// save.
    MaxAge(Duration),
}

impl FromStr for RetentionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "keep" => Ok(RetentionPolicy::Keep),
            "delete-after-send" => Ok(RetentionPolicy::DeleteAfterSend),
            other => other
                .strip_prefix("max-age=")
                .and_then(|secs| secs.parse::<u64>().ok())
                .map(|secs| RetentionPolicy::MaxAge(Duration::from_secs(secs)))
                .ok_or_else(|| {
                    Error::InvalidData(format!(
                        "unknown retention policy '{}' (expected keep, delete-after-send or max-age=<secs>)",
                        other
                    ))
                }),
        }
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionPolicy::Keep => f.write_str("keep"),
            RetentionPolicy::DeleteAfterSend => f.write_str("delete-after-send"),
            RetentionPolicy::MaxAge(age) => write!(f, "max-age={}", age.as_secs()),
        }
    }
}

impl Serialize for RetentionPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RetentionPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A deck written to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// 32 lowercase hex characters.
    pub id: String,
    pub path: PathBuf,
}

impl GeneratedFile {
    pub fn file_name(&self) -> String {
        file_name_for(&self.id)
    }
}

/// A fresh random file id: 16 random bytes as hex.
pub fn generate_id() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

fn file_name_for(id: &str) -> String {
    format!("{}{}.{}", FILE_PREFIX, id, FILE_EXTENSION)
}

/// The id inside a generated file name.
fn generated_id(name: &str) -> Option<&str> {
    name.strip_prefix(FILE_PREFIX)
        .and_then(|rest| rest.strip_suffix(".pptx"))
        .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_hexdigit()))
}


/// The directory generated decks are written to, plus its retention policy.
///
/// Clones share the set of files saved but not yet taken; a sweep never
/// removes those.
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
    retention: RetentionPolicy,
    pending: Arc<Mutex<HashSet<String>>>,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>, retention: RetentionPolicy) -> Self {
        Self {
            dir: dir.into(),
            retention,
            pending: Arc::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Create the output directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Write `bytes` under a fresh random name.
    ///
    /// A failed sweep is logged and does not fail the save.
    pub fn save(&self, bytes: &[u8]) -> Result<GeneratedFile> {
        self.sweep_or_warn();
        self.ensure_dir()?;

        let file = self.new_file();
        if let Err(e) = std::fs::write(&file.path, bytes) {
            self.pending().remove(&file.id);
            return Err(e.into());
        }
        info!("saved {} ({} bytes)", file.path.display(), bytes.len());
        Ok(file)
    }

    /// Serialize and write a deck.
    pub fn save_deck(&self, deck: &Deck<'_>) -> Result<GeneratedFile> {
        let bytes = deck.to_bytes()?;
        self.save(&bytes)
    }

    /// Write `bytes` without blocking the async runtime.
    #[cfg(feature = "async")]
    pub async fn save_async(&self, bytes: Vec<u8>) -> Result<GeneratedFile> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.sweep_or_warn())
            .await
            .map_err(|e| Error::Io(io::Error::other(e)))?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let file = self.new_file();
        if let Err(e) = tokio::fs::write(&file.path, &bytes).await {
            self.pending().remove(&file.id);
            return Err(e.into());
        }
        info!("saved {} ({} bytes)", file.path.display(), bytes.len());
        Ok(file)
    }

    /// Load a generated file for sending, applying the retention policy.
    pub fn take(&self, file: &GeneratedFile) -> Result<Vec<u8>> {
        let read = std::fs::read(&file.path);
        self.pending().remove(&file.id);
        let bytes = read?;
        if self.retention == RetentionPolicy::DeleteAfterSend {
            match std::fs::remove_file(&file.path) {
                Ok(()) => debug!("removed {}", file.path.display()),
                Err(e) => warn!("could not remove {}: {}", file.path.display(), e),
            }
        }
        Ok(bytes)
    }

    /// Remove generated files older than the `MaxAge` limit. Other policies
    /// and a missing directory sweep nothing.
    ///
    /// Files that vanish mid-sweep (another request swept them first) are
    /// skipped, as are files saved but not yet taken.
    pub fn sweep(&self) -> Result<usize> {
        let RetentionPolicy::MaxAge(max_age) = self.retention else {
            return Ok(0);
        };
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let now = SystemTime::now();
        let mut removed = 0;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            let name = entry.file_name();
            let Some(id) = name.to_str().and_then(generated_id) else {
                continue;
            };
            if self.pending().contains(id) {
                continue;
            }

            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if now.duration_since(modified).unwrap_or_default() < max_age {
                continue;
            }
            match std::fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        if removed > 0 {
            info!("swept {} expired file(s) from {}", removed, self.dir.display());
        }
        Ok(removed)
    }

    fn sweep_or_warn(&self) {
        if let Err(e) = self.sweep() {
            warn!("sweeping {} failed: {}", self.dir.display(), e);
        }
    }

    /// Registers the new id as pending before anything is written.
    fn new_file(&self) -> GeneratedFile {
        let id = generate_id();
        self.pending().insert(id.clone());
        let path = self.dir.join(file_name_for(&id));
        GeneratedFile { id, path }
    }

    fn pending(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked.
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id() {
        let a = generate_id();
        let b = generate_id();
        assert_eq!(a.len(), 32);
        assert!(a.bytes().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_retention_parsing() {
        assert_eq!("keep".parse::<RetentionPolicy>().unwrap(), RetentionPolicy::Keep);
        assert_eq!(
            "delete-after-send".parse::<RetentionPolicy>().unwrap(),
            RetentionPolicy::DeleteAfterSend
        );
        assert_eq!(
            "max-age=3600".parse::<RetentionPolicy>().unwrap(),
            RetentionPolicy::MaxAge(Duration::from_secs(3600))
        );
        assert!("max-age=soon".parse::<RetentionPolicy>().is_err());
        assert!("forever".parse::<RetentionPolicy>().is_err());

        for policy in [
            RetentionPolicy::Keep,
            RetentionPolicy::DeleteAfterSend,
            RetentionPolicy::MaxAge(Duration::from_secs(60)),
        ] {
            assert_eq!(policy.to_string().parse::<RetentionPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_retention_serde() {
        let policy: RetentionPolicy = serde_json::from_str("\"max-age=10\"").unwrap();
        assert_eq!(policy, RetentionPolicy::MaxAge(Duration::from_secs(10)));
        assert_eq!(
            serde_json::to_string(&RetentionPolicy::Keep).unwrap(),
            "\"keep\""
        );
    }

    #[test]
    fn test_generated_name_filter() {
        let id = generate_id();
        assert_eq!(generated_id(&file_name_for(&id)), Some(id.as_str()));
        assert_eq!(generated_id("generated_ppt_.pptx"), None);
        assert_eq!(generated_id("notes.pptx"), None);
        assert_eq!(generated_id("generated_ppt_xyz.pptx"), None);
    }

    #[test]
    fn test_save_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::new(tmp.path().join("nested/out"), RetentionPolicy::Keep);

        let file = store.save(b"deck").unwrap();
        assert!(file.path.is_file());
        assert_eq!(file.path.file_name().unwrap().to_str().unwrap(), file.file_name());

        // Existing directory is fine.
        let second = store.save(b"deck").unwrap();
        assert_ne!(file.path, second.path);
    }

    #[test]
    fn test_take_honors_retention() {
        let tmp = tempfile::tempdir().unwrap();

        let keep = OutputStore::new(tmp.path(), RetentionPolicy::Keep);
        let file = keep.save(b"kept").unwrap();
        assert_eq!(keep.take(&file).unwrap(), b"kept");
        assert!(file.path.exists());

        let delete = OutputStore::new(tmp.path(), RetentionPolicy::DeleteAfterSend);
        let file = delete.save(b"gone").unwrap();
        assert_eq!(delete.take(&file).unwrap(), b"gone");
        assert!(!file.path.exists());
    }

    #[test]
    fn test_sweep_removes_only_expired_generated_files() {
        let tmp = tempfile::tempdir().unwrap();
        let keep = OutputStore::new(tmp.path(), RetentionPolicy::Keep);
        let file = keep.save(b"old").unwrap();
        std::fs::write(tmp.path().join("readme.txt"), "x").unwrap();

        assert_eq!(keep.sweep().unwrap(), 0);

        let sweeping = OutputStore::new(tmp.path(), RetentionPolicy::MaxAge(Duration::ZERO));
        assert_eq!(sweeping.sweep().unwrap(), 1);
        assert!(!file.path.exists());
        assert!(tmp.path().join("readme.txt").exists());
    }

    #[test]
    fn test_sweep_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::new(
            tmp.path().join("absent"),
            RetentionPolicy::MaxAge(Duration::from_secs(1)),
        );
        assert_eq!(store.sweep().unwrap(), 0);
    }

    #[test]
    fn test_concurrent_sweeps_tolerate_vanished_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::new(tmp.path(), RetentionPolicy::MaxAge(Duration::ZERO));

        for _ in 0..50 {
            for _ in 0..20 {
                std::fs::write(tmp.path().join(file_name_for(&generate_id())), b"old").unwrap();
            }
            let removed: usize = std::thread::scope(|scope| {
                let handles: Vec<_> = (0..4)
                    .map(|_| scope.spawn(|| store.sweep().unwrap()))
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).sum()
            });
            assert_eq!(removed, 20);
            assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
        }
    }

    #[test]
    fn test_max_age_save_and_take_under_concurrency() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::new(tmp.path().join("out"), RetentionPolicy::MaxAge(Duration::ZERO));

        std::thread::scope(|scope| {
            for worker in 0..8u8 {
                let store = store.clone();
                scope.spawn(move || {
                    for i in 0..100u8 {
                        let body = [worker, i];
                        let file = store.save(&body).unwrap();
                        assert_eq!(store.take(&file).unwrap(), body);
                    }
                });
            }
        });

        // Everything was taken, so the next sweep may clear it all.
        store.sweep().unwrap();
        assert_eq!(std::fs::read_dir(store.dir()).unwrap().count(), 0);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_save_async() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::new(tmp.path().join("out"), RetentionPolicy::Keep);
        let file = store.save_async(b"deck".to_vec()).await.unwrap();
        assert_eq!(std::fs::read(&file.path).unwrap(), b"deck");
    }
}
