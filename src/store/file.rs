//! File-backed event log store.
//!
//! Each identifier's log is a JSON-lines file named by the unpadded base64url
//! SHA-256 digest of the identifier, so names have a fixed length whatever
//! the identifier. Every append writes one line: a JSON array of the events
//! appended. A line only counts once its terminating newline is written, so
//! an interrupted append is never visible.

use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::RwLock;

use super::{EventStore, LockTable, LogLock};
use crate::event::{Event, EventLog};

const EXTENSION: &str = "jsonl";

// Locks for every directory opened in this process, so stores opened
// separately on the same directory exclude each other.
static DIRECTORIES: LazyLock<DashMap<PathBuf, Shared>> = LazyLock::new(DashMap::new);

#[derive(Clone, Debug, Default)]
struct Shared {
    io: Arc<RwLock<()>>,
    ids: LockTable,
}

/// Event logs persisted as `<dir>/<base64url(sha256(id))>.jsonl`.
///
/// All stores on the same directory within a process share their locks: an
/// append is never observed half-written and [`EventStore::lock`] excludes
/// writers going through any of them. Nothing is shared across processes.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
    shared: Shared,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first
    /// append.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let key = std::path::absolute(&dir).unwrap_or_else(|_| dir.clone());
        let shared = DIRECTORIES.entry(key).or_default().clone();
        Self { dir, shared }
    }

    /// Directory holding the log files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn log_path(&self, id: &str) -> PathBuf {
        let name = Base64UrlUnpadded::encode_string(Sha256::digest(id.as_bytes()).as_slice());
        self.dir.join(format!("{name}.{EXTENSION}"))
    }
}

// Length of the complete lines in `contents`. Anything after the last newline
// is left over from an interrupted append.
fn committed_len(contents: &[u8]) -> usize {
    contents.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1)
}

async fn write_record(file: &mut File, at: u64, record: &[u8]) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(at)).await?;
    file.write_all(record).await?;
    file.flush().await
}

impl EventStore for FileStore {
    async fn read(&self, id: &str) -> Result<EventLog> {
        let path = self.log_path(id);
        let _guard = self.shared.io.read().await;

        let contents = match fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(EventLog::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };

        let mut log = EventLog::new();
        let committed = &contents[..committed_len(&contents)];
        for (n, line) in committed.split(|b| *b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let events: EventLog = serde_json::from_slice(line).with_context(|| {
                format!("malformed record on line {} of {}", n + 1, path.display())
            })?;
            log.extend(events);
        }
        Ok(log)
    }

    async fn append(&self, id: &str, events: &[Event]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let mut record = serde_json::to_vec(events)?;
        record.push(b'\n');

        let path = self.log_path(id);
        let _guard = self.shared.io.write().await;

        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let committed = match fs::read(&path).await {
            Ok(contents) => u64::try_from(committed_len(&contents))?,
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .await
            .with_context(|| format!("failed to open {}", path.display()))?;

        // drops the torn tail of an earlier interrupted append, if any
        file.set_len(committed)
            .await
            .with_context(|| format!("failed to truncate {}", path.display()))?;

        if let Err(e) = write_record(&mut file, committed, &record).await {
            tracing::warn!("rolling back failed append to {}: {e}", path.display());
            file.set_len(committed)
                .await
                .with_context(|| format!("failed to roll back {}", path.display()))?;
            return Err(e).with_context(|| format!("failed to write {}", path.display()));
        }

        tracing::trace!("appended {} events to {}", events.len(), path.display());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let path = self.log_path(id);
        let _guard = self.shared.io.write().await;

        let committed = match fs::read(&path).await {
            Ok(contents) => committed_len(&contents),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(committed > 0),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("failed to delete {}", path.display())),
        }
    }

    async fn lock(&self, id: &str) -> LogLock {
        self.shared.ids.lock(id).await
    }
}
