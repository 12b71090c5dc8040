// Copyright 2026 Content Hub Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Recent searches, newest first, with on-disk persistence.

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;
use std::time::Instant;

use anyhow::Context;
use anyhow::Result;
use fs2::FileExt;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use time::OffsetDateTime;

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentSearch {
    pub id: String,
    pub query: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct SearchHistory {
    entries: Vec<RecentSearch>,
    limit: usize,
}

impl SearchHistory {
    pub fn new(limit: usize) -> Self {
        Self::with_entries(Vec::new(), limit)
    }

    pub fn with_entries(mut entries: Vec<RecentSearch>, limit: usize) -> Self {
        let limit = if limit == 0 {
            DEFAULT_HISTORY_LIMIT
        } else {
            limit
        };
        entries.truncate(limit);
        Self { entries, limit }
    }

    /// Record a query. Blank queries are ignored; a repeated query moves
    /// to the front instead of appearing twice.
    pub fn add_search(&mut self, query: &str) -> bool {
        self.add_search_at(query, OffsetDateTime::now_utc())
    }

    fn add_search_at(&mut self, query: &str, now: OffsetDateTime) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        self.entries.retain(|entry| entry.query != query);
        self.entries.insert(
            0,
            RecentSearch {
                id: entry_id(query, now),
                query: query.to_string(),
                timestamp: now,
            },
        );
        self.entries.truncate(self.limit);
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let len = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() < len
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[RecentSearch] {
        &self.entries
    }
}

fn entry_id(query: &str, at: OffsetDateTime) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    hasher.update(at.unix_timestamp_nanos().to_le_bytes());
    let hash = hex::encode(hasher.finalize());
    hash[..16].to_string()
}

pub fn load(path: &Path, limit: usize) -> Result<SearchHistory> {
    if !path.exists() {
        return Ok(SearchHistory::new(limit));
    }
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let entries: Vec<RecentSearch> = if text.trim().is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?
    };
    Ok(SearchHistory::with_entries(entries, limit))
}

/// Apply `mutate` to the history on disk under the history lock. The file
/// is reloaded after the lock is taken, so changes made by other processes
/// since the caller last read it are kept.
pub fn update<T>(
    path: &Path,
    limit: usize,
    mutate: impl FnOnce(&mut SearchHistory) -> T,
) -> Result<(SearchHistory, T)> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;

    let _lock = HistoryLock::acquire(path)?;
    let mut history = load(path, limit)?;
    let out = mutate(&mut history);

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    serde_json::to_writer_pretty(&mut tmp, history.entries()).context("encode history")?;
    tmp.write_all(b"\n").context("write history")?;
    tmp.persist(path)
        .with_context(|| format!("replace {}", path.display()))?;
    Ok((history, out))
}

/// Exclusive lock on a per-history lock file. The file is never removed:
/// unlinking it would let a newcomer lock a fresh inode while a waiter
/// still holds the old one.
struct HistoryLock {
    _file: File,
}

impl HistoryLock {
    fn lock_path_for(path: &Path) -> Result<PathBuf> {
        let mut hasher = Sha256::new();
        hasher.update(path.to_string_lossy().as_bytes());
        let hash = hex::encode(hasher.finalize());
        let mut dir = std::env::temp_dir();
        dir.push("contenthub");
        fs::create_dir_all(&dir).with_context(|| format!("create lock dir {}", dir.display()))?;
        Ok(dir.join(format!("history-{}.lock", &hash[..16])))
    }

    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = Self::lock_path_for(path)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("open lock file {}", lock_path.display()))?;
        let deadline = Instant::now() + Duration::from_millis(5000);
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(Self { _file: file }),
                Err(_) if Instant::now() >= deadline => {
                    anyhow::bail!(
                        "history is locked; another process may be writing {}",
                        path.display()
                    );
                }
                Err(_) => sleep(Duration::from_millis(50)),
            }
        }
    }
}
