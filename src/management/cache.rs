use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::{
    config::{self, CacheBackend},
    error::{Result, TuneflowError},
};

pub const AI_RESULT_TTL: Duration = Duration::from_secs(60 * 60 * 24);
pub const ALBUM_ART_TTL: Duration = Duration::from_secs(60 * 60 * 24);
pub const FETCH_LOCK_TTL: Duration = Duration::from_secs(30);
pub const PARSED_SONGS_TTL: Duration = Duration::from_secs(60 * 60 * 24);

// MemoryCache drops expired entries once every this many writes.
const SWEEP_EVERY: usize = 64;

/// TTL'd key-value store used to memoize AI results, album art and parsed songs.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Stores `value` only when `key` is absent or expired. Returns whether it was stored.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Removes `key`. Returns whether a live entry existed.
    async fn delete(&self, key: &str) -> Result<bool>;
}

/// Builds the cache backend selected by `CACHE_BACKEND`.
pub fn build_cache(backend: CacheBackend) -> std::sync::Arc<dyn CacheStore> {
    match backend {
        CacheBackend::Memory => std::sync::Arc::new(MemoryCache::new()),
        CacheBackend::File => std::sync::Arc::new(FileCache::new(config::data_dir().join("cache/kv"))),
    }
}

/// In-process cache. Entries vanish with the process.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    writes: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn sweep_due(&self) -> bool {
        (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_EVERY == 0
    }
}

fn sweep(entries: &mut HashMap<String, (String, Instant)>, now: Instant) {
    let before = entries.len();
    entries.retain(|_, (_, expires)| *expires > now);
    let swept = before - entries.len();
    if swept > 0 {
        tracing::debug!(swept, remaining = entries.len(), "swept expired cache entries");
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        if self.sweep_due() {
            sweep(&mut entries, now);
        }
        entries.insert(key.to_string(), (value.to_string(), now + ttl));
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        if matches!(entries.get(key), Some((_, expires)) if *expires > now) {
            return Ok(false);
        }
        if self.sweep_due() {
            sweep(&mut entries, now);
        }
        entries.insert(key.to_string(), (value.to_string(), now + ttl));
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let removed = self.entries.lock().await.remove(key);
        Ok(matches!(removed, Some((_, expires)) if expires > Instant::now()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FileEntry {
    key: String,
    value: String,
    expires_at: i64,
}

/// One JSON file per key under a cache directory, surviving restarts.
///
/// Writes land in a temp file that is renamed over the entry, so readers see
/// either the old or the new entry. Files are only removed under `guard`.
pub struct FileCache {
    root: PathBuf,
    guard: Mutex<()>,
}

enum Slot {
    Missing,
    Live(FileEntry),
    // expired or unparsable
    Stale,
}

impl FileCache {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            guard: Mutex::new(()),
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let hash = Sha256::digest(key.as_bytes());
        self.root.join(format!("{}.json", URL_SAFE_NO_PAD.encode(hash)))
    }

    async fn load(path: &Path) -> Result<Slot> {
        let content = match async_fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Slot::Missing),
            Err(e) => return Err(TuneflowError::Cache(e.to_string())),
        };

        match serde_json::from_str::<FileEntry>(&content) {
            Ok(entry) if entry.expires_at > Utc::now().timestamp() => Ok(Slot::Live(entry)),
            Ok(_) => Ok(Slot::Stale),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "unreadable cache entry");
                Ok(Slot::Stale)
            }
        }
    }

    /// Caller must hold `guard`.
    async fn remove_if_stale(path: &Path) -> Result<()> {
        if let Slot::Stale = Self::load(path).await? {
            tracing::warn!(path = %path.display(), "dropping stale cache entry");
            match async_fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(TuneflowError::Cache(e.to_string())),
            }
        }
        Ok(())
    }

    async fn read_entry(&self, key: &str) -> Result<Option<FileEntry>> {
        let path = self.entry_path(key);
        match Self::load(&path).await? {
            Slot::Live(entry) => Ok(Some(entry)),
            Slot::Missing => Ok(None),
            Slot::Stale => {
                let _guard = self.guard.lock().await;
                // a writer may have replaced the file since the first read
                match Self::load(&path).await? {
                    Slot::Live(entry) => Ok(Some(entry)),
                    Slot::Missing => Ok(None),
                    Slot::Stale => {
                        Self::remove_if_stale(&path).await?;
                        Ok(None)
                    }
                }
            }
        }
    }

    async fn write_entry(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        async_fs::create_dir_all(&self.root)
            .await
            .map_err(|e| TuneflowError::Cache(e.to_string()))?;

        let entry = FileEntry {
            key: key.to_string(),
            value: value.to_string(),
            expires_at: Utc::now().timestamp() + ttl.as_secs() as i64,
        };
        let json = serde_json::to_string(&entry)?;

        let path = self.entry_path(key);
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect();
        let tmp = path.with_extension(format!("{suffix}.tmp"));

        if let Err(e) = async_fs::write(&tmp, json).await {
            let _ = async_fs::remove_file(&tmp).await;
            return Err(TuneflowError::Cache(e.to_string()));
        }
        if let Err(e) = async_fs::rename(&tmp, &path).await {
            let _ = async_fs::remove_file(&tmp).await;
            return Err(TuneflowError::Cache(e.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FileCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_entry(key).await?.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.write_entry(key, value, ttl).await
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let _guard = self.guard.lock().await;
        if let Slot::Live(_) = Self::load(&self.entry_path(key)).await? {
            return Ok(false);
        }
        self.write_entry(key, value, ttl).await?;
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let _guard = self.guard.lock().await;
        let path = self.entry_path(key);
        let existed = matches!(Self::load(&path).await?, Slot::Live(_));
        match async_fs::remove_file(&path).await {
            Ok(()) => Ok(existed),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(TuneflowError::Cache(e.to_string())),
        }
    }
}
