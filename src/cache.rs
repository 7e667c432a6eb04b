//! File-based cache for per-file analysis results.
//!
//! Entries are keyed by file path, modification time and config fingerprint,
//! so editing a file or changing the configuration misses. The cache lives in
//! `<root>/.logsweep-cache/` by default:
//!
//! ```text
//! index.json          key -> {blob, file_path, timestamp}
//! blobs/<key>.json    serialized CacheEntry
//! ```
//!
//! Every failure here is logged and treated as a miss; a broken cache never
//! fails a run.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::config::ConfigFingerprint;
use crate::detect::FileAnalysisResult;
use crate::fs_util::write_atomic;

const INDEX_FILE: &str = "index.json";
const BLOB_DIR: &str = "blobs";

/// A cached analysis result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub file_path: String,
    /// Unix timestamp in seconds when the entry was written.
    pub timestamp: u64,
    pub payload: FileAnalysisResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexRecord {
    blob: String,
    file_path: String,
    timestamp: u64,
}

type Index = BTreeMap<String, IndexRecord>;

/// In-memory + file-based cache of analysis results.
pub struct AnalysisCache {
    dir: PathBuf,
    ttl_secs: u64,
    /// Mirror of index.json
    index: RwLock<Index>,
    /// Entries read or written during this session
    memory: RwLock<HashMap<String, CacheEntry>>,
    clock: fn() -> u64,
}

impl AnalysisCache {
    /// Open (or create) the cache in `dir`, purging expired entries.
    pub fn open<P: AsRef<Path>>(dir: P, ttl_hours: u64) -> Self {
        Self::open_with_clock(dir, ttl_hours, current_timestamp)
    }

    fn open_with_clock<P: AsRef<Path>>(dir: P, ttl_hours: u64, clock: fn() -> u64) -> Self {
        let dir = dir.as_ref().to_path_buf();
        if let Err(e) = fs::create_dir_all(dir.join(BLOB_DIR)) {
            warn!(dir = %dir.display(), error = %e, "cannot create cache directory");
        }

        let cache = Self {
            index: RwLock::new(read_index(&dir)),
            dir,
            ttl_secs: ttl_hours.saturating_mul(3600),
            memory: RwLock::new(HashMap::new()),
            clock,
        };
        cache.purge_expired();
        cache
    }

    /// Cache key for one (path, mtime, config) triple.
    pub fn key(file_path: &str, mtime: SystemTime, fingerprint: &ConfigFingerprint) -> String {
        let mtime_nanos = mtime
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_nanos();
        let mut hasher = Sha256::new();
        hasher.update(file_path.as_bytes());
        hasher.update([0u8]);
        hasher.update(mtime_nanos.to_string().as_bytes());
        hasher.update([0u8]);
        hasher.update(fingerprint.as_str().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Get a cached result if it exists and is not expired.
    pub fn get(
        &self,
        file_path: &str,
        mtime: SystemTime,
        fingerprint: &ConfigFingerprint,
    ) -> Option<CacheEntry> {
        let key = Self::key(file_path, mtime, fingerprint);
        let now = (self.clock)();

        // Check in-memory cache first
        {
            let memory = self.memory.read().ok()?;
            if let Some(entry) = memory.get(&key) {
                if !self.is_expired(entry.timestamp, now) {
                    return Some(entry.clone());
                }
            }
        }

        let record = {
            let index = self.index.read().ok()?;
            index.get(&key).cloned()?
        };
        if self.is_expired(record.timestamp, now) {
            debug!(file = %file_path, "cache entry expired");
            self.evict(&key);
            return None;
        }

        let blob_path = self.blob_path(&record.blob);
        let entry = fs::read_to_string(&blob_path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_json::from_str::<CacheEntry>(&content).map_err(|e| e.to_string())
            })
            .and_then(|entry| {
                if entry.key == key {
                    Ok(entry)
                } else {
                    Err("key mismatch".to_string())
                }
            });

        match entry {
            Ok(entry) => {
                // Promote to memory cache
                if let Ok(mut memory) = self.memory.write() {
                    memory.insert(key, entry.clone());
                }
                Some(entry)
            }
            Err(error) => {
                warn!(blob = %blob_path.display(), %error, "corrupted cache entry, evicting");
                self.evict(&key);
                None
            }
        }
    }

    /// Store a result in the cache.
    pub fn set(
        &self,
        file_path: &str,
        mtime: SystemTime,
        fingerprint: &ConfigFingerprint,
        result: &FileAnalysisResult,
    ) {
        let key = Self::key(file_path, mtime, fingerprint);
        let entry = CacheEntry {
            key: key.clone(),
            file_path: file_path.to_string(),
            timestamp: (self.clock)(),
            payload: result.clone(),
        };
        let blob = format!("{}.json", key);

        let written = serde_json::to_vec(&entry)
            .map_err(|e| e.to_string())
            .and_then(|bytes| write_atomic(&self.blob_path(&blob), &bytes).map_err(|e| e.to_string()));
        if let Err(error) = written {
            warn!(file = %file_path, %error, "cannot write cache entry");
            return;
        }

        let record = IndexRecord {
            blob,
            file_path: file_path.to_string(),
            timestamp: entry.timestamp,
        };
        if let Ok(mut index) = self.index.write() {
            index.insert(key.clone(), record);
            self.write_index(&index);
        }
        if let Ok(mut memory) = self.memory.write() {
            memory.insert(key, entry);
        }
    }

    /// Remove every entry: blobs first, then the index.
    pub fn clear(&self) {
        let blob_dir = self.dir.join(BLOB_DIR);
        if let Ok(entries) = fs::read_dir(&blob_dir) {
            for entry in entries.flatten() {
                if let Err(e) = fs::remove_file(entry.path()) {
                    warn!(path = %entry.path().display(), error = %e, "cannot remove cache blob");
                }
            }
        }
        let index_path = self.dir.join(INDEX_FILE);
        if index_path.exists() {
            if let Err(e) = fs::remove_file(&index_path) {
                warn!(path = %index_path.display(), error = %e, "cannot remove cache index");
            }
        }
        if let Ok(mut index) = self.index.write() {
            index.clear();
        }
        if let Ok(mut memory) = self.memory.write() {
            memory.clear();
        }
        debug!(dir = %self.dir.display(), "cache cleared");
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.index.read().map(|i| i.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, timestamp: u64, now: u64) -> bool {
        now.saturating_sub(timestamp) >= self.ttl_secs
    }

    fn purge_expired(&self) {
        let now = (self.clock)();
        let Ok(mut index) = self.index.write() else {
            return;
        };
        let expired: Vec<String> = index
            .iter()
            .filter(|(_, record)| self.is_expired(record.timestamp, now))
            .map(|(key, _)| key.clone())
            .collect();
        if expired.is_empty() {
            return;
        }
        for key in &expired {
            if let Some(record) = index.remove(key) {
                let _ = fs::remove_file(self.blob_path(&record.blob));
            }
        }
        debug!(purged = expired.len(), "purged expired cache entries");
        self.write_index(&index);
    }

    fn evict(&self, key: &str) {
        if let Ok(mut memory) = self.memory.write() {
            memory.remove(key);
        }
        if let Ok(mut index) = self.index.write() {
            if let Some(record) = index.remove(key) {
                let _ = fs::remove_file(self.blob_path(&record.blob));
                self.write_index(&index);
            }
        }
    }

    fn write_index(&self, index: &Index) {
        let path = self.dir.join(INDEX_FILE);
        let result = serde_json::to_vec_pretty(index)
            .map_err(|e| e.to_string())
            .and_then(|bytes| write_atomic(&path, &bytes).map_err(|e| e.to_string()));
        if let Err(error) = result {
            warn!(path = %path.display(), %error, "cannot write cache index");
        }
    }

    fn blob_path(&self, blob: &str) -> PathBuf {
        self.dir.join(BLOB_DIR).join(blob)
    }
}

fn read_index(dir: &Path) -> Index {
    let path = dir.join(INDEX_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => return Index::new(),
    };
    match serde_json::from_str(&content) {
        Ok(index) => index,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupted cache index, starting empty");
            Index::new()
        }
    }
}

/// Get current Unix timestamp in seconds.
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}
