//! Per-term search history.
//!
//! Each search term owns one [`SearchHistoryEntry`]. Saving merges into the
//! stored entry instead of replacing it: URLs are unioned, new results are
//! appended (a page found again takes its newer result) and the timestamp
//! is refreshed. The file-backed store keeps a JSON object keyed by search
//! term.

use crate::results::PageResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("History file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("History store lock poisoned")]
    Poisoned,
}

/// Everything remembered about earlier searches for one term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub search_text: String,
    pub base_url: String,

    /// Normalized URLs visited by all runs for this term
    #[serde(default)]
    pub urls: Vec<String>,

    #[serde(default)]
    pub results: Vec<PageResult>,

    #[serde(default)]
    pub total_urls: usize,

    /// URLs discovered but not fetched by the most recent run
    #[serde(default)]
    pub skipped_urls: Vec<String>,

    pub last_updated: DateTime<Utc>,
}

impl SearchHistoryEntry {
    pub fn new(search_text: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            search_text: search_text.into(),
            base_url: base_url.into(),
            urls: Vec::new(),
            results: Vec::new(),
            total_urls: 0,
            skipped_urls: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    /// Fold a newer run into this entry
    pub fn merge(&mut self, update: SearchHistoryEntry) {
        let mut known: HashSet<String> = self.urls.iter().cloned().collect();
        for url in update.urls {
            if known.insert(url.clone()) {
                self.urls.push(url);
            }
        }

        // A page found again keeps its position but takes the newer result
        let mut positions: HashMap<String, usize> = self
            .results
            .iter()
            .enumerate()
            .map(|(i, r)| (r.url.clone(), i))
            .collect();
        for result in update.results {
            match positions.get(&result.url) {
                Some(&pos) => self.results[pos] = result,
                None => {
                    positions.insert(result.url.clone(), self.results.len());
                    self.results.push(result);
                }
            }
        }

        self.skipped_urls = update
            .skipped_urls
            .into_iter()
            .filter(|url| !known.contains(url.trim_end_matches('/')))
            .collect();

        self.base_url = update.base_url;
        self.total_urls = self.urls.len();
        self.last_updated = update.last_updated.max(self.last_updated);
    }
}

/// Storage for search history, shared between concurrent searches
pub trait HistoryStore: Send + Sync {
    /// Entry for `term`, if the term was searched before
    fn load(&self, term: &str) -> Result<Option<SearchHistoryEntry>, HistoryError>;

    /// Merge `update` into the entry for its term and return the stored entry
    fn save(&self, update: SearchHistoryEntry) -> Result<SearchHistoryEntry, HistoryError>;

    /// Up to `limit` entries, most recently updated first
    fn recent(&self, limit: usize) -> Result<Vec<SearchHistoryEntry>, HistoryError>;
}

fn merge_into(
    entries: &mut BTreeMap<String, SearchHistoryEntry>,
    mut update: SearchHistoryEntry,
) -> SearchHistoryEntry {
    match entries.get_mut(&update.search_text) {
        Some(existing) => {
            existing.merge(update);
            existing.clone()
        }
        None => {
            update.total_urls = update.urls.len();
            entries.insert(update.search_text.clone(), update.clone());
            update
        }
    }
}

fn most_recent(entries: &BTreeMap<String, SearchHistoryEntry>, limit: usize) -> Vec<SearchHistoryEntry> {
    let mut list: Vec<_> = entries.values().cloned().collect();
    list.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
    list.truncate(limit);
    list
}

/// History kept in process memory
#[derive(Debug, Default)]
pub struct MemoryHistory {
    entries: Mutex<BTreeMap<String, SearchHistoryEntry>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistory {
    fn load(&self, term: &str) -> Result<Option<SearchHistoryEntry>, HistoryError> {
        let entries = self.entries.lock().map_err(|_| HistoryError::Poisoned)?;
        Ok(entries.get(term).cloned())
    }

    fn save(&self, update: SearchHistoryEntry) -> Result<SearchHistoryEntry, HistoryError> {
        let mut entries = self.entries.lock().map_err(|_| HistoryError::Poisoned)?;
        Ok(merge_into(&mut entries, update))
    }

    fn recent(&self, limit: usize) -> Result<Vec<SearchHistoryEntry>, HistoryError> {
        let entries = self.entries.lock().map_err(|_| HistoryError::Poisoned)?;
        Ok(most_recent(&entries, limit))
    }
}

/// History stored as one JSON file, re-read on every access
#[derive(Debug)]
pub struct JsonFileHistory {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileHistory {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, SearchHistoryEntry>, HistoryError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(HistoryError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|source| HistoryError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, SearchHistoryEntry>) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(entries).map_err(|source| HistoryError::Json {
            path: self.path.clone(),
            source,
        })?;

        let io_err = |source: io::Error| HistoryError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        // Write a sibling file, then rename it over the old one
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl HistoryStore for JsonFileHistory {
    fn load(&self, term: &str) -> Result<Option<SearchHistoryEntry>, HistoryError> {
        let _guard = self.lock.lock().map_err(|_| HistoryError::Poisoned)?;
        Ok(self.read_all()?.remove(term))
    }

    fn save(&self, update: SearchHistoryEntry) -> Result<SearchHistoryEntry, HistoryError> {
        let _guard = self.lock.lock().map_err(|_| HistoryError::Poisoned)?;
        let mut entries = self.read_all()?;
        let stored = merge_into(&mut entries, update);
        self.write_all(&entries)?;
        ::log::debug!(
            "Saved history for '{}' ({} URLs) to {}",
            stored.search_text,
            stored.total_urls,
            self.path.display()
        );
        Ok(stored)
    }

    fn recent(&self, limit: usize) -> Result<Vec<SearchHistoryEntry>, HistoryError> {
        let _guard = self.lock.lock().map_err(|_| HistoryError::Poisoned)?;
        Ok(most_recent(&self.read_all()?, limit))
    }
}
