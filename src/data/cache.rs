//! Per-file extraction cache.
//!
//! One JSON blob per source path. An entry, once written, is returned for
//! that exact path string forever; nothing checks whether the source file
//! changed since. Empty extractions are never stored.
//!
//! Writes go through a temp file in the destination directory and are
//! renamed into place, and each key is computed under its own lock, so
//! concurrent requests for the same path extract once and never observe a
//! half-written blob.

use std::collections::HashMap;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::config::CacheSettings;
use crate::error::Result;

use super::model::ExtractedFile;
use super::pdf::PeakExtractor;

/// Cache storage failures. These never reach callers of
/// [`ExtractionCache::get_or_compute`]; they are logged and the request falls
/// back to extracting without persisting.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("reading cache entry {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("decoding cache entry {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("writing cache entry {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("encoding cache entry {}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("moving cache entry into place at {}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}

/// Where and whether extraction results are persisted.
#[derive(Debug)]
pub struct ExtractionCache {
    enabled: bool,
    root: Option<PathBuf>,
    suffix: String,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ExtractionCache {
    pub fn new(settings: &CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            root: settings.root.clone(),
            suffix: settings.suffix.clone(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// A cache that never reads or writes anything.
    pub fn disabled() -> Self {
        Self::new(&CacheSettings {
            enabled: false,
            ..CacheSettings::default()
        })
    }

    /// Blob location for a source path: `<path><suffix>` next to the source,
    /// or the escaped path under the configured root.
    pub fn entry_path(&self, source: &Path) -> PathBuf {
        let key = source.to_string_lossy();
        match &self.root {
            Some(root) => root.join(format!("{}{}", escape_key(&key), self.suffix)),
            None => PathBuf::from(format!("{key}{}", self.suffix)),
        }
    }

    /// Return the cached table for `source`, extracting (and persisting a
    /// non-empty result) on a miss.
    pub fn get_or_compute(
        &self,
        source: &Path,
        extractor: &dyn PeakExtractor,
    ) -> Result<ExtractedFile> {
        if !self.enabled {
            return extractor.extract(source);
        }

        let key = source.to_string_lossy().into_owned();
        let key_lock = self.key_lock(&key);
        let result = {
            let _guard = key_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.load_or_extract(source, extractor)
        };
        self.release(&key, key_lock);
        result
    }

    fn load_or_extract(
        &self,
        source: &Path,
        extractor: &dyn PeakExtractor,
    ) -> Result<ExtractedFile> {
        let entry = self.entry_path(source);
        match self.load(&entry) {
            Ok(Some(file)) => {
                log::info!("- Data loaded: {}", entry.display());
                return Ok(file);
            }
            Ok(None) => {}
            Err(e) => log::warn!("{e:#}; re-extracting {}", source.display()),
        }

        let file = extractor.extract(source)?;
        if file.is_empty() {
            log::debug!("not caching empty result for {}", source.display());
            return Ok(file);
        }
        match self.store(&entry, &file) {
            Ok(()) => log::info!("+ Data saved: {}", entry.display()),
            Err(e) => log::warn!("{e:#}; continuing without cache"),
        }
        Ok(file)
    }

    fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key.to_owned()).or_default().clone()
    }

    /// Give back a key lock, dropping the map entry when nobody else holds
    /// or waits on it.
    fn release(&self, key: &str, key_lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        drop(key_lock);
        if locks.get(key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(key);
        }
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn load(&self, entry: &Path) -> std::result::Result<Option<ExtractedFile>, CacheError> {
        let file = match fs::File::open(entry) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CacheError::Read {
                    path: entry.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_reader(BufReader::new(file))
            .map(Some)
            .map_err(|source| CacheError::Decode {
                path: entry.to_path_buf(),
                source,
            })
    }

    fn store(&self, entry: &Path, file: &ExtractedFile) -> std::result::Result<(), CacheError> {
        let write_err = |source| CacheError::Write {
            path: entry.to_path_buf(),
            source,
        };
        let dir = match entry.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(write_err)?;

        let tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(&mut writer, file).map_err(|source| CacheError::Encode {
                path: entry.to_path_buf(),
                source,
            })?;
            writer.flush().map_err(write_err)?;
        }
        tmp.persist(entry).map_err(|source| CacheError::Persist {
            path: entry.to_path_buf(),
            source,
        })?;
        Ok(())
    }
}

/// Flatten a path into a single file name, reversibly.
fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for ch in key.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            '\\' => out.push_str("%5C"),
            ':' => out.push_str("%3A"),
            c => out.push(c),
        }
    }
    out
}
