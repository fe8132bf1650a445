//! Persisted integer preferences.
//!
//! The driver keeps a single value here, the last baud rate that was
//! explicitly requested with persistence, so the next session can start at
//! it instead of the power-on rate.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Namespace the printer keys live under
pub const NAMESPACE: &str = "printer";
/// Last negotiated baud rate
pub const KEY_BAUD_RATE: &str = "baud_rate";

/// Integer key/value store.
///
/// Concurrent writers are not coordinated; the last write wins.
pub trait Preferences {
    fn get_int(&self, key: &str) -> Option<i64>;
    fn set_int(&mut self, key: &str, value: i64) -> io::Result<()>;
}

/// In-memory store, lost when dropped.
#[derive(Clone, Debug, Default)]
pub struct MemoryPreferences {
    values: HashMap<String, i64>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Preferences for MemoryPreferences {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    fn set_int(&mut self, key: &str, value: i64) -> io::Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by `<dir>/<namespace>.json`, a JSON object of integers.
///
/// The whole file is rewritten on every `set_int`, through a temporary file
/// that is renamed over the old one. A file that doesn't parse is treated as
/// empty.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: BTreeMap<String, i64>,
}

impl FilePreferences {
    pub fn open<P: AsRef<Path>>(dir: P, namespace: &str) -> io::Result<Self> {
        let path = dir.as_ref().join(format!("{}.json", namespace));
        let values = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable preferences in {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        log::trace!("Loaded {} preference(s) from {}", values.len(), path.display());
        Ok(FilePreferences { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> io::Result<()> {
        let content = serde_json::to_string_pretty(&self.values)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, content)?;
        fs::rename(&staging, &self.path)
    }
}

impl Preferences for FilePreferences {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    fn set_int(&mut self, key: &str, value: i64) -> io::Result<()> {
        self.values.insert(key.to_string(), value);
        self.save()
    }
}
