//! Flat-file persistence. Mutation volume here is tiny (a warning or a
//! publication every once in a while), so every mutation rewrites the
//! whole file. Each file has exactly one owner component and no outside
//! writers.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Per-user warning counts, backed by a JSON file mapping user IDs to
/// counts. A user is either absent (no warning) or at 1; the second
/// violation kicks them and removes the record instead of counting up.
pub struct WarningStore {
    path: PathBuf,
    map: Mutex<HashMap<u64, u32>>,
}

impl WarningStore {
    /// Load the store from `path`. A missing or corrupt file yields an
    /// empty store with a log line, never an error.
    pub fn load(path: &Path) -> WarningStore {
        let map = match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<HashMap<u64, u32>>(&contents) {
                Ok(map) => map,
                Err(e) => {
                    log::error!(
                        "Warnings file {} is corrupt, starting empty: {}",
                        path.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                log::error!(
                    "Could not read warnings file {}, starting empty: {}",
                    path.display(),
                    e
                );
                HashMap::new()
            }
        };

        WarningStore {
            path: path.to_path_buf(),
            map: Mutex::new(map),
        }
    }

    pub fn get(&self, user_id: u64) -> u32 {
        *self
            .map
            .lock()
            .expect("Warning store lock poisoned")
            .get(&user_id)
            .unwrap_or(&0)
    }

    /// Set the count and write the whole file through.
    pub fn set(&self, user_id: u64, count: u32) -> io::Result<()> {
        let mut map = self.map.lock().expect("Warning store lock poisoned");
        map.insert(user_id, count);
        persist(&self.path, &map)
    }

    /// Remove the record (ban or amnesty) and write through.
    pub fn remove(&self, user_id: u64) -> io::Result<()> {
        let mut map = self.map.lock().expect("Warning store lock poisoned");
        map.remove(&user_id);
        persist(&self.path, &map)
    }

    /// How many users currently carry a warning.
    pub fn len(&self) -> usize {
        self.map.lock().expect("Warning store lock poisoned").len()
    }
}

fn persist(path: &Path, map: &HashMap<u64, u32>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(map)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, json)
}

/// A single published-content fingerprint in a plain text file. A
/// candidate is worth offering for review only if its fingerprint
/// differs from the stored one.
pub struct DedupCursor {
    path: PathBuf,
    value: Mutex<Option<String>>,
}

impl DedupCursor {
    pub fn load(path: &Path) -> DedupCursor {
        let value = match fs::read_to_string(path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                log::error!(
                    "Could not read cursor file {}, starting empty: {}",
                    path.display(),
                    e
                );
                None
            }
        };

        DedupCursor {
            path: path.to_path_buf(),
            value: Mutex::new(value),
        }
    }

    pub fn matches(&self, fingerprint: &str) -> bool {
        self.value
            .lock()
            .expect("Cursor lock poisoned")
            .as_deref()
            == Some(fingerprint)
    }

    /// Remember the fingerprint and write it through to disk.
    pub fn store(&self, fingerprint: &str) -> io::Result<()> {
        let mut value = self.value.lock().expect("Cursor lock poisoned");
        *value = Some(fingerprint.to_string());
        fs::write(&self.path, fingerprint)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn warnings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warnings.json");

        let store = WarningStore::load(&path);
        assert_eq!(store.get(1337), 0);
        store.set(1337, 1).unwrap();
        assert_eq!(store.get(1337), 1);
        assert_eq!(store.len(), 1);

        // A fresh load sees the same state.
        let reloaded = WarningStore::load(&path);
        assert_eq!(reloaded.get(1337), 1);

        reloaded.remove(1337).unwrap();
        assert_eq!(reloaded.get(1337), 0);
        let reloaded_again = WarningStore::load(&path);
        assert_eq!(reloaded_again.len(), 0);
    }

    #[test]
    fn corrupt_warnings_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warnings.json");
        fs::write(&path, "definitely { not json").unwrap();

        let store = WarningStore::load(&path);
        assert_eq!(store.len(), 0);

        // And it recovers on the next write.
        store.set(5, 1).unwrap();
        assert_eq!(WarningStore::load(&path).get(5), 1);
    }

    #[test]
    fn cursor_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor.txt");

        let cursor = DedupCursor::load(&path);
        assert!(!cursor.matches("abc"));
        cursor.store("abc").unwrap();
        assert!(cursor.matches("abc"));
        assert!(!cursor.matches("def"));

        let reloaded = DedupCursor::load(&path);
        assert!(reloaded.matches("abc"));
    }
}
