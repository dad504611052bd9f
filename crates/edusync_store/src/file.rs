//! File-based store for persistent device storage.

use crate::error::{StoreError, StoreResult};
use crate::store::LocalStore;
use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A file-based key/value store.
///
/// Each key maps to one file under a data directory. Values are replaced by
/// writing to a temporary file in the same directory and renaming it over the
/// old one, so a crash mid-write never leaves a torn snapshot behind.
///
/// # Thread Safety
///
/// A single lock serializes writers; renames keep readers consistent.
///
/// # Example
///
/// ```no_run
/// use edusync_store::{FileStore, LocalStore};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("./edusync-data")).unwrap();
/// store.put("snapshot", b"{}").unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: &Path) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the data directory this store writes into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
                reason: "key must not be empty",
            });
        }
        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
                reason: "key must be alphanumeric with '_' or '-'",
            });
        }
        Ok(self.dir.join(format!("{key}.dat")))
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!("{key}.tmp"));

        let _guard = self.write_lock.lock();
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_the_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested").join("data");

        let store = FileStore::open(&nested).unwrap();
        assert!(nested.exists());
        assert_eq!(store.dir(), nested);
    }

    #[test]
    fn get_put_remove() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert_eq!(store.get("snapshot").unwrap(), None);

        store.put("snapshot", b"{\"v\":1}").unwrap();
        assert_eq!(store.get("snapshot").unwrap(), Some(b"{\"v\":1}".to_vec()));

        store.put("snapshot", b"{\"v\":2}").unwrap();
        assert_eq!(store.get("snapshot").unwrap(), Some(b"{\"v\":2}".to_vec()));

        store.remove("snapshot").unwrap();
        assert_eq!(store.get("snapshot").unwrap(), None);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            store.put("channel", b"abc123").unwrap();
        }
        {
            let store = FileStore::open(dir.path()).unwrap();
            assert_eq!(store.get("channel").unwrap(), Some(b"abc123".to_vec()));
        }
    }

    #[test]
    fn rejects_path_like_keys() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert!(matches!(
            store.put("../escape", b"x"),
            Err(StoreError::InvalidKey { .. })
        ));
        assert!(matches!(
            store.get(""),
            Err(StoreError::InvalidKey { .. })
        ));
    }

    #[test]
    fn remove_absent_key_is_ok() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.remove("missing").is_ok());
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.put("snapshot", b"data").unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
