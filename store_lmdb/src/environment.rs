//! Single-file LMDB environment setup and file management.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvFlags, EnvOpenOptions};

use crate::LmdbError;

/// Wraps one LMDB environment backed by a single data file.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    path: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create a single-file LMDB environment at `path`.
    ///
    /// The parent directory is created if needed. An existing file that is not
    /// a valid LMDB environment makes this fail.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut options = EnvOpenOptions::new();
        options.map_size(map_size).max_dbs(max_dbs);

        // SAFETY: each environment file is owned by exactly one store handle in
        // this process, and nothing else maps it while the handle is alive.
        let env = unsafe {
            options.flags(EnvFlags::NO_SUB_DIR);
            options.open(path)?
        };

        Ok(Self {
            env: Arc::new(env),
            path: path.to_path_buf(),
        })
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the named database, creating it when missing.
    pub fn create_database(&self, name: &str) -> Result<Database<Bytes, Bytes>, LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        let db = self
            .env
            .create_database::<Bytes, Bytes>(&mut wtxn, Some(name))?;
        wtxn.commit()?;
        Ok(db)
    }
}

/// The lock file LMDB keeps next to a `NO_SUB_DIR` data file.
pub fn lock_file_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push("-lock");
    PathBuf::from(name)
}

/// Whether a store file exists at `path`. Absence means "first run".
pub fn env_file_exists(path: &Path) -> bool {
    path.is_file()
}

/// Delete a store's data file and lock file. Missing files are not an error.
pub fn remove_env_files(path: &Path) -> io::Result<()> {
    for file in [path.to_path_buf(), lock_file_path(path)] {
        match fs::remove_file(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_file_sits_next_to_data_file() {
        let lock = lock_file_path(Path::new("/data/blockchain"));
        assert_eq!(lock, PathBuf::from("/data/blockchain-lock"));
    }

    #[test]
    fn open_creates_single_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("store");
        assert!(!env_file_exists(&path));

        let env = LmdbEnvironment::open(&path, 2, 1024 * 1024).expect("open env");
        env.create_database("meta").expect("create db");
        assert!(env_file_exists(&path));
        assert_eq!(env.path(), path.as_path());
    }

    #[test]
    fn remove_tolerates_missing_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent");
        remove_env_files(&path).expect("removing nothing succeeds");
    }

    #[test]
    fn remove_deletes_data_and_lock() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("store");
        {
            let env = LmdbEnvironment::open(&path, 2, 1024 * 1024).expect("open env");
            env.create_database("meta").expect("create db");
        }
        remove_env_files(&path).expect("remove");
        assert!(!path.exists());
        assert!(!lock_file_path(&path).exists());
    }
}
