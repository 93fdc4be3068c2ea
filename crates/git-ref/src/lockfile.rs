//! RAII lock file for atomic reference updates.
//!
//! Matches C git's lock file protocol: create `<path>.lock` with
//! `O_CREAT|O_EXCL`, write the new contents, fsync, then atomically rename
//! over the target. The lock file is removed on drop if never committed.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::RefError;

pub(crate) struct LockFile {
    path: PathBuf,
    lock_path: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl LockFile {
    pub(crate) fn acquire(path: impl AsRef<Path>) -> Result<Self, RefError> {
        let path = path.as_ref().to_path_buf();
        let lock_path = PathBuf::from(format!("{}.lock", path.display()));

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .map_err(|e| RefError::IoPath {
                path: lock_path.clone(),
                source: e,
            })?;

        Ok(Self {
            path,
            lock_path,
            file: Some(file),
            committed: false,
        })
    }

    pub(crate) fn commit(mut self) -> Result<(), RefError> {
        if let Some(ref mut file) = self.file {
            file.flush().map_err(|e| RefError::IoPath {
                path: self.lock_path.clone(),
                source: e,
            })?;
            file.sync_all().map_err(|e| RefError::IoPath {
                path: self.lock_path.clone(),
                source: e,
            })?;
        }
        self.file.take();

        fs::rename(&self.lock_path, &self.path).map_err(|e| RefError::IoPath {
            path: self.lock_path.clone(),
            source: e,
        })?;

        self.committed = true;
        Ok(())
    }
}

impl Write for LockFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("lock file already closed"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("lock file already closed"))?
            .flush()
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if !self.committed {
            self.file.take();
            let _ = fs::remove_file(&self.lock_path);
        }
    }
}
