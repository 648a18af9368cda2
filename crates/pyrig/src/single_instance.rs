use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use fs2::FileExt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("another pyrig run is in progress")]
    AlreadyRunning,
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl LockError {
    fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }
}

/// Exclusive lock held for the whole run; released when dropped.
pub struct RunLock {
    _file: File,
}

impl RunLock {
    pub fn acquire(lock_path: &Path) -> Result<Self, LockError> {
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|error| LockError::io("failed to create lock directory", error))?;
        }

        let mut lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(lock_path)
            .map_err(|error| LockError::io("failed to open run lock file", error))?;

        match lock_file.try_lock_exclusive() {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::WouldBlock => {
                return Err(LockError::AlreadyRunning);
            }
            Err(error) => {
                return Err(LockError::io("failed to acquire run lock", error));
            }
        }

        lock_file
            .set_len(0)
            .and_then(|()| lock_file.seek(SeekFrom::Start(0)).map(|_| ()))
            .and_then(|()| writeln!(lock_file, "{}", std::process::id()))
            .map_err(|error| LockError::io("failed to write run lock metadata", error))?;

        Ok(Self { _file: lock_file })
    }
}

#[cfg(test)]
mod tests {
    use super::{LockError, RunLock};

    #[test]
    fn second_acquire_fails_while_first_is_held() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let lock_path = temp_dir.path().join("data").join("pyrig.lock");

        let first = RunLock::acquire(&lock_path).expect("first lock");
        let second = RunLock::acquire(&lock_path);

        assert!(matches!(second, Err(LockError::AlreadyRunning)));
        assert_eq!(
            second.err().map(|e| e.to_string()),
            Some("another pyrig run is in progress".to_string())
        );
        drop(first);
    }

    #[test]
    fn lock_is_released_on_drop() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let lock_path = temp_dir.path().join("pyrig.lock");

        drop(RunLock::acquire(&lock_path).expect("first lock"));

        assert!(RunLock::acquire(&lock_path).is_ok());
    }
}
