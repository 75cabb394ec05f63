use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Exclusive advisory lock around the whole task forest.
///
/// Every write runs as reload → mutate → save while holding this lock, so
/// concurrent `ud` processes are serialized and the last writer wins. The
/// lock is an `flock` on `unidash/.lock` and is released on drop.
pub struct ForestLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("timed out after {waited:?} waiting for {path}: another ud process is writing")]
    Timeout { path: PathBuf, waited: Duration },
}

impl ForestLock {
    /// Block up to `timeout` waiting for the lock in `data_dir`.
    pub fn acquire(data_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = data_dir.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| LockError::Open {
                path: path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        let mut contended = false;
        loop {
            match try_lock(&file) {
                Ok(()) => {
                    if contended {
                        tracing::debug!(waited = ?start.elapsed(), "acquired forest lock");
                    }
                    return Ok(ForestLock { _file: file, path });
                }
                Err(_) if start.elapsed() < timeout => {
                    if !contended {
                        tracing::debug!(path = %path.display(), "forest lock busy, waiting");
                        contended = true;
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(_) => {
                    return Err(LockError::Timeout {
                        path,
                        waited: start.elapsed(),
                    });
                }
            }
        }
    }

    /// Acquire with the default 5 second timeout
    pub fn acquire_default(data_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(data_dir, Duration::from_secs(5))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// The lock file is never removed: all writers must flock the same inode.

#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}
