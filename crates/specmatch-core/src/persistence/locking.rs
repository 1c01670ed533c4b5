//! Cross-platform file locking for persistence.
//!
//! Provides advisory file locking for:
//! - Transaction log (single writer, multiple readers)
//! - Merge coordination (prevent concurrent merges)
//! - Reader handle tracking (detect stale readers)
//!
//! See `docs/PERSISTENCE_DESIGN.md` for locking strategy details.

use crate::persistence::error::{PersistenceError, PersistenceResult};
use std::fs::File;
use std::io;
use std::path::Path;

/// File lock type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockType {
    /// Shared lock (multiple readers)
    Shared,
    /// Exclusive lock (single writer)
    Exclusive,
}

/// Platform-agnostic file lock.
///
/// Automatically unlocks on drop.
pub struct FileLock {
    file: File,
    path: std::path::PathBuf,
    lock_type: LockType,
}

impl FileLock {
    /// Acquire a file lock.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to file to lock
    /// * `lock_type` - Shared (read) or Exclusive (write)
    ///
    /// # Platform Behavior
    ///
    /// - **Linux**: Uses `fcntl` open file description locks (thread-safe, byte-range)
    /// - **Windows**: Uses `LockFileEx` (process-safe, byte-range)
    /// - **macOS/Other Unix**: Uses `flock` for whole-file locking
    pub fn acquire<P: AsRef<Path>>(path: P, lock_type: LockType) -> PersistenceResult<Self> {
        let path = path.as_ref().to_path_buf();
        
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        
        // Open file (create if doesn't exist)
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        
        // Acquire platform-specific lock
        #[cfg(target_os = "linux")]
        {
            use std::os::unix::io::AsRawFd;
            let fd = file.as_raw_fd();
            let lock = libc::flock {
                l_type: match lock_type {
                    LockType::Shared => libc::LOCK_SH as i16,
                    LockType::Exclusive => libc::LOCK_EX as i16,
                },
                l_whence: libc::SEEK_SET as i16,
                l_start: 0,
                l_len: 0,
                l_pid: 0,
            };
            
            if unsafe { libc::fcntl(fd, libc::F_SETLK, &lock) } != 0 {
                return Err(PersistenceError::LockFailed {
                    resource: path.display().to_string(),
                    reason: format!("fcntl failed: {}", io::Error::last_os_error()),
                });
            }
        }
        
        #[cfg(target_os = "windows")]
        {
            use std::os::windows::io::AsRawHandle;
            use winapi::um::fileapi::LockFileEx;
            use winapi::um::minwinbase::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY};
            use winapi::um::winnt::HANDLE;
            
            let handle = file.as_raw_handle() as HANDLE;
            let mut overlapped = std::mem::zeroed();
            
            let flags = match lock_type {
                LockType::Exclusive => LOCKFILE_EXCLUSIVE_LOCK | LOCKFILE_FAIL_IMMEDIATELY,
                LockType::Shared => LOCKFILE_FAIL_IMMEDIATELY,
            };
            
            if unsafe { LockFileEx(handle, flags, 0, !0, !0, &mut overlapped) } == 0 {
                return Err(PersistenceError::LockFailed {
                    resource: path.display().to_string(),
                    reason: format!("LockFileEx failed: {}", io::Error::last_os_error()),
                });
            }
        }
        
        #[cfg(not(any(target_os = "linux", target_os = "windows")))]
        {
            // macOS and other Unix: use flock
            use std::os::unix::io::AsRawFd;
            let fd = file.as_raw_fd();
            let operation = match lock_type {
                LockType::Shared => libc::LOCK_SH,
                LockType::Exclusive => libc::LOCK_EX,
            } | libc::LOCK_NB; // Non-blocking

            if unsafe { libc::flock(fd, operation) } != 0 {
                return Err(PersistenceError::LockFailed {
                    resource: path.display().to_string(),
                    reason: format!("flock failed: {}", io::Error::last_os_error()),
                });
            }
        }
        
        Ok(Self {
            file,
            path,
            lock_type,
        })
    }
    
    /// Get the locked file.
    pub fn file(&self) -> &File {
        &self.file
    }
    
    /// Get the lock type.
    pub fn lock_type(&self) -> LockType {
        self.lock_type
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Release lock on drop
        #[cfg(target_os = "linux")]
        {
            use std::os::unix::io::AsRawFd;
            let fd = self.file.as_raw_fd();
            let unlock = libc::flock {
                l_type: libc::LOCK_UN as i16,
                l_whence: libc::SEEK_SET as i16,
                l_start: 0,
                l_len: 0,
                l_pid: 0,
            };
            unsafe {
                libc::fcntl(fd, libc::F_SETLK, &unlock);
            }
        }

        #[cfg(target_os = "windows")]
        {
            // Windows unlock would go here
            // For now, file handle drop releases the lock
        }

        #[cfg(not(any(target_os = "linux", target_os = "windows")))]
        {
            use std::os::unix::io::AsRawFd;
            let fd = self.file.as_raw_fd();
            unsafe {
                libc::flock(fd, libc::LOCK_UN);
            }
        }
    }
}
