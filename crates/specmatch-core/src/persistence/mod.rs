//! Disk persistence for per-charge ANN index files.
//!
//! # Design
//!
//! - **Atomic writes**: build to a temp file, fsync, then rename into place
//!   ([`directory::Directory::atomic_write`]) — a crash or concurrent reader never
//!   observes a partially-written index.
//! - **Multi-process safety**: advisory file locks ([`locking::FileLock`]) serialize
//!   concurrent rebuilds of the same charge across processes.
//!
//! Format is owned by the ANN backend ([`crate::ann`]); this module only provides the
//! storage primitives.

pub mod directory;
pub mod error;
pub mod locking;

pub use error::PersistenceError;
