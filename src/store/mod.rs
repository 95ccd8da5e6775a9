//! Persistent hash store.
//!
//! Scans are stored in SQLite so that duplicate detection can run over many
//! directories hashed at different times, and so that unchanged files are
//! not hashed twice.
//!
//! # Architecture
//!
//! * [`database`]: schema, queries and maintenance operations.
//! * [`record`]: the stat data stored per file.
//!
//! # Cache Invalidation
//!
//! A cached hash is reused only if the file's path, size, inode, mtime and
//! ctime are all unchanged. Anything else means the file is hashed again.

pub mod database;
pub mod record;

pub use database::{HashStore, PurgeSummary, StoreError, StoreResult};
pub use record::{FileRecord, StoredFile};
