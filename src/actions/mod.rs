//! File actions module.
//!
//! The mover applies a [`Partition`](crate::dedupe::Partition) to disk:
//! - Move into a mirrored trash directory (default, recoverable by hand)
//! - Move to the system trash
//! - Permanent deletion (requires explicit confirmation on the command line)
//!
//! ```no_run
//! use dupetree::actions::{dispose, Disposal};
//! use std::path::Path;
//!
//! let result = dispose(Path::new("/path/to/duplicate.txt"), &Disposal::SystemTrash);
//! ```

pub mod mover;

pub use mover::{
    dispose, trash_target, BatchMoveResult, Disposal, ExecuteError, MoveConfig, MoveError,
    MoveResult, Mover,
};
