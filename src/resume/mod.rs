//! Resume capability for incremental sync
//!
//! Stores one checkpoint per instance in the object store so later runs skip
//! files that were already captured.

pub mod checkpoint;
pub mod state;

pub use checkpoint::{Checkpoint, CheckpointPolicy, Disposition};
pub use state::{checkpoint_key, read_checkpoint, write_checkpoint, ResumeError};
