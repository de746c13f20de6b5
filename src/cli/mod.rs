//! CLI command implementations

pub mod checkpoint;
pub mod error;
pub mod instances;
pub mod sync;

pub use checkpoint::CheckpointCommand;
pub use error::CliError;
pub use instances::InstancesCommand;
pub use sync::{Cli, Commands, OutputFormat, SyncArgs};
