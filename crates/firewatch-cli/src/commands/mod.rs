//! Command implementations for the CLI.

mod config;
mod status;
mod thresholds;
mod watch;

pub use config::cmd_config;
pub use status::cmd_status;
pub use thresholds::{ThresholdChanges, cmd_thresholds_set, cmd_thresholds_show};
pub use watch::{WatchArgs, cmd_watch};
