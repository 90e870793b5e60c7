//! Command implementations for the scratchdb CLI
//!
//! Each submodule handles a group of related commands.

pub mod misc;
pub mod prepare;
pub mod teardown;

// Re-export commonly used items
pub use misc::{cmd_info, cmd_skips};
pub use prepare::{cmd_prepare, run_options};
pub use teardown::cmd_teardown;
