pub mod cli;
pub mod commands;
pub mod config;
pub mod connection;
pub mod harness;
pub mod models;
pub mod service;
pub mod skips;
pub mod snapshot;

pub use cli::{Cli, Commands, CompletionsCommands};
pub use commands::{cmd_info, cmd_prepare, cmd_skips, cmd_teardown, run_options};
pub use config::HarnessConfig;
pub use connection::{Connection, ConnectionSettings, test_database_name};
pub use harness::{
    AdminCommand, AutoConfirm, CACHE_TABLE, ClobberConfirm, CreateCacheTable, Harness,
    PrepareError, PromptConfirm,
};
pub use models::{RunOptions, ServiceFeatures, SkipEntry, Snapshot};
pub use service::{DatabaseAdmin, HttpAdmin, MemoryAdmin, ServiceError};
pub use skips::{ACTIVATION_VAR, SKIP_REASON, SkipRegistry, skips_enabled};
pub use snapshot::{HttpCodec, MemoryCodec, StateCodec};
