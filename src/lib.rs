pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod storage;

pub use config::{SyncConfig, TargetEntry, DEFAULT_CONFIG_FILE};
pub use core::{
    run_with_shutdown, CancelFlag, EventSink, PairReport, PairStatus, RunReport, SyncEngine,
    SyncEvent, SyncOrchestrator, TargetPair, TargetSession, TracingSink,
};
pub use error::{Result, SyncError};
