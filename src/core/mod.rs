pub mod comparator;
pub mod engine;
pub mod events;
pub mod filter;
pub mod orchestrator;
pub mod scanner;
pub mod target;

pub use comparator::{checksum_crc32, CompareConfig, FileComparator};
pub use engine::SyncEngine;
pub use events::{format_size, EventSink, SyncEvent, TracingSink};
pub use filter::FilterSpec;
pub use orchestrator::{run_with_shutdown, CancelFlag, RunReport, SyncOrchestrator};
pub use target::{Counters, PairReport, PairStatus, TargetPair, TargetSession};
