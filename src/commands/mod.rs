pub mod sync;

pub use sync::{run_config, run_config_file, run_config_files};
