pub mod files;
pub mod migration;
pub mod port;
pub mod snapshot;

pub use files::{ensure_data_dir, init_local_data_dir, read_import};
pub use migration::load_and_migrate;
pub use port::{FileStatePort, StatePort, DEFAULT_STATE_FILE};
#[cfg(test)]
pub use port::MemoryStatePort;
pub use snapshot::StateSnapshot;
