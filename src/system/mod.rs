pub mod census;
pub mod counter_store;
pub mod engine;
pub mod entity;
pub mod fan;
pub mod platform;
pub mod procfs;
pub mod rate;
pub mod smoothing;
pub mod snapshot;
pub mod source;

pub use engine::{SamplingConfig, SamplingEngine};
pub use procfs::ProcfsSource;
pub use source::SnapshotSource;
