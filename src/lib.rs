//! Sampling and derivation engine for a system monitor.
//!
//! Raw kernel accounting counters go in; smoothed percentages, rates and a
//! task census come out. See [`system::SamplingEngine`].

pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod system;

pub use error::SampleError;
