use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use super::entity::{InterfaceCounters, ProcessCounters, SystemCounters};
use super::rate::DEFAULT_CLOCK_TICKS_PER_SECOND;
use crate::error::SampleError;

/// Physical memory and swap sizes, in bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemoryTotals {
    pub mem_total: u64,
    pub mem_available: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

/// Filesystem capacity as `df` reports it, in bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiskTotals {
    pub total: u64,
    pub available: u64,
    pub used: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FanState {
    Running,
    Stopped,
}

/// Where raw counters come from. The engine never touches the filesystem
/// itself; everything it knows arrives through this trait.
///
/// Every read is a bounded one-shot access. Implementations report
/// [`SampleError`] and leave recovery to the engine.
pub trait SnapshotSource {
    fn read_system_counters(&self) -> Result<SystemCounters, SampleError>;

    /// Fails with [`SampleError::EntityNotFound`] when the process is gone.
    fn read_process_counters(&self, pid: u32) -> Result<ProcessCounters, SampleError>;

    /// Every currently visible pid. An error means enumeration itself is impossible.
    fn list_process_ids(&self) -> Result<Vec<u32>, SampleError>;

    fn read_interface_counters(&self) -> Result<Vec<InterfaceCounters>, SampleError>;

    fn read_memory_totals(&self) -> Result<MemoryTotals, SampleError>;

    fn read_disk_usage(&self, path: &Path) -> Result<DiskTotals, SampleError>;

    /// Degrees Celsius.
    fn read_thermal_zone(&self) -> Result<f64, SampleError>;

    /// RPM of the first fan that answers.
    fn read_fan_speed(&self) -> Result<u32, SampleError>;

    /// Coarse on/off state for platforms that expose one.
    fn read_fan_state(&self) -> Result<FanState, SampleError> {
        Err(SampleError::unavailable(Path::new("fan state")))
    }

    /// Interface name to IPv4 address.
    fn interface_addresses(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn clock_ticks_per_second(&self) -> f64 {
        DEFAULT_CLOCK_TICKS_PER_SECOND
    }
}
