use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::census::TaskCounts;
use super::entity::InterfaceCounters;
use super::rate::{InterfaceRate, percentage};
use super::source::{DiskTotals, FanState, MemoryTotals};

/// Capacity figures for memory, swap, or a filesystem. Bytes, plus `used`
/// as a share of `total`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct UsageInfo {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub percentage: f64,
}

impl UsageInfo {
    pub fn new(total: u64, used: u64, available: u64) -> Self {
        Self {
            total,
            used,
            available,
            percentage: percentage(used, total),
        }
    }

    pub fn memory(totals: &MemoryTotals) -> Self {
        let used = totals.mem_total.saturating_sub(totals.mem_available);
        Self::new(totals.mem_total, used, totals.mem_available)
    }

    pub fn swap(totals: &MemoryTotals) -> Self {
        let used = totals.swap_total.saturating_sub(totals.swap_free);
        Self::new(totals.swap_total, used, totals.swap_free)
    }

    pub fn disk(totals: &DiskTotals) -> Self {
        Self::new(totals.total, totals.used, totals.available)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NetworkInterfaceInfo {
    pub name: String,
    /// First IPv4 address, or `N/A`.
    pub ip: String,
    pub counters: InterfaceCounters,
    pub rates: InterfaceRate,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessRow {
    pub pid: u32,
    pub name: String,
    pub state: char,
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub enum SensorReading {
    Celsius(f64),
    #[default]
    NotAvailable,
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorReading::Celsius(c) => write!(f, "{c:.1}°C"),
            SensorReading::NotAvailable => f.write_str("Not Available"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum FanStatus {
    Active(Option<u32>),
    Inactive(Option<u32>),
    #[default]
    NotDetected,
}

impl FanStatus {
    /// An explicit on/off state wins over a tachometer reading.
    pub fn derive(state: Option<FanState>, rpm: Option<u32>) -> Self {
        match (state, rpm) {
            (Some(FanState::Running), _) => FanStatus::Active(None),
            (Some(FanState::Stopped), _) => FanStatus::Inactive(None),
            (None, Some(0)) => FanStatus::Inactive(Some(0)),
            (None, Some(rpm)) => FanStatus::Active(Some(rpm)),
            (None, None) => FanStatus::NotDetected,
        }
    }
}

impl fmt::Display for FanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FanStatus::Active(None) => f.write_str("Active"),
            FanStatus::Active(Some(rpm)) => write!(f, "Active ({rpm} RPM)"),
            FanStatus::Inactive(None) => f.write_str("Inactive"),
            FanStatus::Inactive(Some(rpm)) => write!(f, "Inactive ({rpm} RPM)"),
            FanStatus::NotDetected => f.write_str("Not Detected"),
        }
    }
}

/// Everything the engine knows after one tick, copied out.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SystemSnapshot {
    /// Smoothed and rounded.
    pub cpu_percent: f64,
    pub cpu_raw_percent: f64,
    pub memory: UsageInfo,
    pub swap: UsageInfo,
    pub disk_path: PathBuf,
    pub disk: UsageInfo,
    pub tasks: TaskCounts,
    pub interfaces: Vec<NetworkInterfaceInfo>,
    pub thermal: SensorReading,
    pub fan: FanStatus,
    pub processes: Vec<ProcessRow>,
}
