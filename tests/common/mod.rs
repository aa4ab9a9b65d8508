#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use sysgauge::SampleError;
use sysgauge::system::entity::{InterfaceCounters, ProcessCounters, SystemCounters};
use sysgauge::system::source::{DiskTotals, FanState, MemoryTotals, SnapshotSource};

/// What the scripted source will answer on the next tick.
#[derive(Debug, Default)]
pub struct FakeState {
    pub system: Option<SystemCounters>,
    pub processes: BTreeMap<u32, ProcessCounters>,
    /// Listed by enumeration but gone by the time they are read.
    pub vanished: HashSet<u32>,
    pub list_fails: bool,
    pub interfaces: Option<Vec<InterfaceCounters>>,
    pub memory: Option<MemoryTotals>,
    pub disk: Option<DiskTotals>,
    pub thermal: Option<f64>,
    pub fan_rpm: Option<u32>,
    pub fan_state: Option<FanState>,
    pub addresses: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct FakeSource {
    state: RefCell<FakeState>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.borrow_mut());
    }
}

fn missing(what: &str) -> SampleError {
    SampleError::unavailable(Path::new(what))
}

impl SnapshotSource for FakeSource {
    fn read_system_counters(&self) -> Result<SystemCounters, SampleError> {
        self.state.borrow().system.ok_or_else(|| missing("stat"))
    }

    fn read_process_counters(&self, pid: u32) -> Result<ProcessCounters, SampleError> {
        let state = self.state.borrow();
        if state.vanished.contains(&pid) {
            return Err(SampleError::EntityNotFound { pid });
        }
        state
            .processes
            .get(&pid)
            .cloned()
            .ok_or(SampleError::EntityNotFound { pid })
    }

    fn list_process_ids(&self) -> Result<Vec<u32>, SampleError> {
        let state = self.state.borrow();
        if state.list_fails {
            return Err(missing("proc"));
        }
        let mut pids: Vec<u32> = state.processes.keys().copied().collect();
        pids.extend(state.vanished.iter().copied());
        pids.sort_unstable();
        pids.dedup();
        Ok(pids)
    }

    fn read_interface_counters(&self) -> Result<Vec<InterfaceCounters>, SampleError> {
        self.state
            .borrow()
            .interfaces
            .clone()
            .ok_or_else(|| missing("net/dev"))
    }

    fn read_memory_totals(&self) -> Result<MemoryTotals, SampleError> {
        self.state.borrow().memory.ok_or_else(|| missing("meminfo"))
    }

    fn read_disk_usage(&self, path: &Path) -> Result<DiskTotals, SampleError> {
        self.state
            .borrow()
            .disk
            .ok_or_else(|| SampleError::unavailable(path))
    }

    fn read_thermal_zone(&self) -> Result<f64, SampleError> {
        self.state.borrow().thermal.ok_or_else(|| missing("thermal"))
    }

    fn read_fan_speed(&self) -> Result<u32, SampleError> {
        self.state.borrow().fan_rpm.ok_or_else(|| missing("hwmon"))
    }

    fn read_fan_state(&self) -> Result<FanState, SampleError> {
        self.state.borrow().fan_state.ok_or_else(|| missing("fan"))
    }

    fn interface_addresses(&self) -> HashMap<String, String> {
        self.state.borrow().addresses.clone()
    }
}

pub fn system(busy: u64, idle: u64) -> SystemCounters {
    SystemCounters {
        user: busy,
        idle,
        ..SystemCounters::default()
    }
}

pub fn process(name: &str, state: char, utime: u64, rss_bytes: u64) -> ProcessCounters {
    ProcessCounters {
        name: name.to_string(),
        state,
        utime,
        rss_bytes,
        ..ProcessCounters::default()
    }
}

pub fn interface(name: &str, rx_bytes: u64, tx_bytes: u64) -> InterfaceCounters {
    InterfaceCounters {
        name: name.to_string(),
        rx_bytes,
        tx_bytes,
        ..InterfaceCounters::default()
    }
}
