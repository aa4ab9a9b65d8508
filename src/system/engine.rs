use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, debug_span, trace};

use super::census::{TaskCensus, TaskCounts};
use super::counter_store::{CounterStore, SampleRecord};
use super::entity::{EntityId, EntityKind, RawSnapshot};
use super::rate::{self, InterfaceRate, ProcessInterval};
use super::smoothing::{CensusConfig, MetricKind, RefreshGate, Smoother, SmoothingConfig};
use super::snapshot::{
    FanStatus, NetworkInterfaceInfo, ProcessRow, SensorReading, SystemSnapshot, UsageInfo,
};
use super::source::{MemoryTotals, SnapshotSource};
use crate::error::SampleError;

pub const DEFAULT_DISPLAY_REFRESH: Duration = Duration::from_millis(2000);
const NO_ADDRESS: &str = "N/A";

#[derive(Clone, Debug, PartialEq)]
pub struct SamplingConfig {
    /// How often display fields (name, state, memory%) may change.
    pub display_refresh: Duration,
    pub smoothing: SmoothingConfig,
    pub census: CensusConfig,
    /// Filesystem reported by [`SamplingEngine::snapshot`].
    pub disk_path: PathBuf,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            display_refresh: DEFAULT_DISPLAY_REFRESH,
            smoothing: SmoothingConfig::default(),
            census: CensusConfig::default(),
            disk_path: PathBuf::from("/"),
        }
    }
}

/// Slow-moving process fields, refreshed only when the display gate opens.
#[derive(Clone, Debug, PartialEq)]
struct DisplayFields {
    name: String,
    state: char,
    memory_percent: f64,
}

/// Owns every per-entity map. The host drives it one tick at a time.
pub struct SamplingEngine<S> {
    source: S,
    config: SamplingConfig,
    store: CounterStore,
    smoother: Smoother,
    census: TaskCensus,
    display_gate: RefreshGate,
    display: HashMap<u32, DisplayFields>,
    process_cpu_raw: HashMap<u32, f64>,
    system_cpu_raw: f64,
    memory: MemoryTotals,
    addresses: HashMap<String, String>,
    interfaces: Vec<NetworkInterfaceInfo>,
    thermal: SensorReading,
    fan: FanStatus,
}

impl<S: SnapshotSource> SamplingEngine<S> {
    pub fn new(source: S, config: SamplingConfig) -> Self {
        SamplingEngine {
            source,
            store: CounterStore::new(),
            smoother: Smoother::new(config.smoothing),
            census: TaskCensus::new(config.census),
            display_gate: RefreshGate::new(config.display_refresh),
            display: HashMap::new(),
            process_cpu_raw: HashMap::new(),
            system_cpu_raw: 0.0,
            memory: MemoryTotals::default(),
            addresses: HashMap::new(),
            interfaces: Vec::new(),
            thermal: SensorReading::NotAvailable,
            fan: FanStatus::NotDetected,
            config,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    /// Number of entities with a stored baseline.
    pub fn tracked_entities(&self) -> usize {
        self.store.len()
    }

    pub fn refresh(&mut self) {
        self.refresh_at(Instant::now());
    }

    /// One full read-compute-store cycle. Never fails: every source error is
    /// mapped to a zero, a sentinel, or a fresh baseline.
    pub fn refresh_at(&mut self, now: Instant) {
        let _refresh_span = debug_span!("engine.refresh").entered();

        let refresh_display = self.display_gate.ready(now);
        let system_ticks = self.sample_system(now);
        self.sample_memory();
        let codes = self.sample_processes(now, system_ticks, refresh_display);
        self.sample_interfaces(now, refresh_display);
        self.sample_sensors();

        match codes {
            Some(codes) => {
                self.census.record(codes);
            }
            None => {
                self.census.record_unavailable();
            }
        }
    }

    /// Drops every baseline, smoothed value and cached reading.
    pub fn reset(&mut self) {
        self.store.clear();
        self.smoother.clear();
        self.census.reset();
        self.display_gate.reset();
        self.display.clear();
        self.process_cpu_raw.clear();
        self.system_cpu_raw = 0.0;
        self.memory = MemoryTotals::default();
        self.addresses.clear();
        self.interfaces.clear();
        self.thermal = SensorReading::NotAvailable;
        self.fan = FanStatus::NotDetected;
    }

    /// Returns the system-wide tick total of this reading, if there was one.
    fn sample_system(&mut self, now: Instant) -> Option<u64> {
        let curr = match self.source.read_system_counters() {
            Ok(curr) => curr,
            Err(e) => {
                debug!(error = %e, "system counters unavailable");
                self.store.evict(&EntityId::System);
                self.smoother.evict(&EntityId::System);
                self.system_cpu_raw = 0.0;
                return None;
            }
        };

        let prev = self
            .store
            .observe(EntityId::System, SampleRecord::new(RawSnapshot::System(curr), now));
        let raw = match rate::system_cpu_usage(prev.as_ref().and_then(|r| r.snapshot.as_system()), &curr) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(error = %e, "re-baselining system counters");
                0.0
            }
        };
        self.system_cpu_raw = raw;
        self.smoother
            .update(&EntityId::System, MetricKind::CpuUsage, raw, now);
        Some(curr.total())
    }

    fn sample_memory(&mut self) {
        self.memory = self.source.read_memory_totals().unwrap_or_else(|e| {
            debug!(error = %e, "memory totals unavailable");
            MemoryTotals::default()
        });
    }

    /// Returns the state codes of every process read this tick, or `None`
    /// when the process list itself could not be enumerated.
    fn sample_processes(
        &mut self,
        now: Instant,
        system_ticks: Option<u64>,
        refresh_display: bool,
    ) -> Option<Vec<char>> {
        let pids = match self.source.list_process_ids() {
            Ok(pids) => Some(pids),
            Err(e) => {
                debug!(error = %e, "process list unavailable");
                None
            }
        };

        let clock_ticks_per_second = self.source.clock_ticks_per_second();
        let mem_total = self.memory.mem_total;
        let mut seen = HashSet::new();
        let mut codes = Vec::new();

        for pid in pids.iter().flatten().copied() {
            let curr = match self.source.read_process_counters(pid) {
                Ok(curr) => curr,
                Err(SampleError::EntityNotFound { .. }) => {
                    trace!(pid, "process exited before it could be read");
                    continue;
                }
                Err(e) => {
                    trace!(pid, error = %e, "skipping process");
                    continue;
                }
            };

            let id = EntityId::Process(pid);
            let mut record = SampleRecord::new(RawSnapshot::Process(curr.clone()), now);
            if let Some(ticks) = system_ticks {
                record = record.with_reference_ticks(ticks);
            }
            let prev = self.store.observe(id.clone(), record);

            let interval = ProcessInterval {
                system_ticks: match (system_ticks, prev.as_ref().and_then(|r| r.reference_ticks)) {
                    (Some(now_ticks), Some(then_ticks)) => now_ticks.saturating_sub(then_ticks),
                    _ => 0,
                },
                elapsed: prev
                    .as_ref()
                    .map(|r| now.saturating_duration_since(r.observed_at))
                    .unwrap_or_default(),
                clock_ticks_per_second,
            };
            let prev_counters = prev.as_ref().and_then(|r| r.snapshot.as_process());
            let raw = match rate::process_cpu_usage(pid, prev_counters, &curr, interval) {
                Ok(raw) => raw,
                Err(e) => {
                    debug!(error = %e, "re-baselining process counters");
                    0.0
                }
            };
            self.process_cpu_raw.insert(pid, raw);
            self.smoother.update(&id, MetricKind::CpuUsage, raw, now);

            if refresh_display || !self.display.contains_key(&pid) {
                let memory_percent = rate::memory_usage(curr.rss_bytes, mem_total);
                self.display.insert(
                    pid,
                    DisplayFields {
                        name: curr.name,
                        state: curr.state,
                        memory_percent,
                    },
                );
            }

            codes.push(curr.state);
            seen.insert(id);
        }

        let gone = self.store.retain_seen(EntityKind::Process, &seen);
        self.smoother.retain_seen(EntityKind::Process, &seen);
        self.display
            .retain(|pid, _| seen.contains(&EntityId::Process(*pid)));
        self.process_cpu_raw
            .retain(|pid, _| seen.contains(&EntityId::Process(*pid)));
        if !gone.is_empty() {
            debug!(count = gone.len(), "evicted exited processes");
        }

        pids.map(|_| codes)
    }

    fn sample_interfaces(&mut self, now: Instant, refresh_display: bool) {
        let rows = match self.source.read_interface_counters() {
            Ok(rows) => rows,
            Err(e) => {
                debug!(error = %e, "interface counters unavailable");
                Vec::new()
            }
        };
        if refresh_display || self.addresses.is_empty() {
            self.addresses = self.source.interface_addresses();
        }

        let mut seen = HashSet::new();
        let mut interfaces = Vec::with_capacity(rows.len());
        for counters in rows {
            let id = EntityId::Interface(counters.name.clone());
            let prev = self.store.observe(
                id.clone(),
                SampleRecord::new(RawSnapshot::Interface(counters.clone()), now),
            );
            let elapsed = prev
                .as_ref()
                .map(|r| now.saturating_duration_since(r.observed_at))
                .unwrap_or_default();
            let rates = InterfaceRate::between(
                prev.as_ref().and_then(|r| r.snapshot.as_interface()),
                &counters,
                elapsed,
            )
            .unwrap_or_else(|e| {
                debug!(error = %e, "re-baselining interface counters");
                InterfaceRate::default()
            });

            let ip = self
                .addresses
                .get(&counters.name)
                .cloned()
                .unwrap_or_else(|| NO_ADDRESS.to_string());
            interfaces.push(NetworkInterfaceInfo {
                name: counters.name.clone(),
                ip,
                counters,
                rates,
            });
            seen.insert(id);
        }

        let gone = self.store.retain_seen(EntityKind::Interface, &seen);
        if !gone.is_empty() {
            debug!(?gone, "evicted removed interfaces");
        }
        self.interfaces = interfaces;
    }

    fn sample_sensors(&mut self) {
        self.thermal = match self.source.read_thermal_zone() {
            Ok(celsius) => SensorReading::Celsius(celsius),
            Err(e) => {
                debug!(error = %e, "thermal zone unavailable");
                SensorReading::NotAvailable
            }
        };

        let state = self.source.read_fan_state().ok();
        let rpm = if state.is_some() {
            None
        } else {
            match self.source.read_fan_speed() {
                Ok(rpm) => Some(rpm),
                Err(e) => {
                    debug!(error = %e, "no fan detected");
                    None
                }
            }
        };
        self.fan = FanStatus::derive(state, rpm);
    }

    /// Smoothed, rounded system CPU percentage.
    pub fn system_cpu_usage(&self) -> f64 {
        self.smoother
            .displayed(&EntityId::System, MetricKind::CpuUsage)
    }

    /// Unsmoothed system CPU percentage of the last tick.
    pub fn system_cpu_raw(&self) -> f64 {
        self.system_cpu_raw
    }

    /// Smoothed, rounded CPU percentage of one process; zero if unknown.
    pub fn process_cpu_usage(&self, pid: u32) -> f64 {
        self.smoother
            .displayed(&EntityId::Process(pid), MetricKind::CpuUsage)
    }

    pub fn process_cpu_raw(&self, pid: u32) -> f64 {
        self.process_cpu_raw.get(&pid).copied().unwrap_or(0.0)
    }

    /// Resident share of physical memory as last displayed; zero if unknown.
    pub fn process_memory_usage(&self, pid: u32) -> f64 {
        self.display
            .get(&pid)
            .map(|fields| fields.memory_percent)
            .unwrap_or(0.0)
    }

    pub fn memory_info(&self) -> UsageInfo {
        UsageInfo::memory(&self.memory)
    }

    pub fn swap_info(&self) -> UsageInfo {
        UsageInfo::swap(&self.memory)
    }

    /// Read on demand; an unreadable filesystem reports zeros.
    pub fn disk_info(&self, path: &Path) -> UsageInfo {
        match self.source.read_disk_usage(path) {
            Ok(totals) => UsageInfo::disk(&totals),
            Err(e) => {
                debug!(error = %e, "disk usage unavailable");
                UsageInfo::default()
            }
        }
    }

    pub fn task_counts(&self) -> TaskCounts {
        self.census.displayed()
    }

    pub fn raw_task_counts(&self) -> TaskCounts {
        self.census.raw()
    }

    pub fn network_interfaces(&self) -> &[NetworkInterfaceInfo] {
        &self.interfaces
    }

    pub fn thermal(&self) -> SensorReading {
        self.thermal
    }

    pub fn fan(&self) -> FanStatus {
        self.fan
    }

    /// Every process seen on the last tick, busiest first.
    pub fn processes(&self) -> Vec<ProcessRow> {
        let mut rows: Vec<ProcessRow> = self
            .display
            .iter()
            .map(|(pid, fields)| ProcessRow {
                pid: *pid,
                name: fields.name.clone(),
                state: fields.state,
                cpu_percent: self.process_cpu_usage(*pid),
                memory_percent: fields.memory_percent,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.cpu_percent
                .total_cmp(&a.cpu_percent)
                .then_with(|| b.memory_percent.total_cmp(&a.memory_percent))
                .then_with(|| a.pid.cmp(&b.pid))
        });
        rows
    }

    /// Case-insensitive substring match on the process name. An empty
    /// filter matches everything.
    pub fn processes_matching(&self, filter: &str) -> Vec<ProcessRow> {
        let needle = filter.to_lowercase();
        self.processes()
            .into_iter()
            .filter(|row| needle.is_empty() || row.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            cpu_percent: self.system_cpu_usage(),
            cpu_raw_percent: self.system_cpu_raw,
            memory: self.memory_info(),
            swap: self.swap_info(),
            disk_path: self.config.disk_path.clone(),
            disk: self.disk_info(&self.config.disk_path),
            tasks: self.task_counts(),
            interfaces: self.interfaces.clone(),
            thermal: self.thermal,
            fan: self.fan,
            processes: self.processes(),
        }
    }
}
