use std::time::Duration;

use serde::Serialize;

use super::entity::{EntityId, InterfaceCounters, ProcessCounters, SystemCounters};
use crate::error::SampleError;

/// Upper bound for a single process; multi-threaded processes can exceed one core.
pub const MAX_PROCESS_CPU_PERCENT: f64 = 400.0;

/// Kernel clock resolution assumed when the platform cannot report one.
pub const DEFAULT_CLOCK_TICKS_PER_SECOND: f64 = 100.0;

/// Busy share of all CPU time between two system readings, in `[0, 100]`.
pub fn system_cpu_usage(
    prev: Option<&SystemCounters>,
    curr: &SystemCounters,
) -> Result<f64, SampleError> {
    let Some(prev) = prev else {
        return Ok(0.0);
    };
    if curr.regressed_from(prev) {
        return Err(SampleError::CounterRegression {
            entity: EntityId::System,
        });
    }

    let total_delta = curr.total() - prev.total();
    if total_delta == 0 {
        return Ok(0.0);
    }
    let idle_delta = curr.idle_total() - prev.idle_total();
    let busy = total_delta.saturating_sub(idle_delta) as f64;
    Ok((busy / total_delta as f64 * 100.0).clamp(0.0, 100.0))
}

/// What a process delta is normalized against.
#[derive(Clone, Copy, Debug)]
pub struct ProcessInterval {
    /// System-wide total tick delta over the same interval; zero when unknown.
    pub system_ticks: u64,
    pub elapsed: Duration,
    pub clock_ticks_per_second: f64,
}

/// CPU share of one process, in `[0, 400]`.
///
/// Normalized against the system-wide tick delta when there is one (top-style
/// accounting), otherwise against wall-clock time.
pub fn process_cpu_usage(
    pid: u32,
    prev: Option<&ProcessCounters>,
    curr: &ProcessCounters,
    interval: ProcessInterval,
) -> Result<f64, SampleError> {
    let Some(prev) = prev else {
        return Ok(0.0);
    };
    if curr.regressed_from(prev) {
        return Err(SampleError::CounterRegression {
            entity: EntityId::Process(pid),
        });
    }

    let process_ticks = (curr.busy_ticks() - prev.busy_ticks()) as f64;
    let usage = if interval.system_ticks > 0 {
        process_ticks / interval.system_ticks as f64 * 100.0
    } else {
        let secs = interval.elapsed.as_secs_f64();
        let hz = if interval.clock_ticks_per_second > 0.0 {
            interval.clock_ticks_per_second
        } else {
            DEFAULT_CLOCK_TICKS_PER_SECOND
        };
        if secs <= 0.0 {
            0.0
        } else {
            (process_ticks / hz) / secs * 100.0
        }
    };
    Ok(usage.clamp(0.0, MAX_PROCESS_CPU_PERCENT))
}

/// `used / total * 100`, zero when `total` is zero.
pub fn percentage(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    used as f64 / total as f64 * 100.0
}

/// Resident set as a share of physical memory, in `[0, 100]`. Instantaneous:
/// no previous reading involved.
pub fn memory_usage(rss_bytes: u64, total_memory_bytes: u64) -> f64 {
    percentage(rss_bytes, total_memory_bytes).clamp(0.0, 100.0)
}

/// Bytes per second moved by an interface between two readings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct InterfaceRate {
    pub rx_bytes_per_sec: f64,
    pub tx_bytes_per_sec: f64,
}

impl InterfaceRate {
    pub fn between(
        prev: Option<&InterfaceCounters>,
        curr: &InterfaceCounters,
        elapsed: Duration,
    ) -> Result<Self, SampleError> {
        let Some(prev) = prev else {
            return Ok(Self::default());
        };
        if curr.regressed_from(prev) {
            return Err(SampleError::CounterRegression {
                entity: EntityId::Interface(curr.name.clone()),
            });
        }
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return Ok(Self::default());
        }
        Ok(Self {
            rx_bytes_per_sec: (curr.rx_bytes - prev.rx_bytes) as f64 / secs,
            tx_bytes_per_sec: (curr.tx_bytes - prev.tx_bytes) as f64 / secs,
        })
    }
}
