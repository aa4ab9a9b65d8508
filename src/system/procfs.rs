use std::collections::HashMap;
use std::fs;
use std::io;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use sysinfo::Networks;
use tracing::trace;

use super::entity::{InterfaceCounters, ProcessCounters, SystemCounters};
use super::fan::FanChain;
use super::platform;
use super::rate::DEFAULT_CLOCK_TICKS_PER_SECOND;
use super::source::{DiskTotals, FanState, MemoryTotals, SnapshotSource};
use crate::error::SampleError;

pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_SYS_ROOT: &str = "/sys";
pub const DEFAULT_PAGE_SIZE: u64 = 4096;

// Positions in /proc/<pid>/stat, counted from the state field after the comm.
const STAT_STATE: usize = 0;
const STAT_UTIME: usize = 11;
const STAT_STIME: usize = 12;
const STAT_CUTIME: usize = 13;
const STAT_CSTIME: usize = 14;
const STAT_VSIZE: usize = 20;
const STAT_RSS: usize = 21;

#[derive(Debug, Clone)]
pub struct ProcfsSource {
    proc_root: PathBuf,
    sys_root: PathBuf,
    fan_chain: FanChain,
    page_size: u64,
    clock_ticks_per_second: f64,
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcfsSource {
    pub fn new() -> Self {
        Self::with_roots(DEFAULT_PROC_ROOT, DEFAULT_SYS_ROOT)
    }

    pub fn with_roots(proc_root: impl Into<PathBuf>, sys_root: impl Into<PathBuf>) -> Self {
        let proc_root = proc_root.into();
        let sys_root = sys_root.into();
        let fan_chain = FanChain::standard(&proc_root, &sys_root);
        Self {
            proc_root,
            sys_root,
            fan_chain,
            page_size: platform::page_size().unwrap_or(DEFAULT_PAGE_SIZE),
            clock_ticks_per_second: platform::clock_ticks_per_second()
                .unwrap_or(DEFAULT_CLOCK_TICKS_PER_SECOND),
        }
    }

    /// Overrides the page size used to turn rss pages into bytes.
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    pub fn sys_root(&self) -> &Path {
        &self.sys_root
    }

    fn thermal_zone_path(&self) -> PathBuf {
        self.sys_root.join("class/thermal/thermal_zone0/temp")
    }
}

fn read_file(path: &Path) -> Result<String, SampleError> {
    fs::read_to_string(path).map_err(|e| SampleError::io(path, e))
}

fn parse_field(path: &Path, name: &str, value: &str) -> Result<u64, SampleError> {
    value
        .parse::<u64>()
        .map_err(|_| SampleError::malformed(path, format!("{name}: not an integer: {value:?}")))
}

/// First aggregate `cpu ` line of the system accounting file.
pub fn parse_cpu_line(path: &Path, contents: &str) -> Result<SystemCounters, SampleError> {
    let line = contents
        .lines()
        .find(|line| line.starts_with("cpu "))
        .ok_or_else(|| SampleError::malformed(path, "no aggregate cpu line"))?;

    let fields = line
        .split_whitespace()
        .skip(1)
        .map(|v| parse_field(path, "cpu", v))
        .collect::<Result<Vec<u64>, _>>()?;
    if fields.len() < 4 {
        return Err(SampleError::malformed(
            path,
            format!("expected at least 4 cpu fields, found {}", fields.len()),
        ));
    }

    // Older kernels stop before steal/guest; those read as zero.
    let at = |i: usize| fields.get(i).copied().unwrap_or(0);
    Ok(SystemCounters {
        user: at(0),
        nice: at(1),
        system: at(2),
        idle: at(3),
        iowait: at(4),
        irq: at(5),
        softirq: at(6),
        steal: at(7),
        guest: at(8),
        guest_nice: at(9),
    })
}

/// One process accounting line. The comm may itself contain spaces and
/// parentheses, so fields are located relative to the last `)`.
pub fn parse_pid_stat(
    path: &Path,
    contents: &str,
    page_size: u64,
) -> Result<ProcessCounters, SampleError> {
    let open = contents
        .find('(')
        .ok_or_else(|| SampleError::malformed(path, "missing '(' before comm"))?;
    let close = contents
        .rfind(')')
        .filter(|close| *close > open)
        .ok_or_else(|| SampleError::malformed(path, "missing ')' after comm"))?;

    let name = contents[open + 1..close].to_string();
    let fields: Vec<&str> = contents[close + 1..].split_whitespace().collect();
    if fields.len() <= STAT_RSS {
        return Err(SampleError::malformed(
            path,
            format!("expected {} fields after comm, found {}", STAT_RSS + 1, fields.len()),
        ));
    }

    let state = fields[STAT_STATE]
        .chars()
        .next()
        .ok_or_else(|| SampleError::malformed(path, "empty state field"))?;
    let rss_pages = fields[STAT_RSS]
        .parse::<i64>()
        .map_err(|_| SampleError::malformed(path, "rss: not an integer"))?;

    Ok(ProcessCounters {
        name,
        state,
        utime: parse_field(path, "utime", fields[STAT_UTIME])?,
        stime: parse_field(path, "stime", fields[STAT_STIME])?,
        cutime: parse_field(path, "cutime", fields[STAT_CUTIME])?,
        cstime: parse_field(path, "cstime", fields[STAT_CSTIME])?,
        vsize_bytes: parse_field(path, "vsize", fields[STAT_VSIZE])?,
        rss_bytes: (rss_pages.max(0) as u64).saturating_mul(page_size),
    })
}

/// Interface rows of the network device statistics file. Rows that do not
/// parse are dropped rather than failing the whole read.
pub fn parse_net_dev(contents: &str) -> Vec<InterfaceCounters> {
    contents
        .lines()
        .skip(2)
        .filter_map(|line| {
            let parsed = parse_net_dev_row(line);
            if parsed.is_none() {
                trace!(line, "skipping malformed net/dev row");
            }
            parsed
        })
        .collect()
}

fn parse_net_dev_row(line: &str) -> Option<InterfaceCounters> {
    let (name, rest) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let values = rest
        .split_whitespace()
        .map(|v| v.parse::<u64>().ok())
        .collect::<Option<Vec<u64>>>()?;
    if values.len() < 16 {
        return None;
    }
    Some(InterfaceCounters {
        name: name.to_string(),
        rx_bytes: values[0],
        rx_packets: values[1],
        rx_errors: values[2],
        rx_dropped: values[3],
        tx_bytes: values[8],
        tx_packets: values[9],
        tx_errors: values[10],
        tx_dropped: values[11],
    })
}

pub fn parse_meminfo(path: &Path, contents: &str) -> Result<MemoryTotals, SampleError> {
    let mut mem_total = None;
    let mut totals = MemoryTotals::default();

    for line in contents.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let Some(kb) = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok())
        else {
            continue;
        };
        let bytes = kb.saturating_mul(1024);
        match key.trim() {
            "MemTotal" => mem_total = Some(bytes),
            "MemAvailable" => totals.mem_available = bytes,
            "SwapTotal" => totals.swap_total = bytes,
            "SwapFree" => totals.swap_free = bytes,
            _ => {}
        }
    }

    totals.mem_total = mem_total.ok_or_else(|| SampleError::malformed(path, "no MemTotal"))?;
    Ok(totals)
}

pub fn parse_millidegrees(path: &Path, contents: &str) -> Result<f64, SampleError> {
    let milli = contents
        .trim()
        .parse::<i64>()
        .map_err(|_| SampleError::malformed(path, "temperature: not an integer"))?;
    Ok(milli as f64 / 1000.0)
}

/// First line only, `status: on|off`.
pub fn parse_fan_state(contents: &str) -> Option<FanState> {
    let (_, value) = contents.lines().next()?.split_once(':')?;
    match value.trim() {
        "on" => Some(FanState::Running),
        "off" => Some(FanState::Stopped),
        _ => None,
    }
}

impl SnapshotSource for ProcfsSource {
    fn read_system_counters(&self) -> Result<SystemCounters, SampleError> {
        let path = self.proc_root.join("stat");
        parse_cpu_line(&path, &read_file(&path)?)
    }

    fn read_process_counters(&self, pid: u32) -> Result<ProcessCounters, SampleError> {
        let path = self.proc_root.join(pid.to_string()).join("stat");
        // The comm is raw bytes and need not be UTF-8.
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SampleError::EntityNotFound { pid });
            }
            Err(e) => return Err(SampleError::io(&path, e)),
        };
        parse_pid_stat(&path, &String::from_utf8_lossy(&bytes), self.page_size)
    }

    fn list_process_ids(&self) -> Result<Vec<u32>, SampleError> {
        let entries =
            fs::read_dir(&self.proc_root).map_err(|e| SampleError::io(&self.proc_root, e))?;
        let mut pids: Vec<u32> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_str()?;
                if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                name.parse::<u32>().ok()
            })
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }

    fn read_interface_counters(&self) -> Result<Vec<InterfaceCounters>, SampleError> {
        let path = self.proc_root.join("net/dev");
        Ok(parse_net_dev(&read_file(&path)?))
    }

    fn read_memory_totals(&self) -> Result<MemoryTotals, SampleError> {
        let path = self.proc_root.join("meminfo");
        parse_meminfo(&path, &read_file(&path)?)
    }

    fn read_disk_usage(&self, path: &Path) -> Result<DiskTotals, SampleError> {
        platform::filesystem_usage(path).map_err(|e| SampleError::io(path, e))
    }

    fn read_thermal_zone(&self) -> Result<f64, SampleError> {
        let path = self.thermal_zone_path();
        parse_millidegrees(&path, &read_file(&path)?)
    }

    fn read_fan_speed(&self) -> Result<u32, SampleError> {
        self.fan_chain.read()
    }

    fn read_fan_state(&self) -> Result<FanState, SampleError> {
        let path = self.proc_root.join("acpi/fan/FAN0/state");
        let contents = read_file(&path)?;
        parse_fan_state(&contents).ok_or_else(|| SampleError::malformed(&path, "no on/off state"))
    }

    fn interface_addresses(&self) -> HashMap<String, String> {
        let networks = Networks::new_with_refreshed_list();
        let mut addresses = HashMap::new();
        for (name, data) in networks.list() {
            let ipv4 = data.ip_networks().iter().find_map(|net| match net.addr {
                IpAddr::V4(addr) => Some(addr.to_string()),
                IpAddr::V6(_) => None,
            });
            if let Some(ip) = ipv4 {
                addresses.insert(name.clone(), ip);
            }
        }
        addresses
    }

    fn clock_ticks_per_second(&self) -> f64 {
        self.clock_ticks_per_second
    }
}
