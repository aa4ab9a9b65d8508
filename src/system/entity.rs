use serde::Serialize;

/// Identity of a sampled entity; the key into every per-entity map.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EntityId {
    System,
    Process(u32),
    Interface(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    System,
    Process,
    Interface,
}

impl EntityId {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityId::System => EntityKind::System,
            EntityId::Process(_) => EntityKind::Process,
            EntityId::Interface(_) => EntityKind::Interface,
        }
    }
}

/// Aggregate CPU time accumulators from the first `cpu` line of the
/// system accounting file, in clock ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemCounters {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

impl SystemCounters {
    fn fields(&self) -> [u64; 10] {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
            self.guest,
            self.guest_nice,
        ]
    }

    pub fn total(&self) -> u64 {
        self.fields().iter().fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    pub fn idle_total(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }

    /// True if any accumulator is lower than in `prev`.
    pub fn regressed_from(&self, prev: &SystemCounters) -> bool {
        self.fields()
            .iter()
            .zip(prev.fields().iter())
            .any(|(cur, old)| cur < old)
    }
}

/// Per-process accounting. Tick counters are cumulative; the memory sizes
/// are gauges and may move in either direction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessCounters {
    pub name: String,
    pub state: char,
    pub utime: u64,
    pub stime: u64,
    pub cutime: u64,
    pub cstime: u64,
    pub vsize_bytes: u64,
    pub rss_bytes: u64,
}

impl ProcessCounters {
    /// Own plus waited-for children CPU time, in clock ticks.
    pub fn busy_ticks(&self) -> u64 {
        self.utime
            .saturating_add(self.stime)
            .saturating_add(self.cutime)
            .saturating_add(self.cstime)
    }

    pub fn regressed_from(&self, prev: &ProcessCounters) -> bool {
        self.utime < prev.utime
            || self.stime < prev.stime
            || self.cutime < prev.cutime
            || self.cstime < prev.cstime
    }
}

/// Cumulative per-interface counters from the network device statistics file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceCounters {
    pub name: String,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errors: u64,
    pub rx_dropped: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
    pub tx_dropped: u64,
}

impl InterfaceCounters {
    fn counters(&self) -> [u64; 8] {
        [
            self.rx_bytes,
            self.rx_packets,
            self.rx_errors,
            self.rx_dropped,
            self.tx_bytes,
            self.tx_packets,
            self.tx_errors,
            self.tx_dropped,
        ]
    }

    pub fn regressed_from(&self, prev: &InterfaceCounters) -> bool {
        self.counters()
            .iter()
            .zip(prev.counters().iter())
            .any(|(cur, old)| cur < old)
    }
}

/// One raw reading, tagged by the kind of entity it belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawSnapshot {
    System(SystemCounters),
    Process(ProcessCounters),
    Interface(InterfaceCounters),
}

impl RawSnapshot {
    pub fn kind(&self) -> EntityKind {
        match self {
            RawSnapshot::System(_) => EntityKind::System,
            RawSnapshot::Process(_) => EntityKind::Process,
            RawSnapshot::Interface(_) => EntityKind::Interface,
        }
    }

    pub fn as_system(&self) -> Option<&SystemCounters> {
        match self {
            RawSnapshot::System(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_process(&self) -> Option<&ProcessCounters> {
        match self {
            RawSnapshot::Process(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&InterfaceCounters> {
        match self {
            RawSnapshot::Interface(c) => Some(c),
            _ => None,
        }
    }
}

/// Census bucket for a single-character process state code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TaskState {
    Running,
    Sleeping,
    Stopped,
    Zombie,
}

impl TaskState {
    /// Unknown codes (dead, wakekill, parked, ...) count as sleeping.
    pub fn from_code(code: char) -> Self {
        match code {
            'R' => TaskState::Running,
            'S' | 'D' | 'I' => TaskState::Sleeping,
            'T' | 't' => TaskState::Stopped,
            'Z' => TaskState::Zombie,
            _ => TaskState::Sleeping,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(user: u64, idle: u64, iowait: u64) -> SystemCounters {
        SystemCounters {
            user,
            idle,
            iowait,
            ..SystemCounters::default()
        }
    }

    #[test]
    fn total_sums_all_ten_accumulators() {
        let c = SystemCounters {
            user: 1,
            nice: 2,
            system: 3,
            idle: 4,
            iowait: 5,
            irq: 6,
            softirq: 7,
            steal: 8,
            guest: 9,
            guest_nice: 10,
        };
        assert_eq!(c.total(), 55);
        assert_eq!(c.idle_total(), 9);
    }

    #[test]
    fn system_regression_detected_per_field() {
        let prev = counters(100, 500, 20);
        assert!(!counters(100, 500, 20).regressed_from(&prev));
        assert!(!counters(150, 600, 20).regressed_from(&prev));
        assert!(counters(150, 600, 19).regressed_from(&prev));
    }

    #[test]
    fn process_rss_shrinking_is_not_a_regression() {
        let prev = ProcessCounters {
            utime: 10,
            rss_bytes: 4096 * 100,
            ..ProcessCounters::default()
        };
        let cur = ProcessCounters {
            utime: 12,
            rss_bytes: 4096 * 10,
            ..ProcessCounters::default()
        };
        assert!(!cur.regressed_from(&prev));
        assert_eq!(cur.busy_ticks(), 12);
    }

    #[test]
    fn state_codes_map_to_buckets() {
        assert_eq!(TaskState::from_code('R'), TaskState::Running);
        assert_eq!(TaskState::from_code('D'), TaskState::Sleeping);
        assert_eq!(TaskState::from_code('I'), TaskState::Sleeping);
        assert_eq!(TaskState::from_code('t'), TaskState::Stopped);
        assert_eq!(TaskState::from_code('Z'), TaskState::Zombie);
        assert_eq!(TaskState::from_code('X'), TaskState::Sleeping);
    }

    #[test]
    fn entity_kind_matches_snapshot_kind() {
        let snap = RawSnapshot::Interface(InterfaceCounters::default());
        assert_eq!(snap.kind(), EntityId::Interface("eth0".into()).kind());
        assert!(snap.as_system().is_none());
        assert!(snap.as_interface().is_some());
    }
}
