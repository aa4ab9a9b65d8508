mod common;

use std::path::Path;
use std::time::{Duration, Instant};

use common::{FakeSource, interface, process, system};
use sysgauge::system::census::TaskCounts;
use sysgauge::system::snapshot::{FanStatus, SensorReading, UsageInfo};
use sysgauge::system::source::{DiskTotals, FanState, MemoryTotals};
use sysgauge::system::{SamplingConfig, SamplingEngine};

fn engine() -> SamplingEngine<FakeSource> {
    SamplingEngine::new(FakeSource::new(), SamplingConfig::default())
}

fn at(t0: Instant, secs: u64) -> Instant {
    t0 + Duration::from_secs(secs)
}

#[test]
fn first_tick_reports_zero() {
    let mut engine = engine();
    engine.source().with(|s| {
        s.system = Some(system(1_000, 5_000));
        s.processes.insert(1, process("init", 'S', 900, 0));
    });

    engine.refresh_at(Instant::now());

    assert_eq!(engine.system_cpu_usage(), 0.0);
    assert_eq!(engine.system_cpu_raw(), 0.0);
    assert_eq!(engine.process_cpu_usage(1), 0.0);
}

#[test]
fn system_cpu_is_smoothed() {
    let t0 = Instant::now();
    let mut engine = engine();
    engine.source().with(|s| s.system = Some(system(0, 0)));
    engine.refresh_at(t0);

    engine.source().with(|s| s.system = Some(system(50, 50)));
    engine.refresh_at(at(t0, 1));

    assert_eq!(engine.system_cpu_raw(), 50.0);
    // 0.3 * 50 + 0.7 * 0
    assert_eq!(engine.system_cpu_usage(), 15.0);
}

#[test]
fn process_cpu_against_system_delta() {
    let t0 = Instant::now();
    let mut engine = engine();
    engine.source().with(|s| {
        s.system = Some(system(100, 100));
        s.processes.insert(42, process("worker", 'R', 0, 0));
    });
    engine.refresh_at(t0);

    engine.source().with(|s| {
        s.system = Some(system(150, 250));
        s.processes.insert(42, process("worker", 'R', 40, 0));
    });
    engine.refresh_at(at(t0, 1));

    assert!((engine.process_cpu_raw(42) - 20.0).abs() < 1e-9);
    assert_eq!(engine.process_cpu_usage(42), 6.0);
}

#[test]
fn process_cpu_falls_back_to_wall_clock_without_system_counters() {
    let t0 = Instant::now();
    let mut engine = engine();
    engine.source().with(|s| {
        s.processes.insert(5, process("batch", 'R', 0, 0));
    });
    engine.refresh_at(t0);

    engine.source().with(|s| {
        s.processes.insert(5, process("batch", 'R', 100, 0));
    });
    engine.refresh_at(at(t0, 2));

    // 100 ticks at 100 Hz over 2 s
    assert!((engine.process_cpu_raw(5) - 50.0).abs() < 1e-9);
}

#[test]
fn counter_regression_rebaselines() {
    let t0 = Instant::now();
    let mut engine = engine();
    engine.source().with(|s| {
        s.system = Some(system(0, 0));
        s.processes.insert(9, process("daemon", 'S', 500, 0));
    });
    engine.refresh_at(t0);

    engine.source().with(|s| {
        s.system = Some(system(50, 50));
        s.processes.insert(9, process("daemon", 'S', 10, 0));
    });
    engine.refresh_at(at(t0, 1));
    assert_eq!(engine.process_cpu_raw(9), 0.0);
    assert_eq!(engine.process_cpu_usage(9), 0.0);

    // Delta is now measured from the new baseline of 10.
    engine.source().with(|s| {
        s.system = Some(system(100, 100));
        s.processes.insert(9, process("daemon", 'S', 30, 0));
    });
    engine.refresh_at(at(t0, 2));
    assert!((engine.process_cpu_raw(9) - 20.0).abs() < 1e-9);
}

#[test]
fn system_regression_reports_zero() {
    let t0 = Instant::now();
    let mut engine = engine();
    engine.source().with(|s| s.system = Some(system(500, 500)));
    engine.refresh_at(t0);
    engine.source().with(|s| s.system = Some(system(10, 10)));
    engine.refresh_at(at(t0, 1));
    assert_eq!(engine.system_cpu_raw(), 0.0);

    engine.source().with(|s| s.system = Some(system(60, 60)));
    engine.refresh_at(at(t0, 2));
    assert!((engine.system_cpu_raw() - 50.0).abs() < 1e-9);
}

#[test]
fn same_snapshot_twice_is_zero_not_nan() {
    let t0 = Instant::now();
    let mut engine = engine();
    engine.source().with(|s| {
        s.system = Some(system(300, 700));
        s.processes.insert(3, process("idle", 'S', 77, 0));
    });

    engine.refresh_at(t0);
    engine.refresh_at(t0);

    for value in [
        engine.system_cpu_usage(),
        engine.system_cpu_raw(),
        engine.process_cpu_usage(3),
        engine.process_cpu_raw(3),
    ] {
        assert_eq!(value, 0.0);
        assert!(!value.is_nan());
    }
}

#[test]
fn unknown_pid_is_zero() {
    let mut engine = engine();
    engine.refresh_at(Instant::now());
    assert_eq!(engine.process_cpu_usage(12345), 0.0);
    assert_eq!(engine.process_memory_usage(12345), 0.0);
}

#[test]
fn vanished_process_is_skipped() {
    let mut engine = engine();
    engine.source().with(|s| {
        s.processes.insert(1, process("init", 'S', 0, 0));
        s.vanished.insert(7);
    });
    engine.refresh_at(Instant::now());

    let pids: Vec<u32> = engine.processes().iter().map(|row| row.pid).collect();
    assert_eq!(pids, vec![1]);
    assert_eq!(engine.raw_task_counts(), TaskCounts::new(0, 1, 0, 0));
}

#[test]
fn exited_processes_are_evicted() {
    let t0 = Instant::now();
    let mut engine = engine();
    engine.source().with(|s| {
        s.system = Some(system(0, 0));
        s.processes.insert(1, process("init", 'S', 0, 0));
        s.processes.insert(2, process("short", 'R', 0, 0));
    });
    engine.refresh_at(t0);
    assert_eq!(engine.tracked_entities(), 3);

    engine.source().with(|s| {
        s.processes.remove(&2);
    });
    engine.refresh_at(at(t0, 1));

    assert_eq!(engine.tracked_entities(), 2);
    assert!(engine.processes().iter().all(|row| row.pid != 2));
    assert_eq!(engine.process_cpu_usage(2), 0.0);
}

#[test]
fn census_cold_start_adopts_raw() {
    let mut engine = engine();
    engine.source().with(|s| {
        s.processes.insert(1, process("a", 'R', 0, 0));
        s.processes.insert(2, process("b", 'S', 0, 0));
        s.processes.insert(3, process("c", 'D', 0, 0));
        s.processes.insert(4, process("d", 'Z', 0, 0));
    });
    engine.refresh_at(Instant::now());
    assert_eq!(engine.task_counts(), TaskCounts::new(1, 2, 0, 1));
}

#[test]
fn census_holds_between_windows() {
    let t0 = Instant::now();
    let mut engine = engine();
    engine.source().with(|s| {
        for pid in 1..=10 {
            s.processes.insert(pid, process("sleeper", 'S', 0, 0));
        }
    });
    engine.refresh_at(t0);
    assert_eq!(engine.task_counts(), TaskCounts::new(0, 10, 0, 0));

    engine.source().with(|s| {
        for pid in 11..=30 {
            s.processes.insert(pid, process("sleeper", 'S', 0, 0));
        }
    });
    engine.refresh_at(at(t0, 1));
    assert_eq!(engine.raw_task_counts(), TaskCounts::new(0, 30, 0, 0));
    assert_eq!(engine.task_counts(), TaskCounts::new(0, 10, 0, 0));
}

#[test]
fn unavailable_process_list_gives_zero_census() {
    let mut engine = engine();
    engine.source().with(|s| {
        s.processes.insert(1, process("init", 'S', 0, 0));
        s.list_fails = true;
    });
    engine.refresh_at(Instant::now());
    assert!(engine.task_counts().is_zero());
    assert!(engine.processes().is_empty());
}

#[test]
fn display_fields_follow_wall_clock_gate() {
    let t0 = Instant::now();
    let mut engine = engine();
    engine.source().with(|s| {
        s.memory = Some(MemoryTotals {
            mem_total: 4096,
            ..MemoryTotals::default()
        });
        s.processes.insert(8, process("grow", 'S', 0, 1024));
    });
    engine.refresh_at(t0);
    assert_eq!(engine.process_memory_usage(8), 25.0);

    engine.source().with(|s| {
        s.processes.insert(8, process("grown", 'R', 0, 2048));
    });
    engine.refresh_at(at(t0, 1));
    assert_eq!(engine.process_memory_usage(8), 25.0);
    assert_eq!(engine.processes()[0].name, "grow");

    engine.refresh_at(at(t0, 2));
    assert_eq!(engine.process_memory_usage(8), 50.0);
    assert_eq!(engine.processes()[0].name, "grown");
    assert_eq!(engine.processes()[0].state, 'R');
}

#[test]
fn interfaces_report_counters_and_rates() {
    let t0 = Instant::now();
    let mut engine = engine();
    engine.source().with(|s| {
        s.interfaces = Some(vec![interface("eth0", 1_000, 500), interface("lo", 10, 10)]);
        s.addresses.insert("eth0".into(), "192.168.1.20".into());
    });
    engine.refresh_at(t0);

    let first = engine.network_interfaces();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].ip, "192.168.1.20");
    assert_eq!(first[1].ip, "N/A");
    assert_eq!(first[0].rates.rx_bytes_per_sec, 0.0);

    engine.source().with(|s| {
        s.interfaces = Some(vec![interface("eth0", 3_000, 1_500), interface("lo", 5, 10)]);
    });
    engine.refresh_at(at(t0, 2));

    let second = engine.network_interfaces();
    assert_eq!(second[0].counters.rx_bytes, 3_000);
    assert!((second[0].rates.rx_bytes_per_sec - 1_000.0).abs() < 1e-9);
    assert!((second[0].rates.tx_bytes_per_sec - 500.0).abs() < 1e-9);
    // lo went backwards: no rate this tick
    assert_eq!(second[1].rates.rx_bytes_per_sec, 0.0);
}

#[test]
fn removed_interfaces_disappear() {
    let t0 = Instant::now();
    let mut engine = engine();
    engine
        .source()
        .with(|s| s.interfaces = Some(vec![interface("wg0", 1, 1)]));
    engine.refresh_at(t0);
    assert_eq!(engine.tracked_entities(), 1);

    engine.source().with(|s| s.interfaces = Some(Vec::new()));
    engine.refresh_at(at(t0, 1));
    assert!(engine.network_interfaces().is_empty());
    assert_eq!(engine.tracked_entities(), 0);
}

#[test]
fn missing_sensors_are_explicit() {
    let mut engine = engine();
    engine.refresh_at(Instant::now());
    assert_eq!(engine.thermal(), SensorReading::NotAvailable);
    assert_eq!(engine.fan(), FanStatus::NotDetected);
    assert_eq!(engine.fan().to_string(), "Not Detected");
}

#[test]
fn sensors_when_present() {
    let mut engine = engine();
    engine.source().with(|s| {
        s.thermal = Some(52.25);
        s.fan_rpm = Some(2400);
    });
    engine.refresh_at(Instant::now());
    assert_eq!(engine.thermal(), SensorReading::Celsius(52.25));
    assert_eq!(engine.fan().to_string(), "Active (2400 RPM)");

    engine.source().with(|s| s.fan_state = Some(FanState::Stopped));
    engine.refresh_at(Instant::now());
    assert_eq!(engine.fan(), FanStatus::Inactive(None));
}

#[test]
fn memory_swap_and_disk() {
    let mut engine = engine();
    engine.source().with(|s| {
        s.memory = Some(MemoryTotals {
            mem_total: 1000,
            mem_available: 750,
            swap_total: 200,
            swap_free: 50,
        });
        s.disk = Some(DiskTotals {
            total: 1000,
            available: 700,
            used: 250,
        });
    });
    engine.refresh_at(Instant::now());

    assert_eq!(engine.memory_info(), UsageInfo::new(1000, 250, 750));
    assert_eq!(engine.memory_info().percentage, 25.0);
    assert_eq!(engine.swap_info().used, 150);
    assert_eq!(engine.disk_info(Path::new("/")).percentage, 25.0);
}

#[test]
fn unreadable_disk_is_zero() {
    let engine = engine();
    assert_eq!(engine.disk_info(Path::new("/nowhere")), UsageInfo::default());
}

#[test]
fn processes_sorted_and_filtered() {
    let t0 = Instant::now();
    let mut engine = engine();
    engine.source().with(|s| {
        s.system = Some(system(0, 0));
        s.processes.insert(1, process("Firefox", 'S', 0, 0));
        s.processes.insert(2, process("firefox-helper", 'S', 0, 0));
        s.processes.insert(3, process("bash", 'S', 0, 0));
    });
    engine.refresh_at(t0);
    engine.source().with(|s| {
        s.system = Some(system(100, 0));
        s.processes.insert(3, process("bash", 'R', 80, 0));
    });
    engine.refresh_at(at(t0, 1));

    let rows = engine.processes();
    assert_eq!(rows[0].pid, 3);

    let matching: Vec<u32> = engine
        .processes_matching("FIREFOX")
        .iter()
        .map(|row| row.pid)
        .collect();
    assert_eq!(matching, vec![1, 2]);
    assert_eq!(engine.processes_matching("").len(), 3);
}

#[test]
fn reset_drops_all_state() {
    let t0 = Instant::now();
    let mut engine = engine();
    engine.source().with(|s| {
        s.system = Some(system(0, 0));
        s.processes.insert(1, process("init", 'S', 0, 0));
    });
    engine.refresh_at(t0);
    engine.source().with(|s| s.system = Some(system(100, 0)));
    engine.refresh_at(at(t0, 1));
    assert!(engine.system_cpu_usage() > 0.0);

    engine.reset();
    assert_eq!(engine.tracked_entities(), 0);
    assert_eq!(engine.system_cpu_usage(), 0.0);
    assert!(engine.task_counts().is_zero());

    engine.source().with(|s| s.system = Some(system(200, 0)));
    engine.refresh_at(at(t0, 2));
    assert_eq!(engine.system_cpu_raw(), 0.0);
}

#[test]
fn snapshot_serializes() {
    let mut engine = engine();
    engine.source().with(|s| {
        s.system = Some(system(0, 0));
        s.processes.insert(1, process("init", 'S', 0, 0));
        s.disk = Some(DiskTotals::default());
    });
    engine.refresh_at(Instant::now());

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.processes.len(), 1);
    assert_eq!(snapshot.disk_path, Path::new("/"));

    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"cpu_percent\""));
    assert!(json.contains("\"NotAvailable\""));
}
