use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use sysgauge::config::{self, load_config, load_config_from_path};
use sysgauge::format::{format_bytes, format_percent, network_progress};
use sysgauge::logging;
use sysgauge::system::snapshot::{SystemSnapshot, UsageInfo};
use sysgauge::system::{ProcfsSource, SamplingEngine};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "sysgauge",
    about = "Headless system sampler: smoothed CPU, memory, network and task census"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Refresh rate in milliseconds
    #[arg(long)]
    refresh_rate: Option<u64>,

    /// Number of samples to print; 0 runs until Ctrl-C.
    #[arg(long, default_value_t = 0)]
    iterations: u64,

    /// Emit one JSON snapshot per line instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Only list processes whose name contains this text.
    #[arg(long)]
    filter: Option<String>,

    /// Number of process rows to show.
    #[arg(long, default_value_t = 10)]
    top: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);
    logging::init_tracing(&config.logging.filter, config.logging.json)?;

    run(&cli, &config).await
}

async fn run(cli: &Cli, config: &config::Config) -> Result<()> {
    let source = ProcfsSource::with_roots(&config.source.proc_root, &config.source.sys_root);
    let mut engine = SamplingEngine::new(source, config.sampling_config());
    let mut ticker = tokio::time::interval(config.refresh_rate());
    let mut printed = 0u64;

    info!(refresh_ms = config.general.refresh_rate_ms, "sampling started");

    // The first tick only lays down baselines; every rate would read zero.
    ticker.tick().await;
    engine.refresh();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                engine.refresh();
                let mut snapshot = engine.snapshot();
                if let Some(filter) = &cli.filter {
                    snapshot.processes = engine.processes_matching(filter);
                }
                snapshot.processes.truncate(cli.top);
                print_snapshot(&snapshot, cli.json)?;

                printed += 1;
                if cli.iterations > 0 && printed >= cli.iterations {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!(samples = printed, "sampling stopped");
    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> config::Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(rate) = cli.refresh_rate {
        config.general.refresh_rate_ms = rate;
    }

    config
}

fn print_snapshot(snapshot: &SystemSnapshot, json: bool) -> Result<()> {
    let mut out = std::io::stdout().lock();
    if json {
        serde_json::to_writer(&mut out, snapshot)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(
        out,
        "cpu {:>3}%  mem {}  swap {}  disk {} {}",
        snapshot.cpu_percent,
        usage_line(&snapshot.memory),
        usage_line(&snapshot.swap),
        snapshot.disk_path.display(),
        usage_line(&snapshot.disk),
    )?;
    let tasks = snapshot.tasks;
    writeln!(
        out,
        "tasks  running {}  sleeping {}  stopped {}  zombie {}",
        tasks.running, tasks.sleeping, tasks.stopped, tasks.zombie
    )?;
    writeln!(out, "thermal {}  fan {}", snapshot.thermal, snapshot.fan)?;
    for iface in &snapshot.interfaces {
        writeln!(
            out,
            "{:<10} {:<15} rx {:>10} ({:>3.0}%)  tx {:>10} ({:>3.0}%)  {}/s down {}/s up",
            iface.name,
            iface.ip,
            format_bytes(iface.counters.rx_bytes),
            network_progress(iface.counters.rx_bytes) * 100.0,
            format_bytes(iface.counters.tx_bytes),
            network_progress(iface.counters.tx_bytes) * 100.0,
            format_bytes(iface.rates.rx_bytes_per_sec as u64),
            format_bytes(iface.rates.tx_bytes_per_sec as u64),
        )?;
    }
    writeln!(out, "{:>7}  {:<20} {:>1} {:>6} {:>6}", "PID", "NAME", "S", "CPU", "MEM")?;
    for row in &snapshot.processes {
        writeln!(
            out,
            "{:>7}  {:<20} {:>1} {:>6} {:>6}",
            row.pid,
            row.name,
            row.state,
            format_percent(row.cpu_percent),
            format_percent(row.memory_percent),
        )?;
    }
    writeln!(out)?;
    Ok(())
}

fn usage_line(usage: &UsageInfo) -> String {
    format!(
        "{} / {} ({})",
        format_bytes(usage.used),
        format_bytes(usage.total),
        format_percent(usage.percentage)
    )
}
