const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;
const TB: u64 = 1024 * GB;

/// Upper end of the network bar scale.
pub const NETWORK_SCALE_BYTES: u64 = 2 * GB;

pub fn format_bytes(bytes: u64) -> String {
    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Fill fraction for a cumulative byte counter on a 0 to 2 GiB bar.
pub fn network_progress(bytes: u64) -> f64 {
    (bytes as f64 / NETWORK_SCALE_BYTES as f64).min(1.0)
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}
