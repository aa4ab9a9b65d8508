use std::io;
use std::path::Path;

use super::PlatformExtensions;
use crate::system::source::DiskTotals;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn clock_ticks_per_second() -> Option<f64> {
        None
    }

    fn page_size() -> Option<u64> {
        None
    }

    fn filesystem_usage(_path: &Path) -> io::Result<DiskTotals> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "filesystem statistics are not sampled on Windows",
        ))
    }
}
