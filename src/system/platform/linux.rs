use std::io;
use std::path::Path;

use super::{PlatformExtensions, statvfs_usage, sysconf_positive};
use crate::system::source::DiskTotals;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn clock_ticks_per_second() -> Option<f64> {
        // USER_HZ; what /proc/stat and /proc/<pid>/stat are counted in
        sysconf_positive(libc::_SC_CLK_TCK).map(|hz| hz as f64)
    }

    fn page_size() -> Option<u64> {
        // rss in /proc/<pid>/stat is in pages
        sysconf_positive(libc::_SC_PAGESIZE).map(|size| size as u64)
    }

    fn filesystem_usage(path: &Path) -> io::Result<DiskTotals> {
        statvfs_usage(path)
    }
}
