use std::io;
use std::path::Path;

use super::{PlatformExtensions, statvfs_usage, sysconf_positive};
use crate::system::source::DiskTotals;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn clock_ticks_per_second() -> Option<f64> {
        sysconf_positive(libc::_SC_CLK_TCK).map(|hz| hz as f64)
    }

    fn page_size() -> Option<u64> {
        sysconf_positive(libc::_SC_PAGESIZE).map(|size| size as u64)
    }

    fn filesystem_usage(path: &Path) -> io::Result<DiskTotals> {
        // No procfs here, but statvfs behaves the same.
        statvfs_usage(path)
    }
}
