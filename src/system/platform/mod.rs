use std::io;
use std::path::Path;

use super::source::DiskTotals;

/// OS-specific facts the procfs source needs but cannot read from a file.
pub trait PlatformExtensions {
    fn clock_ticks_per_second() -> Option<f64>;
    fn page_size() -> Option<u64>;
    fn filesystem_usage(path: &Path) -> io::Result<DiskTotals>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

pub fn clock_ticks_per_second() -> Option<f64> {
    platform_impl::Platform::clock_ticks_per_second()
}

pub fn page_size() -> Option<u64> {
    platform_impl::Platform::page_size()
}

pub fn filesystem_usage(path: &Path) -> io::Result<DiskTotals> {
    platform_impl::Platform::filesystem_usage(path)
}

#[cfg(unix)]
fn sysconf_positive(name: libc::c_int) -> Option<i64> {
    // SAFETY: sysconf only reads a configuration value and has no side effects.
    let value = unsafe { libc::sysconf(name) };
    if value > 0 { Some(value as i64) } else { None }
}

/// `df`-style usage: used counts blocks reserved for root, available does not.
#[cfg(unix)]
fn statvfs_usage(path: &Path) -> io::Result<DiskTotals> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut stat = std::mem::MaybeUninit::<libc::statvfs>::zeroed();
    // SAFETY: c_path is NUL-terminated and stat points to writable memory of the right size.
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: statvfs returned 0, so the struct has been filled in.
    let stat = unsafe { stat.assume_init() };

    let block_size = stat.f_frsize as u64;
    let blocks = stat.f_blocks as u64;
    let free = stat.f_bfree as u64;
    let avail = stat.f_bavail as u64;
    Ok(DiskTotals {
        total: blocks * block_size,
        available: avail * block_size,
        used: blocks.saturating_sub(free) * block_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrappers_do_not_panic() {
        let _ = clock_ticks_per_second();
        let _ = page_size();
        let _ = filesystem_usage(Path::new("/"));
    }

    #[cfg(unix)]
    #[test]
    fn root_filesystem_is_consistent() {
        if let Ok(disk) = filesystem_usage(Path::new("/")) {
            assert!(disk.used <= disk.total);
            assert!(disk.available <= disk.total);
        }
    }

    #[test]
    fn missing_path_is_an_error() {
        assert!(filesystem_usage(Path::new("/definitely/not/mounted/here")).is_err());
    }
}
