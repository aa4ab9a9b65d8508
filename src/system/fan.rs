use std::fs;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::SampleError;

/// How a probe's file is laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeFormat {
    /// A single integer. Zero means "no tachometer here", so the chain moves on.
    Hwmon,
    /// `/proc/acpi/ibm/fan`: the integer after `speed:` is taken as is, zero included.
    Thinkpad,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FanProbe {
    pub path: PathBuf,
    pub format: ProbeFormat,
}

impl FanProbe {
    pub fn hwmon(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: ProbeFormat::Hwmon,
        }
    }

    pub fn thinkpad(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: ProbeFormat::Thinkpad,
        }
    }

    /// RPM if this probe has something usable, `None` to try the next one.
    pub fn read(&self) -> Option<u32> {
        let contents = fs::read_to_string(&self.path).ok()?;
        match self.format {
            ProbeFormat::Hwmon => parse_hwmon(&contents),
            ProbeFormat::Thinkpad => parse_thinkpad(&contents),
        }
    }
}

fn parse_hwmon(contents: &str) -> Option<u32> {
    contents.trim().parse::<u32>().ok().filter(|rpm| *rpm > 0)
}

fn parse_thinkpad(contents: &str) -> Option<u32> {
    contents
        .lines()
        .find_map(|line| line.trim().strip_prefix("speed:"))
        .and_then(|value| value.trim().parse::<u32>().ok())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FanChain {
    probes: Vec<FanProbe>,
    /// Reported in the error when every probe comes up empty.
    search_root: PathBuf,
}

impl FanChain {
    pub fn new(probes: Vec<FanProbe>, search_root: impl Into<PathBuf>) -> Self {
        Self {
            probes,
            search_root: search_root.into(),
        }
    }

    /// The standard ranking for a Linux box, resolved under the given roots.
    pub fn standard(proc_root: &Path, sys_root: &Path) -> Self {
        let hwmon = sys_root.join("class/hwmon");
        let mut probes: Vec<FanProbe> = (0..10)
            .map(|i| FanProbe::hwmon(hwmon.join(format!("hwmon{i}/fan1_input"))))
            .collect();
        probes.extend((0..2).map(|i| FanProbe::hwmon(hwmon.join(format!("hwmon{i}/fan2_input")))));
        probes.push(FanProbe::hwmon(
            sys_root.join("devices/platform/thinkpad_hwmon/hwmon/hwmon8/fan1_input"),
        ));
        probes.extend((0..2).map(|i| {
            FanProbe::hwmon(sys_root.join(format!("class/thermal/cooling_device{i}/cur_state")))
        }));
        probes.push(FanProbe::thinkpad(proc_root.join("acpi/ibm/fan")));

        Self::new(probes, hwmon)
    }

    pub fn probes(&self) -> &[FanProbe] {
        &self.probes
    }

    pub fn read(&self) -> Result<u32, SampleError> {
        for probe in &self.probes {
            if let Some(rpm) = probe.read() {
                return Ok(rpm);
            }
            trace!(path = %probe.path.display(), "fan probe empty");
        }
        Err(SampleError::unavailable(&self.search_root))
    }
}
