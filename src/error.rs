use std::path::{Path, PathBuf};

use crate::system::entity::EntityId;

/// Failures a snapshot source or the rate engine can report.
///
/// None of these reach the query interface: the engine maps each one to a
/// zero reading, a "not available" sentinel, or a baseline reset.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// Pseudo-file missing or unreadable (sandbox, unsupported platform, absent sensor).
    #[error("source unavailable: {}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The process exited between enumeration and the detail read.
    #[error("process {pid} not found")]
    EntityNotFound { pid: u32 },

    #[error("malformed snapshot in {}: {detail}", path.display())]
    MalformedSnapshot { path: PathBuf, detail: String },

    /// A counter went backwards: wraparound, restart, or pid reuse.
    #[error("counter regression for {entity:?}")]
    CounterRegression { entity: EntityId },
}

impl SampleError {
    pub fn unavailable(path: &Path) -> Self {
        SampleError::SourceUnavailable {
            path: path.to_path_buf(),
            source: None,
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        SampleError::SourceUnavailable {
            path: path.to_path_buf(),
            source: Some(source),
        }
    }

    pub fn malformed(path: &Path, detail: impl Into<String>) -> Self {
        SampleError::MalformedSnapshot {
            path: path.to_path_buf(),
            detail: detail.into(),
        }
    }
}
