//! Error taxonomy for the translation pipeline.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A source routes to a sink name that does not exist in `outputs`.
    #[error("source `{source_name}` routes to unknown sink `{sink}`")]
    UnknownSink { source_name: String, sink: String },

    #[error("source `{source_name}`: cannot resolve event code `{code}`")]
    UnknownEventCode { source_name: String, code: String },

    #[error("source `{source_name}`: event `{code}` must map sink names to event codes")]
    MalformedRoute { source_name: String, code: String },

    #[error("source `{0}` has neither a device name nor a path")]
    UnresolvableSource(String),

    /// An absolute axis advertises `min == max`, which would make
    /// rescaling divide by zero.
    #[error("absolute axis range [{min}, {max}] is empty")]
    EmptyAxisRange { min: i32, max: i32 },

    /// The configured source device is currently absent. Transient:
    /// watchers retry on a fixed backoff.
    #[error("device not found (name: {name:?}, path: {path:?})")]
    DeviceNotFound {
        name: Option<String>,
        path: Option<PathBuf>,
    },

    /// A mid-stream read failure, typically an unplug. Handled exactly
    /// like `DeviceNotFound`.
    #[error("device read failed: {0}")]
    DeviceLost(#[source] std::io::Error),

    #[error("failed to create virtual device `{name}`: {source}")]
    SinkCreation {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to grab {path}: {source}")]
    Grab {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Configuration-class errors are never retried; a watcher that hits
    /// one stops instead of transitioning back to resolving.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownSink { .. }
                | Error::UnknownEventCode { .. }
                | Error::MalformedRoute { .. }
                | Error::UnresolvableSource(_)
                | Error::EmptyAxisRange { .. }
        )
    }
}
