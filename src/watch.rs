//! Per-source watch tasks: resolve, grab, translate, retry.
//!
//! Every configured source gets its own task running a small state
//! machine: resolving (with a fixed backoff on absence), then watching,
//! then back to resolving on device loss, until cancelled. One
//! unplugged or misbehaving device never stops the other sources.

use crate::config::{Config, SourceConfig};
use crate::error::Error;
use crate::resolver::{self, ResolvedDevice};
use crate::routing::RoutingTable;
use crate::sink::{SinkMap, VirtualSink};
use crate::translate::Translator;
use evdev::EventStream;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Backoff between resolution attempts while a device is absent.
pub const RETRY_DELAY: Duration = Duration::from_secs(10);

/// Owns one watch task per configured source.
pub struct Supervisor {
    tasks: JoinSet<()>,
}

impl Supervisor {
    pub fn spawn(
        config: &Config,
        sinks: SinkMap<VirtualSink>,
        shutdown: CancellationToken,
    ) -> Self {
        let mut tasks = JoinSet::new();
        for (name, source) in &config.sources {
            tasks.spawn(watch_source(
                name.clone(),
                source.clone(),
                sinks.clone(),
                shutdown.clone(),
            ));
        }
        Self { tasks }
    }

    /// Wait for every watcher to finish. Watchers only finish on
    /// cancellation or on a per-source fatal error.
    pub async fn join(mut self) {
        while self.tasks.join_next().await.is_some() {}
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

async fn watch_source(
    name: String,
    source: SourceConfig,
    sinks: SinkMap<VirtualSink>,
    shutdown: CancellationToken,
) {
    loop {
        // Resolving
        let resolved = match resolver::resolve(&source) {
            Ok(resolved) => resolved,
            Err(e) => {
                error!(
                    source = %name,
                    "{e}; retrying in {}s",
                    RETRY_DELAY.as_secs()
                );
                tokio::select! {
                    _ = tokio::time::sleep(RETRY_DELAY) => continue,
                    _ = shutdown.cancelled() => {
                        info!(source = %name, "watcher stopped");
                        return;
                    }
                }
            }
        };
        info!(
            source = %name,
            path = %resolved.path.display(),
            device = resolved.device.name().unwrap_or("?"),
            "found device"
        );

        // Watching
        match watch_device(&name, &source, resolved, &sinks, &shutdown).await {
            Ok(()) => {
                info!(source = %name, "watcher stopped");
                return;
            }
            Err(e @ Error::Grab { .. }) => {
                error!(source = %name, "{e}; source disabled until restart");
                return;
            }
            Err(e) if e.is_config_error() => {
                error!(source = %name, "configuration error: {e}; source disabled");
                return;
            }
            Err(e) => {
                warn!(source = %name, "device lost: {e}");
            }
        }
    }
}

/// The Watching state. Returns `Ok(())` only on cancellation; any error
/// sends the watcher back to resolving (or stops it, for fatal classes).
/// The grab is released on every exit path via the stream guard.
async fn watch_device(
    name: &str,
    source: &SourceConfig,
    resolved: ResolvedDevice,
    sinks: &SinkMap<VirtualSink>,
    shutdown: &CancellationToken,
) -> Result<(), Error> {
    let ResolvedDevice { path, device } = resolved;

    let table = RoutingTable::for_device(name, &source.events, &device, sinks)?;
    let stream = device.into_event_stream().map_err(Error::DeviceLost)?;
    let mut watched = WatchedDevice {
        stream,
        path,
        grabbed: false,
    };

    if source.exclusive {
        watched.grab()?;
        info!(source = %name, path = %watched.path.display(), "grabbed exclusive access");
    }

    let mut translator = Translator::new(table, sinks);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            event = watched.stream.next_event() => {
                let event = event.map_err(Error::DeviceLost)?;
                translator.process(event)?;
            }
        }
    }
}

/// Event stream plus grab state. Dropping it releases the grab, so the
/// device is never left locked against other applications, whichever
/// way the watch ends.
struct WatchedDevice {
    stream: EventStream,
    path: PathBuf,
    grabbed: bool,
}

impl WatchedDevice {
    fn grab(&mut self) -> Result<(), Error> {
        self.stream
            .device_mut()
            .grab()
            .map_err(|e| Error::Grab {
                path: self.path.clone(),
                source: e,
            })?;
        self.grabbed = true;
        Ok(())
    }
}

impl Drop for WatchedDevice {
    fn drop(&mut self) {
        if self.grabbed {
            let _ = self.stream.device_mut().ungrab();
            info!(path = %self.path.display(), "released exclusive access");
        }
    }
}
