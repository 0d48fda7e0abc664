//! Synthesized output devices and the write-side abstraction.

use crate::config::SinkConfig;
use crate::error::Error;
use crate::profiles::{self, CapabilityProfile};
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AbsInfo, AttributeSet, EventType, InputEvent, Key, RelativeAxisType, UinputAbsSetup};
use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

/// All sinks of a running process, keyed by config name. Watchers share
/// the map; individual sinks serialize writes internally.
pub type SinkMap<S> = BTreeMap<String, Arc<S>>;

/// The sink write primitive. `emit` posts a batch of events followed by a
/// synchronization report, so one call is one atomically-visible update
/// on the reader side.
pub trait EventSink: Send + Sync {
    fn emit(&self, events: &[InputEvent]) -> io::Result<()>;

    /// Advertised range for an absolute axis code on this sink.
    fn abs_range(&self, code: u16) -> Option<AbsInfo>;
}

/// A uinput-backed franken device.
pub struct VirtualSink {
    profile: CapabilityProfile,
    device: Mutex<VirtualDevice>,
}

impl VirtualSink {
    pub fn create(name: &str, cfg: &SinkConfig) -> Result<Self, Error> {
        let profile = profiles::predefined(&cfg.kind).stripped();
        let mut device = build_device(name, &profile).map_err(|e| Error::SinkCreation {
            name: name.to_string(),
            source: e,
        })?;

        match dev_node(&mut device) {
            Some(path) => info!("created sink `{}` at {}", name, path.display()),
            None => info!("created sink `{}`", name),
        }

        Ok(Self {
            profile,
            device: Mutex::new(device),
        })
    }
}

impl EventSink for VirtualSink {
    fn emit(&self, events: &[InputEvent]) -> io::Result<()> {
        self.device.lock().unwrap().emit(events)
    }

    fn abs_range(&self, code: u16) -> Option<AbsInfo> {
        self.profile.abs_range(code)
    }
}

fn build_device(name: &str, profile: &CapabilityProfile) -> io::Result<VirtualDevice> {
    let mut builder = VirtualDeviceBuilder::new()?.name(name);

    if !profile.keys.is_empty() {
        let mut keys: AttributeSet<Key> = AttributeSet::new();
        for key in &profile.keys {
            keys.insert(*key);
        }
        builder = builder.with_keys(&keys)?;
    }

    for (axis, info) in &profile.abs {
        builder = builder.with_absolute_axis(&UinputAbsSetup::new(*axis, *info))?;
    }

    if !profile.rel.is_empty() {
        let mut rel: AttributeSet<RelativeAxisType> = AttributeSet::new();
        for axis in &profile.rel {
            rel.insert(*axis);
        }
        builder = builder.with_relative_axes(&rel)?;
    }

    builder.build()
}

fn dev_node(device: &mut VirtualDevice) -> Option<std::path::PathBuf> {
    device
        .enumerate_dev_nodes_blocking()
        .ok()
        .and_then(|mut nodes| nodes.next())
        .and_then(|node| node.ok())
}

/// Synthesize every configured sink. Any creation failure is fatal to
/// startup: without sinks there is nothing to translate into.
pub fn build_sinks(outputs: &BTreeMap<String, SinkConfig>) -> Result<SinkMap<VirtualSink>, Error> {
    let mut sinks = SinkMap::new();
    for (name, cfg) in outputs {
        sinks.insert(name.clone(), Arc::new(VirtualSink::create(name, cfg)?));
    }
    Ok(sinks)
}

/// How long `tap` holds the button down.
const TAP_HOLD: Duration = Duration::from_millis(40);

/// Emit a single button-state change (1 = press, 0 = release), flushed.
/// Diagnostic helper; not part of the translation hot path.
pub fn press<S: EventSink>(sink: &S, code: u16, value: i32) -> io::Result<()> {
    sink.emit(&[InputEvent::new(EventType::KEY, code, value)])
}

/// Press, hold briefly, release. For scripted poking at a sink.
pub async fn tap<S: EventSink>(sink: &S, code: u16) -> io::Result<()> {
    press(sink, code, 1)?;
    tokio::time::sleep(TAP_HOLD).await;
    press(sink, code, 0)
}

/// An in-memory sink that records every emitted batch. Lets the
/// translation path run in tests without uinput access.
#[derive(Default)]
pub struct MemorySink {
    ranges: BTreeMap<u16, AbsInfo>,
    batches: Mutex<Vec<Vec<InputEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_abs_range(mut self, code: u16, info: AbsInfo) -> Self {
        self.ranges.insert(code, info);
        self
    }

    /// Every batch emitted so far; one entry per sync flush.
    pub fn batches(&self) -> Vec<Vec<InputEvent>> {
        self.batches.lock().unwrap().clone()
    }

    /// All recorded events, flattened across batches.
    pub fn events(&self) -> Vec<InputEvent> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }

    pub fn flush_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, events: &[InputEvent]) -> io::Result<()> {
        self.batches.lock().unwrap().push(events.to_vec());
        Ok(())
    }

    fn abs_range(&self, code: u16) -> Option<AbsInfo> {
        self.ranges.get(&code).copied()
    }
}
