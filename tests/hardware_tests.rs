//! Hardware-dependent tests that need real kernel interfaces.
//!
//! These tests are ignored by default and can be run with:
//! `cargo test -- --ignored`
//!
//! They require:
//! - uinput module loaded (and write access to /dev/uinput)
//! - read access to /dev/input/event*

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AbsoluteAxisType, AttributeSet, Device, Key};
use frankengamepad::config::{Config, EventRoute, SinkConfig, SourceConfig};
use frankengamepad::sink::{self, EventSink, VirtualSink};
use frankengamepad::watch::{Supervisor, RETRY_DELAY};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Grace period for udev to expose freshly created nodes and for the
/// watcher to get through a resolve cycle.
const SETTLE: Duration = Duration::from_millis(500);

/// Test that /dev/input is populated at all
#[test]
#[ignore]
fn test_real_evdev_enumeration() {
    let devices: Vec<_> = evdev::enumerate().collect();
    println!("Found {} input event devices", devices.len());
    for (path, dev) in &devices {
        println!("  {:?}: {}", path, dev.name().unwrap_or("?"));
    }
    assert!(!devices.is_empty(), "No input event devices found");
}

/// Test uinput availability
#[test]
#[ignore]
fn test_real_uinput_available() {
    use std::path::Path;

    let uinput_path = Path::new("/dev/uinput");
    assert!(
        uinput_path.exists(),
        "/dev/uinput not found. Load the uinput module with: sudo modprobe uinput"
    );
}

/// Create a real xbox360-profile sink and poke a button through it
#[test]
#[ignore]
fn test_real_sink_creation_and_press() {
    let cfg = SinkConfig {
        kind: "xbox360".to_string(),
    };
    let sink = VirtualSink::create("frankengamepad-test", &cfg)
        .expect("Failed to create virtual sink (is uinput loaded and writable?)");

    assert!(sink.abs_range(AbsoluteAxisType::ABS_X.0).is_some());
    sink::press(&sink, Key::BTN_SOUTH.0, 1).expect("press failed");
    sink::press(&sink, Key::BTN_SOUTH.0, 0).expect("release failed");
}

/// A created sink must not advertise sync or force-feedback categories
#[test]
#[ignore]
fn test_real_sink_capability_stripping() {
    use evdev::EventType;

    let cfg = SinkConfig {
        kind: "xbox360".to_string(),
    };
    let _sink = VirtualSink::create("frankengamepad-striptest", &cfg)
        .expect("Failed to create virtual sink");

    // Give udev a moment, then find our node and inspect it.
    std::thread::sleep(std::time::Duration::from_millis(200));
    let found = evdev::enumerate().find(|(_, dev)| {
        dev.name() == Some("frankengamepad-striptest")
    });
    let (_, dev) = found.expect("created sink not visible via enumeration");
    assert!(!dev.supported_events().contains(EventType::FORCEFEEDBACK));
}

/// A stand-in physical gamepad. Dropping it is the unplug.
fn fake_source(name: &str) -> VirtualDevice {
    let mut keys: AttributeSet<Key> = AttributeSet::new();
    keys.insert(Key::BTN_SOUTH);
    VirtualDeviceBuilder::new()
        .expect("uinput not available")
        .name(name)
        .with_keys(&keys)
        .expect("failed to set keys")
        .build()
        .expect("failed to create stand-in source device")
}

fn open_by_name(name: &str) -> Device {
    evdev::enumerate()
        .find(|(_, dev)| dev.name() == Some(name))
        .map(|(_, dev)| dev)
        .unwrap_or_else(|| panic!("device `{name}` not visible via enumeration"))
}

/// Whether some other process currently holds the exclusive grab on the
/// named device. A second grab attempt fails with EBUSY while it does.
fn grab_held(name: &str) -> bool {
    let mut dev = open_by_name(name);
    match dev.grab() {
        Ok(()) => {
            dev.ungrab().expect("failed to release test grab");
            false
        }
        Err(_) => true,
    }
}

/// One exclusive source routing BTN_SOUTH into one xbox360 sink.
fn watch_config(device_name: &str, sink_name: &str) -> Config {
    let mut sources = BTreeMap::new();
    sources.insert(
        "pad".to_string(),
        SourceConfig {
            name: Some(device_name.to_string()),
            path: None,
            exclusive: true,
            events: vec![EventRoute {
                code: Key::BTN_SOUTH.0,
                targets: vec![(sink_name.to_string(), Key::BTN_SOUTH.0)],
            }],
        },
    );
    let mut sinks = BTreeMap::new();
    sinks.insert(
        sink_name.to_string(),
        SinkConfig {
            kind: "xbox360".to_string(),
        },
    );
    Config { sources, sinks }
}

/// An exclusive watcher takes the grab while running and releases it on
/// shutdown, leaving the device usable by other applications.
#[tokio::test]
#[ignore]
async fn test_real_watcher_grabs_and_releases_on_shutdown() {
    let src_name = "frankengamepad-grab-src";
    let _src = fake_source(src_name);
    tokio::time::sleep(SETTLE).await;

    let config = watch_config(src_name, "frankengamepad-grab-out");
    let sinks = sink::build_sinks(&config.sinks).expect("sink creation failed");
    let shutdown = CancellationToken::new();
    let supervisor = Supervisor::spawn(&config, sinks, shutdown.clone());

    tokio::time::sleep(SETTLE).await;
    assert!(grab_held(src_name), "watcher did not take the exclusive grab");

    shutdown.cancel();
    supervisor.join().await;
    assert!(!grab_held(src_name), "grab not released on shutdown");
}

/// Unplugging the source sends the watcher back to resolving; once a
/// device with the same name reappears, it is found within one retry
/// interval and grabbed again.
#[tokio::test]
#[ignore]
async fn test_real_watcher_reconnects_after_device_loss() {
    let src_name = "frankengamepad-replug-src";
    let src = fake_source(src_name);
    tokio::time::sleep(SETTLE).await;

    let config = watch_config(src_name, "frankengamepad-replug-out");
    let sinks = sink::build_sinks(&config.sinks).expect("sink creation failed");
    let shutdown = CancellationToken::new();
    let supervisor = Supervisor::spawn(&config, sinks, shutdown.clone());

    tokio::time::sleep(SETTLE).await;
    assert!(grab_held(src_name), "watcher did not take the exclusive grab");

    // Unplug. The node disappears and a concurrent open must start
    // failing; the watcher falls back to resolving.
    drop(src);
    tokio::time::sleep(SETTLE).await;
    assert!(
        evdev::enumerate().all(|(_, dev)| dev.name() != Some(src_name)),
        "unplugged device still enumerable"
    );

    // Replug under the same name and wait out one retry interval.
    let _src = fake_source(src_name);
    tokio::time::sleep(RETRY_DELAY + Duration::from_secs(2)).await;
    assert!(grab_held(src_name), "watcher did not re-grab after replug");

    shutdown.cancel();
    supervisor.join().await;
    assert!(!grab_held(src_name), "grab not released on shutdown");
}
