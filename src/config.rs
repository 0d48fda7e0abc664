//! YAML configuration loading, defaulting, and event-code resolution.
//!
//! The core pipeline only ever sees numeric event codes; symbolic names
//! (`BTN_SOUTH`, `ABS_X`, ...) are resolved here at load time.

use crate::error::Error;
use anyhow::{Context, Result};
use evdev::{AbsoluteAxisType, Key, RelativeAxisType};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Fully resolved configuration: all symbolic names replaced by numeric
/// codes, all sink references checked.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub sources: BTreeMap<String, SourceConfig>,
    pub sinks: BTreeMap<String, SinkConfig>,
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Advertised device name, used for enumeration lookup.
    pub name: Option<String>,
    /// Last-known device path, tried before enumerating.
    pub path: Option<PathBuf>,
    /// Take an OS-level exclusive grab while watching.
    pub exclusive: bool,
    /// Routing entries in config order.
    pub events: Vec<EventRoute>,
}

/// One source event code and its destinations, in config insertion order.
#[derive(Debug, Clone)]
pub struct EventRoute {
    pub code: u16,
    pub targets: Vec<(String, u16)>,
}

#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Capability-profile identifier, e.g. `xbox360`.
    pub kind: String,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    sources: BTreeMap<String, RawSource>,
    #[serde(default)]
    outputs: BTreeMap<String, RawSink>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    path: Option<PathBuf>,
    #[serde(default)]
    exclusive: bool,
    // serde_yaml::Mapping preserves document order, which fixes the
    // emission order for multi-destination routes.
    #[serde(default)]
    events: Mapping,
}

#[derive(Debug, Deserialize)]
struct RawSink {
    #[serde(rename = "type")]
    kind: String,
}

pub fn load(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let raw: RawConfig = serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(resolve(raw)?)
}

/// Default config location, `$XDG_CONFIG_HOME/frankengamepad/default.yaml`,
/// created with an empty config on first run.
pub fn default_config_file() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("could not determine config directory")?
        .join("frankengamepad");
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let path = dir.join("default.yaml");
    if !path.exists() {
        info!("{} does not exist, creating it", path.display());
        fs::write(&path, "sources: {}\noutputs: {}\n")?;
    }
    Ok(path)
}

fn resolve(raw: RawConfig) -> Result<Config, Error> {
    let sinks: BTreeMap<String, SinkConfig> = raw
        .outputs
        .into_iter()
        .map(|(name, sink)| (name, SinkConfig { kind: sink.kind }))
        .collect();

    let mut sources = BTreeMap::new();
    for (source_name, source) in raw.sources {
        if source.name.is_none() && source.path.is_none() {
            return Err(Error::UnresolvableSource(source_name));
        }

        let mut events = Vec::new();
        for (key, value) in source.events {
            let code = resolve_code(&key).ok_or_else(|| Error::UnknownEventCode {
                source_name: source_name.clone(),
                code: display_value(&key),
            })?;
            let Value::Mapping(destinations) = value else {
                return Err(Error::MalformedRoute {
                    source_name: source_name.clone(),
                    code: display_value(&key),
                });
            };

            let mut targets = Vec::new();
            for (sink_name, sink_code) in destinations {
                let sink_name = sink_name
                    .as_str()
                    .ok_or_else(|| Error::MalformedRoute {
                        source_name: source_name.clone(),
                        code: display_value(&key),
                    })?
                    .to_string();
                if !sinks.contains_key(&sink_name) {
                    return Err(Error::UnknownSink {
                        source_name: source_name.clone(),
                        sink: sink_name,
                    });
                }
                let sink_code =
                    resolve_code(&sink_code).ok_or_else(|| Error::UnknownEventCode {
                        source_name: source_name.clone(),
                        code: display_value(&sink_code),
                    })?;
                targets.push((sink_name, sink_code));
            }
            events.push(EventRoute { code, targets });
        }

        sources.insert(
            source_name,
            SourceConfig {
                name: source.name,
                path: source.path,
                exclusive: source.exclusive,
                events,
            },
        );
    }

    Ok(Config { sources, sinks })
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Resolve a YAML key or value to a numeric event code: plain numbers
/// pass through, strings are tried as decimal first and then against the
/// symbolic name table.
pub fn resolve_code(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s
            .parse::<u16>()
            .ok()
            .or_else(|| code_by_name(s)),
        _ => None,
    }
}

fn code_by_name(name: &str) -> Option<u16> {
    CODE_NAMES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, code)| *code)
}

/// The symbolic names a config may use. Gamepad vocabulary only; plain
/// numeric codes cover everything else.
const CODE_NAMES: &[(&str, u16)] = &[
    // Gamepad buttons (BTN_A..BTN_Y are the legacy aliases)
    ("BTN_SOUTH", Key::BTN_SOUTH.0),
    ("BTN_A", Key::BTN_SOUTH.0),
    ("BTN_EAST", Key::BTN_EAST.0),
    ("BTN_B", Key::BTN_EAST.0),
    ("BTN_C", Key::BTN_C.0),
    ("BTN_NORTH", Key::BTN_NORTH.0),
    ("BTN_X", Key::BTN_NORTH.0),
    ("BTN_WEST", Key::BTN_WEST.0),
    ("BTN_Y", Key::BTN_WEST.0),
    ("BTN_Z", Key::BTN_Z.0),
    ("BTN_TL", Key::BTN_TL.0),
    ("BTN_TR", Key::BTN_TR.0),
    ("BTN_TL2", Key::BTN_TL2.0),
    ("BTN_TR2", Key::BTN_TR2.0),
    ("BTN_SELECT", Key::BTN_SELECT.0),
    ("BTN_START", Key::BTN_START.0),
    ("BTN_MODE", Key::BTN_MODE.0),
    ("BTN_THUMBL", Key::BTN_THUMBL.0),
    ("BTN_THUMBR", Key::BTN_THUMBR.0),
    ("BTN_DPAD_UP", Key::BTN_DPAD_UP.0),
    ("BTN_DPAD_DOWN", Key::BTN_DPAD_DOWN.0),
    ("BTN_DPAD_LEFT", Key::BTN_DPAD_LEFT.0),
    ("BTN_DPAD_RIGHT", Key::BTN_DPAD_RIGHT.0),
    // Joystick buttons
    ("BTN_TRIGGER", Key::BTN_TRIGGER.0),
    ("BTN_THUMB", Key::BTN_THUMB.0),
    ("BTN_THUMB2", Key::BTN_THUMB2.0),
    ("BTN_TOP", Key::BTN_TOP.0),
    ("BTN_TOP2", Key::BTN_TOP2.0),
    ("BTN_PINKIE", Key::BTN_PINKIE.0),
    ("BTN_BASE", Key::BTN_BASE.0),
    ("BTN_BASE2", Key::BTN_BASE2.0),
    ("BTN_BASE3", Key::BTN_BASE3.0),
    ("BTN_BASE4", Key::BTN_BASE4.0),
    ("BTN_BASE5", Key::BTN_BASE5.0),
    ("BTN_BASE6", Key::BTN_BASE6.0),
    ("BTN_TRIGGER_HAPPY1", Key::BTN_TRIGGER_HAPPY1.0),
    ("BTN_TRIGGER_HAPPY2", Key::BTN_TRIGGER_HAPPY2.0),
    ("BTN_TRIGGER_HAPPY3", Key::BTN_TRIGGER_HAPPY3.0),
    ("BTN_TRIGGER_HAPPY4", Key::BTN_TRIGGER_HAPPY4.0),
    // Absolute axes
    ("ABS_X", AbsoluteAxisType::ABS_X.0),
    ("ABS_Y", AbsoluteAxisType::ABS_Y.0),
    ("ABS_Z", AbsoluteAxisType::ABS_Z.0),
    ("ABS_RX", AbsoluteAxisType::ABS_RX.0),
    ("ABS_RY", AbsoluteAxisType::ABS_RY.0),
    ("ABS_RZ", AbsoluteAxisType::ABS_RZ.0),
    ("ABS_THROTTLE", AbsoluteAxisType::ABS_THROTTLE.0),
    ("ABS_RUDDER", AbsoluteAxisType::ABS_RUDDER.0),
    ("ABS_WHEEL", AbsoluteAxisType::ABS_WHEEL.0),
    ("ABS_GAS", AbsoluteAxisType::ABS_GAS.0),
    ("ABS_BRAKE", AbsoluteAxisType::ABS_BRAKE.0),
    ("ABS_HAT0X", AbsoluteAxisType::ABS_HAT0X.0),
    ("ABS_HAT0Y", AbsoluteAxisType::ABS_HAT0Y.0),
    ("ABS_HAT1X", AbsoluteAxisType::ABS_HAT1X.0),
    ("ABS_HAT1Y", AbsoluteAxisType::ABS_HAT1Y.0),
    ("ABS_HAT2X", AbsoluteAxisType::ABS_HAT2X.0),
    ("ABS_HAT2Y", AbsoluteAxisType::ABS_HAT2Y.0),
    ("ABS_HAT3X", AbsoluteAxisType::ABS_HAT3X.0),
    ("ABS_HAT3Y", AbsoluteAxisType::ABS_HAT3Y.0),
    // Relative axes
    ("REL_X", RelativeAxisType::REL_X.0),
    ("REL_Y", RelativeAxisType::REL_Y.0),
    ("REL_Z", RelativeAxisType::REL_Z.0),
    ("REL_WHEEL", RelativeAxisType::REL_WHEEL.0),
    ("REL_HWHEEL", RelativeAxisType::REL_HWHEEL.0),
    ("REL_DIAL", RelativeAxisType::REL_DIAL.0),
];
