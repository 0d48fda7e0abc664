//! Finding the physical device behind a source entry.

use crate::config::SourceConfig;
use crate::error::Error;
use evdev::Device;
use std::path::PathBuf;
use tracing::debug;

pub struct ResolvedDevice {
    pub path: PathBuf,
    pub device: Device,
}

/// Resolve a source to a concrete device handle.
///
/// The path hint is tried first, since device paths tend to be stable
/// while the hardware layout is unchanged; it is accepted when the
/// advertised name matches (or no name is configured). Otherwise all
/// present devices are enumerated by advertised name, which survives
/// path renumbering after reconnects.
pub fn resolve(source: &SourceConfig) -> Result<ResolvedDevice, Error> {
    if let Some(path) = &source.path {
        if let Ok(device) = Device::open(path) {
            let name_matches = match &source.name {
                None => true,
                Some(want) => device.name() == Some(want.as_str()),
            };
            if name_matches {
                return Ok(ResolvedDevice {
                    path: path.clone(),
                    device,
                });
            }
            debug!(
                path = %path.display(),
                found = device.name().unwrap_or("?"),
                "path hint opened a different device, falling back to enumeration"
            );
        }
    }

    if let Some(want) = &source.name {
        for (path, device) in evdev::enumerate() {
            if device.name() == Some(want.as_str()) {
                return Ok(ResolvedDevice { path, device });
            }
        }
    }

    Err(Error::DeviceNotFound {
        name: source.name.clone(),
        path: source.path.clone(),
    })
}
