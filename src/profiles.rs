//! Predefined capability profiles for synthesized devices.
//!
//! To generate a new profile, connect the real device and dump
//! `evdev::Device::supported_*` plus `get_abs_state` for the axis ranges.

use evdev::{AbsInfo, AbsoluteAxisType, Key, RelativeAxisType};
use std::fmt;

/// `evdev::AbsInfo` does not implement `Debug`; this wrapper formats it
/// field by field for the hand-written `Debug` impls below and in
/// `routing`.
pub(crate) struct AbsInfoFmt<'a>(pub(crate) &'a AbsInfo);

impl fmt::Debug for AbsInfoFmt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbsInfo")
            .field("value", &self.0.value())
            .field("minimum", &self.0.minimum())
            .field("maximum", &self.0.maximum())
            .field("fuzz", &self.0.fuzz())
            .field("flat", &self.0.flat())
            .field("resolution", &self.0.resolution())
            .finish()
    }
}

/// The full capability set of a device, by event category.
#[derive(Clone, Default)]
pub struct CapabilityProfile {
    pub sync: Vec<u16>,
    pub keys: Vec<Key>,
    pub abs: Vec<(AbsoluteAxisType, AbsInfo)>,
    pub rel: Vec<RelativeAxisType>,
    pub ff: Vec<u16>,
}

impl CapabilityProfile {
    /// Drop the synchronization and force-feedback categories. uinput
    /// provides both implicitly; advertising them explicitly breaks
    /// device creation.
    pub fn stripped(mut self) -> Self {
        self.sync.clear();
        self.ff.clear();
        self
    }

    /// Advertised range for an absolute axis code, if this profile
    /// carries that axis.
    pub fn abs_range(&self, code: u16) -> Option<AbsInfo> {
        self.abs
            .iter()
            .find(|(axis, _)| axis.0 == code)
            .map(|(_, info)| *info)
    }

    pub fn is_empty(&self) -> bool {
        self.sync.is_empty()
            && self.keys.is_empty()
            && self.abs.is_empty()
            && self.rel.is_empty()
            && self.ff.is_empty()
    }
}

impl fmt::Debug for CapabilityProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityProfile")
            .field("sync", &self.sync)
            .field("keys", &self.keys)
            .field(
                "abs",
                &self
                    .abs
                    .iter()
                    .map(|(axis, info)| (axis, AbsInfoFmt(info)))
                    .collect::<Vec<_>>(),
            )
            .field("rel", &self.rel)
            .field("ff", &self.ff)
            .finish()
    }
}

/// Look up a predefined profile by type identifier. Unknown identifiers
/// yield an empty profile rather than an error, so configs written for a
/// newer build keep starting up.
pub fn predefined(kind: &str) -> CapabilityProfile {
    match kind {
        "xbox360" => xbox360(),
        _ => CapabilityProfile::default(),
    }
}

/// Capabilities of an Xbox 360 pad as advertised by the kernel xpad
/// driver, axis ranges included.
fn xbox360() -> CapabilityProfile {
    let stick = |value| AbsInfo::new(value, -32768, 32767, 16, 128, 0);
    let trigger = AbsInfo::new(0, 0, 255, 0, 0, 0);
    let hat = AbsInfo::new(0, -1, 1, 0, 0, 0);

    CapabilityProfile {
        sync: vec![0, 1, 3, 21],
        keys: vec![
            Key::BTN_SOUTH,
            Key::BTN_EAST,
            Key::BTN_NORTH,
            Key::BTN_WEST,
            Key::BTN_TL,
            Key::BTN_TR,
            Key::BTN_SELECT,
            Key::BTN_START,
            Key::BTN_MODE,
            Key::BTN_THUMBL,
            Key::BTN_THUMBR,
            Key::BTN_TRIGGER_HAPPY1,
            Key::BTN_TRIGGER_HAPPY2,
            Key::BTN_TRIGGER_HAPPY3,
            Key::BTN_TRIGGER_HAPPY4,
        ],
        abs: vec![
            (AbsoluteAxisType::ABS_X, stick(-2687)),
            (AbsoluteAxisType::ABS_Y, stick(-5789)),
            (AbsoluteAxisType::ABS_Z, trigger),
            (AbsoluteAxisType::ABS_RX, stick(496)),
            (AbsoluteAxisType::ABS_RY, stick(-2833)),
            (AbsoluteAxisType::ABS_RZ, trigger),
            (AbsoluteAxisType::ABS_HAT0X, hat),
            (AbsoluteAxisType::ABS_HAT0Y, hat),
        ],
        rel: Vec::new(),
        ff: vec![80, 81, 88, 89, 90, 96],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xbox360_profile_layout() {
        let profile = predefined("xbox360");
        assert_eq!(profile.keys.len(), 15);
        assert_eq!(profile.abs.len(), 8);
        assert!(!profile.ff.is_empty());
        assert!(!profile.sync.is_empty());

        let stick = profile.abs_range(AbsoluteAxisType::ABS_X.0).unwrap();
        assert_eq!(stick.minimum(), -32768);
        assert_eq!(stick.maximum(), 32767);
        let trigger = profile.abs_range(AbsoluteAxisType::ABS_Z.0).unwrap();
        assert_eq!((trigger.minimum(), trigger.maximum()), (0, 255));
    }

    #[test]
    fn stripping_removes_sync_and_ff() {
        let stripped = predefined("xbox360").stripped();
        assert!(stripped.sync.is_empty());
        assert!(stripped.ff.is_empty());
        assert!(!stripped.keys.is_empty());
        assert!(!stripped.abs.is_empty());
    }

    #[test]
    fn unknown_kind_is_empty_profile() {
        let profile = predefined("dance-mat-9000");
        assert!(profile.is_empty());
        assert!(profile.stripped().is_empty());
    }

    #[test]
    fn missing_axis_has_no_range() {
        let profile = predefined("xbox360");
        assert!(profile.abs_range(AbsoluteAxisType::ABS_WHEEL.0).is_none());
    }
}
