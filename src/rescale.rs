//! Axis value rescaling between source and sink ranges.

use crate::error::Error;
use evdev::AbsInfo;

/// Map `value` from the source axis range onto the sink axis range.
///
/// The normalized position `(value - src_min) / (src_max - src_min)` is
/// projected linearly onto the sink range and truncated toward zero.
/// Values outside the advertised source range are not clamped; they
/// extrapolate linearly, matching what raw hardware delivers.
///
/// Unless both ranges are known the value passes through unchanged;
/// that covers non-axis events and mappings onto non-axis codes, which
/// are forwarded as-is.
pub fn rescale(value: i32, source: Option<&AbsInfo>, sink: Option<&AbsInfo>) -> Result<i32, Error> {
    let (src, dst) = match (source, sink) {
        (Some(src), Some(dst)) => (src, dst),
        _ => return Ok(value),
    };

    if src.minimum() == src.maximum() {
        return Err(Error::EmptyAxisRange {
            min: src.minimum(),
            max: src.maximum(),
        });
    }

    let normalized = (value as f64 - src.minimum() as f64)
        / (src.maximum() as f64 - src.minimum() as f64);
    let out = dst.minimum() as f64 + normalized * (dst.maximum() as f64 - dst.minimum() as f64);
    Ok(out as i32)
}
