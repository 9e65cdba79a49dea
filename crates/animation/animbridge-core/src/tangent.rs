//! Tangent conversion between velocity form and handle-point form.
//!
//! Velocity form stores one slope per side, scaled to the neighboring interval.
//! Handle form stores two control points a third of the interval away from the key.
//! Both directions omit the missing neighbor at the first/last key; there is no
//! wraparound.

use crate::curve::{CurveKey, Point};
use crate::data::FloatKey;

const PARTIAL: f64 = 1.0 / 3.0;

/// Handle x coordinate of a key time: a 1-based frame index.
#[inline]
pub fn frame(time: f64, sample_rate: f64) -> f64 {
    time * sample_rate + 1.0
}

/// Handles for `k1` from its velocity tangents. `k0`/`k2` are the neighbors, if any.
pub fn to_handles(
    k0: Option<&FloatKey>,
    k1: &FloatKey,
    k2: Option<&FloatKey>,
    sample_rate: f64,
) -> (Point, Point) {
    let frame1 = frame(k1.time, sample_rate);

    let (delta_r, slope_r) = match k2 {
        Some(k2) => {
            let d = frame(k2.time, sample_rate) - frame1;
            (d, k1.backward / d)
        }
        None => (1.0, k1.backward),
    };
    let (delta_l, slope_l) = match k0 {
        Some(k0) => {
            let d = frame1 - frame(k0.time, sample_rate);
            (d, k1.forward / d)
        }
        None => (1.0, k1.forward),
    };

    let handle_left = [
        frame1 - delta_l * PARTIAL,
        k1.value - slope_l * delta_l * PARTIAL,
    ];
    let handle_right = [
        frame1 + delta_r * PARTIAL,
        k1.value + slope_r * delta_r * PARTIAL,
    ];
    (handle_left, handle_right)
}

/// Build a full curve key for `k1`.
pub fn to_curve_key(
    k0: Option<&FloatKey>,
    k1: &FloatKey,
    k2: Option<&FloatKey>,
    sample_rate: f64,
) -> CurveKey {
    let (handle_left, handle_right) = to_handles(k0, k1, k2, sample_rate);
    CurveKey {
        frame: frame(k1.time, sample_rate),
        value: k1.value,
        handle_left,
        handle_right,
    }
}

#[inline]
fn handle_slope(handle: Point, key: &CurveKey) -> f64 {
    let dx = handle[0] - key.frame;
    if dx.abs() <= f64::EPSILON {
        // zero-width handle carries no slope
        return 0.0;
    }
    (handle[1] - key.value) / dx
}

/// Velocity tangents `(forward, backward)` for `kfp1`; exact inverse of [`to_handles`].
pub fn to_tangents(
    kfp0: Option<&CurveKey>,
    kfp1: &CurveKey,
    kfp2: Option<&CurveKey>,
) -> (f64, f64) {
    let slope_l = handle_slope(kfp1.handle_left, kfp1);
    let slope_r = handle_slope(kfp1.handle_right, kfp1);

    let forward = match kfp0 {
        Some(k0) => slope_l * (kfp1.frame - k0.frame),
        None => slope_l,
    };
    let backward = match kfp2 {
        Some(k2) => slope_r * (k2.frame - kfp1.frame),
        None => slope_r,
    };
    (forward, backward)
}

/// Curve keys for a whole key sequence, neighbors wired correctly at both ends.
pub fn keys_to_curve(keys: &[FloatKey], sample_rate: f64) -> Vec<CurveKey> {
    (0..keys.len())
        .map(|i| {
            let prev = i.checked_sub(1).map(|p| &keys[p]);
            to_curve_key(prev, &keys[i], keys.get(i + 1), sample_rate)
        })
        .collect()
}

/// Velocity-form keys for a whole curve; times are `(frame - 1) / sample_rate`.
pub fn curve_to_keys(keys: &[CurveKey], sample_rate: f64) -> Vec<FloatKey> {
    (0..keys.len())
        .map(|i| {
            let prev = i.checked_sub(1).map(|p| &keys[p]);
            let (forward, backward) = to_tangents(prev, &keys[i], keys.get(i + 1));
            FloatKey {
                time: (keys[i].frame - 1.0) / sample_rate,
                value: keys[i].value,
                forward,
                backward,
            }
        })
        .collect()
}

/// Velocity tangents for linear keys: each side spans its neighboring segment.
/// Boundary keys reuse the tangent of their single segment.
pub fn linear_tangents(keys: &mut [FloatKey]) {
    let n = keys.len();
    if n < 2 {
        return;
    }
    for i in 0..n {
        let incoming = (i > 0).then(|| keys[i].value - keys[i - 1].value);
        let outgoing = (i + 1 < n).then(|| keys[i + 1].value - keys[i].value);
        keys[i].forward = incoming.or(outgoing).unwrap_or(0.0);
        keys[i].backward = outgoing.or(incoming).unwrap_or(0.0);
    }
}
