//! Bind-pose relative rotation and translation.
//!
//! Curves hold rotation relative to the element's bind rotation so edits compose
//! naturally; export re-applies it. Euler triples are `XYZ` order: X is applied
//! first, then Y, then Z.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Components with a magnitude past this in an interpolator rotation mean "unset".
pub const ROTATION_SENTINEL: f64 = 3e38;
/// Translation components past this are bogus and clamp to zero.
pub const TRANSLATION_SENTINEL: f64 = 1e30;
/// Bind rotations closer to identity than this (radians) are treated as identity.
pub const IDENTITY_ANGLE_EPSILON: f64 = 1e-9;

/// Quaternion from `[w, x, y, z]`, normalized.
#[inline]
pub fn quat_from_wxyz(q: [f64; 4]) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(q[0], q[1], q[2], q[3]))
}

/// `[w, x, y, z]` components of a unit quaternion.
#[inline]
pub fn quat_to_wxyz(q: &UnitQuaternion<f64>) -> [f64; 4] {
    [q.w, q.i, q.j, q.k]
}

/// Rotation from an `XYZ` Euler triple in radians.
#[inline]
pub fn quat_from_euler(e: [f64; 3]) -> UnitQuaternion<f64> {
    UnitQuaternion::from_euler_angles(e[0], e[1], e[2])
}

/// `XYZ` Euler triple of a rotation.
#[inline]
pub fn quat_to_euler(q: &UnitQuaternion<f64>) -> [f64; 3] {
    let (x, y, z) = q.euler_angles();
    [x, y, z]
}

/// Import direction: `bind⁻¹ ∘ key`.
#[inline]
pub fn remove_bind(bind: &UnitQuaternion<f64>, key: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    bind.inverse() * key
}

/// Export direction: `bind ∘ delta`.
#[inline]
pub fn apply_bind(bind: &UnitQuaternion<f64>, delta: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    bind * delta
}

/// Euler triple expressed relative to a bind rotation (via quaternions).
/// Best effort: the round trip through quaternions can land on an equivalent
/// but different triple near gimbal lock.
pub fn euler_remove_bind(bind: &UnitQuaternion<f64>, e: [f64; 3]) -> [f64; 3] {
    quat_to_euler(&remove_bind(bind, &quat_from_euler(e)))
}

/// Inverse of [`euler_remove_bind`].
pub fn euler_apply_bind(bind: &UnitQuaternion<f64>, e: [f64; 3]) -> [f64; 3] {
    quat_to_euler(&apply_bind(bind, &quat_from_euler(e)))
}

/// Bind rotation as seen by curves of a transform interpolator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BindFrame {
    /// `None` when the interpolator rotation was a sentinel or normalization is skipped.
    pub rotation: Option<UnitQuaternion<f64>>,
    pub translation: Vector3<f64>,
}

impl BindFrame {
    pub fn identity() -> Self {
        Self {
            rotation: None,
            translation: Vector3::zeros(),
        }
    }

    /// Read a bind frame from raw interpolator values, clamping sentinels.
    pub fn from_raw(translation: [f64; 3], rotation: [f64; 4]) -> Self {
        let unset = rotation
            .iter()
            .any(|c| !c.is_finite() || c.abs() > ROTATION_SENTINEL);
        let rotation = if unset || rotation.iter().all(|c| *c == 0.0) {
            None
        } else {
            Some(quat_from_wxyz(rotation))
        };
        Self {
            rotation,
            translation: Vector3::from(sanitize_translation(translation)),
        }
    }

    /// Bind rotation, identity when unset.
    pub fn rotation_or_identity(&self) -> UnitQuaternion<f64> {
        self.rotation.unwrap_or_else(UnitQuaternion::identity)
    }

    /// Whether Euler keys need the quaternion detour; identity binds do not.
    pub fn has_effective_rotation(&self, epsilon: f64) -> bool {
        self.rotation.is_some_and(|q| q.angle() > epsilon)
    }

    /// Import: translation key relative to the bind translation.
    pub fn remove_translation(&self, v: [f64; 3]) -> [f64; 3] {
        (Vector3::from(v) - self.translation).into()
    }

    /// Export: absolute translation key.
    pub fn apply_translation(&self, v: [f64; 3]) -> [f64; 3] {
        (Vector3::from(v) + self.translation).into()
    }
}

/// Clamp "unset" translation components to zero.
pub fn sanitize_translation(v: [f64; 3]) -> [f64; 3] {
    v.map(|c| {
        if !c.is_finite() || c.abs() >= TRANSLATION_SENTINEL {
            0.0
        } else {
            c
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn bind_round_trip_within_tolerance() {
        let bind = quat_from_euler([0.3, -1.1, 2.0]);
        let key = quat_from_euler([1.2, 0.4, -0.7]);
        let delta = remove_bind(&bind, &key);
        let back = apply_bind(&bind, &delta);
        assert!(back.angle_to(&key) < 1e-4);
    }

    #[test]
    fn euler_matches_xyz_order() {
        // 90° about X, then 90° about Z
        let e = [FRAC_PI_2, 0.0, FRAC_PI_2];
        let q = quat_from_euler(e);
        let explicit = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2)
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);
        assert!(q.angle_to(&explicit) < 1e-9);
        let back = quat_to_euler(&q);
        for i in 0..3 {
            assert!((back[i] - e[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn sentinel_rotation_is_unset() {
        let bf = BindFrame::from_raw([1.0, 2.0, 3.0], [f64::MAX, 0.0, 0.0, 0.0]);
        assert!(bf.rotation.is_none());
        assert!(!bf.has_effective_rotation(1e-9));
        assert_eq!(bf.remove_translation([1.0, 2.0, 3.0]), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn sentinel_translation_clamps() {
        let bf = BindFrame::from_raw([-3.4e38, 5.0, 1e31], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(bf.translation, Vector3::new(0.0, 5.0, 0.0));
        assert!(bf.rotation.is_some());
        assert!(!bf.has_effective_rotation(1e-9));
    }

    #[test]
    fn euler_bind_round_trip_away_from_lock() {
        let bind = quat_from_euler([0.1, 0.2, 0.3]);
        let e = [0.4, -0.2, 0.9];
        let rel = euler_remove_bind(&bind, e);
        let back = euler_apply_bind(&bind, rel);
        for i in 0..3 {
            assert!((back[i] - e[i]).abs() < 1e-9);
        }
    }
}
