//! Keyframe-data blocks to curves.

use crate::channel::{ChannelPath, TransformProperty};
use crate::config::ConvertConfig;
use crate::curve::{Curve, CurveInterpolation, CurveKey};
use crate::data::{AnimKey, FloatData, KeyGroup, KeyType, PosData, TransformData};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::rotation::{
    euler_remove_bind, quat_from_wxyz, quat_to_euler, quat_to_wxyz, remove_bind, BindFrame,
    IDENTITY_ANGLE_EPSILON,
};
use crate::tangent::{frame, keys_to_curve, linear_tangents};

/// One scalar curve from a key group. Empty groups give nothing; unsupported key
/// types are reported and give nothing.
pub fn curve_from_keys(
    keys: &KeyGroup<f64>,
    data_path: &str,
    array_index: usize,
    group: Option<&str>,
    cfg: &ConvertConfig,
    diags: &mut Diagnostics,
) -> Option<Curve> {
    if keys.is_empty() {
        return None;
    }
    let fps = cfg.fps();
    let (interpolation, curve_keys) = match keys.interpolation {
        KeyType::Quadratic => (CurveInterpolation::Bezier, keys_to_curve(&keys.keys, fps)),
        KeyType::Linear => {
            let mut k = keys.keys.clone();
            linear_tangents(&mut k);
            (CurveInterpolation::Linear, keys_to_curve(&k, fps))
        }
        KeyType::Constant => (
            CurveInterpolation::Constant,
            keys.keys
                .iter()
                .map(|k| CurveKey::flat(frame(k.time, fps), k.value))
                .collect(),
        ),
        other => {
            diags.warn(
                DiagnosticKind::UnsupportedInterpolation,
                format!("{other:?} keys not supported on {data_path}[{array_index}]"),
            );
            return None;
        }
    };
    let mut curve = Curve::new(data_path, array_index)
        .with_group(group)
        .with_interpolation(interpolation);
    curve.keys = curve_keys;
    Some(curve)
}

/// One axis of a vector key group, shifted by `offset`.
pub fn axis_group(keys: &KeyGroup<[f64; 3]>, axis: usize, offset: f64) -> KeyGroup<f64> {
    KeyGroup::new(
        keys.interpolation,
        keys.keys
            .iter()
            .map(|k| {
                let mut a = k.axis(axis);
                a.value -= offset;
                a
            })
            .collect(),
    )
}

pub fn import_float_data(
    data: &FloatData,
    data_path: &str,
    group: Option<&str>,
    cfg: &ConvertConfig,
    diags: &mut Diagnostics,
) -> Vec<Curve> {
    curve_from_keys(&data.keys, data_path, 0, group, cfg, diags)
        .into_iter()
        .collect()
}

/// Colors and other vector data: one curve per component.
pub fn import_pos_data(
    data: &PosData,
    data_path: &str,
    group: Option<&str>,
    cfg: &ConvertConfig,
    diags: &mut Diagnostics,
) -> Vec<Curve> {
    if data.keys.is_empty() {
        return Vec::new();
    }
    if !matches!(
        data.keys.interpolation,
        KeyType::Linear | KeyType::Quadratic | KeyType::Constant
    ) {
        diags.warn(
            DiagnosticKind::UnsupportedInterpolation,
            format!("{:?} keys not supported on {data_path}", data.keys.interpolation),
        );
        return Vec::new();
    }
    (0..3)
        .filter_map(|i| curve_from_keys(&axis_group(&data.keys, i, 0.0), data_path, i, group, cfg, diags))
        .collect()
}

/// Transform data relative to `bind`. `bone` prefixes every channel path.
pub fn import_transform_data(
    data: &TransformData,
    bind: &BindFrame,
    bone: Option<&str>,
    cfg: &ConvertConfig,
    diags: &mut Diagnostics,
) -> Vec<Curve> {
    let group = bone.or(Some("Object Transforms"));
    let path = |p| ChannelPath::transform(bone, p).to_string();
    let label = bone.unwrap_or("object");
    let mut curves = Vec::new();

    match data.rotation_type {
        KeyType::XyzRotation => {
            curves.extend(import_euler(data, bind, &path(TransformProperty::RotationEuler), group, label, cfg, diags));
        }
        KeyType::Linear | KeyType::Quadratic => {
            curves.extend(import_quaternions(data, bind, &path(TransformProperty::RotationQuaternion), group, cfg, diags));
        }
        KeyType::NoInterp => {}
        other => {
            if !data.quaternion_keys.is_empty() {
                diags.warn(
                    DiagnosticKind::UnsupportedInterpolation,
                    format!("rotation type {other:?} not supported on {label}"),
                );
            }
        }
    }

    if !data.translations.is_empty() {
        let p = path(TransformProperty::Location);
        for i in 0..3 {
            let g = axis_group(&data.translations, i, bind.translation[i]);
            curves.extend(curve_from_keys(&g, &p, i, group, cfg, diags));
        }
    }

    if !data.scales.is_empty() {
        let p = path(TransformProperty::Scale);
        for i in 0..3 {
            curves.extend(curve_from_keys(&data.scales, &p, i, group, cfg, diags));
        }
    }
    curves
}

/// Quaternion keys become four linear curves `[w, x, y, z]`.
fn import_quaternions(
    data: &TransformData,
    bind: &BindFrame,
    data_path: &str,
    group: Option<&str>,
    cfg: &ConvertConfig,
    diags: &mut Diagnostics,
) -> Vec<Curve> {
    if data.quaternion_keys.is_empty() {
        return Vec::new();
    }
    let mut axes: [KeyGroup<f64>; 4] = Default::default();
    for g in axes.iter_mut() {
        g.interpolation = KeyType::Linear;
    }
    for k in &data.quaternion_keys {
        let value = match &bind.rotation {
            Some(b) => quat_to_wxyz(&remove_bind(b, &quat_from_wxyz(k.value))),
            None => k.value,
        };
        for (g, v) in axes.iter_mut().zip(value) {
            g.keys.push(AnimKey::at(k.time, v));
        }
    }
    axes.iter()
        .enumerate()
        .filter_map(|(i, g)| curve_from_keys(g, data_path, i, group, cfg, diags))
        .collect()
}

fn import_euler(
    data: &TransformData,
    bind: &BindFrame,
    data_path: &str,
    group: Option<&str>,
    label: &str,
    cfg: &ConvertConfig,
    diags: &mut Diagnostics,
) -> Vec<Curve> {
    let mut axes = data.xyz_rotations.clone();
    if axes.iter().all(KeyGroup::is_empty) {
        return Vec::new();
    }
    let [gx, gy, gz] = &data.xyz_rotations;
    let aligned = gx.len() == gy.len()
        && gx.len() == gz.len()
        && gx
            .keys
            .iter()
            .zip(&gy.keys)
            .zip(&gz.keys)
            .all(|((x, y), z)| cfg.same_time(x.time, y.time) && cfg.same_time(x.time, z.time));

    if !aligned {
        diags.warn(
            DiagnosticKind::MisalignedEulerKeys,
            format!("Euler keys do not align on {label}; rotation may be approximate"),
        );
    }

    if bind.has_effective_rotation(IDENTITY_ANGLE_EPSILON) {
        let b = bind.rotation_or_identity();
        if aligned {
            for i in 0..gx.len() {
                let e = [gx.keys[i].value, gy.keys[i].value, gz.keys[i].value];
                let rel = euler_remove_bind(&b, e);
                for (axis, v) in axes.iter_mut().zip(rel) {
                    axis.keys[i].value = v;
                }
            }
        } else {
            let be = quat_to_euler(&b);
            for (axis, offset) in axes.iter_mut().zip(be) {
                for k in &mut axis.keys {
                    k.value -= offset;
                }
            }
        }
    }

    axes.iter()
        .enumerate()
        .filter_map(|(i, g)| curve_from_keys(g, data_path, i, group, cfg, diags))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FloatKey, QuatKey};
    use crate::rotation::quat_from_euler;
    use approx::assert_abs_diff_eq;

    fn cfg() -> ConvertConfig {
        ConvertConfig::default()
    }

    #[test]
    fn quadratic_keys_become_bezier() {
        let g = KeyGroup::new(
            KeyType::Quadratic,
            vec![
                FloatKey::quadratic(0.0, 0.0, 0.0, 3.0),
                FloatKey::quadratic(1.0, 3.0, 3.0, 0.0),
            ],
        );
        let mut d = Diagnostics::new();
        let c = curve_from_keys(&g, "x", 0, None, &cfg(), &mut d).unwrap();
        assert_eq!(c.interpolation, CurveInterpolation::Bezier);
        assert_eq!(c.keys[1].frame, 31.0);
        assert_abs_diff_eq!(c.keys[0].handle_right[1], 1.0, epsilon = 1e-12);
        assert!(d.is_empty());
    }

    #[test]
    fn linear_handles_lie_on_segments() {
        let g = KeyGroup::new(
            KeyType::Linear,
            vec![FloatKey::at(0.0, 0.0), FloatKey::at(1.0, 3.0), FloatKey::at(2.0, 0.0)],
        );
        let mut d = Diagnostics::new();
        let c = curve_from_keys(&g, "x", 0, None, &cfg(), &mut d).unwrap();
        assert_eq!(c.interpolation, CurveInterpolation::Linear);
        assert_abs_diff_eq!(c.keys[1].handle_left[1], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.keys[1].handle_right[1], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.evaluate(16.0), 1.5, epsilon = 1e-9);
    }

    #[test]
    fn unsupported_kind_skips_group() {
        let g = KeyGroup::new(KeyType::Tbc, vec![FloatKey::at(0.0, 1.0)]);
        let mut d = Diagnostics::new();
        assert!(curve_from_keys(&g, "x", 0, None, &cfg(), &mut d).is_none());
        assert!(d.has(DiagnosticKind::UnsupportedInterpolation));
    }

    #[test]
    fn translation_and_quaternion_remove_bind() {
        let bind_q = quat_from_euler([0.0, 0.0, 0.5]);
        let bind = BindFrame {
            rotation: Some(bind_q),
            translation: [1.0, 2.0, 3.0].into(),
        };
        let key_q = quat_from_euler([0.2, 0.0, 0.5]);
        let data = TransformData {
            rotation_type: KeyType::Quadratic,
            quaternion_keys: vec![QuatKey {
                time: 0.0,
                value: quat_to_wxyz(&key_q),
            }],
            translations: KeyGroup::new(KeyType::Linear, vec![AnimKey::at(0.0, [1.5, 2.0, 1.0])]),
            ..Default::default()
        };
        let mut d = Diagnostics::new();
        let curves = import_transform_data(&data, &bind, Some("Tail"), &cfg(), &mut d);
        assert_eq!(curves.len(), 7);
        let loc: Vec<f64> = curves
            .iter()
            .filter(|c| c.data_path.ends_with("location"))
            .map(|c| c.keys[0].value)
            .collect();
        assert_eq!(loc, vec![0.5, 0.0, -2.0]);
        let w = curves
            .iter()
            .find(|c| c.data_path == r#"pose.bones["Tail"].rotation_quaternion"# && c.array_index == 0)
            .unwrap();
        // delta is 0.2 rad about X
        assert_abs_diff_eq!(w.keys[0].value, (0.1f64).cos(), epsilon = 1e-9);
    }

    #[test]
    fn misaligned_euler_falls_back_to_subtraction() {
        let bind = BindFrame {
            rotation: Some(quat_from_euler([0.0, 0.0, 0.25])),
            translation: nalgebra::Vector3::zeros(),
        };
        let mut data = TransformData {
            rotation_type: KeyType::XyzRotation,
            ..Default::default()
        };
        data.xyz_rotations[0] = KeyGroup::new(KeyType::Linear, vec![FloatKey::at(0.0, 0.0)]);
        data.xyz_rotations[2] = KeyGroup::new(
            KeyType::Linear,
            vec![FloatKey::at(0.0, 1.0), FloatKey::at(1.0, 2.0)],
        );
        let mut d = Diagnostics::new();
        let curves = import_transform_data(&data, &bind, None, &cfg(), &mut d);
        assert!(d.has(DiagnosticKind::MisalignedEulerKeys));
        assert_eq!(curves.len(), 2);
        assert_eq!(curves[1].array_index, 2);
        assert_abs_diff_eq!(curves[1].keys[0].value, 0.75, epsilon = 1e-9);
        assert_abs_diff_eq!(curves[1].keys[1].value, 1.75, epsilon = 1e-9);
    }

    #[test]
    fn sentinel_bind_keeps_raw_quaternions() {
        let bind = BindFrame::from_raw([0.0; 3], [f64::MAX; 4]);
        let data = TransformData {
            rotation_type: KeyType::Linear,
            quaternion_keys: vec![QuatKey {
                time: 0.0,
                value: [0.5, 0.5, 0.5, 0.5],
            }],
            ..Default::default()
        };
        let mut d = Diagnostics::new();
        let curves = import_transform_data(&data, &bind, None, &cfg(), &mut d);
        let vals: Vec<f64> = curves.iter().map(|c| c.keys[0].value).collect();
        assert_eq!(vals, vec![0.5, 0.5, 0.5, 0.5]);
        assert_eq!(curves[0].data_path, "rotation_quaternion");
    }
}
