//! Curves to keyframe-data blocks.
//!
//! Scalar, color, and Euler curves keep their keys and convert handles back to
//! velocity tangents. Quaternion and translation groups are resampled on a fixed
//! step instead, since their handles may have been edited into shapes the key
//! format cannot carry.

use crate::config::ConvertConfig;
use crate::curve::{Curve, CurveInterpolation};
use crate::data::{
    AnimKey, FloatData, KeyGroup, KeyType, PosData, QuatKey, TransformData, TransformInterpolator,
};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::element::BindTransform;
use crate::rotation::{
    apply_bind, euler_apply_bind, quat_from_wxyz, quat_to_euler, quat_to_wxyz, BindFrame,
    IDENTITY_ANGLE_EPSILON,
};
use crate::tangent::{curve_to_keys, to_tangents};

/// Key type a curve exports as.
pub fn key_type_of(curve: &Curve) -> KeyType {
    match curve.interpolation {
        CurveInterpolation::Bezier => KeyType::Quadratic,
        CurveInterpolation::Linear => KeyType::Linear,
        CurveInterpolation::Constant | CurveInterpolation::None => KeyType::Constant,
    }
}

/// Velocity-form keys for one curve. Only quadratic keys carry tangents.
pub fn key_group_from_curve(curve: &Curve, cfg: &ConvertConfig) -> KeyGroup<f64> {
    let kind = key_type_of(curve);
    let mut keys = curve_to_keys(&curve.keys, cfg.fps());
    if kind != KeyType::Quadratic {
        for k in &mut keys {
            k.forward = 0.0;
            k.backward = 0.0;
        }
    }
    KeyGroup::new(kind, keys)
}

pub fn export_float(curve: &Curve, cfg: &ConvertConfig) -> FloatData {
    FloatData {
        keys: key_group_from_curve(curve, cfg),
    }
}

/// Three color curves to vector keys. Channels must be keyed on the same frames.
pub fn export_color(
    curves: [&Curve; 3],
    cfg: &ConvertConfig,
    diags: &mut Diagnostics,
) -> Option<PosData> {
    let n = curves[0].keys.len();
    let aligned = curves.iter().all(|c| c.keys.len() == n)
        && (0..n).all(|i| {
            let f = curves[0].keys[i].frame;
            curves.iter().all(|c| (c.keys[i].frame - f).abs() <= cfg.key_time_epsilon * cfg.fps())
        });
    if !aligned {
        diags.warn(
            DiagnosticKind::MismatchedColorKeys,
            format!("color channels of {} are keyed on different frames", curves[0].data_path),
        );
        return None;
    }

    let kind = key_type_of(curves[0]);
    let keys = (0..n)
        .map(|i| {
            let mut key = AnimKey::at(cfg.time_of(curves[0].keys[i].frame), [0.0; 3]);
            for (j, c) in curves.iter().enumerate() {
                key.value[j] = c.keys[i].value;
                if kind == KeyType::Quadratic {
                    let prev = i.checked_sub(1).map(|p| &c.keys[p]);
                    let (f, b) = to_tangents(prev, &c.keys[i], c.keys.get(i + 1));
                    key.forward[j] = f;
                    key.backward[j] = b;
                }
            }
            key
        })
        .collect();
    Some(PosData {
        keys: KeyGroup::new(kind, keys),
    })
}

/// Curves of one transform target, bucketed by array index.
#[derive(Default, Debug)]
pub struct TransformCurves<'c> {
    pub location: [Option<&'c Curve>; 3],
    pub quaternion: [Option<&'c Curve>; 4],
    pub euler: [Option<&'c Curve>; 3],
    pub scale: [Option<&'c Curve>; 3],
}

fn complete<const N: usize>(slots: &[Option<&Curve>; N]) -> bool {
    slots.iter().all(Option::is_some)
}

fn present<const N: usize>(slots: &[Option<&Curve>; N]) -> bool {
    slots.iter().any(Option::is_some)
}

fn flatten<'c, const N: usize>(slots: &[Option<&'c Curve>; N]) -> Vec<&'c Curve> {
    slots.iter().flatten().copied().collect()
}

impl<'c> TransformCurves<'c> {
    pub fn has_scale(&self) -> bool {
        present(&self.scale)
    }

    /// Time span of the rotation and translation keys.
    fn time_range(&self, cfg: &ConvertConfig) -> Option<(f64, f64)> {
        self.location
            .iter()
            .chain(&self.quaternion)
            .chain(&self.euler)
            .flatten()
            .filter_map(|c| c.frame_range())
            .reduce(|(a, b), (lo, hi)| (a.min(lo), b.max(hi)))
            .map(|(lo, hi)| (cfg.time_of(lo), cfg.time_of(hi)))
    }
}

/// Resample times `tmin + i * step` up to `tmax` (inclusive within epsilon).
pub fn sample_times(tmin: f64, tmax: f64, cfg: &ConvertConfig) -> Vec<f64> {
    let step = cfg.step();
    let span = (tmax - tmin).max(0.0);
    let count = ((span + cfg.key_time_epsilon) / step).floor() as usize + 1;
    (0..count).map(|i| tmin + i as f64 * step).collect()
}

/// Build a transform interpolator for one target. `None` when no complete
/// rotation or translation group exists.
pub fn export_transform(
    curves: &TransformCurves<'_>,
    bind: &BindTransform,
    label: &str,
    cfg: &ConvertConfig,
    diags: &mut Diagnostics,
) -> Option<TransformInterpolator> {
    let use_quat = complete(&curves.quaternion);
    let use_euler = !use_quat && complete(&curves.euler);
    let use_loc = complete(&curves.location);

    for (name, partial) in [
        ("location", present(&curves.location) && !use_loc),
        ("rotation_quaternion", present(&curves.quaternion) && !use_quat),
        ("rotation_euler", present(&curves.euler) && !complete(&curves.euler)),
    ] {
        if partial {
            diags.warn(
                DiagnosticKind::IncompleteCurveGroup,
                format!("incomplete {name} curves on {label}"),
            );
        }
    }
    if !use_quat && !use_euler && !use_loc {
        diags.warn(
            DiagnosticKind::IncompleteCurveGroup,
            format!("no usable transform curves on {label}"),
        );
        return None;
    }

    let frame = if cfg.raw_transforms {
        BindFrame::identity()
    } else {
        bind.to_frame()
    };
    let Some((tmin, tmax)) = curves.time_range(cfg) else {
        diags.warn(
            DiagnosticKind::MissingData,
            format!("transform curves on {label} have no keys"),
        );
        return None;
    };
    let times = sample_times(tmin, tmax, cfg);
    let mut data = TransformData::default();

    if use_quat {
        let q = flatten(&curves.quaternion);
        data.rotation_type = KeyType::Quadratic;
        data.quaternion_keys = times
            .iter()
            .map(|&t| {
                let fr = cfg.frame_of(t);
                let raw = [q[0].evaluate(fr), q[1].evaluate(fr), q[2].evaluate(fr), q[3].evaluate(fr)];
                let value = match &frame.rotation {
                    Some(b) => quat_to_wxyz(&apply_bind(b, &quat_from_wxyz(raw))),
                    None => raw,
                };
                QuatKey { time: t, value }
            })
            .collect();
    } else if use_euler {
        data.rotation_type = KeyType::XyzRotation;
        let mut axes = flatten(&curves.euler)
            .into_iter()
            .map(|c| key_group_from_curve(c, cfg));
        let mut groups: [KeyGroup<f64>; 3] = Default::default();
        for g in groups.iter_mut() {
            if let Some(next) = axes.next() {
                *g = next;
            }
        }
        if frame.has_effective_rotation(IDENTITY_ANGLE_EPSILON) {
            reapply_euler_bind(&mut groups, &frame, cfg);
        }
        data.xyz_rotations = groups;
    }

    if use_loc {
        let l = flatten(&curves.location);
        data.translations = KeyGroup::new(
            KeyType::Linear,
            times
                .iter()
                .map(|&t| {
                    let fr = cfg.frame_of(t);
                    let v = [l[0].evaluate(fr), l[1].evaluate(fr), l[2].evaluate(fr)];
                    AnimKey::at(t, frame.apply_translation(v))
                })
                .collect(),
        );
    }

    Some(TransformInterpolator {
        translation: bind.translation,
        rotation: bind.rotation,
        scale: bind.scale,
        data: Some(data),
    })
}

/// Inverse of the import-side bind removal for Euler keys.
fn reapply_euler_bind(groups: &mut [KeyGroup<f64>; 3], frame: &BindFrame, cfg: &ConvertConfig) {
    let b = frame.rotation_or_identity();
    let n = groups[0].len();
    let aligned = groups.iter().all(|g| g.len() == n)
        && (0..n).all(|i| {
            cfg.same_time(groups[0].keys[i].time, groups[1].keys[i].time)
                && cfg.same_time(groups[0].keys[i].time, groups[2].keys[i].time)
        });
    if aligned {
        for i in 0..n {
            let e = [groups[0].keys[i].value, groups[1].keys[i].value, groups[2].keys[i].value];
            let abs = euler_apply_bind(&b, e);
            for (g, v) in groups.iter_mut().zip(abs) {
                g.keys[i].value = v;
            }
        }
    } else {
        let be = quat_to_euler(&b);
        for (g, offset) in groups.iter_mut().zip(be) {
            for k in &mut g.keys {
                k.value += offset;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::CurveKey;
    use approx::assert_abs_diff_eq;

    fn linear_curve(path: &str, index: usize, points: &[(f64, f64)]) -> Curve {
        let mut c = Curve::new(path, index).with_interpolation(CurveInterpolation::Linear);
        for &(f, v) in points {
            c.insert(CurveKey::flat(f, v));
        }
        c
    }

    #[test]
    fn sample_times_include_end() {
        let cfg = ConvertConfig::default();
        let t = sample_times(0.0, 1.0, &cfg);
        assert_eq!(t.len(), 31);
        assert_abs_diff_eq!(*t.last().unwrap(), 1.0, epsilon = 1e-9);
        assert_eq!(sample_times(0.5, 0.5, &cfg), vec![0.5]);
    }

    #[test]
    fn color_requires_matching_frames() {
        let cfg = ConvertConfig::default();
        let r = linear_curve("c", 0, &[(1.0, 1.0), (11.0, 0.0)]);
        let g = linear_curve("c", 1, &[(1.0, 0.5), (11.0, 0.5)]);
        let b = linear_curve("c", 2, &[(1.0, 0.0), (12.0, 1.0)]);
        let mut d = Diagnostics::new();
        assert!(export_color([&r, &g, &b], &cfg, &mut d).is_none());
        assert!(d.has(DiagnosticKind::MismatchedColorKeys));

        let b = linear_curve("c", 2, &[(1.0, 0.0), (11.0, 1.0)]);
        let data = export_color([&r, &g, &b], &cfg, &mut d).unwrap();
        assert_eq!(data.keys.interpolation, KeyType::Linear);
        assert_eq!(data.keys.keys[1].value, [0.0, 0.5, 1.0]);
        assert_abs_diff_eq!(data.keys.keys[1].time, 10.0 / 30.0, epsilon = 1e-12);
    }

    #[test]
    fn translation_adds_bind_back() {
        let cfg = ConvertConfig::default();
        let x = linear_curve("location", 0, &[(1.0, 0.0), (31.0, 3.0)]);
        let y = linear_curve("location", 1, &[(1.0, 0.0), (31.0, 0.0)]);
        let z = linear_curve("location", 2, &[(1.0, 0.0), (31.0, 0.0)]);
        let curves = TransformCurves {
            location: [Some(&x), Some(&y), Some(&z)],
            ..Default::default()
        };
        let bind = BindTransform {
            translation: [10.0, 0.0, 0.0],
            ..BindTransform::IDENTITY
        };
        let mut d = Diagnostics::new();
        let ti = export_transform(&curves, &bind, "Bip01", &cfg, &mut d).unwrap();
        let data = ti.data.unwrap();
        assert_eq!(data.translations.len(), 31);
        assert_abs_diff_eq!(data.translations.keys[15].value[0], 11.5, epsilon = 1e-9);
        assert_eq!(ti.translation, [10.0, 0.0, 0.0]);
        assert!(d.is_empty());
    }

    #[test]
    fn incomplete_group_is_skipped() {
        let cfg = ConvertConfig::default();
        let x = linear_curve("location", 0, &[(1.0, 0.0)]);
        let curves = TransformCurves {
            location: [Some(&x), None, None],
            ..Default::default()
        };
        let mut d = Diagnostics::new();
        assert!(export_transform(&curves, &BindTransform::IDENTITY, "Bip01", &cfg, &mut d).is_none());
        assert_eq!(d.count(DiagnosticKind::IncompleteCurveGroup), 2);
    }

    #[test]
    fn keyless_group_is_reported() {
        let cfg = ConvertConfig::default();
        let axes: Vec<Curve> = (0..3).map(|i| Curve::new("location", i)).collect();
        let curves = TransformCurves {
            location: [Some(&axes[0]), Some(&axes[1]), Some(&axes[2])],
            ..Default::default()
        };
        let mut d = Diagnostics::new();
        assert!(export_transform(&curves, &BindTransform::IDENTITY, "Bip01", &cfg, &mut d).is_none());
        assert_eq!(d.count(DiagnosticKind::MissingData), 1);
        assert!(!d.has(DiagnosticKind::IncompleteCurveGroup));
    }
}
