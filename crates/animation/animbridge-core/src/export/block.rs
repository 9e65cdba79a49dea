//! One timeline into controlled blocks.
//!
//! Curves are classified and grouped into runs keyed by `(class, variable, bone)`
//! in order of first appearance. Each run becomes one interpolator.

use indexmap::IndexMap;

use crate::channel::{classify, ChannelKind, ChannelPath};
use crate::control_vars::ControllerClass;
use crate::curve::Curve;
use crate::data::Interpolator;
use crate::diagnostics::DiagnosticKind;
use crate::element::{ControlledElement, ElementResolver};
use crate::error::Result;
use crate::ids::InterpolatorId;
use crate::timeline::Timeline;

use super::curve_group::{export_color, export_float, export_transform, TransformCurves};
use super::Exporter;

/// Interpolator built for one run, with the element it drives.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportedBlock<'e> {
    pub element: &'e ControlledElement,
    pub class: ControllerClass,
    pub controlled_variable: Option<u32>,
    pub interpolator: InterpolatorId,
}

type RunKey = (ControllerClass, Option<u32>, Option<String>);

/// Export every curve of `timeline`, which animates `element`. Malformed channel
/// paths abort; everything else is reported and skipped.
pub fn export_timeline<'e, R: ElementResolver + ?Sized>(
    exp: &mut Exporter<'e, R>,
    timeline: &Timeline,
    element: &'e ControlledElement,
) -> Result<Vec<ExportedBlock<'e>>> {
    let mut runs: IndexMap<RunKey, Vec<(&Curve, ChannelKind)>> = IndexMap::new();
    for curve in &timeline.curves {
        let channel = classify(&curve.data_path, element.shader)?;
        let Some((class, variable)) = channel.kind.controller() else {
            exp.diags.warn(
                DiagnosticKind::UnknownPropertyGroup,
                format!("no controller for {} on {}", curve.data_path, element.name),
            );
            continue;
        };
        let bone = match &channel.path {
            ChannelPath::Transform { bone, .. } => bone.clone(),
            ChannelPath::Socket { .. } => None,
        };
        runs.entry((class, variable, bone))
            .or_default()
            .push((curve, channel.kind));
    }

    let mut blocks = Vec::new();
    for ((class, variable, bone), curves) in runs {
        let block = match class {
            ControllerClass::Transform => {
                export_transform_run(exp, element, bone.as_deref(), &curves)
            }
            ControllerClass::ColorProperty(_) => export_color_run(exp, element, &curves),
            ControllerClass::ScalarProperty(_) | ControllerClass::AlphaThreshold => {
                export_scalar_run(exp, element, &curves)
            }
        };
        if let Some((target, interp)) = block {
            let id = exp.graph.add_interpolator(interp);
            blocks.push(ExportedBlock {
                element: target,
                class,
                controlled_variable: variable,
                interpolator: id,
            });
        }
    }
    Ok(blocks)
}

fn export_transform_run<'e, R: ElementResolver + ?Sized>(
    exp: &mut Exporter<'e, R>,
    element: &'e ControlledElement,
    bone: Option<&str>,
    curves: &[(&Curve, ChannelKind)],
) -> Option<(&'e ControlledElement, Interpolator)> {
    let resolver = exp.resolver;
    let target = match bone {
        Some(name) => match resolver.element(name) {
            Some(e) if e.bone_name().is_some() => e,
            _ => {
                exp.diags.warn(
                    DiagnosticKind::UnresolvedTarget,
                    format!("bone not found: {}/{name}", element.name),
                );
                return None;
            }
        },
        None => element,
    };

    let mut group = TransformCurves::default();
    for (curve, kind) in curves {
        let i = curve.array_index;
        let slot = match kind {
            ChannelKind::Translation => group.location.get_mut(i),
            ChannelKind::RotationQuaternion => group.quaternion.get_mut(i),
            ChannelKind::RotationEuler => group.euler.get_mut(i),
            ChannelKind::Scale => group.scale.get_mut(i),
            _ => None,
        };
        match slot {
            Some(s) if s.is_none() => *s = Some(*curve),
            _ => exp.diags.warn(
                DiagnosticKind::DuplicateCurve,
                format!("{}[{i}] ignored on {}", curve.data_path, target.name),
            ),
        }
    }
    if group.has_scale() {
        exp.report_scale();
    }

    let label = resolver.identifier_of(target);
    export_transform(&group, &target.bind, label, exp.cfg, &mut exp.diags)
        .map(|ti| (target, Interpolator::Transform(ti)))
}

fn export_color_run<'e, R: ElementResolver + ?Sized>(
    exp: &mut Exporter<'e, R>,
    element: &'e ControlledElement,
    curves: &[(&Curve, ChannelKind)],
) -> Option<(&'e ControlledElement, Interpolator)> {
    let mut rgb: [Option<&Curve>; 3] = [None; 3];
    for (c, _) in curves {
        if let Some(slot) = rgb.get_mut(c.array_index) {
            slot.get_or_insert(*c);
        }
    }
    let [Some(r), Some(g), Some(b)] = rgb else {
        exp.diags.warn(
            DiagnosticKind::IncompleteCurveGroup,
            format!("color needs three channels: {} on {}", curves[0].0.data_path, element.name),
        );
        return None;
    };
    export_color([r, g, b], exp.cfg, &mut exp.diags)
        .map(|data| (element, Interpolator::Point3 { data: Some(data) }))
}

/// Scalar sockets hold one value; the lowest array index is the one exported.
fn export_scalar_run<'e, R: ElementResolver + ?Sized>(
    exp: &mut Exporter<'e, R>,
    element: &'e ControlledElement,
    curves: &[(&Curve, ChannelKind)],
) -> Option<(&'e ControlledElement, Interpolator)> {
    let (curve, _) = curves.iter().min_by_key(|(c, _)| c.array_index)?;
    let data = export_float(curve, exp.cfg);
    Some((element, Interpolator::Float { data: Some(data) }))
}
