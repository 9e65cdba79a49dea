//! One controlled block (or chained controller) into its element's timeline.

use crate::channel::ChannelPath;
use crate::control_vars::{self, effect_float, ControllerClass};
use crate::data::Interpolator;
use crate::diagnostics::DiagnosticKind;
use crate::element::ElementResolver;
use crate::error::{ConvertError, Result};
use crate::ids::{ControllerId, InterpolatorId};
use crate::naming::{make_name, SHADER_TAG};
use crate::rotation::BindFrame;
use crate::timeline::TimelineLibrary;

use super::curve_group::{import_float_data, import_pos_data, import_transform_data};
use super::{Importer, Stage};

/// The parts of a controlled block the importer needs. Chained controllers are
/// imported through the same path with `controller` set and no interpolator.
#[derive(Clone, Copy, Debug)]
pub struct BlockSource<'g> {
    pub node_name: &'g str,
    pub class: ControllerClass,
    pub controlled_variable: Option<u32>,
    pub controller: Option<ControllerId>,
    pub interpolator: Option<InterpolatorId>,
}

/// Import one block into the staged timeline of `animation`. Returns the timeline
/// name written, if any.
pub fn import_block<R: ElementResolver + ?Sized>(
    imp: &mut Importer<'_, R>,
    stage: &mut Stage,
    library: &TimelineLibrary,
    animation: &str,
    src: &BlockSource<'_>,
) -> Result<Option<String>> {
    let (graph, resolver, cfg) = (imp.graph, imp.resolver, imp.cfg);
    let Some(element) = resolver.resolve(src.node_name) else {
        imp.diags.warn(
            DiagnosticKind::UnresolvedTarget,
            format!("controller target not found: {}", src.node_name),
        );
        return Ok(None);
    };

    let controller = match src.controller {
        Some(id) => Some(graph.controller(id, src.node_name)?),
        None => None,
    };
    let Some(interp_id) = src
        .interpolator
        .or_else(|| controller.and_then(|c| c.interpolator))
    else {
        imp.diags.note(
            DiagnosticKind::MissingData,
            format!("no interpolator for {} on {}", src.class.block_name(), src.node_name),
        );
        return Ok(None);
    };
    let interp = graph.interpolator(interp_id, src.node_name)?;

    match interp {
        Interpolator::Blend { manager_controlled: true } => {
            imp.diags.note(
                DiagnosticKind::IgnoredInterpolator,
                format!("manager-controlled blend interpolator on {}", src.node_name),
            );
            return Ok(None);
        }
        Interpolator::Blend { .. } => {
            imp.diags.warn(
                DiagnosticKind::UnsupportedInterpolation,
                format!("blend interpolator on {} is not manager controlled", src.node_name),
            );
            return Ok(None);
        }
        _ => {}
    }

    let variable = src
        .controlled_variable
        .or_else(|| controller.and_then(|c| c.controlled_variable));

    match (src.class, interp) {
        (ControllerClass::Transform, Interpolator::Transform(ti)) => {
            let Some(data) = &ti.data else {
                imp.diags.note(
                    DiagnosticKind::MissingData,
                    format!("transform interpolator on {} has no data", src.node_name),
                );
                return Ok(None);
            };
            let bind = if cfg.raw_transforms {
                BindFrame::identity()
            } else {
                BindFrame::from_raw(ti.translation, ti.rotation)
            };
            let curves =
                import_transform_data(data, &bind, element.bone_name(), cfg, &mut imp.diags);
            let owner = element.timeline_owner();
            let name = make_name(animation, owner, None);
            stage.add_curves(library, &name, owner, None, curves, &mut imp.diags);
            Ok(Some(name))
        }
        (class, Interpolator::Float { .. } | Interpolator::Point3 { .. })
            if class.is_property()
                && matches!(class, ControllerClass::ColorProperty(_))
                    == matches!(interp, Interpolator::Point3 { .. }) =>
        {
            let variable = match class {
                ControllerClass::AlphaThreshold => {
                    variable.unwrap_or(effect_float::ALPHA_TRANSPARENCY)
                }
                _ => variable.unwrap_or(0),
            };
            let Some((node, socket, direction)) =
                control_vars::find_by_variable(cfg.game, class, variable)
            else {
                return Err(ConvertError::UnmappedControlledVariable {
                    class,
                    variable,
                    target: src.node_name.to_string(),
                });
            };
            let path = ChannelPath::socket(node, direction, socket).to_string();
            let curves = match interp {
                Interpolator::Float { data: Some(d) } => {
                    import_float_data(d, &path, Some(SHADER_TAG), cfg, &mut imp.diags)
                }
                Interpolator::Point3 { data: Some(d) } => {
                    import_pos_data(d, &path, Some(SHADER_TAG), cfg, &mut imp.diags)
                }
                _ => {
                    imp.diags.note(
                        DiagnosticKind::MissingData,
                        format!("{} interpolator on {} has no data", interp.kind_name(), src.node_name),
                    );
                    return Ok(None);
                }
            };
            let name = make_name(animation, &element.name, Some(SHADER_TAG));
            stage.add_curves(library, &name, &element.name, Some(SHADER_TAG), curves, &mut imp.diags);
            Ok(Some(name))
        }
        (class, other) => {
            imp.diags.warn(
                DiagnosticKind::UnsupportedInterpolation,
                format!(
                    "{} interpolator cannot drive {} on {}",
                    other.kind_name(),
                    class.block_name(),
                    src.node_name
                ),
            );
            Ok(None)
        }
    }
}
