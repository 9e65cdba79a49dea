//! Timelines into sequences and attached controller chains.

use crate::config::ConvertConfig;
use crate::control_vars::ControllerClass;
use crate::element::{ControlledElement, ElementKind, ElementResolver};
use crate::error::Result;
use crate::graph::{AnimationSequence, ControlledBlock, Controller, CycleType, TextKey};
use crate::timeline::Timeline;

use super::block::{export_timeline, ExportedBlock};
use super::Exporter;

/// One member of a named animation: a timeline and the element that plays it.
pub type Member<'e> = (&'e Timeline, &'e ControlledElement);

/// `(start, stop)` in seconds over the first/last keys of every member curve.
pub fn sequence_bounds(timelines: &[&Timeline], cfg: &ConvertConfig) -> (f64, f64) {
    timelines
        .iter()
        .filter_map(|t| t.curve_frame_range())
        .reduce(|(a, b), (lo, hi)| (a.min(lo), b.max(hi)))
        .map_or((0.0, 0.0), |(lo, hi)| (cfg.time_of(lo), cfg.time_of(hi)))
}

/// Cyclic only when every member is.
pub fn sequence_cyclic(timelines: &[&Timeline]) -> bool {
    !timelines.is_empty() && timelines.iter().all(|t| t.cyclic)
}

/// Union of member markers ordered by time; the first occurrence of a label wins.
pub fn collect_text_keys(timelines: &[&Timeline]) -> Vec<TextKey> {
    let mut keys: Vec<TextKey> = Vec::new();
    for t in timelines {
        for (label, time) in &t.markers {
            if !keys.iter().any(|k| &k.label == label) {
                keys.push(TextKey {
                    time: *time,
                    label: label.clone(),
                });
            }
        }
    }
    keys.sort_by(|a, b| a.time.total_cmp(&b.time));
    keys
}

fn timing(timeline: &Timeline, cfg: &ConvertConfig) -> (f64, f64, CycleType) {
    let (lo, hi) = timeline
        .curve_frame_range()
        .map_or((0.0, 0.0), |(lo, hi)| (cfg.time_of(lo), cfg.time_of(hi)));
    (lo, hi, CycleType::from_cyclic(timeline.cyclic))
}

fn property_controller(identifier: &str, block: &ExportedBlock<'_>, timing: (f64, f64, CycleType)) -> Controller {
    let mut c = Controller::new(block.class);
    c.target = Some(identifier.to_string());
    c.controlled_variable = block.controlled_variable;
    c.interpolator = Some(block.interpolator);
    (c.start_time, c.stop_time, c.cycle_type) = timing;
    c
}

/// Skeleton root that a bone block accumulates into, by controller-graph identifier.
fn accum_root<R: ElementResolver + ?Sized>(resolver: &R, element: &ControlledElement) -> Option<String> {
    let ElementKind::Bone { skeleton } = &element.kind else {
        return None;
    };
    let root = resolver
        .element(skeleton)
        .map_or(skeleton.as_str(), |e| resolver.identifier_of(e));
    Some(root.to_string())
}

/// Assemble one named sequence.
pub fn export_sequence<'e, R: ElementResolver + ?Sized>(
    exp: &mut Exporter<'e, R>,
    name: &str,
    members: &[Member<'e>],
) -> Result<AnimationSequence> {
    let timelines: Vec<&Timeline> = members.iter().map(|(t, _)| *t).collect();
    let (start, stop) = sequence_bounds(&timelines, exp.cfg);
    let cyclic = sequence_cyclic(&timelines);

    let mut seq = AnimationSequence::new(name);
    seq.start_time = start;
    seq.stop_time = stop;
    seq.cycle_type = CycleType::from_cyclic(cyclic);

    for &(timeline, element) in members {
        let blocks = export_timeline(exp, timeline, element)?;
        let member_timing = timing(timeline, exp.cfg);
        for block in &blocks {
            let identifier = exp.resolver.identifier_of(block.element).to_string();
            let controller = match block.class {
                ControllerClass::Transform => exp.manager_controller(&identifier),
                _ => exp
                    .graph
                    .add_controller(property_controller(&identifier, block, member_timing)),
            };
            seq.controlled_blocks.push(ControlledBlock {
                node_name: identifier,
                class: block.class,
                controlled_variable: block.controlled_variable,
                controller: Some(controller),
                interpolator: Some(block.interpolator),
            });
            if seq.accum_root_name.is_none() {
                seq.accum_root_name = accum_root(exp.resolver, block.element);
            }
            exp.register_palette(block.element);
        }
        exp.register_palette(element);
    }

    seq.text_keys = collect_text_keys(&timelines);
    log::debug!(
        "sequence '{name}': {} blocks, {start}..{stop}s, cyclic={cyclic}",
        seq.controlled_blocks.len()
    );
    Ok(seq)
}

/// Export an unnamed timeline as controller chains attached to their elements.
pub fn export_attached<'e, R: ElementResolver + ?Sized>(
    exp: &mut Exporter<'e, R>,
    timeline: &Timeline,
    element: &'e ControlledElement,
) -> Result<()> {
    let member_timing = timing(timeline, exp.cfg);
    for block in export_timeline(exp, timeline, element)? {
        let identifier = exp.resolver.identifier_of(block.element).to_string();
        let controller = property_controller(&identifier, &block, member_timing);
        exp.graph.attach(&identifier, controller);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{Curve, CurveKey};
    use crate::element::{BindTransform, SceneRegistry};

    fn keyed(name: &str, times: (f64, f64), cyclic: bool, cfg: &ConvertConfig) -> Timeline {
        let mut c = Curve::new("location", 0);
        c.insert(CurveKey::flat(cfg.frame_of(times.0), 0.0));
        c.insert(CurveKey::flat(cfg.frame_of(times.1), 1.0));
        Timeline::new(name).with_curve(c).with_cyclic(cyclic)
    }

    #[test]
    fn bounds_span_all_members() {
        let cfg = ConvertConfig::default();
        let a = keyed("a", (0.0, 2.5), true, &cfg);
        let b = keyed("b", (0.5, 3.0), true, &cfg);
        let (start, stop) = sequence_bounds(&[&a, &b], &cfg);
        assert!((start - 0.0).abs() < 1e-12);
        assert!((stop - 3.0).abs() < 1e-12);
    }

    #[test]
    fn accum_root_is_skeleton_of_bone() {
        let scene = SceneRegistry::new()
            .with(ControlledElement::node("Rig").with_file_name("Rig Root"))
            .with(ControlledElement::bone("Jaw", "Rig", BindTransform::IDENTITY))
            .with(ControlledElement::bone("Tail", "Lost", BindTransform::IDENTITY));
        let jaw = scene.element("Jaw").unwrap();
        assert_eq!(accum_root(&scene, jaw).as_deref(), Some("Rig Root"));
        let tail = scene.element("Tail").unwrap();
        assert_eq!(accum_root(&scene, tail).as_deref(), Some("Lost"));
        let rig = scene.element("Rig").unwrap();
        assert!(accum_root(&scene, rig).is_none());
    }

    #[test]
    fn cyclic_is_and_reduced() {
        let cfg = ConvertConfig::default();
        let a = keyed("a", (0.0, 1.0), true, &cfg);
        let b = keyed("b", (0.0, 1.0), true, &cfg);
        let c = keyed("c", (0.0, 1.0), false, &cfg);
        assert!(!sequence_cyclic(&[&a, &b, &c]));
        assert!(sequence_cyclic(&[&a, &b]));
        assert!(!sequence_cyclic(&[]));
    }

    #[test]
    fn text_keys_merge_in_time_order() {
        let mut a = Timeline::new("a");
        a.markers.insert("end".into(), 2.0);
        a.markers.insert("start".into(), 0.0);
        let mut b = Timeline::new("b");
        b.markers.insert("hit".into(), 1.0);
        b.markers.insert("end".into(), 9.0);
        let keys = collect_text_keys(&[&a, &b]);
        let labels: Vec<&str> = keys.iter().map(|k| k.label.as_str()).collect();
        assert_eq!(labels, vec!["start", "hit", "end"]);
        assert_eq!(keys[2].time, 2.0);
    }
}
