//! Sequences and free-standing controller chains into staged timelines.

use crate::element::ElementResolver;
use crate::error::Result;
use crate::graph::AnimationSequence;
use crate::ids::ControllerId;
use crate::naming::UNNAMED;
use crate::timeline::TimelineLibrary;

use super::block::{import_block, BlockSource};
use super::{Importer, Stage};

/// Import every controlled block of `seq`. Touched timelines get the sequence's
/// frame range, cycle flag, and text keys as markers.
pub fn import_sequence<R: ElementResolver + ?Sized>(
    imp: &mut Importer<'_, R>,
    library: &TimelineLibrary,
    seq: &AnimationSequence,
) -> Result<Stage> {
    let mut stage = Stage::default();
    for block in &seq.controlled_blocks {
        let src = BlockSource {
            node_name: &block.node_name,
            class: block.class,
            controlled_variable: block.controlled_variable,
            controller: block.controller,
            interpolator: block.interpolator,
        };
        import_block(imp, &mut stage, library, &seq.name, &src)?;
    }

    let lo = imp.cfg.frame_of(seq.start_time);
    let hi = imp.cfg.frame_of(seq.stop_time);
    for t in stage.timelines.values_mut() {
        t.include_frames(lo, hi);
        t.cyclic = seq.cyclic();
        for tk in &seq.text_keys {
            t.markers.insert(tk.label.clone(), tk.time);
        }
    }
    Ok(stage)
}

/// Import a controller chain attached directly to an element into its unnamed
/// timelines. Each controller contributes its own timing.
pub fn import_attached<R: ElementResolver + ?Sized>(
    imp: &mut Importer<'_, R>,
    library: &TimelineLibrary,
    identifier: &str,
    head: ControllerId,
) -> Result<Stage> {
    let graph = imp.graph;
    let mut stage = Stage::default();
    for id in graph.chain(head, identifier)? {
        let c = graph.controller(id, identifier)?;
        let target = c.target.as_deref().unwrap_or(identifier);
        let src = BlockSource {
            node_name: target,
            class: c.class,
            controlled_variable: c.controlled_variable,
            controller: Some(id),
            interpolator: None,
        };
        if let Some(name) = import_block(imp, &mut stage, library, UNNAMED, &src)? {
            let lo = imp.cfg.frame_of(c.start_time);
            let hi = imp.cfg.frame_of(c.stop_time);
            if let Some(t) = stage.timelines.get_mut(&name) {
                t.include_frames(lo, hi);
                t.cyclic = c.cycle_type.is_cyclic();
            }
        }
    }
    Ok(stage)
}
