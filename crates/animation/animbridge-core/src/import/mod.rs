//! Controller graph to timelines.
//!
//! Each sequence is staged separately and committed to the library only when it
//! imports without a fatal error, so a failing sequence leaves the ones before it
//! in place.

pub mod block;
pub mod curve_group;
pub mod sequence;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::ConvertConfig;
use crate::curve::Curve;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::element::ElementResolver;
use crate::error::Result;
use crate::graph::ControllerGraph;
use crate::playback::{apply_animation, PlaybackRange};
use crate::timeline::{SceneMarker, Timeline, TimelineLibrary};

/// Outcome of a successful import.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub diagnostics: Diagnostics,
    /// First named sequence; applied to the scene after import.
    pub active_animation: Option<String>,
    /// Playback range of the active animation.
    pub playback: Option<PlaybackRange>,
    /// Every timeline written, in creation order.
    pub timelines: Vec<String>,
}

/// Shared state of one import pass.
pub struct Importer<'a, R: ElementResolver + ?Sized> {
    pub graph: &'a ControllerGraph,
    pub resolver: &'a R,
    pub cfg: &'a ConvertConfig,
    pub diags: Diagnostics,
}

impl<'a, R: ElementResolver + ?Sized> Importer<'a, R> {
    pub fn new(graph: &'a ControllerGraph, resolver: &'a R, cfg: &'a ConvertConfig) -> Self {
        Self {
            graph,
            resolver,
            cfg,
            diags: Diagnostics::new(),
        }
    }
}

/// Timelines written by one sequence, not yet visible in the library.
#[derive(Debug, Default)]
pub struct Stage {
    pub timelines: IndexMap<String, Timeline>,
    assignments: Vec<(String, Option<String>, String)>,
}

impl Stage {
    /// Staged timeline, seeded from the library when it already exists there.
    pub fn timeline(&mut self, library: &TimelineLibrary, name: &str) -> &mut Timeline {
        self.timelines
            .entry(name.to_string())
            .or_insert_with(|| library.get(name).cloned().unwrap_or_else(|| Timeline::new(name)))
    }

    /// Add curves to a staged timeline and assign it to `owner`. A curve for a
    /// channel the timeline already has is reported and dropped.
    pub fn add_curves(
        &mut self,
        library: &TimelineLibrary,
        name: &str,
        owner: &str,
        sub_element: Option<&str>,
        curves: Vec<Curve>,
        diags: &mut Diagnostics,
    ) {
        let timeline = self.timeline(library, name);
        for curve in curves {
            if timeline.has_curve(&curve.data_path, curve.array_index) {
                diags.warn(
                    DiagnosticKind::DuplicateCurve,
                    format!("{}[{}] already keyed in {name}", curve.data_path, curve.array_index),
                );
                continue;
            }
            timeline.curves.push(curve);
        }
        let key = (owner.to_string(), sub_element.map(str::to_string), name.to_string());
        if !self.assignments.contains(&key) {
            self.assignments.push(key);
        }
    }

    pub fn commit(self, library: &mut TimelineLibrary) -> Vec<String> {
        let names: Vec<String> = self.timelines.keys().cloned().collect();
        for t in self.timelines.into_values() {
            library.insert(t);
        }
        for (owner, sub, name) in &self.assignments {
            library.assign(owner, sub.as_deref(), name);
        }
        names
    }
}

/// Import every sequence and free-standing controller chain of `graph` into `library`.
pub fn import_graph<R: ElementResolver + ?Sized>(
    graph: &ControllerGraph,
    resolver: &R,
    library: &mut TimelineLibrary,
    cfg: &ConvertConfig,
) -> Result<ImportReport> {
    let mut imp = Importer::new(graph, resolver, cfg);
    let mut report = ImportReport::default();

    for seq in &graph.sequences {
        log::debug!("importing sequence '{}'", seq.name);
        let stage = sequence::import_sequence(&mut imp, library, seq)?;

        library.scene_markers = seq
            .text_keys
            .iter()
            .map(|tk| SceneMarker {
                label: tk.label.clone(),
                frame: (tk.time * cfg.fps()).round() as i64 + 1,
            })
            .collect();
        let span = ((seq.stop_time - seq.start_time) * cfg.fps()).max(0.0);
        library.scene_frame_range = Some((1, 1 + span as i64));

        push_unique(&mut report.timelines, stage.commit(library));
        if report.active_animation.is_none() {
            report.active_animation = Some(seq.name.clone());
        }
    }

    for (identifier, head) in &graph.attached {
        let stage = sequence::import_attached(&mut imp, library, identifier, *head)?;
        push_unique(&mut report.timelines, stage.commit(library));
    }

    if let Some(active) = &report.active_animation {
        report.playback = apply_animation(library, active, cfg);
    }
    report.diagnostics = imp.diags;
    Ok(report)
}

fn push_unique(into: &mut Vec<String>, names: Vec<String>) {
    for n in names {
        if !into.contains(&n) {
            into.push(n);
        }
    }
}
