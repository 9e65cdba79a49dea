//! Timelines to a fresh controller graph.
//!
//! Named timelines (`ANIM|<animation>|<target>`) are grouped per animation and
//! assembled into sequences; unnamed ones become controller chains attached
//! directly to their elements.

pub mod block;
pub mod curve_group;
pub mod sequence;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::ConvertConfig;
use crate::control_vars::ControllerClass;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::element::{ControlledElement, ElementResolver};
use crate::error::Result;
use crate::graph::{Controller, ControllerGraph};
use crate::ids::ControllerId;
use crate::naming::TimelineName;
use crate::timeline::TimelineLibrary;

pub use sequence::Member;

/// Outcome of a successful export.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExportReport {
    pub graph: ControllerGraph,
    pub diagnostics: Diagnostics,
}

/// Shared state of one export session.
pub struct Exporter<'e, R: ElementResolver + ?Sized> {
    pub resolver: &'e R,
    pub cfg: &'e ConvertConfig,
    pub graph: ControllerGraph,
    pub diags: Diagnostics,
    scale_reported: bool,
}

impl<'e, R: ElementResolver + ?Sized> Exporter<'e, R> {
    pub fn new(resolver: &'e R, cfg: &'e ConvertConfig) -> Self {
        Self {
            resolver,
            cfg,
            graph: ControllerGraph::new(),
            diags: Diagnostics::new(),
            scale_reported: false,
        }
    }

    /// Scale curves are dropped; say so once per session.
    pub fn report_scale(&mut self) {
        if !self.scale_reported {
            self.scale_reported = true;
            self.diags.info(
                DiagnosticKind::ScaleUnsupported,
                "scale curves are not exported",
            );
        }
    }

    /// Shared multi-target transform controller, created on first use. Each
    /// element it drives is listed once among its targets.
    pub fn manager_controller(&mut self, identifier: &str) -> ControllerId {
        let id = match self.graph.manager_controller {
            Some(id) => id,
            None => {
                let mut c = Controller::new(ControllerClass::Transform);
                c.multi_target = true;
                let id = self.graph.add_controller(c);
                self.graph.manager_controller = Some(id);
                id
            }
        };
        if let Some(c) = self.graph.controller_mut(id) {
            if !c.extra_targets.iter().any(|t| t == identifier) {
                c.extra_targets.push(identifier.to_string());
            }
        }
        id
    }

    /// Add `element` and everything below it in the scene to the palette.
    pub fn register_palette(&mut self, element: &'e ControlledElement) {
        let resolver = self.resolver;
        let mut pending = vec![element];
        while let Some(e) = pending.pop() {
            if !self.graph.palette.add(resolver.identifier_of(e), e.bind) {
                continue;
            }
            pending.extend(resolver.children(e).into_iter().rev());
        }
    }

    pub fn finish(self) -> ExportReport {
        ExportReport {
            graph: self.graph,
            diagnostics: self.diags,
        }
    }
}

/// Named timelines grouped per animation, and the unnamed ones, each paired
/// with the element it plays on. Timelines whose target is unknown are left out.
pub struct Collected<'e> {
    pub animations: IndexMap<String, Vec<Member<'e>>>,
    pub unnamed: Vec<Member<'e>>,
}

pub fn collect_animations<'e, R: ElementResolver + ?Sized>(
    library: &'e TimelineLibrary,
    resolver: &'e R,
) -> Collected<'e> {
    let mut out = Collected {
        animations: IndexMap::new(),
        unnamed: Vec::new(),
    };
    for timeline in library.iter() {
        let Ok(name) = TimelineName::parse(&timeline.name) else {
            continue;
        };
        // Shader sub-element timelines play on the element itself.
        let Some(element) = resolver.element(&name.target) else {
            log::debug!("timeline '{}' has no element '{}'", timeline.name, name.target);
            continue;
        };
        if name.is_named_animation() {
            out.animations
                .entry(name.animation)
                .or_default()
                .push((timeline, element));
        } else {
            out.unnamed.push((timeline, element));
        }
    }
    out
}

/// Build one sequence per entry of `animations`, in map order.
pub fn export_animations<'e, R: ElementResolver + ?Sized>(
    animations: &IndexMap<String, Vec<Member<'e>>>,
    resolver: &'e R,
    cfg: &'e ConvertConfig,
) -> Result<ExportReport> {
    let mut exp = Exporter::new(resolver, cfg);
    export_into(&mut exp, animations)?;
    Ok(exp.finish())
}

/// Export every timeline of `library`: named animations as sequences and unnamed
/// timelines as attached controller chains.
pub fn export_library<R: ElementResolver + ?Sized>(
    library: &TimelineLibrary,
    resolver: &R,
    cfg: &ConvertConfig,
) -> Result<ExportReport> {
    let collected = collect_animations(library, resolver);
    let mut exp = Exporter::new(resolver, cfg);
    export_into(&mut exp, &collected.animations)?;
    for &(timeline, element) in &collected.unnamed {
        sequence::export_attached(&mut exp, timeline, element)?;
    }
    Ok(exp.finish())
}

fn export_into<'e, R: ElementResolver + ?Sized>(
    exp: &mut Exporter<'e, R>,
    animations: &IndexMap<String, Vec<Member<'e>>>,
) -> Result<()> {
    for (name, members) in animations {
        let seq = sequence::export_sequence(exp, name, members)?;
        exp.graph.sequences.push(seq);
    }
    Ok(())
}

