//! Curve-editor timelines and the library that owns them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::curve::Curve;
use crate::naming::TimelineName;

/// A named collection of curves (one animation on one target).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub name: String,
    #[serde(default)]
    pub curves: Vec<Curve>,
    #[serde(default)]
    pub cyclic: bool,
    /// Playback frame range recorded at import time.
    #[serde(default)]
    pub frame_range: Option<(f64, f64)>,
    /// Marker label to time in seconds.
    #[serde(default)]
    pub markers: IndexMap<String, f64>,
}

impl Timeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curves.push(curve);
        self
    }

    pub fn with_cyclic(mut self, cyclic: bool) -> Self {
        self.cyclic = cyclic;
        self
    }

    pub fn parsed_name(&self) -> Option<TimelineName> {
        TimelineName::parse(&self.name).ok()
    }

    pub fn has_curve(&self, path: &str, index: usize) -> bool {
        self.curves.iter().any(|c| c.same_channel(path, index))
    }

    /// Frame range spanned by all keyed curves.
    pub fn curve_frame_range(&self) -> Option<(f64, f64)> {
        self.curves
            .iter()
            .filter_map(Curve::frame_range)
            .reduce(|(a, b), (lo, hi)| (a.min(lo), b.max(hi)))
    }

    /// Widen the recorded frame range.
    pub fn include_frames(&mut self, lo: f64, hi: f64) {
        self.frame_range = Some(match self.frame_range {
            Some((a, b)) => (a.min(lo), b.max(hi)),
            None => (lo, hi),
        });
    }
}

/// Scene-level timeline marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneMarker {
    pub label: String,
    pub frame: i64,
}

/// All timelines of a scene plus which one each target plays.
///
/// `generation` changes whenever the set of timelines changes; registries
/// built from the library compare it to detect staleness.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TimelineLibrary {
    timelines: IndexMap<String, Timeline>,
    /// Assignment key (`target` or `target|sub`) to timeline name.
    #[serde(default)]
    assignments: IndexMap<String, String>,
    #[serde(default)]
    pub scene_markers: Vec<SceneMarker>,
    #[serde(default)]
    pub scene_frame_range: Option<(i64, i64)>,
    #[serde(skip)]
    generation: u64,
}

fn assignment_key(target: &str, sub_element: Option<&str>) -> String {
    match sub_element {
        Some(sub) => format!("{target}|{sub}"),
        None => target.to_string(),
    }
}

impl TimelineLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Timeline> {
        self.timelines.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Timeline> {
        self.timelines.get_mut(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Timeline> {
        self.timelines.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.timelines.keys().map(String::as_str)
    }

    /// Add or replace a timeline.
    pub fn insert(&mut self, timeline: Timeline) {
        self.timelines.insert(timeline.name.clone(), timeline);
        self.generation += 1;
    }

    pub fn remove(&mut self, name: &str) -> Option<Timeline> {
        let removed = self.timelines.shift_remove(name);
        if removed.is_some() {
            self.assignments.retain(|_, v| v != name);
            self.generation += 1;
        }
        removed
    }

    /// Timeline with the given name, created empty if missing.
    pub fn ensure(&mut self, name: &str) -> &mut Timeline {
        if !self.timelines.contains_key(name) {
            self.generation += 1;
        }
        self.timelines
            .entry(name.to_string())
            .or_insert_with(|| Timeline::new(name))
    }

    /// Make `timeline` the one played by `target` (and optional sub-element).
    pub fn assign(&mut self, target: &str, sub_element: Option<&str>, timeline: &str) {
        self.assignments
            .insert(assignment_key(target, sub_element), timeline.to_string());
    }

    pub fn assigned(&self, target: &str, sub_element: Option<&str>) -> Option<&Timeline> {
        self.assignments
            .get(&assignment_key(target, sub_element))
            .and_then(|n| self.timelines.get(n))
    }

    /// Named timelines of one animation, in library order.
    pub fn animation_timelines<'a>(
        &'a self,
        animation: &'a str,
    ) -> impl Iterator<Item = (&'a Timeline, TimelineName)> + 'a {
        self.timelines.values().filter_map(move |t| {
            let n = t.parsed_name()?;
            (n.animation == animation).then_some((t, n))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::CurveKey;

    #[test]
    fn generation_tracks_membership() {
        let mut lib = TimelineLibrary::new();
        let g0 = lib.generation();
        lib.ensure("ANIM|Walk|Skeleton");
        let g1 = lib.generation();
        assert!(g1 > g0);
        lib.ensure("ANIM|Walk|Skeleton").cyclic = true;
        assert_eq!(lib.generation(), g1);
        lib.remove("ANIM|Walk|Skeleton");
        assert!(lib.generation() > g1);
        assert!(lib.is_empty());
    }

    #[test]
    fn assignments_follow_removal() {
        let mut lib = TimelineLibrary::new();
        lib.insert(Timeline::new("ANIM|Pulse|Torch|Shader"));
        lib.assign("Torch", Some("Shader"), "ANIM|Pulse|Torch|Shader");
        assert!(lib.assigned("Torch", Some("Shader")).is_some());
        assert!(lib.assigned("Torch", None).is_none());
        lib.remove("ANIM|Pulse|Torch|Shader");
        assert!(lib.assigned("Torch", Some("Shader")).is_none());
    }

    #[test]
    fn curve_frame_range_spans_curves() {
        let mut a = Curve::new("location", 0);
        a.insert(CurveKey::flat(1.0, 0.0));
        a.insert(CurveKey::flat(76.0, 0.0));
        let mut b = Curve::new("location", 1);
        b.insert(CurveKey::flat(16.0, 0.0));
        b.insert(CurveKey::flat(91.0, 0.0));
        let t = Timeline::new("x").with_curve(a).with_curve(b);
        assert_eq!(t.curve_frame_range(), Some((1.0, 91.0)));
    }
}
