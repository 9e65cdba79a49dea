//! Activating a named animation and listing the ones available.

use serde::{Deserialize, Serialize};

use crate::config::ConvertConfig;
use crate::graph::CycleType;
use crate::naming::TimelineName;
use crate::timeline::{SceneMarker, TimelineLibrary};

/// Playback settings of an activated animation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaybackRange {
    pub start_time: f64,
    pub stop_time: f64,
    pub start_frame: i64,
    pub stop_frame: i64,
    pub cycle: CycleType,
    pub frequency: f64,
}

/// Make every timeline of animation `name` the active one for its target, restore
/// its markers into the scene, and return its playback range. `None` when the
/// library holds no keyed timeline of that animation.
pub fn apply_animation(
    library: &mut TimelineLibrary,
    name: &str,
    cfg: &ConvertConfig,
) -> Option<PlaybackRange> {
    let mut frames: Option<(f64, f64)> = None;
    let mut cycle = CycleType::Loop;
    let mut markers: Vec<SceneMarker> = Vec::new();
    let mut assigned: Vec<(String, TimelineName)> = Vec::new();

    for (timeline, parsed) in library.animation_timelines(name) {
        log::debug!("applying timeline '{}'", timeline.name);
        if let Some((lo, hi)) = timeline.curve_frame_range() {
            frames = Some(match frames {
                Some((a, b)) => (a.min(lo), b.max(hi)),
                None => (lo, hi),
            });
        }
        if !timeline.cyclic {
            cycle = CycleType::Clamp;
        }
        for (label, time) in &timeline.markers {
            if !markers.iter().any(|m| &m.label == label) {
                markers.push(SceneMarker {
                    label: label.clone(),
                    frame: (time * cfg.fps()) as i64 + 1,
                });
            }
        }
        assigned.push((timeline.name.clone(), parsed));
    }

    for (timeline, parsed) in &assigned {
        library.assign(&parsed.target, parsed.sub_element.as_deref(), timeline);
    }
    library.scene_markers = markers;

    let (lo, hi) = frames?;
    let range = PlaybackRange {
        start_time: cfg.time_of(lo),
        stop_time: cfg.time_of(hi),
        start_frame: lo as i64,
        stop_frame: hi as i64,
        cycle,
        frequency: 1.0,
    };
    library.scene_frame_range = Some((range.start_frame, range.stop_frame));
    Some(range)
}

/// Named animations of a library, rebuilt only when the library's timeline set
/// has changed since the last refresh.
#[derive(Clone, Debug, Default)]
pub struct AnimationRegistry {
    generation: Option<u64>,
    names: Vec<String>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stale(&self, library: &TimelineLibrary) -> bool {
        self.generation != Some(library.generation())
    }

    /// Animation names in order of first appearance.
    pub fn refresh(&mut self, library: &TimelineLibrary) -> &[String] {
        if self.is_stale(library) {
            self.names.clear();
            for n in library.iter().filter_map(|t| t.parsed_name()) {
                if n.is_named_animation() && !self.names.contains(&n.animation) {
                    self.names.push(n.animation);
                }
            }
            self.generation = Some(library.generation());
            log::debug!("animation registry rebuilt: {} animations", self.names.len());
        }
        &self.names
    }

    /// Names as of the last refresh.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}
