//! Controller graph: controllers, interpolators, sequences, and the object palette.
//!
//! Controllers and interpolators live in arenas indexed by [`ControllerId`] and
//! [`InterpolatorId`]; sequences and chains refer to them by id only.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::control_vars::ControllerClass;
use crate::data::Interpolator;
use crate::element::BindTransform;
use crate::error::{ConvertError, Result};
use crate::ids::{ControllerId, IdAllocator, InterpolatorId};

/// Playback cycle. Discriminants match the file format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CycleType {
    Loop = 0,
    Reverse = 1,
    #[default]
    Clamp = 2,
}

impl CycleType {
    pub fn from_cyclic(cyclic: bool) -> Self {
        if cyclic {
            CycleType::Loop
        } else {
            CycleType::Clamp
        }
    }

    pub fn is_cyclic(self) -> bool {
        self == CycleType::Loop
    }
}

fn default_frequency() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Timing and linkage of one controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Controller {
    pub class: ControllerClass,
    /// Shared transform controller driving many elements of a sequence.
    #[serde(default)]
    pub multi_target: bool,
    /// Identifier of the driven element.
    #[serde(default)]
    pub target: Option<String>,
    /// Extra targets of a multi-target controller.
    #[serde(default)]
    pub extra_targets: Vec<String>,
    #[serde(default)]
    pub controlled_variable: Option<u32>,
    #[serde(default)]
    pub interpolator: Option<InterpolatorId>,
    #[serde(default)]
    pub next_controller: Option<ControllerId>,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default)]
    pub stop_time: f64,
    #[serde(default = "default_frequency")]
    pub frequency: f64,
    #[serde(default)]
    pub cycle_type: CycleType,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Controller {
    pub fn new(class: ControllerClass) -> Self {
        Self {
            class,
            multi_target: false,
            target: None,
            extra_targets: Vec::new(),
            controlled_variable: None,
            interpolator: None,
            next_controller: None,
            start_time: 0.0,
            stop_time: 0.0,
            frequency: 1.0,
            cycle_type: CycleType::Clamp,
            active: true,
        }
    }

    /// Name of the block type in the container format.
    pub fn block_name(&self) -> &'static str {
        if self.multi_target {
            "NiMultiTargetTransformController"
        } else {
            self.class.block_name()
        }
    }
}

/// Binds one interpolator to one element within a sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlledBlock {
    /// Identifier of the driven element.
    pub node_name: String,
    pub class: ControllerClass,
    #[serde(default)]
    pub controlled_variable: Option<u32>,
    #[serde(default)]
    pub controller: Option<ControllerId>,
    /// When absent, the controller's own interpolator applies.
    #[serde(default)]
    pub interpolator: Option<InterpolatorId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextKey {
    /// Seconds.
    pub time: f64,
    pub label: String,
}

/// A named, time-bounded animation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationSequence {
    pub name: String,
    pub start_time: f64,
    pub stop_time: f64,
    #[serde(default)]
    pub cycle_type: CycleType,
    #[serde(default = "default_frequency")]
    pub frequency: f64,
    #[serde(default)]
    pub accum_root_name: Option<String>,
    #[serde(default)]
    pub controlled_blocks: Vec<ControlledBlock>,
    #[serde(default)]
    pub text_keys: Vec<TextKey>,
}

impl AnimationSequence {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start_time: 0.0,
            stop_time: 0.0,
            cycle_type: CycleType::Clamp,
            frequency: 1.0,
            accum_root_name: None,
            controlled_blocks: Vec::new(),
            text_keys: Vec::new(),
        }
    }

    pub fn cyclic(&self) -> bool {
        self.cycle_type.is_cyclic()
    }
}

/// Elements driven by a multi-target controller, with their bind transforms.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectPalette {
    pub objects: IndexMap<String, BindTransform>,
}

impl ObjectPalette {
    /// Register an element; first registration wins.
    pub fn add(&mut self, identifier: &str, bind: BindTransform) -> bool {
        if self.objects.contains_key(identifier) {
            return false;
        }
        self.objects.insert(identifier.to_string(), bind);
        true
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.objects.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Top-level aggregate of one container's animation data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerGraph {
    #[serde(default)]
    pub controllers: Vec<Controller>,
    #[serde(default)]
    pub interpolators: Vec<Interpolator>,
    #[serde(default)]
    pub sequences: Vec<AnimationSequence>,
    /// Free-standing controller chains: element identifier to chain head.
    #[serde(default)]
    pub attached: IndexMap<String, ControllerId>,
    /// Shared transform controller of the sequence manager.
    #[serde(default)]
    pub manager_controller: Option<ControllerId>,
    #[serde(default)]
    pub palette: ObjectPalette,
}

impl ControllerGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn ids(&self) -> IdAllocator {
        IdAllocator::starting_at(self.controllers.len(), self.interpolators.len())
    }

    pub fn add_controller(&mut self, controller: Controller) -> ControllerId {
        let id = self.ids().alloc_controller();
        self.controllers.push(controller);
        id
    }

    pub fn add_interpolator(&mut self, interpolator: Interpolator) -> InterpolatorId {
        let id = self.ids().alloc_interpolator();
        self.interpolators.push(interpolator);
        id
    }

    pub fn controller(&self, id: ControllerId, owner: &str) -> Result<&Controller> {
        self.controllers
            .get(id.index())
            .ok_or_else(|| ConvertError::DanglingController {
                owner: owner.to_string(),
                index: id.0,
            })
    }

    pub fn controller_mut(&mut self, id: ControllerId) -> Option<&mut Controller> {
        self.controllers.get_mut(id.index())
    }

    pub fn interpolator(&self, id: InterpolatorId, owner: &str) -> Result<&Interpolator> {
        self.interpolators
            .get(id.index())
            .ok_or_else(|| ConvertError::DanglingInterpolator {
                owner: owner.to_string(),
                index: id.0,
            })
    }

    pub fn sequence(&self, name: &str) -> Option<&AnimationSequence> {
        self.sequences.iter().find(|s| s.name == name)
    }

    /// Ids along a `next_controller` chain. Stops at the first repeated id.
    pub fn chain(&self, head: ControllerId, owner: &str) -> Result<Vec<ControllerId>> {
        let mut out = Vec::new();
        let mut cur = Some(head);
        while let Some(id) = cur {
            if out.contains(&id) {
                log::warn!("controller chain on '{owner}' loops back to {}", id.0);
                break;
            }
            let c = self.controller(id, owner)?;
            out.push(id);
            cur = c.next_controller;
        }
        Ok(out)
    }

    /// Append a controller at the end of an element's attached chain.
    pub fn attach(&mut self, identifier: &str, controller: Controller) -> ControllerId {
        let id = self.add_controller(controller);
        match self.attached.get(identifier).copied() {
            None => {
                self.attached.insert(identifier.to_string(), id);
            }
            Some(head) => {
                let mut tail = head;
                let mut seen = vec![head];
                while let Some(next) = self
                    .controllers
                    .get(tail.index())
                    .and_then(|c| c.next_controller)
                {
                    if seen.contains(&next) {
                        break;
                    }
                    seen.push(next);
                    tail = next;
                }
                if let Some(c) = self.controller_mut(tail) {
                    c.next_controller = Some(id);
                }
            }
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_vars::ShaderFamily;

    #[test]
    fn chain_walks_and_stops_on_loops() {
        let mut g = ControllerGraph::new();
        let a = g.attach("Glow", Controller::new(ControllerClass::Transform));
        let b = g.attach(
            "Glow",
            Controller::new(ControllerClass::ScalarProperty(ShaderFamily::Effect)),
        );
        assert_eq!(g.chain(a, "Glow").unwrap(), vec![a, b]);

        g.controller_mut(b).unwrap().next_controller = Some(a);
        assert_eq!(g.chain(a, "Glow").unwrap(), vec![a, b]);
    }

    #[test]
    fn dangling_references_are_errors() {
        let mut g = ControllerGraph::new();
        let mut c = Controller::new(ControllerClass::Transform);
        c.next_controller = Some(ControllerId(9));
        let a = g.add_controller(c);
        let err = g.chain(a, "Tail").unwrap_err();
        assert_eq!(
            err,
            ConvertError::DanglingController {
                owner: "Tail".into(),
                index: 9
            }
        );
        assert!(g.interpolator(InterpolatorId(0), "Tail").is_err());
    }

    #[test]
    fn palette_keeps_first_registration() {
        let mut p = ObjectPalette::default();
        assert!(p.add("A", BindTransform::IDENTITY));
        assert!(!p.add("A", BindTransform::default()));
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn multi_target_block_name() {
        let mut c = Controller::new(ControllerClass::Transform);
        c.multi_target = true;
        assert_eq!(c.block_name(), "NiMultiTargetTransformController");
    }
}
