//! Identifiers and simple allocators for controller-graph arenas.

use serde::{Deserialize, Serialize};

/// Index of a controller in [`crate::graph::ControllerGraph::controllers`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ControllerId(pub u32);

/// Index of an interpolator in [`crate::graph::ControllerGraph::interpolators`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct InterpolatorId(pub u32);

impl ControllerId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl InterpolatorId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Monotonic allocator for ControllerId and InterpolatorId.
/// Ids are dense so they double as arena indices.
#[derive(Default, Debug, Clone)]
pub struct IdAllocator {
    next_controller: u32,
    next_interpolator: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume allocation after existing arenas of the given sizes.
    pub fn starting_at(controllers: usize, interpolators: usize) -> Self {
        Self {
            next_controller: controllers as u32,
            next_interpolator: interpolators as u32,
        }
    }

    #[inline]
    pub fn alloc_controller(&mut self) -> ControllerId {
        let id = ControllerId(self.next_controller);
        self.next_controller = self.next_controller.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_interpolator(&mut self) -> InterpolatorId {
        let id = InterpolatorId(self.next_interpolator);
        self.next_interpolator = self.next_interpolator.wrapping_add(1);
        id
    }
}
