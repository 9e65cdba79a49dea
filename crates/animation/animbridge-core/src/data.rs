//! Typed keyframe-data blocks of the controller-graph format.
//!
//! Keys carry velocity-form tangents: `forward` is the incoming slope scaled to the
//! preceding interval, `backward` the outgoing slope scaled to the following one.
//! Quaternions are stored `[w, x, y, z]`, the order the container format uses.

use serde::{Deserialize, Serialize};

/// Interpolation kind tag of a key group. Discriminants match the file format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum KeyType {
    #[default]
    NoInterp = 0,
    Linear = 1,
    Quadratic = 2,
    Tbc = 3,
    XyzRotation = 4,
    Constant = 5,
}

/// One key in velocity form.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: Deserialize<'de> + Default"
))]
pub struct AnimKey<T> {
    /// Seconds.
    pub time: f64,
    pub value: T,
    #[serde(default)]
    pub forward: T,
    #[serde(default)]
    pub backward: T,
}

impl<T: Default> AnimKey<T> {
    /// Key with zero tangents (linear/constant groups).
    pub fn at(time: f64, value: T) -> Self {
        Self {
            time,
            value,
            forward: T::default(),
            backward: T::default(),
        }
    }
}

impl<T> AnimKey<T> {
    pub fn quadratic(time: f64, value: T, forward: T, backward: T) -> Self {
        Self {
            time,
            value,
            forward,
            backward,
        }
    }
}

pub type FloatKey = AnimKey<f64>;
pub type Vec3Key = AnimKey<[f64; 3]>;

impl Vec3Key {
    /// Project one axis out of a vector key.
    pub fn axis(&self, i: usize) -> FloatKey {
        FloatKey {
            time: self.time,
            value: self.value[i],
            forward: self.forward[i],
            backward: self.backward[i],
        }
    }
}

/// Quaternion key; the format stores no tangents for quadratic quaternion keys.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuatKey {
    pub time: f64,
    /// `[w, x, y, z]`
    pub value: [f64; 4],
}

/// Keys plus their interpolation tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: Deserialize<'de> + Default"
))]
pub struct KeyGroup<T> {
    pub interpolation: KeyType,
    pub keys: Vec<AnimKey<T>>,
}

impl<T> Default for KeyGroup<T> {
    fn default() -> Self {
        Self {
            interpolation: KeyType::NoInterp,
            keys: Vec::new(),
        }
    }
}

impl<T> KeyGroup<T> {
    pub fn new(interpolation: KeyType, keys: Vec<AnimKey<T>>) -> Self {
        Self {
            interpolation,
            keys,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// First and last key time, if any.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        Some((self.keys.first()?.time, self.keys.last()?.time))
    }

    /// Keys must be strictly increasing in time.
    pub fn is_strictly_increasing(&self) -> bool {
        self.keys.windows(2).all(|w| w[0].time < w[1].time)
    }
}

/// Scalar keyframe data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FloatData {
    pub keys: KeyGroup<f64>,
}

/// Vector3 keyframe data; also carries RGB colors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PosData {
    pub keys: KeyGroup<[f64; 3]>,
}

/// Transform keyframe data: rotation as quaternion or per-axis Euler, translation, scale.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformData {
    /// `XyzRotation` selects `xyz_rotations`; `Linear`/`Quadratic` select `quaternion_keys`.
    pub rotation_type: KeyType,
    #[serde(default)]
    pub quaternion_keys: Vec<QuatKey>,
    #[serde(default)]
    pub xyz_rotations: [KeyGroup<f64>; 3],
    #[serde(default)]
    pub translations: KeyGroup<[f64; 3]>,
    #[serde(default)]
    pub scales: KeyGroup<f64>,
}

impl TransformData {
    /// Min/max key time over every channel.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        let mut widen = |lo: f64, hi: f64| {
            range = Some(match range {
                Some((a, b)) => (a.min(lo), b.max(hi)),
                None => (lo, hi),
            });
        };
        if let (Some(first), Some(last)) =
            (self.quaternion_keys.first(), self.quaternion_keys.last())
        {
            widen(first.time, last.time);
        }
        for g in &self.xyz_rotations {
            if let Some((lo, hi)) = g.time_range() {
                widen(lo, hi);
            }
        }
        if let Some((lo, hi)) = self.translations.time_range() {
            widen(lo, hi);
        }
        if let Some((lo, hi)) = self.scales.time_range() {
            widen(lo, hi);
        }
        range
    }
}

/// Bind transform carried by a transform interpolator.
/// Components beyond the sentinel limits mean "unset".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformInterpolator {
    pub translation: [f64; 3],
    /// `[w, x, y, z]`
    pub rotation: [f64; 4],
    pub scale: f64,
    #[serde(default)]
    pub data: Option<TransformData>,
}

/// Pairs an evaluation strategy with a typed keyframe-data block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Interpolator {
    Float {
        #[serde(default)]
        data: Option<FloatData>,
    },
    Point3 {
        #[serde(default)]
        data: Option<PosData>,
    },
    Transform(TransformInterpolator),
    /// Blend interpolators own no keys; manager-controlled ones defer to a sequence.
    Blend { manager_controlled: bool },
}

impl Interpolator {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Interpolator::Float { .. } => "Float",
            Interpolator::Point3 { .. } => "Point3",
            Interpolator::Transform(_) => "Transform",
            Interpolator::Blend { .. } => "Blend",
        }
    }

    /// Interpolators that carry nothing to import.
    pub fn is_ignorable(&self) -> bool {
        matches!(
            self,
            Interpolator::Blend {
                manager_controlled: true
            }
        )
    }
}
