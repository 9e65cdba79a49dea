//! Curve-editor representation: one scalar channel per curve, keys in handle form.
//!
//! Key x coordinates are frames (`t * fps + 1`), y coordinates are channel values.
//! Evaluation:
//! - Bezier segments solve the x cubic for the frame by bisection, then evaluate y
//! - Linear segments blend the two key values
//! - Constant segments hold the left value
//! - Outside the key range the nearest key value is held

use serde::{Deserialize, Serialize};

/// Interpolation tag of a curve.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurveInterpolation {
    Constant,
    Linear,
    /// Cubic segments shaped by key handles (imported quadratic Hermite keys).
    #[default]
    Bezier,
    /// Keys exist but carry no interpolation; evaluated as constant.
    None,
}

/// `(frame, value)` point.
pub type Point = [f64; 2];

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub frame: f64,
    pub value: f64,
    pub handle_left: Point,
    pub handle_right: Point,
}

impl CurveKey {
    /// Key with flat handles one third of a frame away.
    pub fn flat(frame: f64, value: f64) -> Self {
        Self {
            frame,
            value,
            handle_left: [frame - 1.0 / 3.0, value],
            handle_right: [frame + 1.0 / 3.0, value],
        }
    }

    #[inline]
    pub fn co(&self) -> Point {
        [self.frame, self.value]
    }
}

/// One animated scalar channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    /// Channel path, e.g. `pose.bones["Bip01 Head"].location`.
    pub data_path: String,
    /// Component index within the path's property.
    pub array_index: usize,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub interpolation: CurveInterpolation,
    pub keys: Vec<CurveKey>,
}

impl Curve {
    pub fn new(data_path: impl Into<String>, array_index: usize) -> Self {
        Self {
            data_path: data_path.into(),
            array_index,
            group: None,
            interpolation: CurveInterpolation::Bezier,
            keys: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: Option<&str>) -> Self {
        self.group = group.map(str::to_string);
        self
    }

    pub fn with_interpolation(mut self, interpolation: CurveInterpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// First and last key frame.
    pub fn frame_range(&self) -> Option<(f64, f64)> {
        Some((self.keys.first()?.frame, self.keys.last()?.frame))
    }

    /// Same channel as another curve.
    pub fn same_channel(&self, path: &str, index: usize) -> bool {
        self.data_path == path && self.array_index == index
    }

    /// Frames of every key, in order.
    pub fn frames(&self) -> impl Iterator<Item = f64> + '_ {
        self.keys.iter().map(|k| k.frame)
    }

    /// Insert a key, keeping frames strictly increasing; a key on an existing frame replaces it.
    pub fn insert(&mut self, key: CurveKey) {
        match self
            .keys
            .binary_search_by(|k| k.frame.total_cmp(&key.frame))
        {
            Ok(i) => self.keys[i] = key,
            Err(i) => self.keys.insert(i, key),
        }
    }

    /// Evaluate the curve at a frame.
    pub fn evaluate(&self, frame: f64) -> f64 {
        let keys = &self.keys;
        let n = keys.len();
        match n {
            0 => 0.0,
            1 => keys[0].value,
            _ => {
                if frame <= keys[0].frame {
                    return keys[0].value;
                }
                if frame >= keys[n - 1].frame {
                    return keys[n - 1].value;
                }
                let i = match keys.binary_search_by(|k| k.frame.total_cmp(&frame)) {
                    Ok(i) => return keys[i].value,
                    Err(i) => i - 1,
                };
                let (a, b) = (&keys[i], &keys[i + 1]);
                match self.interpolation {
                    CurveInterpolation::Constant | CurveInterpolation::None => a.value,
                    CurveInterpolation::Linear => {
                        let span = (b.frame - a.frame).max(f64::EPSILON);
                        let t = (frame - a.frame) / span;
                        a.value + (b.value - a.value) * t
                    }
                    CurveInterpolation::Bezier => bezier_segment(a, b, frame),
                }
            }
        }
    }
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Evaluate the segment [a, b] at `frame` by inverting its x polynomial.
fn bezier_segment(a: &CurveKey, b: &CurveKey, frame: f64) -> f64 {
    // Clamp handle x into the segment so x(t) stays monotonic.
    let x0 = a.frame;
    let x3 = b.frame;
    let x1 = a.handle_right[0].clamp(x0, x3);
    let x2 = b.handle_left[0].clamp(x0, x3);

    let mut lo = 0.0f64;
    let mut hi = 1.0f64;
    let mut mid = ((frame - x0) / (x3 - x0)).clamp(0.0, 1.0);
    for _ in 0..64 {
        let x = cubic_bezier(x0, x1, x2, x3, mid);
        if (x - frame).abs() < 1e-9 {
            break;
        }
        if x < frame {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(a.value, a.handle_right[1], b.handle_left[1], b.value, mid)
}
