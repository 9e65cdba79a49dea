//! Animbridge Core (host-agnostic)
//!
//! Translates animation between a controller graph (controllers, interpolators and
//! typed key data grouped into named sequences) and curve-editor timelines (per
//! channel curves with Bezier handles). Import and export are single synchronous
//! passes; the scene itself is only read through an [`ElementResolver`].

pub mod channel;
pub mod config;
pub mod control_vars;
pub mod curve;
pub mod data;
pub mod diagnostics;
pub mod element;
pub mod error;
pub mod export;
pub mod graph;
pub mod ids;
pub mod import;
pub mod naming;
pub mod playback;
pub mod rotation;
pub mod shader_attrs;
pub mod tangent;
pub mod timeline;

// Re-exports for hosts
pub use channel::{classify, Channel, ChannelKind, ChannelPath, TransformProperty};
pub use config::ConvertConfig;
pub use control_vars::{ControllerClass, GameVariant, ShaderFamily, SocketDirection};
pub use curve::{Curve, CurveInterpolation, CurveKey};
pub use data::{
    AnimKey, FloatData, Interpolator, KeyGroup, KeyType, PosData, TransformData,
    TransformInterpolator,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use element::{BindTransform, ControlledElement, ElementKind, ElementResolver, SceneRegistry};
pub use error::{ConvertError, Result};
pub use export::{collect_animations, export_animations, export_library, ExportReport};
pub use graph::{AnimationSequence, ControlledBlock, Controller, ControllerGraph, CycleType, TextKey};
pub use ids::{ControllerId, InterpolatorId};
pub use import::{import_graph, ImportReport};
pub use naming::{make_name, parse_name, TimelineName};
pub use playback::{apply_animation, AnimationRegistry, PlaybackRange};
pub use tangent::{to_handles, to_tangents};
pub use timeline::{SceneMarker, Timeline, TimelineLibrary};
