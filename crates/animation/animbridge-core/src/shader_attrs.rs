//! Shader attribute hand-off.
//!
//! Material graphs are built outside this crate from a plain attribute map. Some
//! file-format attributes have no curve-editor counterpart and are dropped here.

use indexmap::IndexMap;
use serde_json::Value;

/// Attributes never passed on to the material builder. Sorted.
pub const IGNORED_ATTRIBUTES: &[&str] = &[
    "Emissive_Color",
    "Emissive_Mult",
    "UV_Offset_U",
    "UV_Offset_V",
    "UV_Scale_U",
    "UV_Scale_V",
    "baseColor",
    "baseColorScale",
    "bufSize",
    "bufType",
    "controllerID",
    "greyscaleTexture",
    "nameID",
    "sourceTexture",
];

pub fn is_ignored(name: &str) -> bool {
    IGNORED_ATTRIBUTES.binary_search(&name).is_ok()
}

/// Copy of `attrs` without the ignored attributes, order preserved.
pub fn filter_attributes(attrs: &IndexMap<String, Value>) -> IndexMap<String, Value> {
    attrs
        .iter()
        .filter(|(k, _)| !is_ignored(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
