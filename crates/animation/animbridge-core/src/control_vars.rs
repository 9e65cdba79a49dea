//! Controller classes and the static controlled-variable table.
//!
//! The table maps a shader property slot `(property group, socket, direction)` to
//! the controller class and controlled-variable id that drive it. The same semantic
//! group has different node names per game, so the import lookup takes a
//! [`GameVariant`] as a second key.

use serde::{Deserialize, Serialize};

/// Target game / engine variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameVariant {
    Fo4,
    #[default]
    Skyrim,
    SkyrimSe,
    Other,
}

impl GameVariant {
    fn is_skyrim(self) -> bool {
        matches!(self, GameVariant::Skyrim | GameVariant::SkyrimSe)
    }
}

/// Shader property family a property controller attaches to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderFamily {
    Effect,
    Lighting,
}

/// Controller class, dispatched through the table rather than a type hierarchy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerClass {
    Transform,
    ScalarProperty(ShaderFamily),
    ColorProperty(ShaderFamily),
    AlphaThreshold,
}

impl ControllerClass {
    /// Block type name in the container format.
    pub fn block_name(self) -> &'static str {
        match self {
            ControllerClass::Transform => "NiTransformController",
            ControllerClass::ScalarProperty(ShaderFamily::Effect) => {
                "BSEffectShaderPropertyFloatController"
            }
            ControllerClass::ScalarProperty(ShaderFamily::Lighting) => {
                "BSLightingShaderPropertyFloatController"
            }
            ControllerClass::ColorProperty(ShaderFamily::Effect) => {
                "BSEffectShaderPropertyColorController"
            }
            ControllerClass::ColorProperty(ShaderFamily::Lighting) => {
                "BSLightingShaderPropertyColorController"
            }
            ControllerClass::AlphaThreshold => "BSNiAlphaPropertyTestRefController",
        }
    }

    pub fn from_block_name(name: &str) -> Option<Self> {
        const ALL: [ControllerClass; 6] = [
            ControllerClass::Transform,
            ControllerClass::ScalarProperty(ShaderFamily::Effect),
            ControllerClass::ScalarProperty(ShaderFamily::Lighting),
            ControllerClass::ColorProperty(ShaderFamily::Effect),
            ControllerClass::ColorProperty(ShaderFamily::Lighting),
            ControllerClass::AlphaThreshold,
        ];
        if name == "NiMultiTargetTransformController" {
            return Some(ControllerClass::Transform);
        }
        ALL.into_iter().find(|c| c.block_name() == name)
    }

    /// Property classes animate the shader sub-element of their target.
    pub fn is_property(self) -> bool {
        !matches!(self, ControllerClass::Transform)
    }

    pub fn family(self) -> Option<ShaderFamily> {
        match self {
            ControllerClass::ScalarProperty(f) | ControllerClass::ColorProperty(f) => Some(f),
            _ => None,
        }
    }
}

/// Effect shader float variables.
pub mod effect_float {
    pub const EMISSIVE_MULTIPLE: u32 = 0;
    pub const FALLOFF_START_ANGLE: u32 = 1;
    pub const FALLOFF_STOP_ANGLE: u32 = 2;
    pub const FALLOFF_START_OPACITY: u32 = 3;
    pub const FALLOFF_STOP_OPACITY: u32 = 4;
    pub const ALPHA_TRANSPARENCY: u32 = 5;
    pub const U_OFFSET: u32 = 6;
    pub const U_SCALE: u32 = 7;
    pub const V_OFFSET: u32 = 8;
    pub const V_SCALE: u32 = 9;
}

/// Lighting shader float variables.
pub mod lighting_float {
    pub const REFRACTION_STRENGTH: u32 = 0;
    pub const ENVIRONMENT_MAP_SCALE: u32 = 8;
    pub const GLOSSINESS: u32 = 9;
    pub const SPECULAR_STRENGTH: u32 = 10;
    pub const EMISSIVE_MULTIPLE: u32 = 11;
    pub const ALPHA: u32 = 12;
    pub const U_OFFSET: u32 = 20;
    pub const U_SCALE: u32 = 21;
    pub const V_OFFSET: u32 = 22;
    pub const V_SCALE: u32 = 23;
}

/// Lighting shader color variables.
pub mod lighting_color {
    pub const SPECULAR: u32 = 0;
    pub const EMISSIVE: u32 = 1;
}

/// Effect shader color variables.
pub mod effect_color {
    pub const EMISSIVE: u32 = 0;
}

/// Socket side of a shader node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketDirection {
    Inputs,
    Outputs,
}

impl SocketDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SocketDirection::Inputs => "inputs",
            SocketDirection::Outputs => "outputs",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inputs" => Some(SocketDirection::Inputs),
            "outputs" => Some(SocketDirection::Outputs),
            _ => None,
        }
    }
}

/// One table row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ControlledVariable {
    /// Semantic property group: `Effect`, `Lighting`, or a plain node name.
    pub group: &'static str,
    pub socket: &'static str,
    pub direction: SocketDirection,
    pub class: ControllerClass,
    pub variable: u32,
}

const fn row(
    group: &'static str,
    socket: &'static str,
    direction: SocketDirection,
    class: ControllerClass,
    variable: u32,
) -> ControlledVariable {
    ControlledVariable {
        group,
        socket,
        direction,
        class,
        variable,
    }
}

use ControllerClass::{AlphaThreshold, ColorProperty, ScalarProperty};
use ShaderFamily::{Effect, Lighting};
use SocketDirection::{Inputs, Outputs};

pub const ALPHA_THRESHOLD_NODE: &str = "Alpha Threshold";
pub const UV_CONVERTER_NODE: &str = "UV Converter";

pub static CONTROLLED_VARIABLES: &[ControlledVariable] = &[
    row(ALPHA_THRESHOLD_NODE, "0", Outputs, AlphaThreshold, effect_float::ALPHA_TRANSPARENCY),
    row("Effect", "Emission Strength", Inputs, ScalarProperty(Effect), effect_float::EMISSIVE_MULTIPLE),
    row("Effect", "Emission Color", Inputs, ColorProperty(Effect), effect_color::EMISSIVE),
    row("Lighting", "Alpha Mult", Inputs, ScalarProperty(Lighting), lighting_float::ALPHA),
    row("Lighting", "Emission Strength", Inputs, ScalarProperty(Lighting), lighting_float::EMISSIVE_MULTIPLE),
    row("Lighting", "Glossiness", Inputs, ScalarProperty(Lighting), lighting_float::GLOSSINESS),
    row("Lighting", "Specular Str", Inputs, ScalarProperty(Lighting), lighting_float::SPECULAR_STRENGTH),
    row("Lighting", "Emission Color", Inputs, ColorProperty(Lighting), lighting_color::EMISSIVE),
    row("Lighting", "Specular Color", Inputs, ColorProperty(Lighting), lighting_color::SPECULAR),
    row(UV_CONVERTER_NODE, "Offset U", Inputs, ScalarProperty(Effect), effect_float::U_OFFSET),
    row(UV_CONVERTER_NODE, "Offset U", Inputs, ScalarProperty(Lighting), lighting_float::U_OFFSET),
    row(UV_CONVERTER_NODE, "Offset V", Inputs, ScalarProperty(Effect), effect_float::V_OFFSET),
    row(UV_CONVERTER_NODE, "Offset V", Inputs, ScalarProperty(Lighting), lighting_float::V_OFFSET),
    row(UV_CONVERTER_NODE, "Scale U", Inputs, ScalarProperty(Effect), effect_float::U_SCALE),
    row(UV_CONVERTER_NODE, "Scale U", Inputs, ScalarProperty(Lighting), lighting_float::U_SCALE),
    row(UV_CONVERTER_NODE, "Scale V", Inputs, ScalarProperty(Effect), effect_float::V_SCALE),
    row(UV_CONVERTER_NODE, "Scale V", Inputs, ScalarProperty(Lighting), lighting_float::V_SCALE),
];

/// Shader node names per semantic group, in lookup order.
static SHADER_NODES: &[(&str, &str)] = &[
    ("Fallout 4 MTS", "Lighting"),
    ("FO4 Effect Shader", "Effect"),
    ("Skyrim Shader - Effect", "Effect"),
    ("Skyrim Shader - TSN", "Lighting"),
];

/// Semantic group of a node name; nodes that are not shader nodes are their own group.
pub fn property_group(node_name: &str) -> &str {
    SHADER_NODES
        .iter()
        .find(|(n, _)| *n == node_name)
        .map_or(node_name, |(_, g)| g)
}

/// Node name that carries `group` in the given game.
pub fn node_name_for(group: &'static str, game: GameVariant) -> &'static str {
    for (node, g) in SHADER_NODES {
        if *g != group {
            continue;
        }
        let skyrim_node = node.contains("Skyrim");
        match game {
            GameVariant::Fo4 if !skyrim_node => return node,
            g if g.is_skyrim() && skyrim_node => return node,
            _ => {}
        }
    }
    group
}

/// Export lookup: node + socket to class/variable. When a socket is shared by both
/// shader families, `family` picks the row; otherwise the first row wins.
pub fn find_by_socket(
    node_name: &str,
    socket: &str,
    family: Option<ShaderFamily>,
) -> Option<&'static ControlledVariable> {
    let group = property_group(node_name);
    let mut candidates = CONTROLLED_VARIABLES
        .iter()
        .filter(|r| r.group == group && r.socket == socket)
        .peekable();
    let first = *candidates.peek()?;
    let preferred = family.and_then(|f| candidates.find(|r| r.class.family() == Some(f)));
    Some(preferred.unwrap_or(first))
}

/// Import lookup: class/variable to `(node name, socket, direction)` for the game.
pub fn find_by_variable(
    game: GameVariant,
    class: ControllerClass,
    variable: u32,
) -> Option<(&'static str, &'static str, SocketDirection)> {
    CONTROLLED_VARIABLES
        .iter()
        .find(|r| r.class == class && r.variable == variable)
        .map(|r| (node_name_for(r.group, game), r.socket, r.direction))
}
