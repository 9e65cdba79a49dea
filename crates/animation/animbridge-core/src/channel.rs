//! Channel paths and classification.
//!
//! Grammar:
//!   [pose.bones["BONE"].](location|rotation_quaternion|rotation_euler|scale)
//!   nodes["NODE"].(inputs|outputs)["SOCKET"|INDEX].default_value
//!
//! Names are double-quoted; `\"` and `\\` escape inside quotes. Numeric sockets
//! are written without quotes.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::control_vars::{self, ControlledVariable, ControllerClass, ShaderFamily, SocketDirection};
use crate::error::{ConvertError, Result};

/// Transform property addressed by a path.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransformProperty {
    Location,
    RotationQuaternion,
    RotationEuler,
    Scale,
}

impl TransformProperty {
    pub fn as_str(self) -> &'static str {
        match self {
            TransformProperty::Location => "location",
            TransformProperty::RotationQuaternion => "rotation_quaternion",
            TransformProperty::RotationEuler => "rotation_euler",
            TransformProperty::Scale => "scale",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "location" => Some(TransformProperty::Location),
            "rotation_quaternion" => Some(TransformProperty::RotationQuaternion),
            "rotation_euler" => Some(TransformProperty::RotationEuler),
            "scale" => Some(TransformProperty::Scale),
            _ => None,
        }
    }
}

/// Parsed curve data path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChannelPath {
    Transform {
        bone: Option<String>,
        property: TransformProperty,
    },
    Socket {
        node: String,
        direction: SocketDirection,
        socket: String,
    },
}

impl ChannelPath {
    pub fn transform(bone: Option<&str>, property: TransformProperty) -> Self {
        ChannelPath::Transform {
            bone: bone.map(str::to_string),
            property,
        }
    }

    pub fn socket(node: &str, direction: SocketDirection, socket: &str) -> Self {
        ChannelPath::Socket {
            node: node.to_string(),
            direction,
            socket: socket.to_string(),
        }
    }

    /// Bone the path addresses, if any.
    pub fn bone(&self) -> Option<&str> {
        match self {
            ChannelPath::Transform { bone, .. } => bone.as_deref(),
            ChannelPath::Socket { .. } => None,
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let malformed = || ConvertError::MalformedChannelPath {
            path: s.to_string(),
        };

        if let Some(rest) = s.strip_prefix("pose.bones[") {
            let (bone, rest) = take_quoted(rest).ok_or_else(malformed)?;
            let rest = rest.strip_prefix("].").ok_or_else(malformed)?;
            let property = TransformProperty::parse(rest).ok_or_else(malformed)?;
            return Ok(ChannelPath::Transform {
                bone: Some(bone),
                property,
            });
        }

        if let Some(rest) = s.strip_prefix("nodes[") {
            let (node, rest) = take_quoted(rest).ok_or_else(malformed)?;
            let rest = rest.strip_prefix("].").ok_or_else(malformed)?;
            let (dir, rest) = rest.split_once('[').ok_or_else(malformed)?;
            let direction = SocketDirection::parse(dir).ok_or_else(malformed)?;
            let (socket, rest) = if rest.starts_with('"') {
                take_quoted(rest).ok_or_else(malformed)?
            } else {
                let end = rest.find(']').ok_or_else(malformed)?;
                let idx = &rest[..end];
                if idx.is_empty() || !idx.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(malformed());
                }
                (idx.to_string(), &rest[end..])
            };
            if rest != "].default_value" {
                return Err(malformed());
            }
            return Ok(ChannelPath::Socket {
                node,
                direction,
                socket,
            });
        }

        TransformProperty::parse(s)
            .map(|property| ChannelPath::Transform {
                bone: None,
                property,
            })
            .ok_or_else(malformed)
    }
}

/// Read a `"..."` string from the front of `s`; returns the unescaped name and the rest.
fn take_quoted(s: &str) -> Option<(String, &str)> {
    let body = s.strip_prefix('"')?;
    let mut out = String::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                let (_, next) = chars.next()?;
                out.push(next);
            }
            '"' => return Some((out, &body[i + 1..])),
            _ => out.push(c),
        }
    }
    None
}

fn write_quoted(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in name.chars() {
        if c == '"' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("\"")
}

impl fmt::Display for ChannelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelPath::Transform { bone, property } => {
                if let Some(bone) = bone {
                    f.write_str("pose.bones[")?;
                    write_quoted(f, bone)?;
                    f.write_str("].")?;
                }
                f.write_str(property.as_str())
            }
            ChannelPath::Socket {
                node,
                direction,
                socket,
            } => {
                f.write_str("nodes[")?;
                write_quoted(f, node)?;
                write!(f, "].{}[", direction.as_str())?;
                if !socket.is_empty() && socket.bytes().all(|b| b.is_ascii_digit()) {
                    f.write_str(socket)?;
                } else {
                    write_quoted(f, socket)?;
                }
                f.write_str("].default_value")
            }
        }
    }
}

impl FromStr for ChannelPath {
    type Err = ConvertError;
    fn from_str(s: &str) -> Result<Self> {
        ChannelPath::parse(s)
    }
}

impl Serialize for ChannelPath {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ChannelPath {
    fn deserialize<D>(deserializer: D) -> core::result::Result<ChannelPath, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ChannelPath::parse(&s).map_err(de::Error::custom)
    }
}

/// What a channel animates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    Translation,
    RotationQuaternion,
    RotationEuler,
    Scale,
    /// Shader socket found in the controlled-variable table.
    Property(&'static ControlledVariable),
    /// Well-formed socket path with no table entry.
    UnknownProperty,
}

impl ChannelKind {
    /// Run key for block assembly: `(class, variable)`. Transform channels share one key.
    pub fn controller(&self) -> Option<(ControllerClass, Option<u32>)> {
        match self {
            ChannelKind::Translation
            | ChannelKind::RotationQuaternion
            | ChannelKind::RotationEuler
            | ChannelKind::Scale => Some((ControllerClass::Transform, None)),
            ChannelKind::Property(row) => Some((row.class, Some(row.variable))),
            ChannelKind::UnknownProperty => None,
        }
    }
}

/// A parsed, classified channel.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    pub path: ChannelPath,
    pub kind: ChannelKind,
}

/// Classify a curve data path. `family` breaks ties between shader families that
/// share a socket name (UV transforms). Malformed paths are an error.
pub fn classify(data_path: &str, family: Option<ShaderFamily>) -> Result<Channel> {
    let path = ChannelPath::parse(data_path)?;
    let kind = match &path {
        ChannelPath::Transform { property, .. } => match property {
            TransformProperty::Location => ChannelKind::Translation,
            TransformProperty::RotationQuaternion => ChannelKind::RotationQuaternion,
            TransformProperty::RotationEuler => ChannelKind::RotationEuler,
            TransformProperty::Scale => ChannelKind::Scale,
        },
        ChannelPath::Socket {
            node,
            direction,
            socket,
        } => match control_vars::find_by_socket(node, socket, family) {
            Some(row) if row.direction == *direction => ChannelKind::Property(row),
            _ => ChannelKind::UnknownProperty,
        },
    };
    Ok(Channel { path, kind })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_vars::lighting_float;

    #[test]
    fn parse_and_format_round_trip() {
        for s in [
            "location",
            "rotation_euler",
            r#"pose.bones["NPC L Forearm [LLar]"].rotation_quaternion"#,
            r#"pose.bones["Say \"hi\""].scale"#,
            r#"nodes["Skyrim Shader - TSN"].inputs["Glossiness"].default_value"#,
            r#"nodes["Alpha Threshold"].outputs[0].default_value"#,
        ] {
            let p = ChannelPath::parse(s).unwrap();
            assert_eq!(p.to_string(), s);
        }
    }

    #[test]
    fn bone_names_unescape() {
        let p = ChannelPath::parse(r#"pose.bones["Say \"hi\""].scale"#).unwrap();
        assert_eq!(p.bone(), Some("Say \"hi\""));
    }

    #[test]
    fn rejects_malformed() {
        for s in [
            "",
            "locations",
            r#"pose.bones["B"]location"#,
            r#"pose.bones["B].location"#,
            r#"nodes["N"].sideways["S"].default_value"#,
            r#"nodes["N"].inputs["S"]"#,
            r#"nodes["N"].inputs[x].default_value"#,
        ] {
            let err = ChannelPath::parse(s).unwrap_err();
            assert_eq!(err.category(), "naming", "{s}");
        }
    }

    #[test]
    fn classifies_sockets_through_table() {
        let c = classify(
            r#"nodes["Fallout 4 MTS"].inputs["Specular Str"].default_value"#,
            None,
        )
        .unwrap();
        assert_eq!(
            c.kind.controller(),
            Some((
                ControllerClass::ScalarProperty(ShaderFamily::Lighting),
                Some(lighting_float::SPECULAR_STRENGTH)
            ))
        );
        let c = classify(r#"nodes["Mix"].inputs["Fac"].default_value"#, None).unwrap();
        assert_eq!(c.kind, ChannelKind::UnknownProperty);
    }

    #[test]
    fn classification_is_deterministic() {
        let paths = [
            r#"nodes["UV Converter"].inputs["Scale V"].default_value"#,
            r#"pose.bones["Tail"].location"#,
            r#"nodes["Alpha Threshold"].outputs[0].default_value"#,
        ];
        let first: Vec<_> = paths
            .iter()
            .map(|p| classify(p, Some(ShaderFamily::Lighting)).unwrap().kind.controller())
            .collect();
        for _ in 0..3 {
            let again: Vec<_> = paths
                .iter()
                .rev()
                .map(|p| classify(p, Some(ShaderFamily::Lighting)).unwrap().kind.controller())
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            assert_eq!(first, again);
        }
    }
}
