//! Composite timeline names.
//!
//! `ANIM|<animation>|<target>[|<sub-element>]`. A literal `|` inside a part is
//! written `||`. The authoring host may append a `.NNN` suffix to the whole name
//! when it collides; that suffix is dropped from the last part on parse.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};

/// Leading part that marks a timeline as a named animation.
pub const ANIM_MARKER: &str = "ANIM";
/// Animation name used for free-standing element controllers.
pub const UNNAMED: &str = "-";
/// Sub-element tag of shader property timelines.
pub const SHADER_TAG: &str = "Shader";

const SEP: char = '|';

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimelineName {
    pub animation: String,
    pub target: String,
    pub sub_element: Option<String>,
}

impl TimelineName {
    pub fn new(animation: &str, target: &str, sub_element: Option<&str>) -> Self {
        let animation = if animation.is_empty() { UNNAMED } else { animation };
        Self {
            animation: animation.to_string(),
            target: target.to_string(),
            sub_element: sub_element.filter(|s| !s.is_empty()).map(str::to_string),
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        let invalid = || ConvertError::InvalidTimelineName {
            name: name.to_string(),
        };
        let parts = split_escaped(name);
        if parts.len() < 3 || parts.len() > 4 || parts[0] != ANIM_MARKER {
            return Err(invalid());
        }
        let mut parts = parts.into_iter().skip(1);
        let (Some(animation), Some(target)) = (parts.next(), parts.next()) else {
            return Err(invalid());
        };
        let sub_element = parts
            .next()
            .map(|s| strip_numeric_suffix(&s).to_string())
            .filter(|s| !s.is_empty());
        Ok(Self {
            animation,
            target,
            sub_element,
        })
    }

    /// Whether this names a playable animation rather than a free-standing chain.
    pub fn is_named_animation(&self) -> bool {
        self.animation != UNNAMED
    }
}

impl fmt::Display for TimelineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{ANIM_MARKER}{SEP}{}{SEP}{}",
            escape(&self.animation),
            escape(&self.target)
        )?;
        if let Some(sub) = &self.sub_element {
            write!(f, "{SEP}{}", escape(sub))?;
        }
        Ok(())
    }
}

/// Build a timeline name.
///
/// Doubling is ambiguous where a field starts or ends with `|`: the escaped pair
/// sits next to a real separator and the scan pairs them the other way.
/// `make_name("Walk", "|Bone", Some("Shader"))` parses back as
/// `("Walk|", "Bone", "Shader")`.
pub fn make_name(animation: &str, target: &str, sub_element: Option<&str>) -> String {
    TimelineName::new(animation, target, sub_element).to_string()
}

/// Parse a timeline name into `(animation, target, sub-element)`; the sub-element is
/// empty when absent.
pub fn parse_name(name: &str) -> Result<(String, String, String)> {
    let n = TimelineName::parse(name)?;
    Ok((n.animation, n.target, n.sub_element.unwrap_or_default()))
}

fn escape(s: &str) -> String {
    s.replace(SEP, "||")
}

/// Split on unescaped separators, collapsing `||` to `|`. Scans left to right, so a
/// doubled separator always reads as an escaped one.
fn split_escaped(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut cur = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == SEP {
            if chars.peek() == Some(&SEP) {
                chars.next();
                cur.push(SEP);
            } else {
                parts.push(std::mem::take(&mut cur));
            }
        } else {
            cur.push(c);
        }
    }
    parts.push(cur);
    parts
}

fn strip_numeric_suffix(s: &str) -> &str {
    match s.rsplit_once('.') {
        Some((head, digits)) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            head
        }
        _ => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_separator_survives() {
        let name = make_name("Walk", "Bone|L_Arm", Some("Shader"));
        assert_eq!(name, "ANIM|Walk|Bone||L_Arm|Shader");
        assert_eq!(
            parse_name(&name).unwrap(),
            ("Walk".to_string(), "Bone|L_Arm".to_string(), "Shader".to_string())
        );
    }

    #[test]
    fn leading_separator_binds_to_previous_field() {
        let name = make_name("Walk", "|Bone", Some("Shader"));
        assert_eq!(name, "ANIM|Walk|||Bone|Shader");
        assert_eq!(
            parse_name(&name).unwrap(),
            ("Walk|".to_string(), "Bone".to_string(), "Shader".to_string())
        );
    }

    #[test]
    fn missing_sub_element_is_empty() {
        let (a, t, s) = parse_name("ANIM|Idle|Skeleton").unwrap();
        assert_eq!((a.as_str(), t.as_str(), s.as_str()), ("Idle", "Skeleton", ""));
    }

    #[test]
    fn strips_host_suffix() {
        let n = TimelineName::parse("ANIM|Pulse|Glow|Shader.001").unwrap();
        assert_eq!(n.sub_element.as_deref(), Some("Shader"));
    }

    #[test]
    fn empty_animation_is_unnamed() {
        let n = TimelineName::new("", "Torch", None);
        assert!(!n.is_named_animation());
        assert_eq!(n.to_string(), "ANIM|-|Torch");
    }

    #[test]
    fn rejects_foreign_names() {
        assert!(TimelineName::parse("Action").is_err());
        assert!(TimelineName::parse("ANIM|OnlyOne").is_err());
        assert!(TimelineName::parse("CLIP|Walk|Skeleton").is_err());
        assert!(TimelineName::parse("ANIM|a|b|c|d").is_err());
    }
}
