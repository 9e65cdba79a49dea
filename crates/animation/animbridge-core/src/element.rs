//! Controlled elements and the element resolver.
//!
//! Elements belong to the host scene; the core only reads their bind transforms and
//! hierarchy through an [`ElementResolver`]. [`SceneRegistry`] is a self-contained
//! resolver backed by plain maps, used by tests and by hosts without their own lookup.

use hashbrown::HashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::control_vars::ShaderFamily;
use crate::rotation::{quat_from_wxyz, BindFrame};

/// Rest transform of an element relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BindTransform {
    pub translation: [f64; 3],
    /// `[w, x, y, z]`
    pub rotation: [f64; 4],
    pub scale: f64,
}

impl Default for BindTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl BindTransform {
    pub const IDENTITY: BindTransform = BindTransform {
        translation: [0.0; 3],
        rotation: [1.0, 0.0, 0.0, 0.0],
        scale: 1.0,
    };

    pub fn to_frame(&self) -> BindFrame {
        BindFrame {
            rotation: Some(quat_from_wxyz(self.rotation)),
            translation: self.translation.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ElementKind {
    /// Skeletal bone; animated on the timeline of its skeleton.
    Bone { skeleton: String },
    /// Non-skeletal node with its own timeline.
    Node,
}

/// An animatable target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlledElement {
    /// Scene-side name.
    pub name: String,
    /// Identifier in the controller graph when it differs from `name`.
    #[serde(default)]
    pub file_name: Option<String>,
    pub kind: ElementKind,
    #[serde(default)]
    pub bind: BindTransform,
    /// Shader property slot, if the element carries an animatable shader.
    #[serde(default)]
    pub shader: Option<ShaderFamily>,
    /// Scene-side names of direct children.
    #[serde(default)]
    pub children: Vec<String>,
}

impl ControlledElement {
    pub fn node(name: &str) -> Self {
        Self {
            name: name.to_string(),
            file_name: None,
            kind: ElementKind::Node,
            bind: BindTransform::IDENTITY,
            shader: None,
            children: Vec::new(),
        }
    }

    pub fn bone(name: &str, skeleton: &str, bind: BindTransform) -> Self {
        Self {
            kind: ElementKind::Bone {
                skeleton: skeleton.to_string(),
            },
            bind,
            ..Self::node(name)
        }
    }

    pub fn with_shader(mut self, family: ShaderFamily) -> Self {
        self.shader = Some(family);
        self
    }

    pub fn with_file_name(mut self, file_name: &str) -> Self {
        self.file_name = Some(file_name.to_string());
        self
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    /// Owner of the element's timeline: the skeleton for bones, itself otherwise.
    pub fn timeline_owner(&self) -> &str {
        match &self.kind {
            ElementKind::Bone { skeleton } => skeleton,
            ElementKind::Node => &self.name,
        }
    }

    /// Bone name used in channel paths.
    pub fn bone_name(&self) -> Option<&str> {
        match self.kind {
            ElementKind::Bone { .. } => Some(&self.name),
            ElementKind::Node => None,
        }
    }
}

/// Lookup of scene elements by controller-graph identifier and back.
pub trait ElementResolver {
    /// Element for a controller-graph identifier. Implementations fall back to
    /// case-insensitive matching for legacy files.
    fn resolve(&self, identifier: &str) -> Option<&ControlledElement>;

    /// Element by scene-side name.
    fn element(&self, name: &str) -> Option<&ControlledElement>;

    /// Controller-graph identifier of an element.
    fn identifier_of<'a>(&'a self, element: &'a ControlledElement) -> &'a str {
        element.file_name.as_deref().unwrap_or(&element.name)
    }

    /// Direct children of an element that are known to the resolver.
    fn children<'a>(&'a self, element: &'a ControlledElement) -> Vec<&'a ControlledElement> {
        element
            .children
            .iter()
            .filter_map(|c| self.element(c))
            .collect()
    }
}

/// Map-backed resolver.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SceneRegistry {
    elements: IndexMap<String, ControlledElement>,
    #[serde(skip)]
    by_identifier: HashMap<String, String>,
    #[serde(skip)]
    by_lowercase: HashMap<String, String>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild lookup indices; needed after deserializing.
    pub fn reindex(&mut self) {
        self.by_identifier.clear();
        self.by_lowercase.clear();
        for (name, e) in &self.elements {
            let id = e.file_name.as_deref().unwrap_or(name);
            self.by_identifier.insert(id.to_string(), name.clone());
            self.by_lowercase
                .entry(id.to_lowercase())
                .or_insert_with(|| name.clone());
            self.by_lowercase
                .entry(name.to_lowercase())
                .or_insert_with(|| name.clone());
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut reg: SceneRegistry = serde_json::from_str(json)?;
        reg.reindex();
        Ok(reg)
    }

    /// Insert or replace an element.
    pub fn insert(&mut self, element: ControlledElement) {
        let name = element.name.clone();
        let id = element.file_name.clone().unwrap_or_else(|| name.clone());
        self.by_lowercase
            .entry(id.to_lowercase())
            .or_insert_with(|| name.clone());
        self.by_lowercase
            .entry(name.to_lowercase())
            .or_insert_with(|| name.clone());
        self.by_identifier.insert(id, name.clone());
        self.elements.insert(name, element);
    }

    pub fn with(mut self, element: ControlledElement) -> Self {
        self.insert(element);
        self
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ControlledElement> {
        self.elements.values()
    }
}

impl ElementResolver for SceneRegistry {
    fn resolve(&self, identifier: &str) -> Option<&ControlledElement> {
        if let Some(name) = self.by_identifier.get(identifier) {
            return self.elements.get(name);
        }
        if let Some(e) = self.elements.get(identifier) {
            return Some(e);
        }
        let name = self.by_lowercase.get(&identifier.to_lowercase())?;
        let found = self.elements.get(name);
        if found.is_some() {
            log::debug!("resolved '{identifier}' case-insensitively to '{name}'");
        }
        found
    }

    fn element(&self, name: &str) -> Option<&ControlledElement> {
        self.elements.get(name)
    }
}
