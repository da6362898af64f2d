// Copyright 2017 The gltf Library Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The kind discriminant and property bag shared by every FBX object.
//!
//! A single struct with a kind tag is used rather than open-ended
//! inheritance: connections walk a flat `by_id` map and never need virtual
//! dispatch to find out what an endpoint is.

use std::collections::HashMap;

/// The kind of a materialised FBX object. `Objects/<Kind>` in the source
/// node tree maps directly onto this enum.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ElementKind {
    /// A transform node (`Model`), the scene-graph sense of "node".
    Node,
    /// Polygonal or NURBS geometry (`Geometry`, sub-type `Mesh`).
    Mesh,
    Light,
    Camera,
    Material,
    Texture,
    Video,
    Skin,
    Cluster,
    BlendChannel,
    BlendShape,
    AnimStack,
    AnimLayer,
    AnimCurveNode,
    AnimCurve,
    NodeAttribute,
    Constraint,
    Pose,
    SelectionSet,
    SelectionNode,
    DisplayLayer,
    CacheFile,
    CacheDeformer,
    AudioLayer,
    AudioClip,
    Marker,
    /// Anything else: retained so round-trip inspection stays possible.
    Unknown,
}

/// A single typed, optionally-animated property from a `P` node.
#[derive(Clone, Debug)]
pub struct Property {
    /// FBX type name, e.g. `"Lcl Translation"`.
    pub type_name: String,
    /// FBX sub-type name, e.g. `""`, `"A"`, `"Visibility"`.
    pub subtype_name: String,
    /// Raw flags string as stored (e.g. `"A"`, `"A+U"`).
    pub flags: String,
    /// The property's static value(s): 1 for scalars, 3 for vectors/colors,
    /// 4 for `ColorAndAlpha`.
    pub values: Vec<PropertyValue>,
    /// FBX id of the `AnimCurveNode` connected to this property, if any.
    pub animated_by: Option<u64>,
}

/// A scalar held inside a property's value list. Kept distinct from
/// [`crate::value::Value`] since properties are never typed arrays.
#[derive(Clone, Debug)]
pub enum PropertyValue {
    Int(i64),
    Float(f64),
    String(String),
}

impl PropertyValue {
    /// Narrows to `f64`, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Int(v) => Some(*v as f64),
            PropertyValue::String(_) => None,
        }
    }

    /// Narrows to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Narrows to `&str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// An ordered, case-sensitive property bag, as declared by `Properties70`
/// (or `Properties60` for legacy files) plus anything filled in from a
/// `Definitions` template.
#[derive(Clone, Debug, Default)]
pub struct PropertyBag {
    order: Vec<String>,
    by_name: HashMap<String, Property>,
}

impl PropertyBag {
    /// An empty property bag.
    pub fn new() -> Self {
        PropertyBag::default()
    }

    /// Inserts (or overwrites) a property, preserving first-insertion order
    /// for iteration.
    pub fn insert(&mut self, name: String, prop: Property) {
        if !self.by_name.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.by_name.insert(name, prop);
    }

    /// Fills in `name` with `prop` only if absent; used when applying a
    /// `Definitions` template after the object's own properties have
    /// already been parsed, so explicit values always win.
    pub fn insert_if_absent(&mut self, name: String, prop: Property) {
        if !self.by_name.contains_key(&name) {
            self.order.push(name.clone());
            self.by_name.insert(name, prop);
        }
    }

    /// Looks up a property by name.
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.by_name.get(name)
    }

    /// Iterates properties in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.order.iter().map(move |name| (name.as_str(), self.by_name.get(name).unwrap()))
    }

    /// Number of properties in the bag.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the bag holds no properties.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// One materialised FBX object: identity plus its property bag. Kind-
/// specific data (mesh vertex buffers, light parameters, ...) lives
/// alongside this in [`super::ObjectData`], keyed by the same id so that
/// connections never need to downcast through a trait object.
#[derive(Clone, Debug)]
pub struct Object {
    /// Stable 64-bit FBX id. Zero for legacy pre-6000 files, which are
    /// assigned a synthetic id in `Objects` declaration order (see
    /// `DESIGN.md` for the documented ordering policy).
    pub id: u64,
    pub kind: ElementKind,
    pub name: String,
    pub subtype: String,
    pub properties: PropertyBag,
}
