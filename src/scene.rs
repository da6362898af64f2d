// Copyright 2017 The gltf Library Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! L9: freezes the resolved object graph into the immutable [`Scene`]
//! handed out to callers.
//!
//! Mirrors the wrapper-over-index pattern the teacher uses for its own
//! scene graph (`Node<'a> { gltf: &'a Gltf, json: &'a json::scene::Node }`):
//! every public accessor borrows from one `Arc<Scene>` rather than owning
//! a copy, so walking the graph costs no allocation.

use crate::connect::{self, Graph, ResolveOptions};
use crate::document::object::{ElementKind, Object};
use crate::document::{Metadata, Objects, Settings};
use crate::error::{Error, Kind};
use crate::math::Mat4;
use crate::transform::{InheritMode, TransformProps};
use std::collections::HashMap;
use std::sync::Arc;

/// A single interned string; indices are stable for the scene's lifetime.
#[derive(Default)]
struct StringArena {
    strings: Vec<Box<str>>,
    index: HashMap<Box<str>, u32>,
}

impl StringArena {
    fn intern(&mut self, s: &str) -> u32 {
        if let Some(&id) = self.index.get(s) {
            return id;
        }
        let id = self.strings.len() as u32;
        let boxed: Box<str> = s.into();
        self.index.insert(boxed.clone(), id);
        self.strings.push(boxed);
        id
    }

    fn get(&self, id: u32) -> &str {
        &self.strings[id as usize]
    }
}

/// The frozen, reference-counted scene. Clone is O(1); all storage is
/// shared behind the `Arc`.
pub struct Scene(Arc<Inner>);

struct Inner {
    objects: Vec<Object>,
    by_id: HashMap<u64, usize>,
    data: HashMap<u64, crate::document::data::ObjectData>,
    graph: Graph,
    settings: Settings,
    metadata: Metadata,
    world_transforms: HashMap<u64, Mat4>,
    strings: StringArena,
}

impl Clone for Scene {
    fn clone(&self) -> Self {
        Scene(Arc::clone(&self.0))
    }
}

/// One object plus its scene-graph context, borrowed from a [`Scene`].
#[derive(Clone, Copy)]
pub struct Node<'a> {
    scene: &'a Scene,
    index: usize,
}

impl<'a> Node<'a> {
    pub fn id(&self) -> u64 {
        self.scene.0.objects[self.index].id
    }

    pub fn name(&self) -> &'a str {
        &self.scene.0.objects[self.index].name
    }

    pub fn kind(&self) -> ElementKind {
        self.scene.0.objects[self.index].kind
    }

    pub fn object(&self) -> &'a Object {
        &self.scene.0.objects[self.index]
    }

    pub fn data(&self) -> Option<&'a crate::document::data::ObjectData> {
        self.scene.0.data.get(&self.id())
    }

    /// The accumulated world transform, identity for anything that is not
    /// part of the `Model` parent/child tree.
    pub fn world_transform(&self) -> Mat4 {
        self.scene.0.world_transforms.get(&self.id()).copied().unwrap_or(Mat4::IDENTITY)
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        let id = self.id();
        let parent_id = *self.scene.0.graph.parent_of.get(&id)?;
        self.scene.node_by_id(parent_id)
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let scene = self.scene;
        let ids = scene.0.graph.children_of.get(&self.id()).cloned().unwrap_or_default();
        ids.into_iter().filter_map(move |id| scene.node_by_id(id))
    }

    /// Objects connected to this one as a source (e.g. a mesh's
    /// `Material` list, in declaration order).
    pub fn sources(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let scene = self.scene;
        let ids = scene.0.graph.sources_of.get(&self.id()).cloned().unwrap_or_default();
        ids.into_iter().filter_map(move |id| scene.node_by_id(id))
    }
}

impl Scene {
    /// Builds the frozen scene from L5's raw object list, wiring
    /// connections and computing world transforms.
    pub fn build(objects: Objects, resolve_opts: ResolveOptions) -> Result<Scene, Error> {
        Scene::build_with_root(objects, resolve_opts, Mat4::IDENTITY)
    }

    /// Like [`Scene::build`], but seeds every root node's world transform
    /// with `root_conversion` instead of the identity — the mechanism
    /// behind the `TransformRoot`/`AdjustTransforms` space-conversion
    /// policies, which differ only in *where* the matrix is said to live,
    /// not in the world transforms it produces.
    pub fn build_with_root(objects: Objects, resolve_opts: ResolveOptions, root_conversion: Mat4) -> Result<Scene, Error> {
        let graph = connect::resolve(&objects, resolve_opts)?;

        let mut by_id: HashMap<u64, usize> = HashMap::with_capacity(objects.objects.len());
        for (i, o) in objects.objects.iter().enumerate() {
            if by_id.insert(o.id, i).is_some() {
                return Err(Error::new(Kind::DuplicateObjectId(o.id)));
            }
        }
        let mut strings = StringArena::default();
        for o in &objects.objects {
            strings.intern(&o.name);
            strings.intern(&o.subtype);
        }

        let mut world_transforms = HashMap::new();
        let mut stack: Vec<(u64, Mat4)> = graph.roots.iter().map(|&id| (id, root_conversion)).collect();
        while let Some((id, parent_world)) = stack.pop() {
            let Some(&idx) = by_id.get(&id) else { continue };
            let props = TransformProps::from_object(&objects.objects[idx]);
            let local = crate::transform::local_matrix(&props);
            let world = compose_world(parent_world, local, props.inherit_mode);
            world_transforms.insert(id, world);
            if let Some(children) = graph.children_of.get(&id) {
                for &child in children {
                    stack.push((child, world));
                }
            }
        }

        let Objects { objects, data, settings, metadata, .. } = objects;
        Ok(Scene(Arc::new(Inner { objects, by_id, data, graph, settings, metadata, world_transforms, strings })))
    }

    pub fn node_by_id(&self, id: u64) -> Option<Node<'_>> {
        self.0.by_id.get(&id).map(|&index| Node { scene: self, index })
    }

    pub fn node_by_name(&self, name: &str) -> Option<Node<'_>> {
        self.0.objects.iter().position(|o| o.name == name).map(|index| Node { scene: self, index })
    }

    /// All objects of a given kind, in file declaration order.
    pub fn nodes_of_kind(&self, kind: ElementKind) -> impl Iterator<Item = Node<'_>> {
        self.0.objects.iter().enumerate().filter(move |(_, o)| o.kind == kind).map(move |(index, _)| Node { scene: self, index })
    }

    pub fn roots(&self) -> impl Iterator<Item = Node<'_>> {
        self.0.graph.roots.iter().filter_map(move |&id| self.node_by_id(id))
    }

    pub fn settings(&self) -> &Settings {
        &self.0.settings
    }

    pub fn metadata(&self) -> &Metadata {
        &self.0.metadata
    }

    pub fn len(&self) -> usize {
        self.0.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.objects.is_empty()
    }

    /// Resolves a string previously interned during [`Scene::build`]; used
    /// by callers that received an interned id from a lower layer instead
    /// of a borrowed `&str`.
    pub fn resolve_string(&self, id: u32) -> &str {
        self.0.strings.get(id)
    }
}

fn compose_world(parent_world: Mat4, child_local: Mat4, inherit: InheritMode) -> Mat4 {
    match inherit {
        InheritMode::Normal => parent_world.mul(&child_local),
        InheritMode::NoScale | InheritMode::NoScaleShear => {
            let (t, r, _) = parent_world.decompose();
            let parent_no_scale = Mat4::translation(t).mul(&r.to_matrix());
            parent_no_scale.mul(&child_local)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::object::{Property, PropertyBag, PropertyValue};
    use crate::document::Connection;

    fn model(id: u64, name: &str, translation: f64) -> Object {
        let mut bag = PropertyBag::new();
        bag.insert(
            "Lcl Translation".into(),
            Property {
                type_name: String::new(),
                subtype_name: String::new(),
                flags: String::new(),
                values: vec![PropertyValue::Float(translation), PropertyValue::Float(0.0), PropertyValue::Float(0.0)],
                animated_by: None,
            },
        );
        Object { id, kind: ElementKind::Node, name: name.into(), subtype: String::new(), properties: bag }
    }

    fn objects() -> Objects {
        Objects {
            objects: vec![model(1, "root", 1.0), model(2, "child", 2.0)],
            data: HashMap::new(),
            connections: vec![Connection::ObjectObject { src: 2, dst: 1 }],
            templates: HashMap::new(),
            settings: Settings::default(),
            metadata: Metadata::default(),
        }
    }

    #[test]
    fn world_transform_accumulates_down_the_tree() {
        let scene = Scene::build(objects(), ResolveOptions::default()).unwrap();
        let child = scene.node_by_name("child").unwrap();
        let world = child.world_transform();
        assert_eq!(world.mul_point([0.0, 0.0, 0.0]), [3.0, 0.0, 0.0]);
    }

    #[test]
    fn node_by_name_and_kind_lookup_work() {
        let scene = Scene::build(objects(), ResolveOptions::default()).unwrap();
        assert_eq!(scene.nodes_of_kind(ElementKind::Node).count(), 2);
        assert!(scene.node_by_name("root").is_some());
    }

    #[test]
    fn parent_and_children_navigate_both_ways() {
        let scene = Scene::build(objects(), ResolveOptions::default()).unwrap();
        let root = scene.node_by_name("root").unwrap();
        let child = scene.node_by_name("child").unwrap();
        assert_eq!(child.parent().unwrap().id(), root.id());
        assert_eq!(root.children().next().unwrap().id(), child.id());
    }

    #[test]
    fn duplicate_object_id_is_rejected() {
        let mut objs = objects();
        objs.objects.push(model(1, "also_root", 0.0));
        let err = Scene::build(objs, ResolveOptions::default()).unwrap_err();
        assert!(matches!(err.kind(), Kind::DuplicateObjectId(1)));
    }
}
