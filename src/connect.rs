// Copyright 2017 The gltf Library Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! L6: wires the flat connection list from `Connections` into a navigable
//! graph — object-to-object source lists, property animation bindings,
//! and the node parent/child tree, with cycle detection.

use crate::document::object::ElementKind;
use crate::document::{Connection, Objects};
use crate::error::{Error, Kind};
use std::collections::HashMap;

/// The resolved graph: per-object connected-source lists (in declaration
/// order, so index 0 is always the first-declared source — FBX scenes
/// depend on this for e.g. per-face material binding) and the Model
/// parent/child tree.
pub struct Graph {
    /// For each destination id, the ids of objects connected to it as a
    /// source, in declaration order.
    pub sources_of: HashMap<u64, Vec<u64>>,
    /// For each destination id, the ids of objects it is itself connected
    /// to as a source (the reverse direction), in declaration order.
    pub targets_of: HashMap<u64, Vec<u64>>,
    /// Model id -> parent Model id, built from object-to-object
    /// connections where both ends are `Model` nodes.
    pub parent_of: HashMap<u64, u64>,
    /// Parent Model id -> child Model ids, in declaration order.
    pub children_of: HashMap<u64, Vec<u64>>,
    /// Root-level Model ids (no `Model` parent).
    pub roots: Vec<u64>,
    /// Count of connections that referenced a missing endpoint, whether
    /// discarded outright or retained broken under
    /// `connect_broken_elements` (never incremented when `strict`
    /// promoted the case to an error instead).
    pub dropped: usize,
}

/// Mirrors [`crate::import::Config`] fields this layer needs, so `connect`
/// does not have to depend on the whole import module.
#[derive(Clone, Copy, Debug)]
pub struct ResolveOptions {
    pub connect_broken_elements: bool,
    pub strict: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        ResolveOptions { connect_broken_elements: false, strict: false }
    }
}

/// Builds the connection and parent/child graph, detecting cycles in the
/// `Model` parent relation.
pub fn resolve(objects: &Objects, opts: ResolveOptions) -> Result<Graph, Error> {
    let by_id: HashMap<u64, ElementKind> = objects.objects.iter().map(|o| (o.id, o.kind)).collect();

    let mut sources_of: HashMap<u64, Vec<u64>> = HashMap::new();
    let mut targets_of: HashMap<u64, Vec<u64>> = HashMap::new();
    let mut parent_of: HashMap<u64, u64> = HashMap::new();
    let mut dropped = 0usize;

    for conn in &objects.connections {
        let (src, dst) = match conn {
            Connection::ObjectObject { src, dst } => (*src, *dst),
            Connection::ObjectProperty { src, dst, .. } => (*src, *dst),
            Connection::PropertyObject { src, dst, .. } => (*src, *dst),
            Connection::PropertyProperty { src, dst, .. } => (*src, *dst),
        };
        let src_ok = by_id.contains_key(&src);
        let dst_ok = by_id.contains_key(&dst);
        if !src_ok || !dst_ok {
            if opts.strict {
                let missing = if !src_ok { src } else { dst };
                return Err(Error::new(Kind::MissingObject(missing)));
            }
            dropped += 1;
            if !opts.connect_broken_elements {
                continue;
            }
        }

        sources_of.entry(dst).or_default().push(src);
        targets_of.entry(src).or_default().push(dst);

        if let Connection::ObjectObject { .. } = conn {
            if by_id.get(&src) == Some(&ElementKind::Node) && by_id.get(&dst) == Some(&ElementKind::Node) {
                parent_of.insert(src, dst);
            }
        }
    }

    detect_cycles(&parent_of)?;

    let mut children_of: HashMap<u64, Vec<u64>> = HashMap::new();
    for (child, parent) in &parent_of {
        children_of.entry(*parent).or_default().push(*child);
    }
    // Preserve `Objects` declaration order within each parent's child list.
    for list in children_of.values_mut() {
        list.sort_by_key(|id| objects.objects.iter().position(|o| o.id == *id).unwrap_or(usize::MAX));
    }

    let roots: Vec<u64> = objects
        .objects
        .iter()
        .filter(|o| o.kind == ElementKind::Node && !parent_of.contains_key(&o.id))
        .map(|o| o.id)
        .collect();

    Ok(Graph { sources_of, targets_of, parent_of, children_of, roots, dropped })
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

fn detect_cycles(parent_of: &HashMap<u64, u64>) -> Result<(), Error> {
    let mut color: HashMap<u64, Color> = HashMap::new();
    for &node in parent_of.keys() {
        if matches!(color.get(&node), Some(Color::Black)) {
            continue;
        }
        let mut path = Vec::new();
        let mut cur = node;
        loop {
            match color.get(&cur).copied().unwrap_or(Color::White) {
                Color::White => {
                    color.insert(cur, Color::Gray);
                    path.push(cur);
                    match parent_of.get(&cur) {
                        Some(&next) => cur = next,
                        None => break,
                    }
                }
                Color::Gray => return Err(Error::new(Kind::NodeCycle)),
                Color::Black => break,
            }
        }
        for n in path {
            color.insert(n, Color::Black);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::object::{Object, PropertyBag};

    fn node(id: u64) -> Object {
        Object { id, kind: ElementKind::Node, name: format!("n{id}"), subtype: String::new(), properties: PropertyBag::new() }
    }

    fn objects_with(connections: Vec<Connection>, ids: &[u64]) -> Objects {
        Objects {
            objects: ids.iter().map(|&id| node(id)).collect(),
            data: Default::default(),
            connections,
            templates: Default::default(),
            settings: Default::default(),
            metadata: Default::default(),
        }
    }

    #[test]
    fn parent_child_edges_from_object_object() {
        let objs = objects_with(vec![Connection::ObjectObject { src: 1, dst: 2 }], &[1, 2]);
        let graph = resolve(&objs, ResolveOptions::default()).unwrap();
        assert_eq!(graph.parent_of.get(&1), Some(&2));
        assert_eq!(graph.roots, vec![2]);
    }

    #[test]
    fn cycle_is_rejected() {
        let objs = objects_with(
            vec![
                Connection::ObjectObject { src: 1, dst: 2 },
                Connection::ObjectObject { src: 2, dst: 1 },
            ],
            &[1, 2],
        );
        let err = resolve(&objs, ResolveOptions::default()).unwrap_err();
        assert!(matches!(err.kind(), Kind::NodeCycle));
    }

    #[test]
    fn broken_connection_is_dropped_by_default() {
        let objs = objects_with(vec![Connection::ObjectObject { src: 1, dst: 999 }], &[1]);
        let graph = resolve(&objs, ResolveOptions::default()).unwrap();
        assert_eq!(graph.dropped, 1);
    }

    #[test]
    fn strict_mode_errors_on_broken_connection() {
        let objs = objects_with(vec![Connection::ObjectObject { src: 1, dst: 999 }], &[1]);
        let opts = ResolveOptions { connect_broken_elements: false, strict: true };
        let err = resolve(&objs, opts).unwrap_err();
        assert!(matches!(err.kind(), Kind::MissingObject(999)));
    }

    #[test]
    fn connect_broken_elements_still_counts_as_dropped() {
        let objs = objects_with(vec![Connection::ObjectObject { src: 1, dst: 999 }], &[1]);
        let opts = ResolveOptions { connect_broken_elements: true, strict: false };
        let graph = resolve(&objs, opts).unwrap();
        assert_eq!(graph.dropped, 1);
        assert_eq!(graph.sources_of.get(&999), Some(&vec![1]));
    }
}
