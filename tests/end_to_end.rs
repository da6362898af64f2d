// Copyright 2017 The gltf Library Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use fbxcel::error::Kind;
use fbxcel::import::{import_slice, Config};

#[test]
fn empty_file_fails_with_empty_file_kind() {
    let err = import_slice(&[], &Config::default()).unwrap_err();
    assert!(matches!(err.kind(), Kind::EmptyFile));
}

#[test]
fn ascii_echo_round_trips_through_the_binary_encoder() {
    let ascii_src = b"Node: 1 {\n\tSub: 2,3\n}\n";
    let doc = fbxcel::ascii::parse(ascii_src).unwrap();
    assert_eq!(doc.version(), 7500);

    let node = doc.root().child("Node").expect("Node child");
    assert_eq!(node.value(0).unwrap().as_i64().unwrap(), 1);
    let sub = node.child("Sub").expect("Sub child");
    assert_eq!(sub.value(0).unwrap().as_i64().unwrap(), 2);
    assert_eq!(sub.value(1).unwrap().as_i64().unwrap(), 3);

    let encoded = fbxcel::binary::encode_minimal(7400, std::slice::from_ref(node));
    assert!(fbxcel::binary::has_binary_magic(&encoded));
    let reparsed = fbxcel::binary::parse(&encoded).unwrap();
    assert_eq!(reparsed.version(), 7400);
    let reparsed_node = reparsed.root().child("Node").unwrap();
    assert_eq!(reparsed_node.value(0).unwrap().as_i64().unwrap(), 1);
}

fn node_fbx(name: &str, id: i64, props: &str) -> String {
    format!(
        "Model: {id}, \"Model::{name}\", \"Null\" {{\n\tProperties70:  {{\n\t\t{props}\n\t}}\n}}\n",
        id = id,
        name = name,
        props = props
    )
}

#[test]
fn cycle_detection_fails_the_load() {
    let mut src = String::new();
    src.push_str("FBXHeaderExtension: {\n\tFBXVersion: 7400\n}\n");
    src.push_str("Objects:  {\n");
    src.push_str(&node_fbx("A", 1000, ""));
    src.push_str(&node_fbx("B", 1001, ""));
    src.push_str("}\n");
    src.push_str("Connections:  {\n\tC: \"OO\",1000,1001\n\tC: \"OO\",1001,1000\n}\n");

    let err = import_slice(src.as_bytes(), &Config::default()).unwrap_err();
    assert!(matches!(err.kind(), Kind::NodeCycle));
}

#[test]
fn parent_child_chain_produces_accumulated_world_transform() {
    let mut src = String::new();
    src.push_str("FBXHeaderExtension: {\n\tFBXVersion: 7400\n}\n");
    src.push_str("Objects:  {\n");
    src.push_str(&node_fbx(
        "Root",
        2000,
        "P: \"Lcl Translation\", \"Lcl Translation\", \"\", \"A\",1,0,0",
    ));
    src.push_str(&node_fbx(
        "Child",
        2001,
        "P: \"Lcl Translation\", \"Lcl Translation\", \"\", \"A\",2,0,0",
    ));
    src.push_str("}\n");
    src.push_str("Connections:  {\n\tC: \"OO\",2001,2000\n}\n");

    let scene = import_slice(src.as_bytes(), &Config::default()).unwrap();
    let child = scene.node_by_id(2001).expect("child object present");
    let world = child.world_transform().mul_point([0.0, 0.0, 0.0]);
    assert!((world[0] - 3.0).abs() < 1e-9);
}
