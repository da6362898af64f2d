// Copyright 2017 The gltf Library Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Loads a scene and prints its node hierarchy with world transforms.

use fbxcel::import::{self, Config};
use fbxcel::scene::Node;
use std::env;
use std::process;

fn print_node(node: Node, depth: usize) {
    let t = node.world_transform().mul_point([0.0, 0.0, 0.0]);
    println!("{}{} [{:?}] @ ({:.3}, {:.3}, {:.3})", "  ".repeat(depth), node.name(), node.kind(), t[0], t[1], t[2]);
    for child in node.children() {
        print_node(child, depth + 1);
    }
}

fn main() {
    let path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: fbx-display <path>");
            process::exit(2);
        }
    };

    match import::import_path(&path, &Config::default()) {
        Ok(scene) => {
            println!("{} objects, creator: {}", scene.len(), scene.metadata().creator);
            for root in scene.roots() {
                print_node(root, 0);
            }
        }
        Err(err) => {
            eprintln!("error loading {path}: {err}");
            process::exit(1);
        }
    }
}
