// Copyright 2017 The gltf Library Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Prints the raw DOM node tree of an FBX file, depth-first.

use fbxcel::dom::Node;
use std::env;
use std::process;

fn print_node(node: &Node, depth: usize) {
    println!("{}{} {:?}", "  ".repeat(depth), node.name(), node.values());
    for child in node.children() {
        print_node(child, depth + 1);
    }
}

fn main() {
    let path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: fbx-tree <path>");
            process::exit(2);
        }
    };

    let data = match std::fs::read(&path) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("error reading {path}: {err}");
            process::exit(1);
        }
    };

    let doc = if fbxcel::binary::has_binary_magic(&data) { fbxcel::binary::parse(&data) } else { fbxcel::ascii::parse(&data) };

    match doc {
        Ok(doc) => {
            println!("version: {}", doc.version());
            print_node(doc.root(), 0);
        }
        Err(err) => {
            eprintln!("parse error: {err}");
            process::exit(1);
        }
    }
}
