// Copyright 2017 The gltf Library Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! FBX scene loading.
//!
//! Parses both the binary and ASCII FBX dialects into a shared node tree,
//! reads the tree into typed objects, resolves the `Connections` graph,
//! evaluates each node's local transform, optionally reconciles the
//! file's axis/unit convention with a caller-chosen target, and freezes
//! the result into an immutable [`scene::Scene`].
//!
//! ```no_run
//! let config = fbxcel::import::Config::default();
//! let scene = fbxcel::import::import_path("model.fbx", &config)?;
//! for node in scene.roots() {
//!     println!("{}: {:?}", node.name(), node.world_transform());
//! }
//! # Ok::<(), fbxcel::error::Error>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod ascii;
pub mod binary;
pub mod bitreader;
pub mod connect;
pub mod document;
pub mod dom;
pub mod error;
pub mod inflate;
#[cfg(feature = "import")]
pub mod import;
pub mod math;
pub mod scene;
pub mod space;
pub mod transform;
pub mod value;

pub use error::{Error, Kind};
