// Copyright 2017 The gltf Library Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Kind-specific payloads parsed eagerly out of the DOM at L5, keyed by
//! the same id as the owning [`super::object::Object`]. Everything that
//! can instead live in the property bag (colors, transforms, ...) does;
//! this module only holds data FBX stores as raw arrays or sub-nodes.

/// Per-mesh geometry, straight out of the `Geometry` node's array children.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    /// Flattened `(x, y, z)` tuples.
    pub vertices: Vec<f64>,
    /// Indices into `vertices` (divided by 3 to get a vertex index); the
    /// last index of each face is bitwise-NOT'd to mark the face boundary,
    /// matching the on-disk `PolygonVertexIndex` convention.
    pub polygon_vertex_index: Vec<i32>,
    /// Per-polygon-vertex or per-vertex normals (mirrors
    /// `LayerElementNormal`), flattened `(x, y, z)` tuples.
    pub normals: Vec<f64>,
    /// Per-polygon-vertex UV coordinates, flattened `(u, v)` tuples.
    pub uvs: Vec<f64>,
    /// Indices into `uvs`, parallel to `polygon_vertex_index` when the UV
    /// layer uses `IndexToDirect` mapping.
    pub uv_indices: Vec<i32>,
    /// Per-polygon material index (`LayerElementMaterial`).
    pub material_indices: Vec<i32>,
    /// Per-(vertex or polygon-vertex) smoothing group id.
    pub edges: Vec<i32>,
}

impl MeshData {
    /// Decodes the face boundaries out of `polygon_vertex_index`: each
    /// inner `Vec` is one face's vertex indices, in declaration order.
    pub fn faces(&self) -> Vec<Vec<i32>> {
        let mut faces = Vec::new();
        let mut current = Vec::new();
        for &raw in &self.polygon_vertex_index {
            if raw < 0 {
                current.push(!raw);
                faces.push(std::mem::take(&mut current));
            } else {
                current.push(raw);
            }
        }
        if !current.is_empty() {
            faces.push(current);
        }
        faces
    }
}

/// A single animation-curve key.
#[derive(Clone, Copy, Debug)]
pub struct CurveKey {
    /// FBX time, in units of 1/46186158000 second.
    pub time: i64,
    pub value: f32,
}

/// `AnimCurve`: one channel's worth of keyframes.
#[derive(Clone, Debug, Default)]
pub struct AnimCurveData {
    pub keys: Vec<CurveKey>,
}

impl AnimCurveData {
    /// Samples the curve at `time` (in native FBX time units) with linear
    /// interpolation, clamping at the ends.
    pub fn sample(&self, time: i64) -> f32 {
        if self.keys.is_empty() {
            return 0.0;
        }
        if time <= self.keys[0].time {
            return self.keys[0].value;
        }
        if time >= self.keys[self.keys.len() - 1].time {
            return self.keys[self.keys.len() - 1].value;
        }
        for w in self.keys.windows(2) {
            let (a, b) = (w[0], w[1]);
            if time >= a.time && time <= b.time {
                let span = (b.time - a.time).max(1) as f64;
                let t = (time - a.time) as f64 / span;
                return (a.value as f64 + (b.value - a.value) as f64 * t) as f32;
            }
        }
        self.keys[self.keys.len() - 1].value
    }
}

/// `Deformer[Cluster]`: the set of control points a skin cluster
/// influences, and the bind-pose matrices needed to skin them.
#[derive(Clone, Debug, Default)]
pub struct ClusterData {
    /// Indices into the target mesh's vertex array.
    pub indexes: Vec<i32>,
    /// Per-index weight, parallel to `indexes`.
    pub weights: Vec<f64>,
    /// The mesh-local transform at bind time.
    pub transform: [f64; 16],
    /// The bone-local transform at bind time.
    pub transform_link: [f64; 16],
}

/// `Geometry[Shape]`: a blend-shape target as a sparse vertex delta.
#[derive(Clone, Debug, Default)]
pub struct BlendShapeData {
    pub indexes: Vec<i32>,
    pub vertices: Vec<f64>,
    pub normals: Vec<f64>,
}

/// `Deformer[BlendShapeChannel]`: one blend channel's full-weight targets
/// and current weight.
#[derive(Clone, Debug, Default)]
pub struct BlendChannelData {
    pub full_weights: Vec<f64>,
    pub deform_percent: f64,
}

/// `Video`/embedded `Texture` content.
#[derive(Clone, Debug, Default)]
pub struct MediaData {
    pub filename: String,
    pub relative_filename: String,
    pub content: Option<Vec<u8>>,
    /// Pixel `(width, height)`, probed from `content` when the `import`
    /// feature is enabled; `None` otherwise or when the content is not a
    /// recognised image format.
    pub dimensions: Option<(u32, u32)>,
}

/// Everything about an object that isn't representable as a plain
/// property. One variant per [`super::object::ElementKind`] that needs
/// it; kinds whose state is entirely property-driven (`Material`,
/// `Light`, `Camera`, `NodeAttribute`, `Model`, `AnimCurveNode`, ...) carry
/// `None`.
#[derive(Clone, Debug)]
pub enum ObjectData {
    Mesh(MeshData),
    AnimCurve(AnimCurveData),
    Cluster(ClusterData),
    BlendShape(BlendShapeData),
    BlendChannel(BlendChannelData),
    Media(MediaData),
    None,
}
