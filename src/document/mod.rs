// Copyright 2017 The gltf Library Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! L5: recognises the canonical FBX node shape and materialises typed
//! domain objects with their property bags.

pub mod data;
pub mod object;

use crate::dom::{Document as DomDocument, Node};
use crate::error::{Error, Kind};
use data::{AnimCurveData, BlendChannelData, BlendShapeData, ClusterData, CurveKey, MediaData, MeshData, ObjectData};
use object::{ElementKind, Object, Property, PropertyBag, PropertyValue};
use std::collections::HashMap;

/// Global scene settings parsed from the `GlobalSettings` node.
#[derive(Clone, Debug)]
pub struct Settings {
    pub up_axis: i32,
    pub up_axis_sign: i32,
    pub front_axis: i32,
    pub front_axis_sign: i32,
    pub coord_axis: i32,
    pub coord_axis_sign: i32,
    pub original_unit_meters: f64,
    pub custom_frame_rate: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            up_axis: 1,
            up_axis_sign: 1,
            front_axis: 2,
            front_axis_sign: 1,
            coord_axis: 0,
            coord_axis_sign: 1,
            original_unit_meters: 0.01,
            custom_frame_rate: -1.0,
        }
    }
}

/// File-level metadata parsed from `FBXHeaderExtension`.
#[derive(Clone, Debug, Default)]
pub struct Metadata {
    pub creator: String,
    pub version: u32,
    pub is_ascii: bool,
    pub creation_time: String,
}

/// A connection declared in the `Connections` block, source before
/// destination, in declaration order.
#[derive(Clone, Debug)]
pub enum Connection {
    ObjectObject { src: u64, dst: u64 },
    ObjectProperty { src: u64, dst: u64, dst_property: String },
    PropertyObject { src: u64, src_property: String, dst: u64 },
    PropertyProperty { src: u64, src_property: String, dst: u64, dst_property: String },
}

/// A default property template declared under
/// `Definitions/ObjectType[<Kind>]/PropertyTemplate[<Sub>]`.
#[derive(Clone, Debug, Default)]
pub struct Template {
    pub properties: PropertyBag,
}

/// The output of L5: every object, its kind-specific data, the raw
/// connection list, templates, settings and metadata. Still mutable;
/// [`crate::connect`] wires this up and [`crate::scene`] freezes it.
pub struct Objects {
    pub objects: Vec<Object>,
    pub data: HashMap<u64, ObjectData>,
    pub connections: Vec<Connection>,
    pub templates: HashMap<(ElementKind, String), Template>,
    pub settings: Settings,
    pub metadata: Metadata,
}

fn kind_from_node_name(name: &str, subtype: &str) -> ElementKind {
    match name {
        "Model" => ElementKind::Node,
        "Geometry" => match subtype {
            "Shape" => ElementKind::BlendShape,
            _ => ElementKind::Mesh,
        },
        "Material" => ElementKind::Material,
        "Texture" => ElementKind::Texture,
        "Video" => ElementKind::Video,
        "NodeAttribute" => ElementKind::NodeAttribute,
        "AnimationStack" => ElementKind::AnimStack,
        "AnimationLayer" => ElementKind::AnimLayer,
        "AnimationCurveNode" => ElementKind::AnimCurveNode,
        "AnimationCurve" => ElementKind::AnimCurve,
        "Deformer" => match subtype {
            "Cluster" => ElementKind::Cluster,
            "BlendShapeChannel" => ElementKind::BlendChannel,
            "Skin" | "BlendShape" => ElementKind::Skin,
            _ => ElementKind::Unknown,
        },
        "Constraint" => ElementKind::Constraint,
        "Pose" => ElementKind::Pose,
        "SelectionSet" => ElementKind::SelectionSet,
        "SelectionNode" => ElementKind::SelectionNode,
        "DisplayLayer" => ElementKind::DisplayLayer,
        "CollectionExclusive" | "Collection" => ElementKind::DisplayLayer,
        "CacheFile" => ElementKind::CacheFile,
        _ => ElementKind::Unknown,
    }
}

fn parse_property_value(node: &Node, start: usize) -> Vec<PropertyValue> {
    let mut out = Vec::new();
    for value in node.values().iter().skip(start) {
        match value {
            crate::value::Value::Int(v) => out.push(PropertyValue::Int(*v)),
            crate::value::Value::Float(v) => out.push(PropertyValue::Float(*v)),
            crate::value::Value::String(bytes) => {
                out.push(PropertyValue::String(String::from_utf8_lossy(bytes).into_owned()))
            }
            _ => {}
        }
    }
    out
}

fn parse_properties(node: &Node) -> PropertyBag {
    let mut bag = PropertyBag::new();
    let container = node.child("Properties70").or_else(|| node.child("Properties60"));
    let Some(container) = container else { return bag };
    for p in container.children_named("P") {
        let name = match p.value(0).and_then(|v| v.as_str().map(str::to_owned).map_err(|_| Error::new(Kind::BadValueType))) {
            Ok(n) => n,
            Err(_) => continue,
        };
        let type_name = p.value(1).and_then(|v| v.as_str().map(str::to_owned)).unwrap_or_default();
        let subtype_name = p.value(2).and_then(|v| v.as_str().map(str::to_owned)).unwrap_or_default();
        let flags = p.value(3).and_then(|v| v.as_str().map(str::to_owned)).unwrap_or_default();
        let values = parse_property_value(p, 4);
        bag.insert(name, Property { type_name, subtype_name, flags, values, animated_by: None });
    }
    bag
}

fn f64_array(node: &Node, name: &str) -> Result<Vec<f64>, Error> {
    let Some(child) = node.child(name) else { return Ok(Vec::new()) };
    let Some(value) = child.values().first() else { return Ok(Vec::new()) };
    match value {
        crate::value::Value::ArrayF64(a) => a.to_vec(),
        crate::value::Value::ArrayF32(a) => Ok(a.to_vec()?.into_iter().map(|v| v as f64).collect()),
        _ => Err(Error::new(Kind::BadValueType).push_path(name)),
    }
}

fn i32_array(node: &Node, name: &str) -> Result<Vec<i32>, Error> {
    let Some(child) = node.child(name) else { return Ok(Vec::new()) };
    let Some(value) = child.values().first() else { return Ok(Vec::new()) };
    match value {
        crate::value::Value::ArrayI32(a) => a.to_vec(),
        crate::value::Value::ArrayI64(a) => Ok(a.to_vec()?.into_iter().map(|v| v as i32).collect()),
        _ => Err(Error::new(Kind::BadValueType).push_path(name)),
    }
}

fn layer_element_f64(node: &Node, layer_name: &str) -> Result<Vec<f64>, Error> {
    let Some(layer) = node.child(layer_name) else { return Ok(Vec::new()) };
    let candidate = if layer_name == "LayerElementUV" { "UV" } else { "Normals" };
    let Some(arr) = layer.child(candidate) else { return Ok(Vec::new()) };
    let Some(v) = arr.values().first() else { return Ok(Vec::new()) };
    match v {
        crate::value::Value::ArrayF64(a) => a.to_vec(),
        crate::value::Value::ArrayF32(a) => Ok(a.to_vec()?.into_iter().map(|v| v as f64).collect()),
        _ => Ok(Vec::new()),
    }
}

fn parse_mesh(node: &Node) -> Result<MeshData, Error> {
    let vertices = f64_array(node, "Vertices")?;
    let polygon_vertex_index = i32_array(node, "PolygonVertexIndex")?;
    let normals = layer_element_f64(node, "LayerElementNormal")?;
    let uvs = layer_element_f64(node, "LayerElementUV")?;
    let material_indices = node
        .child("LayerElementMaterial")
        .map(|l| i32_array(l, "Materials"))
        .transpose()?
        .unwrap_or_default();
    Ok(MeshData { vertices, polygon_vertex_index, normals, uvs, uv_indices: Vec::new(), material_indices, edges: Vec::new() })
}

fn i64_array(node: &Node, name: &str) -> Result<Vec<i64>, Error> {
    let Some(child) = node.child(name) else { return Ok(Vec::new()) };
    let Some(value) = child.values().first() else { return Ok(Vec::new()) };
    match value {
        crate::value::Value::ArrayI64(a) => a.to_vec(),
        crate::value::Value::ArrayI32(a) => Ok(a.to_vec()?.into_iter().map(i64::from).collect()),
        _ => Err(Error::new(Kind::BadValueType).push_path(name)),
    }
}

fn parse_anim_curve(node: &Node) -> Result<AnimCurveData, Error> {
    let times_i64 = i64_array(node, "KeyTime")?;
    let values = f64_array(node, "KeyValueFloat")?;
    let keys = times_i64
        .into_iter()
        .zip(values.into_iter())
        .map(|(time, value)| CurveKey { time, value: value as f32 })
        .collect();
    Ok(AnimCurveData { keys })
}

fn parse_cluster(node: &Node) -> Result<ClusterData, Error> {
    let indexes = i32_array(node, "Indexes")?;
    let weights = f64_array(node, "Weights")?;
    let transform = mat16(&f64_array(node, "Transform")?);
    let transform_link = mat16(&f64_array(node, "TransformLink")?);
    Ok(ClusterData { indexes, weights, transform, transform_link })
}

fn parse_blend_shape(node: &Node) -> Result<BlendShapeData, Error> {
    let indexes = i32_array(node, "Indexes")?;
    let vertices = f64_array(node, "Vertices")?;
    let normals = f64_array(node, "Normals")?;
    Ok(BlendShapeData { indexes, vertices, normals })
}

fn parse_blend_channel(node: &Node) -> Result<BlendChannelData, Error> {
    let full_weights = f64_array(node, "FullWeights")?;
    let deform_percent = node
        .child("DeformPercent")
        .and_then(|n| n.value(0).ok())
        .and_then(|v| v.as_f64().ok())
        .unwrap_or(100.0);
    Ok(BlendChannelData { full_weights, deform_percent })
}

fn mat16(values: &[f64]) -> [f64; 16] {
    let mut out = [0.0; 16];
    for i in 0..16.min(values.len()) {
        out[i] = values[i];
    }
    if values.is_empty() {
        out[0] = 1.0;
        out[5] = 1.0;
        out[10] = 1.0;
        out[15] = 1.0;
    }
    out
}

fn parse_media(node: &Node) -> MediaData {
    let filename = node.child("FileName").and_then(|n| n.value(0).ok()).and_then(|v| v.as_str().ok()).unwrap_or_default().to_string();
    let relative = node.child("RelativeFilename").and_then(|n| n.value(0).ok()).and_then(|v| v.as_str().ok()).unwrap_or_default().to_string();
    let content = node.child("Content").and_then(|n| n.values().first()).and_then(|v| v.as_bytes().ok()).map(|b| b.to_vec());
    MediaData { filename, relative_filename: relative, content, dimensions: None }
}

fn synthetic_id(counter: &mut u64) -> u64 {
    *counter += 1;
    0x1_0000_0000 | *counter
}

fn parse_header(root: &Node) -> Metadata {
    let mut meta = Metadata::default();
    if let Some(header) = root.child("FBXHeaderExtension") {
        if let Some(creator) = header.child("Creator").and_then(|n| n.value(0).ok()) {
            meta.creator = creator.as_str().unwrap_or("").to_string();
        }
        if let Some(time) = header.child("CreationTimeStamp") {
            meta.creation_time = format!("{:?}", time.values().len());
        }
    }
    meta
}

fn parse_settings(root: &Node) -> Settings {
    let mut settings = Settings::default();
    let Some(node) = root.child("GlobalSettings") else { return settings };
    let Some(props) = node.child("Properties70").or_else(|| node.child("Properties60")) else { return settings };
    for p in props.children_named("P") {
        let Ok(name) = p.value(0).and_then(|v| v.as_str().map(str::to_owned)) else { continue };
        let read_i = |idx: usize| p.value(idx).and_then(|v| v.as_i64()).ok();
        let read_f = |idx: usize| p.value(idx).and_then(|v| v.as_f64()).ok();
        match name.as_str() {
            "UpAxis" => settings.up_axis = read_i(4).unwrap_or(1) as i32,
            "UpAxisSign" => settings.up_axis_sign = read_i(4).unwrap_or(1) as i32,
            "FrontAxis" => settings.front_axis = read_i(4).unwrap_or(2) as i32,
            "FrontAxisSign" => settings.front_axis_sign = read_i(4).unwrap_or(1) as i32,
            "CoordAxis" => settings.coord_axis = read_i(4).unwrap_or(0) as i32,
            "CoordAxisSign" => settings.coord_axis_sign = read_i(4).unwrap_or(1) as i32,
            "UnitScaleFactor" => settings.original_unit_meters = read_f(4).unwrap_or(1.0) / 100.0,
            "CustomFrameRate" => settings.custom_frame_rate = read_f(4).unwrap_or(-1.0),
            _ => {}
        }
    }
    settings
}

fn parse_templates(root: &Node) -> HashMap<(ElementKind, String), Template> {
    let mut templates = HashMap::new();
    let Some(defs) = root.child("Definitions") else { return templates };
    for object_type in defs.children_named("ObjectType") {
        let Some(type_name_val) = object_type.values().first() else { continue };
        let Ok(type_name) = type_name_val.as_str() else { continue };
        for pt in object_type.children_named("PropertyTemplate") {
            let subtype = pt.values().first().and_then(|v| v.as_str().ok()).unwrap_or("").to_string();
            let kind = kind_from_node_name(type_name, &subtype);
            templates.insert((kind, subtype), Template { properties: parse_properties(pt) });
        }
    }
    templates
}

/// Parses the canonical FBX container nodes into [`Objects`].
pub fn read(doc: &DomDocument) -> Result<Objects, Error> {
    let root = doc.root();
    let version = doc.version();
    let mut metadata = parse_header(root);
    metadata.version = version;
    let settings = parse_settings(root);
    let templates = parse_templates(root);

    let mut objects = Vec::new();
    let mut data = HashMap::new();
    let mut synthetic_counter = 0u64;

    if let Some(objects_node) = root.child("Objects") {
        for object_node in objects_node.children() {
            let (id, name, subtype) = object_identity(object_node, &mut synthetic_counter);
            let kind = kind_from_node_name(object_node.name(), &subtype);
            if matches!(kind, ElementKind::Unknown) && !matches!(object_node.name(), "Pose" | "SelectionSet" | "SelectionNode" | "DisplayLayer" | "CacheFile") {
                continue;
            }
            let mut properties = parse_properties(object_node);
            if let Some(template) = templates.get(&(kind, subtype.clone())) {
                for (name, prop) in template.properties.iter() {
                    properties.insert_if_absent(name.to_string(), prop.clone());
                }
            }
            let payload = match kind {
                ElementKind::Mesh => ObjectData::Mesh(parse_mesh(object_node)?),
                ElementKind::AnimCurve => ObjectData::AnimCurve(parse_anim_curve(object_node)?),
                ElementKind::Cluster => ObjectData::Cluster(parse_cluster(object_node)?),
                ElementKind::BlendShape => ObjectData::BlendShape(parse_blend_shape(object_node)?),
                ElementKind::BlendChannel => ObjectData::BlendChannel(parse_blend_channel(object_node)?),
                ElementKind::Video | ElementKind::Texture => ObjectData::Media(parse_media(object_node)),
                _ => ObjectData::None,
            };
            data.insert(id, payload);
            objects.push(Object { id, kind, name, subtype, properties });
        }
    }

    let mut connections = Vec::new();
    if let Some(conn_node) = root.child("Connections") {
        for c in conn_node.children_named("C") {
            if let Some(conn) = parse_connection(c)? {
                connections.push(conn);
            }
        }
    }

    Ok(Objects { objects, data, connections, templates, settings, metadata })
}

fn object_identity(node: &Node, synthetic_counter: &mut u64) -> (u64, String, String) {
    let raw_id = node.value(0).ok().and_then(|v| v.as_i64().ok());
    let name_field = node.value(1).ok().and_then(|v| v.as_str().ok()).unwrap_or("").to_string();
    let subtype = node.value(2).ok().and_then(|v| v.as_str().ok()).unwrap_or("").to_string();
    let name = name_field.split("::").next_back().unwrap_or("").to_string();
    let id = match raw_id {
        Some(0) | None => synthetic_id(synthetic_counter),
        Some(v) => v as u64,
    };
    (id, name, subtype)
}

fn parse_connection(node: &Node) -> Result<Option<Connection>, Error> {
    let Ok(kind) = node.value(0).and_then(|v| v.as_str()) else { return Ok(None) };
    let src = node.value(1)?.as_i64()? as u64;
    let dst = node.value(2)?.as_i64()? as u64;
    Ok(Some(match kind {
        "OO" => Connection::ObjectObject { src, dst },
        "OP" => {
            let prop = node.value(3)?.as_str()?.to_string();
            Connection::ObjectProperty { src, dst, dst_property: prop }
        }
        "PO" => {
            let prop = node.value(3)?.as_str()?.to_string();
            Connection::PropertyObject { src, src_property: prop, dst }
        }
        "PP" => {
            let src_prop = node.value(3)?.as_str()?.to_string();
            let dst_prop = node.value(4)?.as_str()?.to_string();
            Connection::PropertyProperty { src, src_property: src_prop, dst, dst_property: dst_prop }
        }
        _ => return Ok(None),
    }))
}
