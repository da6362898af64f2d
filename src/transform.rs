// Copyright 2017 The gltf Library Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! L7: evaluates a `Model`'s local transform from its property bag.
//!
//! FBX composes nine matrices per node:
//!
//! `L = T * Roff * Rp * Rpre * R(order) * Rpost^-1 * Rp^-1 * Soff * Sp * S * Sp^-1`
//!
//! where `T`/`S` are translation/scale, `Roff`/`Soff` are pivot offsets,
//! `Rp`/`Sp` are pivots, and `Rpre`/`Rpost` are the (rarely used) static
//! pre/post rotations layered around the animated `R(order)` rotation.

use crate::document::object::{Object, PropertyValue};
use crate::math::{Mat4, Vec3};

/// The six Euler rotation orders FBX supports, plus the rare spherical
/// (quaternion-interpolated) mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RotationOrder {
    Xyz,
    Xzy,
    Yzx,
    Yxz,
    Zxy,
    Zyx,
    SphericXyz,
}

impl RotationOrder {
    fn from_fbx(n: i64) -> RotationOrder {
        match n {
            0 => RotationOrder::Xyz,
            1 => RotationOrder::Xzy,
            2 => RotationOrder::Yzx,
            3 => RotationOrder::Yxz,
            4 => RotationOrder::Zxy,
            5 => RotationOrder::Zyx,
            6 => RotationOrder::SphericXyz,
            _ => RotationOrder::Xyz,
        }
    }
}

/// How a child node's transform is affected by a scaled parent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InheritMode {
    /// Parent scale applies to the child's translation and rotation too.
    Normal,
    /// The child ignores the parent's scale entirely.
    NoScale,
    /// Parent scale applies to translation but not to the child's own
    /// rotation/scale axes (the common "RrSs" FBX default).
    NoScaleShear,
}

impl InheritMode {
    fn from_fbx(n: i64) -> InheritMode {
        match n {
            1 => InheritMode::NoScale,
            2 => InheritMode::NoScaleShear,
            _ => InheritMode::Normal,
        }
    }
}

/// Every field the composition chain needs, pulled out of a `Model`'s
/// property bag with FBX's documented per-field defaults.
#[derive(Clone, Debug)]
pub struct TransformProps {
    pub translation: Vec3,
    pub rotation_offset: Vec3,
    pub rotation_pivot: Vec3,
    pub pre_rotation: Vec3,
    pub rotation: Vec3,
    pub post_rotation: Vec3,
    pub scaling_offset: Vec3,
    pub scaling_pivot: Vec3,
    pub scale: Vec3,
    pub rotation_order: RotationOrder,
    pub inherit_mode: InheritMode,
    /// Legacy FBX 6.1-and-earlier scale compensation: when true and the
    /// parent inherits `Normal`, a synthetic counter-scale node must be
    /// inserted between parent and child at the scene layer.
    pub scale_compensate: bool,
}

pub(crate) fn vec3_prop(obj: &Object, name: &str, default: Vec3) -> Vec3 {
    let Some(prop) = obj.properties.get(name) else { return default };
    if prop.values.len() < 3 {
        return default;
    }
    let get = |v: &PropertyValue| v.as_f64().unwrap_or(0.0);
    [get(&prop.values[0]), get(&prop.values[1]), get(&prop.values[2])]
}

pub(crate) fn i64_prop(obj: &Object, name: &str, default: i64) -> i64 {
    obj.properties.get(name).and_then(|p| p.values.first()).and_then(|v| v.as_i64()).unwrap_or(default)
}

fn bool_prop(obj: &Object, name: &str, default: bool) -> bool {
    obj.properties.get(name).and_then(|p| p.values.first()).and_then(|v| v.as_i64()).map(|v| v != 0).unwrap_or(default)
}

impl TransformProps {
    /// Reads transform properties off a `Model` object, falling back to
    /// FBX's documented zero/identity defaults for anything absent.
    pub fn from_object(obj: &Object) -> TransformProps {
        TransformProps {
            translation: vec3_prop(obj, "Lcl Translation", [0.0; 3]),
            rotation_offset: vec3_prop(obj, "RotationOffset", [0.0; 3]),
            rotation_pivot: vec3_prop(obj, "RotationPivot", [0.0; 3]),
            pre_rotation: vec3_prop(obj, "PreRotation", [0.0; 3]),
            rotation: vec3_prop(obj, "Lcl Rotation", [0.0; 3]),
            post_rotation: vec3_prop(obj, "PostRotation", [0.0; 3]),
            scaling_offset: vec3_prop(obj, "ScalingOffset", [0.0; 3]),
            scaling_pivot: vec3_prop(obj, "ScalingPivot", [0.0; 3]),
            scale: vec3_prop(obj, "Lcl Scaling", [1.0, 1.0, 1.0]),
            rotation_order: RotationOrder::from_fbx(i64_prop(obj, "RotationOrder", 0)),
            inherit_mode: InheritMode::from_fbx(i64_prop(obj, "InheritType", 0)),
            scale_compensate: bool_prop(obj, "ScalingCompensate", false),
        }
    }
}

/// A `Model`'s geometric transform: the offset between the node and the
/// geometry it owns. Never inherited by children and not part of the nine-
/// matrix local-transform chain; `geometry_transform_handling` decides how
/// it reaches the output scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometricTransform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scaling: Vec3,
}

impl GeometricTransform {
    pub fn from_object(obj: &Object) -> GeometricTransform {
        GeometricTransform {
            translation: vec3_prop(obj, "GeometricTranslation", [0.0; 3]),
            rotation: vec3_prop(obj, "GeometricRotation", [0.0; 3]),
            scaling: vec3_prop(obj, "GeometricScaling", [1.0, 1.0, 1.0]),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.translation == [0.0; 3] && self.rotation == [0.0; 3] && self.scaling == [1.0, 1.0, 1.0]
    }

    /// `T * R(xyz) * S`, no pivots — geometric transforms do not have them.
    pub fn matrix(&self) -> Mat4 {
        Mat4::translation(self.translation).mul(&euler_matrix(self.rotation, RotationOrder::Xyz)).mul(&Mat4::scale(self.scaling))
    }
}

fn euler_matrix(r: Vec3, order: RotationOrder) -> Mat4 {
    let (rx, ry, rz) = (Mat4::rotation_x(r[0]), Mat4::rotation_y(r[1]), Mat4::rotation_z(r[2]));
    match order {
        RotationOrder::Xyz | RotationOrder::SphericXyz => rz.mul(&ry).mul(&rx),
        RotationOrder::Xzy => ry.mul(&rz).mul(&rx),
        RotationOrder::Yzx => rx.mul(&rz).mul(&ry),
        RotationOrder::Yxz => rz.mul(&rx).mul(&ry),
        RotationOrder::Zxy => ry.mul(&rx).mul(&rz),
        RotationOrder::Zyx => rx.mul(&ry).mul(&rz),
    }
}

/// Evaluates the full nine-matrix composition chain for one node's local
/// transform (parent-relative). Scene-level world transforms are
/// accumulated by walking the node tree built in [`crate::connect`].
pub fn local_matrix(props: &TransformProps) -> Mat4 {
    let t = Mat4::translation(props.translation);
    let r_off = Mat4::translation(props.rotation_offset);
    let r_piv = Mat4::translation(props.rotation_pivot);
    let r_piv_inv = r_piv.inverse();
    let r_pre = euler_matrix(props.pre_rotation, RotationOrder::Xyz);
    let r = euler_matrix(props.rotation, props.rotation_order);
    let r_post_inv = euler_matrix(props.post_rotation, RotationOrder::Xyz).inverse();
    let s_off = Mat4::translation(props.scaling_offset);
    let s_piv = Mat4::translation(props.scaling_pivot);
    let s_piv_inv = s_piv.inverse();
    let s = Mat4::scale(props.scale);

    t.mul(&r_off).mul(&r_piv).mul(&r_pre).mul(&r).mul(&r_post_inv).mul(&r_piv_inv).mul(&s_off).mul(&s_piv).mul(&s).mul(&s_piv_inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::object::{ElementKind, Property, PropertyBag};

    fn model_with(props: Vec<(&str, Vec<PropertyValue>)>) -> Object {
        let mut bag = PropertyBag::new();
        for (name, values) in props {
            bag.insert(
                name.to_string(),
                Property { type_name: String::new(), subtype_name: String::new(), flags: String::new(), values, animated_by: None },
            );
        }
        Object { id: 1, kind: ElementKind::Node, name: "node".into(), subtype: String::new(), properties: bag }
    }

    #[test]
    fn defaults_produce_identity() {
        let obj = model_with(vec![]);
        let props = TransformProps::from_object(&obj);
        let m = local_matrix(&props);
        assert_eq!(m, Mat4::IDENTITY);
    }

    #[test]
    fn plain_translation_moves_origin() {
        let obj = model_with(vec![("Lcl Translation", vec![PropertyValue::Float(1.0), PropertyValue::Float(2.0), PropertyValue::Float(3.0)])]);
        let props = TransformProps::from_object(&obj);
        let m = local_matrix(&props);
        assert_eq!(m.mul_point([0.0, 0.0, 0.0]), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn rotation_pivot_keeps_pivot_point_fixed() {
        let obj = model_with(vec![
            ("RotationPivot", vec![PropertyValue::Float(1.0), PropertyValue::Float(0.0), PropertyValue::Float(0.0)]),
            ("Lcl Rotation", vec![PropertyValue::Float(0.0), PropertyValue::Float(90.0), PropertyValue::Float(0.0)]),
        ]);
        let props = TransformProps::from_object(&obj);
        let m = local_matrix(&props);
        let pivot = m.mul_point([1.0, 0.0, 0.0]);
        assert!((pivot[0] - 1.0).abs() < 1e-9);
        assert!(pivot[2].abs() < 1e-9);
    }

    #[test]
    fn inherit_mode_reads_from_property() {
        let obj = model_with(vec![("InheritType", vec![PropertyValue::Int(2)])]);
        let props = TransformProps::from_object(&obj);
        assert_eq!(props.inherit_mode, InheritMode::NoScaleShear);
    }

    #[test]
    fn absent_geometric_transform_is_identity() {
        let obj = model_with(vec![]);
        let gt = GeometricTransform::from_object(&obj);
        assert!(gt.is_identity());
        assert_eq!(gt.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn geometric_translation_offsets_only_the_geometry() {
        let obj = model_with(vec![(
            "GeometricTranslation",
            vec![PropertyValue::Float(1.0), PropertyValue::Float(0.0), PropertyValue::Float(0.0)],
        )]);
        let gt = GeometricTransform::from_object(&obj);
        assert!(!gt.is_identity());
        assert_eq!(gt.matrix().mul_point([0.0, 0.0, 0.0]), [1.0, 0.0, 0.0]);
    }
}
