// Copyright 2017 The gltf Library Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! L8: the optional post-pass that reconciles a file's axis convention
//! and unit scale with the caller's target space.

use crate::math::Mat4;

/// Target coordinate-axis convention, matching FBX's `GlobalSettings`
/// `UpAxis`/`FrontAxis`/`CoordAxis` triple.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisSystem {
    pub up: Axis,
    pub front: Axis,
    pub coord: Axis,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Axis {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl Axis {
    fn from_fbx(axis: i32, sign: i32) -> Axis {
        let positive = sign >= 0;
        match (axis, positive) {
            (0, true) => Axis::PosX,
            (0, false) => Axis::NegX,
            (1, true) => Axis::PosY,
            (1, false) => Axis::NegY,
            (2, true) => Axis::PosZ,
            (2, false) => Axis::NegZ,
            _ => Axis::PosY,
        }
    }

    fn unit_vec(self) -> [f64; 3] {
        match self {
            Axis::PosX => [1.0, 0.0, 0.0],
            Axis::NegX => [-1.0, 0.0, 0.0],
            Axis::PosY => [0.0, 1.0, 0.0],
            Axis::NegY => [0.0, -1.0, 0.0],
            Axis::PosZ => [0.0, 0.0, 1.0],
            Axis::NegZ => [0.0, 0.0, -1.0],
        }
    }
}

impl AxisSystem {
    pub fn from_settings(up: i32, up_sign: i32, front: i32, front_sign: i32, coord: i32, coord_sign: i32) -> AxisSystem {
        AxisSystem {
            up: Axis::from_fbx(up, up_sign),
            front: Axis::from_fbx(front, front_sign),
            coord: Axis::from_fbx(coord, coord_sign),
        }
    }

    /// glTF/common "Y-up, Z-forward, right-handed" convention.
    pub fn y_up_right_handed() -> AxisSystem {
        AxisSystem { up: Axis::PosY, front: Axis::NegZ, coord: Axis::PosX }
    }

    fn basis(self) -> Mat4 {
        let x = self.coord.unit_vec();
        let y = self.up.unit_vec();
        let z = self.front.unit_vec();
        Mat4([
            [x[0], y[0], z[0], 0.0],
            [x[1], y[1], z[1], 0.0],
            [x[2], y[2], z[2], 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }
}

/// How the axis/unit conversion is applied to the scene.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SpaceConversionPolicy {
    /// Wrap the whole scene under a synthetic root carrying the conversion.
    TransformRoot,
    /// Push the conversion into each root-parented node's local transform,
    /// so the scene root itself stays identity.
    AdjustTransforms,
    /// Bake the conversion into geometry and anim-curve values instead of
    /// any node transform.
    ModifyGeometry,
}

/// The conversion matrix from a file's declared axis/unit system to the
/// caller's target, plus the scalar unit ratio for anim-curve baking.
pub struct Conversion {
    pub matrix: Mat4,
    pub unit_ratio: f64,
}

/// Computes the conversion from `source` (the file's `GlobalSettings`
/// axis system, in `source_unit_cm` units) to `target` (in
/// `target_unit_cm` units). Rotation and scale magnitudes are invariant
/// under unit conversion; only translations and point positions scale.
pub fn compute_conversion(source: AxisSystem, source_unit_cm: f64, target: AxisSystem, target_unit_cm: f64) -> Conversion {
    let unit_ratio = if target_unit_cm.abs() > 1e-12 { source_unit_cm / target_unit_cm } else { 1.0 };
    let source_basis = source.basis();
    let target_basis_inv = target.basis().inverse();
    let rotation = target_basis_inv.mul(&source_basis);
    let matrix = rotation.mul(&Mat4::scale([unit_ratio, unit_ratio, unit_ratio]));
    Conversion { matrix, unit_ratio }
}

/// Applies `conversion` to a flat `(x, y, z)` position buffer, as used by
/// `ModifyGeometry` for mesh vertex arrays and bone-space cluster data.
pub fn apply_to_positions(conversion: &Conversion, positions: &mut [f64]) {
    for chunk in positions.chunks_exact_mut(3) {
        let p = conversion.matrix.mul_point([chunk[0], chunk[1], chunk[2]]);
        chunk.copy_from_slice(&p);
    }
}

/// Applies only the unit-length component of `conversion` to an
/// anim-curve's sampled values, used when the curve drives a translation
/// channel under `ModifyGeometry`.
pub fn apply_unit_to_curve(conversion: &Conversion, values: &mut [f32]) {
    let ratio = conversion.unit_ratio as f32;
    for v in values {
        *v *= ratio;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_axis_systems_give_identity_rotation() {
        let target = AxisSystem::y_up_right_handed();
        let conversion = compute_conversion(target, 1.0, target, 1.0);
        assert_eq!(conversion.matrix, Mat4::IDENTITY);
    }

    #[test]
    fn unit_ratio_scales_translation_only() {
        let target = AxisSystem::y_up_right_handed();
        // Source file authored in centimeters (FBX default), target meters.
        let conversion = compute_conversion(target, 1.0, target, 100.0);
        assert!((conversion.unit_ratio - 0.01).abs() < 1e-12);
        let p = conversion.matrix.mul_point([100.0, 0.0, 0.0]);
        assert!((p[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn z_up_to_y_up_swaps_axes() {
        let source = AxisSystem { up: Axis::PosZ, front: Axis::NegY, coord: Axis::PosX };
        let target = AxisSystem::y_up_right_handed();
        let conversion = compute_conversion(source, 1.0, target, 1.0);
        let p = conversion.matrix.mul_point([0.0, 0.0, 1.0]);
        assert!((p[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn apply_to_positions_scales_each_triple() {
        let target = AxisSystem::y_up_right_handed();
        let conversion = compute_conversion(target, 1.0, target, 2.0);
        let mut positions = vec![2.0, 4.0, 6.0, 1.0, 1.0, 1.0];
        apply_to_positions(&conversion, &mut positions);
        assert!((positions[0] - 1.0).abs() < 1e-9);
        assert!((positions[3] - 0.5).abs() < 1e-9);
    }
}
