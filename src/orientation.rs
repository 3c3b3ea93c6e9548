//! Orientation algebra
//!
//! MJCF stores quaternions scalar-first (`w x y z`, the *canonical*
//! ordering). Rotation math here runs on [`nalgebra::UnitQuaternion`], and
//! the scalar-last (`x y z w`, *computational*) ordering is what most
//! rotation libraries exchange. Conversions between the two orderings are
//! explicit functions so every boundary crossing is visible.
//!
//! Composition follows the usual convention: `a * b` applies `b` first and
//! then `a`. The inverse of a unit quaternion is its conjugate.

use crate::document::{Document, Element};
use crate::error::{Error, Result};
use nalgebra::{Matrix3, Quaternion, Rotation3, Unit, UnitQuaternion, Vector3};

/// Rotation type used throughout the crate
pub type Rotation = UnitQuaternion<f64>;

/// Attributes that can carry an element's orientation
pub const ORIENTATION_ATTRIBUTES: [&str; 5] = ["quat", "axisangle", "euler", "xyaxes", "zaxis"];

/// Euler sequence used when neither the element nor the caller supplies one
pub const DEFAULT_EULER_SEQUENCE: &str = "xyz";

const MIN_AXIS_NORM: f64 = 1e-8;

/// Unit for angles written in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleUnit {
    /// Angles are in degrees (MJCF default)
    #[default]
    Degree,
    /// Angles are in radians
    Radian,
}

impl AngleUnit {
    /// Read the unit from the document's `<compiler angle="...">`
    ///
    /// Anything other than `radian` (case-insensitive) means degrees,
    /// including a missing `compiler` element or attribute.
    pub fn of(document: &Document) -> Self {
        document
            .first_child(document.root(), "compiler")
            .and_then(|compiler| document.element(compiler).attr("angle"))
            .map(|angle| {
                if angle.trim().eq_ignore_ascii_case("radian") {
                    AngleUnit::Radian
                } else {
                    AngleUnit::Degree
                }
            })
            .unwrap_or_default()
    }

    /// Convert a value in this unit to radians
    pub fn to_radians(self, value: f64) -> f64 {
        match self {
            AngleUnit::Degree => value.to_radians(),
            AngleUnit::Radian => value,
        }
    }
}

/// Reorder `w x y z` into `x y z w`
pub fn canonical_to_computational(q: [f64; 4]) -> [f64; 4] {
    [q[1], q[2], q[3], q[0]]
}

/// Reorder `x y z w` into `w x y z`
pub fn computational_to_canonical(q: [f64; 4]) -> [f64; 4] {
    [q[3], q[0], q[1], q[2]]
}

/// Build a rotation from canonical `w x y z` components, normalizing them
///
/// Returns `None` for a zero-length quaternion.
pub fn from_canonical(q: [f64; 4]) -> Option<Rotation> {
    let [x, y, z, w] = canonical_to_computational(q);
    UnitQuaternion::try_new(Quaternion::new(w, x, y, z), f64::EPSILON)
}

/// Canonical `w x y z` components of a rotation
pub fn to_canonical(rotation: &Rotation) -> [f64; 4] {
    let q = rotation.quaternion();
    computational_to_canonical([q.i, q.j, q.k, q.w])
}

/// Rotation about a normalized axis
///
/// `angle` is already in radians. Fails if the axis has (near) zero length.
pub fn from_axis_angle(axis: Vector3<f64>, angle: f64) -> Option<Rotation> {
    if axis.norm() < MIN_AXIS_NORM {
        return None;
    }
    Some(UnitQuaternion::from_axis_angle(&Unit::new_normalize(axis), angle))
}

/// Rotation from three Euler angles (radians) and a sequence such as `"xyz"`
///
/// Lowercase letters rotate about the fixed frame (extrinsic), uppercase
/// letters about the moving frame (intrinsic). Case may not be mixed and
/// consecutive axes must differ.
pub fn from_euler(angles: [f64; 3], sequence: &str) -> std::result::Result<Rotation, String> {
    let axes: Vec<char> = sequence.chars().collect();
    if axes.len() != 3 {
        return Err(format!(
            "euler sequence '{}' must have exactly 3 axes",
            sequence
        ));
    }

    let extrinsic = axes.iter().all(|c| matches!(c, 'x' | 'y' | 'z'));
    let intrinsic = axes.iter().all(|c| matches!(c, 'X' | 'Y' | 'Z'));
    if !extrinsic && !intrinsic {
        return Err(format!(
            "euler sequence '{}' must use only xyz (extrinsic) or only XYZ (intrinsic)",
            sequence
        ));
    }
    if axes[0] == axes[1] || axes[1] == axes[2] {
        return Err(format!(
            "euler sequence '{}' repeats an axis consecutively",
            sequence
        ));
    }

    let mut rotation = Rotation::identity();
    for (axis, angle) in axes.iter().zip(angles) {
        let elementary = match axis.to_ascii_lowercase() {
            'x' => UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angle),
            'y' => UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle),
            _ => UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle),
        };
        rotation = if extrinsic {
            elementary * rotation
        } else {
            rotation * elementary
        };
    }
    Ok(rotation)
}

/// Rotation whose frame has the given x and y axes
fn from_xyaxes(values: [f64; 6]) -> Option<Rotation> {
    let x = Vector3::new(values[0], values[1], values[2]);
    let y = Vector3::new(values[3], values[4], values[5]);
    if x.norm() < MIN_AXIS_NORM {
        return None;
    }
    let x = x.normalize();
    // Gram-Schmidt: keep x, make y orthogonal to it
    let y = y - x * x.dot(&y);
    if y.norm() < MIN_AXIS_NORM {
        return None;
    }
    let y = y.normalize();
    let z = x.cross(&y);
    let matrix = Matrix3::from_columns(&[x, y, z]);
    Some(UnitQuaternion::from_rotation_matrix(
        &Rotation3::from_matrix_unchecked(matrix),
    ))
}

/// Minimal rotation taking +Z onto the given axis
fn from_zaxis(values: [f64; 3]) -> Option<Rotation> {
    let z = Vector3::new(values[0], values[1], values[2]);
    if z.norm() < MIN_AXIS_NORM {
        return None;
    }
    let z = z.normalize();
    UnitQuaternion::rotation_between(&Vector3::z(), &z).or_else(|| {
        // antiparallel: half turn about x
        Some(UnitQuaternion::from_axis_angle(
            &Vector3::x_axis(),
            std::f64::consts::PI,
        ))
    })
}

/// Orientation explicitly declared on an element, if any
///
/// Attributes are checked in priority order: `quat`, `axisangle`, `euler`
/// (with the element's `eulerseq` or `default_sequence`), then `xyaxes`
/// and `zaxis`. Blank attributes count as absent.
pub fn explicit_orientation(
    element: &Element,
    unit: AngleUnit,
    default_sequence: &str,
) -> Result<Option<Rotation>> {
    if let Some(q) = element.parse_array::<4>("quat")? {
        return from_canonical(q).map(Some).ok_or_else(|| {
            malformed(element, "quat", "quaternion has zero length")
        });
    }

    if let Some([x, y, z, angle]) = element.parse_array::<4>("axisangle")? {
        return from_axis_angle(Vector3::new(x, y, z), unit.to_radians(angle))
            .map(Some)
            .ok_or_else(|| malformed(element, "axisangle", "rotation axis is a zero vector"));
    }

    if let Some(angles) = element.parse_array::<3>("euler")? {
        let sequence = element
            .non_blank_attr("eulerseq")
            .map(str::trim)
            .unwrap_or(default_sequence);
        let radians = angles.map(|angle| unit.to_radians(angle));
        return from_euler(radians, sequence)
            .map(Some)
            .map_err(|message| malformed(element, "euler", &message));
    }

    if let Some(values) = element.parse_array::<6>("xyaxes")? {
        return from_xyaxes(values)
            .map(Some)
            .ok_or_else(|| malformed(element, "xyaxes", "axes are degenerate"));
    }

    if let Some(values) = element.parse_array::<3>("zaxis")? {
        return from_zaxis(values)
            .map(Some)
            .ok_or_else(|| malformed(element, "zaxis", "axis is a zero vector"));
    }

    Ok(None)
}

/// Resolve an element's orientation, defaulting to identity
pub fn resolve_orientation(
    element: &Element,
    unit: AngleUnit,
    default_sequence: &str,
) -> Result<Rotation> {
    Ok(explicit_orientation(element, unit, default_sequence)?.unwrap_or_else(Rotation::identity))
}

/// Store a rotation as the element's `quat`, dropping competing encodings
pub fn write_orientation(element: &mut Element, rotation: &Rotation) {
    for attribute in ORIENTATION_ATTRIBUTES.iter().skip(1) {
        element.remove_attr(attribute);
    }
    element.set_floats("quat", &to_canonical(rotation));
}

fn malformed(element: &Element, attribute: &str, message: &str) -> Error {
    Error::malformed_attribute(
        element.tag(),
        attribute,
        element.attr(attribute).unwrap_or_default(),
        message,
    )
}
