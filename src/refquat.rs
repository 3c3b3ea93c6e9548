//! Mesh reference-orientation correction
//!
//! An MJCF `<mesh>` asset may declare `refquat`, the orientation the mesh
//! data was authored in. Importers that ignore it place every instance of the
//! mesh with the wrong rotation, so the reference orientation is factored out
//! of each `<geom>` that uses the mesh and the attribute is dropped from the
//! asset.
//!
//! This runs before replicate expansion so that copies inherit the corrected
//! orientation.

use crate::document::{Document, normalize_identifier};
use crate::error::{Error, Result};
use crate::orientation::{self, AngleUnit, Rotation};
use std::collections::HashMap;

/// Normalized mesh name -> reference orientation
pub type RefQuatTable = HashMap<String, Rotation>;

/// Collect `refquat` from every mesh asset, removing the attribute
///
/// Meshes without a name are left untouched.
pub fn take_reference_orientations(document: &mut Document) -> Result<RefQuatTable> {
    let mut table = RefQuatTable::new();

    for asset in document.find_all(document.root(), "asset") {
        let meshes: Vec<_> = document.children(asset, "mesh").collect();
        for mesh in meshes {
            let element = document.element(mesh);
            let Some(name) = element.name() else {
                continue;
            };
            let Some(q) = element.parse_array::<4>("refquat")? else {
                continue;
            };
            let rotation = orientation::from_canonical(q).ok_or_else(|| {
                Error::malformed_attribute(
                    "mesh",
                    "refquat",
                    element.attr("refquat").unwrap_or_default(),
                    "quaternion has zero length",
                )
            })?;

            table.insert(normalize_identifier(name), rotation);
            document.element_mut(mesh).remove_attr("refquat");
        }
    }

    Ok(table)
}

/// Factor mesh reference orientations out of every geom using those meshes
///
/// A geom with orientation `g` becomes `g * r⁻¹`; a geom with no
/// orientation becomes `r⁻¹`. Returns the number of geoms rewritten.
pub fn apply_reference_orientations(
    document: &mut Document,
    table: &RefQuatTable,
    unit: AngleUnit,
    default_sequence: &str,
) -> Result<usize> {
    if table.is_empty() {
        return Ok(0);
    }

    let mut rewritten = 0;
    for geom in document.find_all(document.root(), "geom") {
        let element = document.element(geom);
        let Some(reference) = element
            .attr("mesh")
            .and_then(|mesh| table.get(&normalize_identifier(mesh)))
        else {
            continue;
        };

        let corrected = match orientation::explicit_orientation(element, unit, default_sequence)? {
            Some(current) => current * reference.inverse(),
            None => reference.inverse(),
        };
        orientation::write_orientation(document.element_mut(geom), &corrected);
        rewritten += 1;
    }

    Ok(rewritten)
}

/// Run both passes: collect reference orientations, then correct geoms
pub fn correct_reference_orientations(
    document: &mut Document,
    default_sequence: &str,
) -> Result<usize> {
    let unit = AngleUnit::of(document);
    let table = take_reference_orientations(document)?;
    tracing::debug!(meshes = table.len(), "collected mesh reference orientations");
    let rewritten = apply_reference_orientations(document, &table, unit, default_sequence)?;
    tracing::debug!(geoms = rewritten, "applied mesh reference orientations");
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use nalgebra::{UnitQuaternion, Vector3};
    use std::f64::consts::FRAC_PI_2;

    fn geom_rotation(document: &Document, name: &str) -> Rotation {
        let geom = document
            .find_all(document.root(), "geom")
            .into_iter()
            .find(|id| document.element(*id).name() == Some(name))
            .unwrap();
        let q = document.element(geom).parse_array::<4>("quat").unwrap().unwrap();
        orientation::from_canonical(q).unwrap()
    }

    const SOURCE: &str = r#"
        <mujoco>
            <asset>
                <mesh name="door-handle.stl" file="handle.stl" refquat="0.7071067811865476 0 0 0.7071067811865476"/>
                <mesh name="plain" file="plain.stl"/>
            </asset>
            <worldbody>
                <body name="door">
                    <geom name="bare" type="mesh" mesh="door-handle.stl"/>
                    <geom name="turned" type="mesh" mesh="door_handle_stl" euler="90 0 0"/>
                    <geom name="other" type="mesh" mesh="plain" quat="1 0 0 0"/>
                </body>
            </worldbody>
        </mujoco>"#;

    #[test]
    fn test_refquat_removed_from_asset() {
        let mut doc = parse_document(SOURCE).unwrap();
        let table = take_reference_orientations(&mut doc).unwrap();
        assert!(table.contains_key("door_handle_stl"));
        assert_eq!(table.len(), 1);
        let mesh = doc.find(doc.root(), "mesh").unwrap();
        assert!(!doc.element(mesh).has_attr("refquat"));
    }

    #[test]
    fn test_geom_without_orientation_gets_inverse() {
        let mut doc = parse_document(SOURCE).unwrap();
        correct_reference_orientations(&mut doc, "xyz").unwrap();
        let reference = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let bare = geom_rotation(&doc, "bare");
        assert!(bare.angle_to(&reference.inverse()) < 1e-6);
    }

    #[test]
    fn test_geom_with_orientation_composes() {
        let mut doc = parse_document(SOURCE).unwrap();
        let rewritten = correct_reference_orientations(&mut doc, "xyz").unwrap();
        assert_eq!(rewritten, 2);

        let reference = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let own = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);
        let turned = geom_rotation(&doc, "turned");
        assert!(turned.angle_to(&(own * reference.inverse())) < 1e-6);

        let geom = doc
            .find_all(doc.root(), "geom")
            .into_iter()
            .find(|id| doc.element(*id).name() == Some("turned"))
            .unwrap();
        assert!(!doc.element(geom).has_attr("euler"));
    }

    #[test]
    fn test_unrelated_geom_untouched() {
        let mut doc = parse_document(SOURCE).unwrap();
        correct_reference_orientations(&mut doc, "xyz").unwrap();
        let other = doc
            .find_all(doc.root(), "geom")
            .into_iter()
            .find(|id| doc.element(*id).name() == Some("other"))
            .unwrap();
        assert_eq!(doc.element(other).attr("quat"), Some("1 0 0 0"));
    }

    #[test]
    fn test_malformed_refquat() {
        let mut doc = parse_document(
            r#"<mujoco><asset><mesh name="m" refquat="1 0 0"/></asset></mujoco>"#,
        )
        .unwrap();
        let err = take_reference_orientations(&mut doc).unwrap_err();
        assert!(err.to_string().contains("refquat"));
    }
}
