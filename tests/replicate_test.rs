//! Integration tests for replicate expansion

use approx::assert_relative_eq;
use mjcf_prep::replicate::expand_replicates;
use mjcf_prep::{Document, ElementId, Error, Rotation, orientation};
use nalgebra::{UnitQuaternion, Vector3};
use std::f64::consts::{FRAC_PI_2, PI};

fn pose(doc: &Document, id: ElementId) -> (Vector3<f64>, Rotation) {
    let element = doc.element(id);
    let pos = element
        .parse_vector3("pos")
        .unwrap()
        .unwrap_or_else(Vector3::zeros);
    let rotation = orientation::resolve_orientation(element, orientation::AngleUnit::Degree, "xyz")
        .unwrap();
    (pos, rotation)
}

fn names(doc: &Document, ids: &[ElementId]) -> Vec<String> {
    ids.iter()
        .map(|id| doc.element(*id).name().unwrap_or("").to_string())
        .collect()
}

#[test]
fn test_quarter_turn_ring() {
    let mut doc = Document::parse_str(
        r#"
        <mujoco>
          <worldbody>
            <body name="table">
              <replicate count="3" offset="1 0 0" euler="0 0 90">
                <geom name="leg" type="cylinder" size="0.02 0.3"/>
              </replicate>
            </body>
          </worldbody>
        </mujoco>"#,
    )
    .unwrap();

    let summary = expand_replicates(&mut doc, "xyz").unwrap();
    assert_eq!(summary.blocks, 1);
    assert_eq!(summary.instances, 3);

    let table = doc.find(doc.root(), "body").unwrap();
    let legs: Vec<ElementId> = doc.children(table, "geom").collect();
    assert_eq!(names(&doc, &legs), vec!["leg_0", "leg_1", "leg_2"]);

    let angles = [0.0, FRAC_PI_2, PI];
    for (index, leg) in legs.iter().enumerate() {
        let (pos, rotation) = pose(&doc, *leg);
        assert_relative_eq!(pos, Vector3::new(index as f64, 0.0, 0.0), epsilon = 1e-12);
        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angles[index]);
        assert!(rotation.angle_to(&expected) < 1e-6);
        // Other attributes survive the copy
        assert_eq!(doc.element(*leg).attr("size"), Some("0.02 0.3"));
    }
}

#[test]
fn test_subtree_copies_are_independent() {
    let mut doc = Document::parse_str(
        r#"
        <mujoco>
          <worldbody>
            <replicate count="2" offset="0 1 0">
              <body name="arm" pos="0 0 1">
                <joint name="shoulder"/>
                <geom name="upper" pos="0 0 0.2"/>
              </body>
            </replicate>
          </worldbody>
        </mujoco>"#,
    )
    .unwrap();

    expand_replicates(&mut doc, "xyz").unwrap();

    let worldbody = doc.find(doc.root(), "worldbody").unwrap();
    let arms: Vec<ElementId> = doc.children(worldbody, "body").collect();
    assert_eq!(names(&doc, &arms), vec!["arm_0", "arm_1"]);

    // Only the instance root is renamed; nested names are copied verbatim
    for arm in &arms {
        let joint = doc.first_child(*arm, "joint").unwrap();
        assert_eq!(doc.element(joint).name(), Some("shoulder"));
        let geom = doc.first_child(*arm, "geom").unwrap();
        assert_eq!(doc.element(geom).attr("pos"), Some("0 0 0.2"));
    }

    let (pos, _) = pose(&doc, arms[1]);
    assert_relative_eq!(pos, Vector3::new(0.0, 1.0, 1.0), epsilon = 1e-12);

    doc.element_mut(arms[0]).set_attr("rgba", "1 0 0 1");
    assert!(!doc.element(arms[1]).has_attr("rgba"));
}

#[test]
fn test_outer_block_repeats_expanded_inner_block() {
    let mut doc = Document::parse_str(
        r#"
        <mujoco>
          <worldbody>
            <replicate count="2" euler="0 0 180">
              <replicate count="2" offset="1 0 0">
                <site name="pin" pos="1 0 0"/>
              </replicate>
            </replicate>
          </worldbody>
        </mujoco>"#,
    )
    .unwrap();

    let summary = expand_replicates(&mut doc, "xyz").unwrap();
    assert_eq!(summary.blocks, 2);
    assert_eq!(summary.instances, 2 + 4);

    let sites = doc.find_all(doc.root(), "site");
    assert_eq!(names(&doc, &sites), vec!["pin_0", "pin_1", "pin_2", "pin_3"]);

    let expected = [
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(-1.0, 0.0, 0.0),
        Vector3::new(2.0, 0.0, 0.0),
        Vector3::new(-2.0, 0.0, 0.0),
    ];
    for (site, expected) in sites.iter().zip(expected) {
        let (pos, _) = pose(&doc, *site);
        assert_relative_eq!(pos, expected, epsilon = 1e-9);
    }
}

#[test]
fn test_duplicate_names_across_blocks_share_counter() {
    let mut doc = Document::parse_str(
        r#"
        <mujoco>
          <worldbody>
            <replicate count="2"><geom name="part"/></replicate>
            <body name="middle"/>
            <replicate count="1"><geom name="part"/><geom name="bolt"/></replicate>
          </worldbody>
        </mujoco>"#,
    )
    .unwrap();

    let summary = expand_replicates(&mut doc, "xyz").unwrap();
    assert_eq!(summary.renamed, 4);

    let geoms = doc.find_all(doc.root(), "geom");
    assert_eq!(
        names(&doc, &geoms),
        vec!["part_0", "part_1", "part_2", "bolt_0"]
    );
    assert!(doc.first_child(doc.find(doc.root(), "worldbody").unwrap(), "body").is_some());
}

#[test]
fn test_replicate_outside_worldbody_untouched() {
    let mut doc = Document::parse_str(
        r#"
        <mujoco>
          <asset><replicate count="2"><mesh name="m"/></replicate></asset>
          <worldbody/>
        </mujoco>"#,
    )
    .unwrap();

    let summary = expand_replicates(&mut doc, "xyz").unwrap();
    assert_eq!(summary.blocks, 0);
    assert!(doc.find(doc.root(), "replicate").is_some());
}

#[test]
fn test_malformed_offset_is_rejected() {
    let mut doc = Document::parse_str(
        r#"<mujoco><worldbody><replicate count="2" offset="1 x 0"><geom/></replicate></worldbody></mujoco>"#,
    )
    .unwrap();

    match expand_replicates(&mut doc, "xyz") {
        Err(Error::MalformedAttribute {
            element, attribute, value, ..
        }) => {
            assert_eq!(element, "replicate");
            assert_eq!(attribute, "offset");
            assert_eq!(value, "1 x 0");
        }
        other => panic!("expected malformed offset, got {:?}", other),
    }
}

#[test]
fn test_zero_count_is_rejected() {
    let mut doc = Document::parse_str(
        r#"<mujoco><worldbody><replicate count="0"><geom/></replicate></worldbody></mujoco>"#,
    )
    .unwrap();
    let err = expand_replicates(&mut doc, "xyz").unwrap_err();
    assert!(err.to_string().contains("count"));
}

#[test]
fn test_serialized_output_has_no_replicate() {
    let mut doc = Document::parse_str(
        r#"<mujoco><worldbody><replicate count="2" offset="0.5 0 0"><geom name="g"/></replicate></worldbody></mujoco>"#,
    )
    .unwrap();
    expand_replicates(&mut doc, "xyz").unwrap();

    let xml = doc.to_xml_string().unwrap();
    assert!(!xml.contains("replicate"));
    assert!(xml.contains(r#"name="g_0""#));
    assert!(xml.contains(r#"pos="0.5 0 0""#));

    let reparsed = Document::parse_str(&xml).unwrap();
    assert_eq!(reparsed.find_all(reparsed.root(), "geom").len(), 2);
}
