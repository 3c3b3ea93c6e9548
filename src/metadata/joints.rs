//! Joint dynamics extraction

use crate::document::{Document, ElementId};
use crate::error::Result;
use std::collections::BTreeMap;

/// Dynamics parameters of a single joint
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JointSpec {
    /// `damping`
    pub damping: Option<f64>,
    /// `stiffness`
    pub stiffness: Option<f64>,
    /// `frictionloss`
    pub friction_loss: Option<f64>,
}

/// Collect joint parameters keyed by joint name
///
/// Walks the body tree under `<worldbody>` and reads the joints declared
/// directly on each body. Unnamed joints are skipped. Joint names are
/// assumed unique across the document; a repeated name overwrites the
/// earlier entry.
pub fn joint_specs(document: &Document) -> Result<BTreeMap<String, JointSpec>> {
    let mut joints = BTreeMap::new();
    let Some(worldbody) = document.find(document.root(), "worldbody") else {
        return Ok(joints);
    };

    for body in document.children(worldbody, "body") {
        collect_body_joints(document, body, &mut joints)?;
    }
    Ok(joints)
}

fn collect_body_joints(
    document: &Document,
    body: ElementId,
    joints: &mut BTreeMap<String, JointSpec>,
) -> Result<()> {
    for joint in document.children(body, "joint") {
        let element = document.element(joint);
        let Some(name) = element.non_blank_attr("name") else {
            continue;
        };

        let spec = JointSpec {
            damping: element.parse_f64("damping")?,
            stiffness: element.parse_f64("stiffness")?,
            friction_loss: element.parse_f64("frictionloss")?,
        };
        if joints.insert(name.to_string(), spec).is_some() {
            tracing::debug!(joint = name, "joint name repeated; keeping the later one");
        }
    }

    for child in document.children(body, "body") {
        collect_body_joints(document, child, joints)?;
    }
    Ok(())
}
