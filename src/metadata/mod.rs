//! Metadata extracted for downstream scene construction
//!
//! Extraction is read-only and should run on the fully preprocessed tree so
//! that names produced by replicate expansion are captured. The resulting
//! [`Metadata`] has no further tie to the document.

mod density;
mod joints;
mod materials;

pub use density::{DensityMap, body_densities, class_densities};
pub use joints::{JointSpec, joint_specs};
pub use materials::{MaterialSpec, geom_material_map, material_specs};

use crate::document::Document;
use crate::error::Result;
use std::collections::BTreeMap;

/// Every metadata table handed to the scene builder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// Normalized material identifier -> material
    pub materials: BTreeMap<String, MaterialSpec>,
    /// Mesh name -> normalized material identifier
    pub geom_materials: BTreeMap<String, String>,
    /// Joint name -> dynamics parameters
    pub joints: BTreeMap<String, JointSpec>,
    /// Body name -> density
    pub densities: DensityMap,
}

/// Options that affect how identifiers and classes are interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Prefix added to material names before normalization
    pub material_prefix: String,
    /// Substring that marks a geom class as a collision class
    pub collision_class_marker: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            material_prefix: "material_".to_string(),
            collision_class_marker: "col".to_string(),
        }
    }
}

/// Extract all metadata tables from a document
pub fn extract(document: &Document, options: &ExtractOptions) -> Result<Metadata> {
    let metadata = Metadata {
        materials: material_specs(document, &options.material_prefix)?,
        geom_materials: geom_material_map(document, &options.material_prefix),
        joints: joint_specs(document)?,
        densities: body_densities(document, &options.collision_class_marker)?,
    };

    tracing::debug!(
        materials = metadata.materials.len(),
        geom_materials = metadata.geom_materials.len(),
        joints = metadata.joints.len(),
        densities = metadata.densities.len(),
        "extracted metadata"
    );

    Ok(metadata)
}
