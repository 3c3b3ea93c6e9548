//! `<replicate>` expansion
//!
//! A replicate block repeats its children `count` times. Instance `i` is
//! translated by `i * offset` and rotated by the block's `euler` increment
//! applied `i` times. Expansion dissolves the block: instances are appended
//! to the block's parent after its existing children and the block is
//! removed.
//!
//! The tree is walked post-order, so nested blocks are expanded before the
//! block that contains them and an outer block repeats already expanded
//! content. Instances created by a block that is not itself inside another
//! block ("depth 1") get a `_<n>` suffix per distinct name, in creation
//! order, so repeated names become unique.

use crate::document::{Document, ElementId};
use crate::error::{Error, Result};
use crate::orientation::{self, AngleUnit, Rotation};
use nalgebra::Vector3;
use std::collections::HashMap;

/// Tag of a replication block
pub const REPLICATE_TAG: &str = "replicate";

/// Parsed attributes of a `<replicate>` block
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicateSpec {
    /// Number of instances, at least 1
    pub count: usize,
    /// Translation added per step
    pub offset: Vector3<f64>,
    /// Rotation applied per step
    pub increment: Rotation,
}

impl Default for ReplicateSpec {
    fn default() -> Self {
        Self {
            count: 1,
            offset: Vector3::zeros(),
            increment: Rotation::identity(),
        }
    }
}

impl ReplicateSpec {
    /// Read `count`, `offset` and `euler` from a block element
    ///
    /// The `euler` increment is interpreted in the document's angle unit
    /// using `sequence`.
    pub fn from_element(
        document: &Document,
        block: ElementId,
        unit: AngleUnit,
        sequence: &str,
    ) -> Result<Self> {
        let element = document.element(block);

        let count = match element.parse_i64("count")? {
            None => 1,
            Some(count) if count >= 1 => count as usize,
            Some(_) => {
                return Err(Error::malformed_attribute(
                    REPLICATE_TAG,
                    "count",
                    element.attr("count").unwrap_or_default(),
                    "count must be a positive integer",
                ));
            }
        };

        let offset = element.parse_vector3("offset")?.unwrap_or_else(Vector3::zeros);

        let increment = match element.parse_array::<3>("euler")? {
            Some(angles) => {
                let radians = angles.map(|angle| unit.to_radians(angle));
                orientation::from_euler(radians, sequence).map_err(|message| {
                    Error::malformed_attribute(
                        REPLICATE_TAG,
                        "euler",
                        element.attr("euler").unwrap_or_default(),
                        message,
                    )
                })?
            }
            None => Rotation::identity(),
        };

        Ok(Self {
            count,
            offset,
            increment,
        })
    }

    /// Ambient pose of each instance in order
    ///
    /// Instance `i` is translated by `i * offset` and rotated by
    /// `rot_i = increment * rot_(i-1)`, with `rot_0` the identity.
    pub fn step_poses(&self) -> impl Iterator<Item = (Vector3<f64>, Rotation)> + '_ {
        let mut rotation = Rotation::identity();
        (0..self.count).map(move |index| {
            if index > 0 {
                rotation = self.increment * rotation;
            }
            (self.offset * index as f64, rotation)
        })
    }
}

/// Counts reported by [`expand_replicates`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionSummary {
    /// Replicate blocks dissolved
    pub blocks: usize,
    /// Instances inserted, including intermediate ones later re-replicated
    pub instances: usize,
    /// Depth-1 instances that received a numeric suffix
    pub renamed: usize,
}

/// Expands every replicate block beneath `<worldbody>`
struct Expander<'a> {
    document: &'a mut Document,
    unit: AngleUnit,
    sequence: &'a str,
    top_level_instances: Vec<ElementId>,
    summary: ExpansionSummary,
}

impl Expander<'_> {
    fn visit(&mut self, id: ElementId, depth: usize) -> Result<()> {
        let is_block = self.document.element(id).is(REPLICATE_TAG);
        let child_depth = if is_block { depth + 1 } else { depth };

        // Children are rewritten while we walk; iterate over a snapshot
        let children = self.document.child_ids(id).to_vec();
        for child in children {
            self.visit(child, child_depth)?;
        }

        if is_block {
            self.expand_block(id, depth)?;
        }
        Ok(())
    }

    fn expand_block(&mut self, block: ElementId, depth: usize) -> Result<()> {
        let parent = self.document.parent(block).ok_or_else(|| {
            Error::InvalidDocument("<replicate> block has no parent element".to_string())
        })?;
        let spec = ReplicateSpec::from_element(self.document, block, self.unit, self.sequence)?;

        let templates: Vec<ElementId> = self
            .document
            .child_ids(block)
            .iter()
            .copied()
            .filter(|child| !self.document.element(*child).is(REPLICATE_TAG))
            .collect();

        for template in templates {
            for (translation, rotation) in spec.step_poses() {
                let instance = self.document.deep_copy(template);
                self.place_instance(instance, &translation, &rotation)?;
                self.document.insert_child(parent, instance, None)?;
                self.summary.instances += 1;

                if depth + 1 == 1 && self.document.element(instance).name().is_some() {
                    self.top_level_instances.push(instance);
                }
            }
        }

        self.document.remove_child(parent, block);
        self.summary.blocks += 1;
        Ok(())
    }

    /// Re-pose a copy: `pos' = t + R * pos`, `quat' = R * quat`
    fn place_instance(
        &mut self,
        instance: ElementId,
        translation: &Vector3<f64>,
        rotation: &Rotation,
    ) -> Result<()> {
        let element = self.document.element(instance);
        let local_pos = element.parse_vector3("pos")?.unwrap_or_else(Vector3::zeros);
        let local_rot = orientation::resolve_orientation(element, self.unit, self.sequence)?;

        let pos = translation + rotation * local_pos;
        let rot = rotation * local_rot;

        let element = self.document.element_mut(instance);
        element.set_floats("pos", pos.as_slice());
        orientation::write_orientation(element, &rot);
        Ok(())
    }

    fn rename_top_level_instances(&mut self) {
        let mut counters: HashMap<String, usize> = HashMap::new();
        for instance in &self.top_level_instances {
            let element = self.document.element_mut(*instance);
            let Some(name) = element.name().map(str::to_string) else {
                continue;
            };
            let counter = counters.entry(name.clone()).or_insert(0);
            element.set_attr("name", format!("{}_{}", name, counter));
            *counter += 1;
            self.summary.renamed += 1;
        }
    }
}

/// Expand all `<replicate>` blocks under the first `<worldbody>`
///
/// `sequence` is the Euler sequence used for `euler` attributes (the block
/// increment and any template orientation given as Euler angles).
pub fn expand_replicates(document: &mut Document, sequence: &str) -> Result<ExpansionSummary> {
    let Some(worldbody) = document.find(document.root(), "worldbody") else {
        return Ok(ExpansionSummary::default());
    };
    let unit = AngleUnit::of(document);

    let mut expander = Expander {
        document,
        unit,
        sequence,
        top_level_instances: Vec::new(),
        summary: ExpansionSummary::default(),
    };

    let children = expander.document.child_ids(worldbody).to_vec();
    for child in children {
        expander.visit(child, 0)?;
    }
    expander.rename_top_level_instances();

    tracing::debug!(
        blocks = expander.summary.blocks,
        instances = expander.summary.instances,
        renamed = expander.summary.renamed,
        "expanded replicate blocks"
    );
    Ok(expander.summary)
}
