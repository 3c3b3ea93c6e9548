//! Body density from class defaults

use crate::document::{Document, ElementId};
use crate::error::Result;
use std::collections::{BTreeMap, HashMap};

/// Body name -> density
pub type DensityMap = BTreeMap<String, f64>;

/// Read `class -> geom density` from the first `<default>` block
///
/// Only direct child classes are considered, using the `density` of each
/// class's first `<geom>`.
pub fn class_densities(document: &Document) -> Result<HashMap<String, f64>> {
    let mut classes = HashMap::new();
    let Some(defaults) = document.find(document.root(), "default") else {
        return Ok(classes);
    };

    for class in document.children(defaults, "default") {
        let Some(class_name) = document.element(class).non_blank_attr("class") else {
            continue;
        };
        let Some(geom) = document.first_child(class, "geom") else {
            continue;
        };
        if let Some(density) = document.element(geom).parse_f64("density")? {
            classes.insert(class_name.to_string(), density);
        }
    }

    Ok(classes)
}

/// Density of every named body that has a collision-class geom
///
/// A geom counts when its `class` contains `collision_marker` and that class
/// has a known density. The first such direct child geom decides the body's
/// density; bodies without one are left out.
pub fn body_densities(document: &Document, collision_marker: &str) -> Result<DensityMap> {
    let classes = class_densities(document)?;
    let mut densities = DensityMap::new();
    let Some(worldbody) = document.find(document.root(), "worldbody") else {
        return Ok(densities);
    };

    for body in document.find_all(worldbody, "body") {
        let Some(name) = document.element(body).name() else {
            continue;
        };
        if let Some(density) = representative_density(document, body, &classes, collision_marker) {
            densities.insert(name.to_string(), density);
        }
    }

    Ok(densities)
}

fn representative_density(
    document: &Document,
    body: ElementId,
    classes: &HashMap<String, f64>,
    collision_marker: &str,
) -> Option<f64> {
    document.children(body, "geom").find_map(|geom| {
        let class = document.element(geom).attr("class")?;
        if !class.contains(collision_marker) {
            return None;
        }
        classes.get(class).copied()
    })
}
