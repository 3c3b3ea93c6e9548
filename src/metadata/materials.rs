//! Material and texture extraction

use crate::document::{Document, ElementId, normalize_identifier};
use crate::error::Result;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Material definition resolved against its texture
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialSpec {
    /// Color in RGBA format
    pub rgba: Option<[f64; 4]>,
    /// Shininess in `[0, 1]`
    pub shininess: Option<f64>,
    /// Specular intensity in `[0, 1]`
    pub specular: Option<f64>,
    /// Texture image path, resolved against the document directory
    pub texture_file: Option<PathBuf>,
    /// Texture kind (`2d`, `cube`, `skybox`)
    pub texture_kind: Option<String>,
}

#[derive(Debug, Clone)]
struct TextureSpec {
    file: Option<PathBuf>,
    kind: Option<String>,
}

/// Identifier a material is published under downstream
pub fn material_identifier(prefix: &str, name: &str) -> String {
    normalize_identifier(&format!("{}{}", prefix, name))
}

/// Read `<material>` declarations, resolving their textures
///
/// A material referencing a texture that is not declared gets no texture
/// fields; the miss is logged.
pub fn material_specs(
    document: &Document,
    prefix: &str,
) -> Result<BTreeMap<String, MaterialSpec>> {
    let assets = asset_sections(document);
    let textures = texture_specs(document, &assets);
    let mut materials = BTreeMap::new();

    for asset in &assets {
        for material in document.children(*asset, "material") {
            let element = document.element(material);
            let Some(name) = element.name() else {
                continue;
            };

            let mut spec = MaterialSpec {
                rgba: element.parse_array::<4>("rgba")?,
                shininess: element.parse_f64("shininess")?,
                specular: element.parse_f64("specular")?,
                ..MaterialSpec::default()
            };

            if let Some(texture_name) = element.non_blank_attr("texture") {
                match textures.get(texture_name) {
                    Some(texture) => {
                        spec.texture_file = texture.file.clone();
                        spec.texture_kind = texture.kind.clone();
                    }
                    None => tracing::warn!(
                        material = name,
                        texture = texture_name,
                        "material references an undeclared texture"
                    ),
                }
            }

            materials.insert(material_identifier(prefix, name), spec);
        }
    }

    Ok(materials)
}

/// Map each mesh to the material of the geom that instances it
///
/// Only geoms carrying both `mesh` and `material` contribute; a later geom
/// overrides an earlier one for the same mesh.
pub fn geom_material_map(document: &Document, prefix: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for geom in document.find_all(document.root(), "geom") {
        let element = document.element(geom);
        if let (Some(mesh), Some(material)) = (element.attr("mesh"), element.attr("material")) {
            map.insert(mesh.to_string(), material_identifier(prefix, material));
        }
    }
    map
}

fn asset_sections(document: &Document) -> Vec<ElementId> {
    document.children(document.root(), "asset").collect()
}

fn texture_specs(document: &Document, assets: &[ElementId]) -> HashMap<String, TextureSpec> {
    let base_dir = document.base_dir();
    let mut textures = HashMap::new();

    for asset in assets {
        for texture in document.children(*asset, "texture") {
            let element = document.element(texture);
            let Some(name) = element.name() else {
                continue;
            };
            let file = element.non_blank_attr("file").map(|file| match base_dir {
                Some(dir) => dir.join(file),
                None => PathBuf::from(file),
            });
            textures.insert(
                name.to_string(),
                TextureSpec {
                    file,
                    kind: element.attr("type").map(str::to_string),
                },
            );
        }
    }

    textures
}
