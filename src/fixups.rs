//! Structural fixups applied after replicate expansion

use crate::document::{Document, ElementId};
use crate::error::Result;

/// Name of the child body that should own sibling sites
pub const OBJECT_BODY_NAME: &str = "object";

/// Move misplaced `<site>` elements into the sibling `<body name="object">`
///
/// For every body that has both a direct child body named `object` and
/// direct child sites, the sites are appended to the `object` body in their
/// original order. When several children are named `object`, the last one
/// wins. Returns whether anything moved; a second run is always a no-op.
pub fn relocate_sites(document: &mut Document) -> Result<bool> {
    let mut modified = false;

    for parent in document.find_all(document.root(), "body") {
        let Some(object_body) = last_object_body(document, parent) else {
            continue;
        };

        let sites: Vec<ElementId> = document.children(parent, "site").collect();
        for site in &sites {
            document.insert_child(object_body, *site, None)?;
        }
        modified |= !sites.is_empty();
    }

    if modified {
        match document.path() {
            Some(path) => tracing::info!("Fixed misplaced <site> elements in {}", path.display()),
            None => tracing::info!("Fixed misplaced <site> elements"),
        }
    }

    Ok(modified)
}

fn last_object_body(document: &Document, parent: ElementId) -> Option<ElementId> {
    document
        .children(parent, "body")
        .filter(|body| document.element(*body).name() == Some(OBJECT_BODY_NAME))
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use crate::writer::document_to_string;

    const SOURCE: &str = r#"
        <mujoco>
            <worldbody>
                <body name="cabinet">
                    <site name="s1" pos="0 0 1"/>
                    <body name="object">
                        <geom name="shell"/>
                    </body>
                    <site name="s2" size="0.01"/>
                </body>
                <body name="lamp">
                    <site name="keep"/>
                </body>
            </worldbody>
        </mujoco>"#;

    #[test]
    fn test_sites_moved_in_order() {
        let mut doc = parse_document(SOURCE).unwrap();
        assert!(relocate_sites(&mut doc).unwrap());

        let cabinet = doc.find(doc.root(), "body").unwrap();
        assert_eq!(doc.children(cabinet, "site").count(), 0);

        let object = doc.first_child(cabinet, "body").unwrap();
        let names: Vec<&str> = doc
            .children(object, "site")
            .filter_map(|site| doc.element(site).name())
            .collect();
        assert_eq!(names, vec!["s1", "s2"]);

        let s1 = doc.children(object, "site").next().unwrap();
        assert_eq!(doc.element(s1).attr("pos"), Some("0 0 1"));
        // existing children stay first
        assert_eq!(doc.element(doc.child_ids(object)[0]).name(), Some("shell"));
    }

    #[test]
    fn test_body_without_object_untouched() {
        let mut doc = parse_document(SOURCE).unwrap();
        relocate_sites(&mut doc).unwrap();
        let lamp = doc
            .find_all(doc.root(), "body")
            .into_iter()
            .find(|body| doc.element(*body).name() == Some("lamp"))
            .unwrap();
        assert_eq!(doc.children(lamp, "site").count(), 1);
    }

    #[test]
    fn test_relocation_idempotent() {
        let mut doc = parse_document(SOURCE).unwrap();
        assert!(relocate_sites(&mut doc).unwrap());
        let once = document_to_string(&doc).unwrap();
        assert!(!relocate_sites(&mut doc).unwrap());
        assert_eq!(document_to_string(&doc).unwrap(), once);
    }
}
