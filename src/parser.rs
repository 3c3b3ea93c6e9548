//! XML parsing for MJCF documents
//!
//! Builds a [`Document`] from XML text using the `quick-xml` event reader.
//! Comments, processing instructions and the XML declaration are dropped;
//! element order, attribute order and text content are kept. Text split by
//! entity or character references is reassembled; text that is only
//! indentation is dropped and the outer whitespace of real text is trimmed.

use crate::document::{Document, Element, ElementId};
use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use std::path::Path;

/// Parse MJCF XML text into a document
pub fn parse_document(xml: &str) -> Result<Document> {
    // DTDs can pull in external entities; MJCF never needs them
    let check_len = xml.len().min(2000);
    let xml_start = xml.get(..check_len).unwrap_or(xml).to_lowercase();
    if xml_start.contains("<!doctype") {
        return Err(Error::InvalidXml(
            "DTD declarations are not allowed in MJCF documents".to_string(),
        ));
    }

    // Whitespace is kept while reading so text around references survives
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut document: Option<Document> = None;
    let mut stack: Vec<ElementId> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                let element = parse_element(e)?;
                let id = attach(&mut document, &stack, element)?;
                stack.push(id);
            }
            Event::Empty(ref e) => {
                let element = parse_element(e)?;
                attach(&mut document, &stack, element)?;
            }
            Event::End(ref e) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;
                let open = stack.pop().ok_or_else(|| {
                    Error::invalid_xml_element(name_str, "closing tag without an opening tag")
                })?;
                if let Some(doc) = document.as_mut() {
                    let open_tag = doc.element(open).tag();
                    if open_tag != name_str {
                        return Err(Error::invalid_xml_element(
                            open_tag,
                            &format!("closed by mismatched tag '</{}>'", name_str),
                        ));
                    }
                    finish_text(doc, open);
                }
            }
            Event::Text(ref e) => {
                let text = e.decode().map_err(|e| Error::InvalidXml(e.to_string()))?;
                append_text(&mut document, &stack, &text);
            }
            Event::GeneralRef(ref e) => {
                let text = resolve_reference(e)?;
                append_text(&mut document, &stack, &text);
            }
            Event::CData(e) => {
                let bytes = e.into_inner();
                let text =
                    std::str::from_utf8(&bytes).map_err(|e| Error::InvalidXml(e.to_string()))?;
                append_text(&mut document, &stack, text);
            }
            Event::DocType(_) => {
                return Err(Error::InvalidXml(
                    "DTD declarations are not allowed in MJCF documents".to_string(),
                ));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        let tag = document
            .as_ref()
            .map(|doc| doc.element(*open).tag().to_string())
            .unwrap_or_default();
        return Err(Error::invalid_xml_element(&tag, "element is never closed"));
    }

    document.ok_or_else(|| Error::InvalidXml("document has no root element".to_string()))
}

/// Read and parse an MJCF file, recording its path on the document
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path)?;
    let mut document = parse_document(&xml)?;
    document.set_path(path);
    Ok(document)
}

fn parse_element(e: &BytesStart) -> Result<Element> {
    let name = e.name();
    let tag = std::str::from_utf8(name.as_ref()).map_err(|e| Error::InvalidXml(e.to_string()))?;
    let mut element = Element::new(tag);

    for attr in e.attributes() {
        let attr = attr?;
        let key =
            std::str::from_utf8(attr.key.as_ref()).map_err(|e| Error::InvalidXml(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| Error::XmlAttr(format!("{}: {}", key, e)))?;
        element.set_attr(key, value.as_ref());
    }

    Ok(element)
}

fn attach(
    document: &mut Option<Document>,
    stack: &[ElementId],
    element: Element,
) -> Result<ElementId> {
    match (document.as_mut(), stack.last()) {
        (None, _) => {
            let doc = Document::new(element);
            let root = doc.root();
            *document = Some(doc);
            Ok(root)
        }
        (Some(doc), Some(parent)) => {
            let id = doc.create_element(element);
            doc.insert_child(*parent, id, None)?;
            Ok(id)
        }
        (Some(doc), None) => Err(Error::invalid_xml_element(
            element.tag(),
            &format!(
                "second top-level element after <{}>",
                doc.element(doc.root()).tag()
            ),
        )),
    }
}

fn resolve_reference(reference: &BytesRef) -> Result<String> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(|e| Error::InvalidXml(e.to_string()))?
    {
        return Ok(ch.to_string());
    }

    let name = reference
        .decode()
        .map_err(|e| Error::InvalidXml(e.to_string()))?;
    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidXml(format!("unknown entity reference '&{};'", name)))
}

/// Trim the collected text of a closed element; indentation alone is dropped
fn finish_text(document: &mut Document, id: ElementId) {
    let element = document.element_mut(id);
    let trimmed = element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);
    element.set_text(trimmed);
}

fn append_text(document: &mut Option<Document>, stack: &[ElementId], text: &str) {
    if text.is_empty() {
        return;
    }
    if let (Some(doc), Some(current)) = (document.as_mut(), stack.last()) {
        let element = doc.element_mut(*current);
        let combined = match element.text() {
            Some(existing) => format!("{}{}", existing, text),
            None => text.to_string(),
        };
        element.set_text(Some(combined));
    }
}
