//! XML writing for MJCF documents
//!
//! Serializes every element reachable from the document root. Detached
//! elements left in the arena are never written.

use crate::document::{Document, ElementId};
use crate::error::{Error, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write as IoWrite;

/// Write a document as indented XML
pub fn write_document<W: IoWrite>(document: &Document, writer: W) -> Result<()> {
    let mut xml_writer = Writer::new_with_indent(writer, b' ', 2);

    xml_writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(|e| Error::xml_write(format!("Failed to write XML declaration: {}", e)))?;

    write_element(&mut xml_writer, document, document.root())
}

/// Serialize a document to a string
pub fn document_to_string(document: &Document) -> Result<String> {
    let mut buffer = Vec::new();
    write_document(document, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| Error::xml_write(format!("Failed to convert XML to UTF-8: {}", e)))
}

fn write_element<W: IoWrite>(
    writer: &mut Writer<W>,
    document: &Document,
    id: ElementId,
) -> Result<()> {
    let element = document.element(id);
    let tag = element.tag();

    let mut start = BytesStart::new(tag);
    for (key, value) in element.attributes() {
        start.push_attribute((key, value));
    }

    let children = document.child_ids(id);
    if children.is_empty() && element.text().is_none() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| Error::xml_write(format!("Failed to write <{}> element: {}", tag, e)));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| Error::xml_write(format!("Failed to write <{}> element: {}", tag, e)))?;

    if let Some(text) = element.text() {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(|e| Error::xml_write(format!("Failed to write <{}> text: {}", tag, e)))?;
    }

    for child in children {
        write_element(writer, document, *child)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(|e| Error::xml_write(format!("Failed to close <{}> element: {}", tag, e)))?;

    Ok(())
}
