//! Error types for MJCF preprocessing
//!
//! All errors carry an error code for categorization and enough context to
//! locate the offending element or attribute in the source document.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O errors
//! - **E2xxx**: XML parsing, structure and writing errors
//! - **E3xxx**: Document content errors (malformed numbers, poses, replicate blocks)
//! - **E4xxx**: Configuration errors
//!
//! ## Error Codes
//!
//! - `E1001`: I/O error reading or writing a file
//! - `E2001`: XML parsing error
//! - `E2002`: XML attribute error
//! - `E2003`: Invalid XML structure
//! - `E2005`: XML writing error
//! - `E3001`: Invalid document structure
//! - `E3003`: Malformed attribute value
//! - `E4001`: Invalid preprocessing configuration

use std::io;
use thiserror::Error;

/// Result type for MJCF preprocessing operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, transforming or writing an MJCF document
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred while reading or writing a file
    ///
    /// **Error Code**: E1001
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// XML parsing error
    ///
    /// **Error Code**: E2001
    ///
    /// **Common Causes**:
    /// - Malformed XML syntax
    /// - Invalid character encoding
    /// - Unclosed tags
    #[error("[E2001] XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    ///
    /// **Error Code**: E2002
    ///
    /// **Common Causes**:
    /// - Unquoted attribute value
    /// - Duplicate attribute
    #[error("[E2002] XML attribute error: {0}")]
    XmlAttr(String),

    /// Invalid XML structure
    ///
    /// **Error Code**: E2003
    ///
    /// **Common Causes**:
    /// - Document has no root element
    /// - Mismatched closing tag
    /// - DTD declaration present
    #[error("[E2003] Invalid XML structure: {0}")]
    InvalidXml(String),

    /// XML writing error
    ///
    /// **Error Code**: E2005
    #[error("[E2005] XML writing error: {0}")]
    XmlWrite(String),

    /// Invalid document structure
    ///
    /// **Error Code**: E3001
    ///
    /// **Common Causes**:
    /// - `<replicate>` used as the document root
    /// - Element handle that does not belong to the document
    #[error("[E3001] Invalid document: {0}")]
    InvalidDocument(String),

    /// Malformed attribute value
    ///
    /// **Error Code**: E3003
    ///
    /// **Common Causes**:
    /// - Wrong number of components (`quat` needs 4, `euler` needs 3)
    /// - Non-numeric token in a numeric list
    /// - Non-finite value (`nan`, `inf`)
    /// - Zero-length rotation axis in `axisangle`
    /// - Invalid `eulerseq`
    #[error("[E3003] Malformed attribute '{attribute}' on <{element}>: {message} (value: '{value}')")]
    MalformedAttribute {
        /// Tag of the element carrying the attribute
        element: String,
        /// Attribute name
        attribute: String,
        /// Raw attribute text
        value: String,
        /// What was wrong with it
        message: String,
    },

    /// Invalid preprocessing configuration
    ///
    /// **Error Code**: E4001
    ///
    /// **Common Causes**:
    /// - Working copy suffix that maps the working copy onto the source file
    #[error("[E4001] Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttr(format!("Attribute parsing failed: {}", err))
    }
}

impl Error {
    /// Create an InvalidXml error with element context
    ///
    /// # Example
    /// ```ignore
    /// Error::invalid_xml_element("body", "closing tag does not match")
    /// ```
    pub fn invalid_xml_element(element: &str, message: &str) -> Self {
        Error::InvalidXml(format!("Element '<{}>': {}", element, message))
    }

    /// Create a MalformedAttribute error naming the element, attribute and raw value
    ///
    /// # Example
    /// ```ignore
    /// Error::malformed_attribute("geom", "quat", "1 0 0", "expected 4 values, got 3")
    /// ```
    pub fn malformed_attribute(
        element: &str,
        attribute: &str,
        value: &str,
        message: impl Into<String>,
    ) -> Self {
        Error::MalformedAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
            value: value.to_string(),
            message: message.into(),
        }
    }

    /// Create an XmlWrite error
    pub fn xml_write(message: String) -> Self {
        Error::XmlWrite(message)
    }
}
