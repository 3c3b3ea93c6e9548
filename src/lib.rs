//! # mjcf-prep
//!
//! Preprocessing of MJCF (MuJoCo XML) documents ahead of scene import.
//!
//! MJCF carries constructs that scene formats have no equivalent for. This
//! crate rewrites a document so that a downstream scene builder only sees
//! plain bodies, geoms and poses, and extracts the side tables the builder
//! needs.
//!
//! ## Features
//!
//! - Pure Rust implementation with no unsafe code
//! - Mesh `refquat` orientations folded into every geom that uses the mesh
//! - `<replicate>` blocks expanded into posed, uniquely named instances
//! - Misplaced `<site>` elements moved into their `object` body
//! - Material, joint and density metadata extraction
//! - Working-copy workflow that never modifies the source file
//!
//! ## Example
//!
//! ```no_run
//! use mjcf_prep::{PreprocessConfig, Preprocessor};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let preprocessor = Preprocessor::new(PreprocessConfig::new().with_keep_working_copy(true));
//! let report = preprocessor.preprocess_file("scene.xml")?;
//!
//! println!("Expanded {} replicate blocks", report.transforms.expansion.blocks);
//! println!("Working copy: {}", report.working_copy.display());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod document;
pub mod error;
pub mod fixups;
pub mod metadata;
pub mod orientation;
pub mod parser;
pub mod pipeline;
pub mod refquat;
pub mod replicate;
mod writer;

pub use config::PreprocessConfig;
pub use document::{Document, Element, ElementId, normalize_identifier};
pub use error::{Error, Result};
pub use metadata::{DensityMap, ExtractOptions, JointSpec, MaterialSpec, Metadata};
pub use orientation::{AngleUnit, Rotation};
pub use pipeline::{PreprocessReport, Preprocessor, SceneBuilder, TransformSummary};
pub use replicate::{ExpansionSummary, ReplicateSpec};

use std::io::Write;
use std::path::Path;

impl Document {
    /// Parse an MJCF document from a string
    ///
    /// # Example
    ///
    /// ```
    /// use mjcf_prep::Document;
    ///
    /// let doc = Document::parse_str(r#"<mujoco model="m"><worldbody/></mujoco>"#).unwrap();
    /// assert_eq!(doc.element(doc.root()).tag(), "mujoco");
    /// ```
    pub fn parse_str(xml: &str) -> Result<Self> {
        parser::parse_document(xml)
    }

    /// Parse an MJCF document from a file
    ///
    /// The path is remembered so that relative asset paths can be resolved.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the MJCF file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        parser::parse_file(path)
    }

    /// Serialize the document to an XML string
    pub fn to_xml_string(&self) -> Result<String> {
        writer::document_to_string(self)
    }

    /// Serialize the document to a writer
    ///
    /// # Arguments
    ///
    /// * `writer` - Destination for the XML text
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        writer::write_document(self, writer)
    }

    /// Write the document to a file path
    ///
    /// This is a convenience method that creates the file and writes the XML
    /// text to it.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mjcf_prep::Document;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let doc = Document::from_file("scene.xml")?;
    /// doc.write_to_file("scene_copy.xml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Accepts a few bytes, then fails every write
    struct FullDisk {
        remaining: usize,
    }

    impl Write for FullDisk {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::new(io::ErrorKind::StorageFull, "no space left"));
            }
            let n = buf.len().min(self.remaining);
            self.remaining -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn sample() -> Document {
        Document::parse_str(r#"<mujoco model="m"><worldbody><body name="b"/></worldbody></mujoco>"#)
            .unwrap()
    }

    #[test]
    fn test_to_writer_reports_write_failure() {
        let result = sample().to_writer(FullDisk { remaining: 8 });
        assert!(result.is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_to_file_reports_full_device() {
        assert!(sample().write_to_file("/dev/full").is_err());
    }

    #[test]
    fn test_write_to_file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("copy.xml");
        sample().write_to_file(&path).unwrap();

        let reloaded = Document::from_file(&path).unwrap();
        let body = reloaded.find(reloaded.root(), "body").unwrap();
        assert_eq!(reloaded.element(body).name(), Some("b"));
    }
}
