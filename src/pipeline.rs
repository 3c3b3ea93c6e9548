//! Preprocessing pipeline
//!
//! A [`Preprocessor`] runs the document transforms in a fixed order:
//! reference-orientation correction, replicate expansion, then site
//! relocation. Metadata is extracted from the transformed tree, and the
//! rewritten document is saved as a working copy next to the source for the
//! scene builder to consume. The source file itself is never modified.

use crate::config::PreprocessConfig;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::fixups;
use crate::metadata::{self, Metadata};
use crate::parser;
use crate::refquat;
use crate::replicate::{self, ExpansionSummary};
use crate::writer;
use std::path::{Path, PathBuf};

/// Consumer of a preprocessed document
///
/// Implement this to turn the working copy and its metadata into a target
/// scene. The builder is only invoked when the working copy was written.
pub trait SceneBuilder {
    /// Build a scene from the rewritten document at `working_copy`
    fn build(&mut self, working_copy: &Path, metadata: &Metadata) -> Result<()>;
}

impl<F> SceneBuilder for F
where
    F: FnMut(&Path, &Metadata) -> Result<()>,
{
    fn build(&mut self, working_copy: &Path, metadata: &Metadata) -> Result<()> {
        self(working_copy, metadata)
    }
}

/// Counts of the in-memory transforms applied to a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformSummary {
    /// Geoms whose orientation absorbed a mesh reference orientation
    pub refquat_geoms: usize,
    /// Replicate expansion counts
    pub expansion: ExpansionSummary,
    /// Whether any site was relocated
    pub sites_relocated: bool,
}

/// Outcome of preprocessing a file
#[derive(Debug, Clone)]
pub struct PreprocessReport {
    /// Rewritten document
    pub document: Document,
    /// Metadata extracted after all transforms
    pub metadata: Metadata,
    /// Counts of the applied transforms
    pub transforms: TransformSummary,
    /// Location of the working copy
    pub working_copy: PathBuf,
    /// Whether the working copy was written
    pub written: bool,
}

/// Runs the preprocessing stages with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    /// Create a preprocessor with the given configuration
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Apply the tree transforms to a document in place
    ///
    /// Stops at the first error; the document may then be partially
    /// transformed and should be discarded.
    pub fn preprocess_document(&self, document: &mut Document) -> Result<TransformSummary> {
        let sequence = self.config.default_euler_sequence();

        let refquat_geoms = refquat::correct_reference_orientations(document, sequence)?;
        let expansion = replicate::expand_replicates(document, sequence)?;
        let sites_relocated = if self.config.relocate_sites() {
            fixups::relocate_sites(document)?
        } else {
            false
        };

        Ok(TransformSummary {
            refquat_geoms,
            expansion,
            sites_relocated,
        })
    }

    /// Extract metadata using this configuration's conventions
    pub fn extract_metadata(&self, document: &Document) -> Result<Metadata> {
        metadata::extract(document, &self.config.extract_options())
    }

    /// Path of the working copy for `source`
    ///
    /// # Example
    ///
    /// ```
    /// use mjcf_prep::Preprocessor;
    /// use std::path::Path;
    ///
    /// let preprocessor = Preprocessor::default();
    /// let copy = preprocessor.working_copy_path("scenes/kitchen.xml");
    /// assert_eq!(copy, Path::new("scenes/kitchen_tmp.xml"));
    /// ```
    pub fn working_copy_path<P: AsRef<Path>>(&self, source: P) -> PathBuf {
        let source = source.as_ref();
        let stem = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut file_name = format!("{}{}", stem, self.config.working_copy_suffix());
        if let Some(extension) = source.extension() {
            file_name.push('.');
            file_name.push_str(&extension.to_string_lossy());
        }
        source.with_file_name(file_name)
    }

    /// Load, transform and save a working copy of an MJCF file
    ///
    /// Parsing and transform errors are returned, as is a configuration
    /// whose working copy would land on `source`. A failure to write the
    /// working copy is not: it is logged and reported through
    /// [`PreprocessReport::written`].
    ///
    /// # Arguments
    ///
    /// * `source` - Path to the MJCF file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mjcf_prep::Preprocessor;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let report = Preprocessor::default().preprocess_file("robot.xml")?;
    /// println!("{} joints", report.metadata.joints.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn preprocess_file<P: AsRef<Path>>(&self, source: P) -> Result<PreprocessReport> {
        let source = source.as_ref();
        let working_copy = self.working_copy_path(source);
        if working_copy.file_name() == source.file_name() {
            return Err(Error::InvalidConfig(format!(
                "working copy of {} would overwrite the source; use a non-empty suffix",
                source.display()
            )));
        }

        let mut document = parser::parse_file(source)?;
        let transforms = self.preprocess_document(&mut document)?;
        let metadata = self.extract_metadata(&document)?;

        let written = match save(&document, &working_copy) {
            Ok(()) => {
                tracing::info!("Wrote preprocessed document to {}", working_copy.display());
                true
            }
            Err(err) => {
                tracing::warn!(
                    "Failed to write preprocessed document to {}: {}",
                    working_copy.display(),
                    err
                );
                false
            }
        };

        Ok(PreprocessReport {
            document,
            metadata,
            transforms,
            working_copy,
            written,
        })
    }

    /// Preprocess a file and hand the result to a scene builder
    ///
    /// The builder is skipped when the working copy could not be written.
    /// The working copy is removed afterwards unless the configuration keeps
    /// it, including when the builder fails.
    pub fn convert_file<P, B>(&self, source: P, builder: &mut B) -> Result<PreprocessReport>
    where
        P: AsRef<Path>,
        B: SceneBuilder + ?Sized,
    {
        let report = self.preprocess_file(source)?;
        if !report.written {
            return Ok(report);
        }

        let built = builder.build(&report.working_copy, &report.metadata);

        if !self.config.keep_working_copy() {
            if let Err(err) = std::fs::remove_file(&report.working_copy) {
                tracing::warn!(
                    "Failed to remove working copy {}: {}",
                    report.working_copy.display(),
                    err
                );
            }
        }

        built.map(|()| report)
    }
}

fn save(document: &Document, path: &Path) -> Result<()> {
    let xml = writer::document_to_string(document)?;
    std::fs::write(path, xml)?;
    Ok(())
}
