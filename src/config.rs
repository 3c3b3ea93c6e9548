//! Preprocessing configuration

use crate::metadata::ExtractOptions;
use crate::orientation::DEFAULT_EULER_SEQUENCE;

/// Configuration for preprocessing MJCF files
///
/// The defaults reproduce the conventions expected by the scene importer.
/// Individual settings can be overridden with the `with_*` builders.
///
/// # Example
///
/// ```
/// use mjcf_prep::PreprocessConfig;
///
/// let config = PreprocessConfig::new()
///     .with_working_copy_suffix("_prepped")
///     .with_keep_working_copy(true);
/// assert!(config.keep_working_copy());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessConfig {
    default_euler_sequence: String,
    material_prefix: String,
    collision_class_marker: String,
    working_copy_suffix: String,
    keep_working_copy: bool,
    relocate_sites: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PreprocessConfig {
    /// Create a configuration with the default conventions
    pub fn new() -> Self {
        Self {
            default_euler_sequence: DEFAULT_EULER_SEQUENCE.to_string(),
            material_prefix: "material_".to_string(),
            collision_class_marker: "col".to_string(),
            working_copy_suffix: "_tmp".to_string(),
            keep_working_copy: false,
            relocate_sites: true,
        }
    }

    /// Euler sequence used when an element has no `eulerseq`
    pub fn with_default_euler_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.default_euler_sequence = sequence.into();
        self
    }

    /// Prefix prepended to material names before normalization
    pub fn with_material_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.material_prefix = prefix.into();
        self
    }

    /// Substring marking a default class as a collision class
    pub fn with_collision_class_marker(mut self, marker: impl Into<String>) -> Self {
        self.collision_class_marker = marker.into();
        self
    }

    /// Suffix inserted before the extension of the working copy
    ///
    /// An empty suffix would place the working copy on the source file;
    /// preprocessing rejects it.
    pub fn with_working_copy_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.working_copy_suffix = suffix.into();
        self
    }

    /// Keep the working copy after conversion
    pub fn with_keep_working_copy(mut self, keep: bool) -> Self {
        self.keep_working_copy = keep;
        self
    }

    /// Enable or disable site relocation
    pub fn with_relocate_sites(mut self, relocate: bool) -> Self {
        self.relocate_sites = relocate;
        self
    }

    /// Euler sequence used when an element has no `eulerseq`
    pub fn default_euler_sequence(&self) -> &str {
        &self.default_euler_sequence
    }

    /// Prefix prepended to material names
    pub fn material_prefix(&self) -> &str {
        &self.material_prefix
    }

    /// Substring marking a collision class
    pub fn collision_class_marker(&self) -> &str {
        &self.collision_class_marker
    }

    /// Suffix of the working copy file stem
    pub fn working_copy_suffix(&self) -> &str {
        &self.working_copy_suffix
    }

    /// Whether the working copy survives conversion
    pub fn keep_working_copy(&self) -> bool {
        self.keep_working_copy
    }

    /// Whether site relocation runs
    pub fn relocate_sites(&self) -> bool {
        self.relocate_sites
    }

    /// Metadata extraction options derived from this configuration
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            material_prefix: self.material_prefix.clone(),
            collision_class_marker: self.collision_class_marker.clone(),
        }
    }
}
