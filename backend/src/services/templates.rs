//! Template catalog
//!
//! Loads the color template catalog once at startup. The catalog is
//! read-only afterwards and served verbatim at `/template.json`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Color descriptor of a template: one color or a palette
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ColorDescriptor {
    /// A single color value
    Single(String),
    /// A list of key colors
    Palette(Vec<String>),
}

impl Default for ColorDescriptor {
    fn default() -> Self {
        ColorDescriptor::Palette(Vec::new())
    }
}

impl std::fmt::Display for ColorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorDescriptor::Single(color) => f.write_str(color),
            ColorDescriptor::Palette(colors) => f.write_str(&colors.join(",")),
        }
    }
}

/// One selectable rendering template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateVariant {
    /// Display name, also used as the variant label
    #[serde(alias = "id")]
    pub name: String,
    /// Key colors applied to the prompt
    #[serde(default)]
    pub color: ColorDescriptor,
}

/// Template catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("Failed to read template catalog {path}: {source}")]
    Io {
        /// Catalog path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Catalog file is not a JSON array of templates
    #[error("Invalid template catalog {path}: {source}")]
    Json {
        /// Catalog path
        path: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

/// Read-only list of templates
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    variants: Vec<TemplateVariant>,
}

impl TemplateCatalog {
    /// Load the catalog from a JSON file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let variants: Vec<TemplateVariant> =
            serde_json::from_str(&content).map_err(|e| CatalogError::Json {
                path: path.display().to_string(),
                source: e,
            })?;
        Ok(Self::from_variants(variants))
    }

    /// Build a catalog from already-parsed templates
    pub fn from_variants(variants: Vec<TemplateVariant>) -> Self {
        Self { variants }
    }

    /// All templates in catalog order
    pub fn variants(&self) -> &[TemplateVariant] {
        &self.variants
    }

    /// Look up a template by name
    pub fn find(&self, name: &str) -> Option<&TemplateVariant> {
        self.variants.iter().find(|t| t.name == name)
    }
}
