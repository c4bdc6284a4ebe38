//! Content type registry.
//!
//! Loads content type definitions from YAML files at startup and keeps them
//! in declaration order for listing and lookup.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use super::types::{ContentType, FIELD_SEPARATOR, slugify};

/// Registry of content types.
///
/// Read-only after startup; cloning is cheap.
#[derive(Debug, Clone, Default)]
pub struct ContentTypeRegistry {
    types: Arc<Vec<ContentType>>,
}

impl ContentTypeRegistry {
    /// Create a registry from already-parsed definitions.
    ///
    /// Missing ids are derived from the type name; ids are lowercased.
    /// Duplicate ids are rejected.
    pub fn new(types: Vec<ContentType>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(types.len());

        for mut ty in types {
            ty.id = if ty.id.trim().is_empty() {
                slugify(&ty.name)
            } else {
                ty.id.trim().to_lowercase()
            };

            if ty.id.is_empty() {
                bail!("content type '{}' has no usable id", ty.name);
            }
            if !seen.insert(ty.id.clone()) {
                bail!("duplicate content type id '{}'", ty.id);
            }

            let mut attribute_ids = HashSet::new();
            for attr in &ty.attributes {
                if attr.id.contains(FIELD_SEPARATOR) {
                    bail!(
                        "attribute '{}' of content type '{}' must not contain '{FIELD_SEPARATOR}'",
                        attr.id,
                        ty.id
                    );
                }
                if !attribute_ids.insert(attr.id.clone()) {
                    bail!(
                        "content type '{}' declares attribute '{}' twice",
                        ty.id,
                        attr.id
                    );
                }
            }

            normalized.push(ty);
        }

        Ok(Self {
            types: Arc::new(normalized),
        })
    }

    /// Load every `*.yml` / `*.yaml` file in a directory, ordered by file name.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read content types from {}", dir.display()))?;

        let mut paths: Vec<_> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e == "yml" || e == "yaml")
            })
            .collect();
        paths.sort();

        let mut types = Vec::with_capacity(paths.len());
        for path in paths {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let ty: ContentType = serde_yml::from_str(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            debug!(path = %path.display(), name = %ty.name, "loaded content type");
            types.push(ty);
        }

        let registry = Self::new(types)?;
        info!(count = registry.len(), dir = %dir.display(), "content types loaded");
        Ok(registry)
    }

    /// Find a content type by slug. The slug is lowercased before comparison.
    pub fn find(&self, slug: &str) -> Option<&ContentType> {
        let slug = slug.to_lowercase();
        self.types.iter().find(|t| t.id == slug)
    }

    /// All content types in declaration order.
    pub fn list(&self) -> &[ContentType] {
        &self.types
    }

    /// Number of registered content types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
