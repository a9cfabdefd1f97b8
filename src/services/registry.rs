//! Catalog registry: the pickable icon and tag vocabularies.
//!
//! Ships with built-in defaults; deployments can overlay their own sets
//! from a JSON file keyed by catalog name. Unknown values are still
//! accepted on writes, the registry only drives pickers and validation
//! hints.

use dashmap::DashMap;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::errors::ServiceError;

pub const ITEM_ICONS: &str = "item-icons";
pub const ITEM_TAGS: &str = "item-tags";
pub const PERSON_TAGS: &str = "person-tags";
pub const LOCATION_TAGS: &str = "location-tags";

const DEFAULT_ITEM_ICONS: &[&str] = &[
    "🧻", "🧼", "🧽", "🧹", "🧴", "🪣", "🧺", "🔋", "💡", "🔧", "🪛", "🔨", "🍽️", "☕", "🧂",
];
const DEFAULT_ITEM_TAGS: &[&str] = &["cleaning", "kitchen", "bathroom", "tools", "consumable"];
const DEFAULT_PERSON_TAGS: &[&str] = &["new-arrival", "long-term", "needs-checkin"];
const DEFAULT_LOCATION_TAGS: &[&str] = &["shared", "private", "storage"];

#[derive(Debug, Default)]
pub struct CatalogRegistry {
    catalogs: DashMap<String, Vec<String>>,
}

impl CatalogRegistry {
    pub fn with_defaults() -> Self {
        let registry = Self::default();
        registry.seed(ITEM_ICONS, DEFAULT_ITEM_ICONS);
        registry.seed(ITEM_TAGS, DEFAULT_ITEM_TAGS);
        registry.seed(PERSON_TAGS, DEFAULT_PERSON_TAGS);
        registry.seed(LOCATION_TAGS, DEFAULT_LOCATION_TAGS);
        registry
    }

    fn seed(&self, catalog: &str, values: &[&str]) {
        self.catalogs.insert(
            catalog.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
    }

    /// Defaults overlaid with the catalogs found at `path`. A file entry
    /// replaces the default set of the same name wholesale.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let registry = Self::with_defaults();
        let raw = fs::read_to_string(path.as_ref()).map_err(|e| {
            ServiceError::InternalError(format!(
                "failed to read registry file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let overlays: HashMap<String, Vec<String>> = serde_json::from_str(&raw)
            .map_err(|e| ServiceError::InternalError(format!("invalid registry file: {}", e)))?;
        for (catalog, values) in overlays {
            registry.catalogs.insert(catalog, values);
        }
        info!(path = %path.as_ref().display(), "catalog registry loaded");
        Ok(registry)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ServiceError> {
        let snapshot: HashMap<String, Vec<String>> = self
            .catalogs
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        let raw = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| ServiceError::InternalError(format!("registry serialize: {}", e)))?;
        fs::write(path.as_ref(), raw).map_err(|e| {
            ServiceError::InternalError(format!(
                "failed to write registry file {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    pub fn entries(&self, catalog: &str) -> Vec<String> {
        self.catalogs
            .get(catalog)
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    pub fn catalog_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.catalogs.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Appends a value to a catalog, creating the catalog if needed.
    /// Duplicates are ignored.
    pub fn register(&self, catalog: &str, value: impl Into<String>) {
        let value = value.into();
        let mut entry = self.catalogs.entry(catalog.to_string()).or_default();
        if !entry.contains(&value) {
            entry.push(value);
        }
    }

    pub fn is_known(&self, catalog: &str, value: &str) -> bool {
        self.catalogs
            .get(catalog)
            .map(|v| v.iter().any(|e| e == value))
            .unwrap_or(false)
    }
}
