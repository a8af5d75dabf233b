// --- File: crates/icewatch_config/src/products.rs ---
//! The product catalog: which booking-site products to watch and which
//! calendars each one is mirrored into.

use icewatch_common::ProductId;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::ConfigLoadError;

/// Calendar targets for one product. Both keys are optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ProductEntry {
    #[serde(rename = "GCal", default)]
    pub gcal: Option<String>,
    #[serde(rename = "Calendars", default)]
    pub calendars: Vec<String>,
}

impl ProductEntry {
    /// Every configured calendar id, `GCal` first, without duplicates.
    pub fn calendar_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for id in self.gcal.iter().chain(self.calendars.iter()) {
            if !id.is_empty() && !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }
}

/// Products keyed by id; iteration order is the id order.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ProductCatalog {
    entries: BTreeMap<ProductId, ProductEntry>,
}

impl ProductCatalog {
    pub fn new(entries: BTreeMap<ProductId, ProductEntry>) -> Self {
        Self { entries }
    }

    pub fn product_ids(&self) -> Vec<ProductId> {
        self.entries.keys().cloned().collect()
    }

    pub fn entry(&self, product: &ProductId) -> Option<&ProductEntry> {
        self.entries.get(product)
    }

    /// Calendars for `product`; unknown products have none.
    pub fn calendars_for(&self, product: &ProductId) -> Vec<String> {
        self.entry(product)
            .map(ProductEntry::calendar_ids)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads the catalog from a JSON file.
///
/// Any failure is fatal for the caller: without a catalog no pass can run.
pub fn load_product_catalog(path: impl AsRef<Path>) -> Result<ProductCatalog, ConfigLoadError> {
    let path = path.as_ref();
    let shown = path.display().to_string();

    let raw = fs::read_to_string(path).map_err(|source| ConfigLoadError::CatalogIo {
        path: shown.clone(),
        source,
    })?;
    let catalog: ProductCatalog =
        serde_json::from_str(&raw).map_err(|source| ConfigLoadError::CatalogParse {
            path: shown.clone(),
            source,
        })?;

    info!("Loaded {} products from {}", catalog.len(), shown);
    Ok(catalog)
}
