use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogError, SupplierSpec};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub suppliers: Vec<SupplierSpec>,
}

impl CatalogDocument {
    pub fn into_catalog(self) -> Result<Catalog, CatalogError> {
        Catalog::builder().suppliers(self.suppliers).build()
    }
}

impl From<&Catalog> for CatalogDocument {
    fn from(value: &Catalog) -> Self {
        Self {
            suppliers: value.to_specs(),
        }
    }
}

pub fn parse_catalog(data: &str) -> Result<Catalog> {
    let document: CatalogDocument =
        serde_json::from_str(data).context("failed parsing catalog JSON")?;
    Ok(document.into_catalog()?)
}

pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading catalog: {}", path.display()))?;
    parse_catalog(&data).with_context(|| format!("invalid catalog: {}", path.display()))
}

pub fn save_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating catalog directory: {}", parent.display())
            })?;
        }
    }
    let json = serde_json::to_string_pretty(&CatalogDocument::from(catalog))?;
    fs::write(path, json).with_context(|| format!("failed writing catalog: {}", path.display()))
}
