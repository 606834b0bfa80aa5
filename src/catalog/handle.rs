use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use tracing::info;

use crate::catalog::Catalog;

/// Shared, swappable catalog. Readers take an `Arc` snapshot and keep it for
/// the whole request, so a concurrent `replace` never shows up mid-search.
#[derive(Debug, Clone)]
pub struct CatalogHandle {
    current: Arc<RwLock<Arc<Catalog>>>,
    next_version: Arc<AtomicU64>,
}

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(catalog.with_version(1)))),
            next_version: Arc::new(AtomicU64::new(2)),
        }
    }

    pub fn snapshot(&self) -> Result<Arc<Catalog>> {
        let guard = self
            .current
            .read()
            .map_err(|_| anyhow!("catalog lock poisoned"))?;
        Ok(Arc::clone(&guard))
    }

    pub fn replace(&self, catalog: Catalog) -> Result<u64> {
        let version = self.next_version.fetch_add(1, Ordering::Relaxed);
        let suppliers = catalog.len();
        let mut guard = self
            .current
            .write()
            .map_err(|_| anyhow!("catalog lock poisoned"))?;
        *guard = Arc::new(catalog.with_version(version));
        info!("catalog replaced: version {version}, {suppliers} suppliers");
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SupplierSpec;

    fn catalog_of(ids: &[&str]) -> Catalog {
        Catalog::builder()
            .suppliers(ids.iter().map(|id| SupplierSpec::new(*id, *id)))
            .build()
            .expect("valid catalog")
    }

    #[test]
    fn snapshot_survives_replacement() {
        let handle = CatalogHandle::new(catalog_of(&["a"]));
        let before = handle.snapshot().expect("snapshot");
        assert_eq!(before.version(), 1);

        let version = handle.replace(catalog_of(&["b", "c"])).expect("replace");
        assert_eq!(version, 2);

        assert_eq!(before.len(), 1);
        assert_eq!(before.suppliers()[0].id(), "a");
        let after = handle.snapshot().expect("snapshot");
        assert_eq!(after.len(), 2);
        assert_eq!(after.version(), 2);
    }
}
