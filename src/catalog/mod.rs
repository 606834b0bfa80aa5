pub mod demo;
pub mod handle;
pub mod store;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use handle::CatalogHandle;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    #[error("supplier id cannot be empty")]
    EmptySupplierId,
    #[error("duplicate supplier id: {0}")]
    DuplicateSupplier(String),
    #[error("supplier {supplier}: base cost must be a non-negative amount, got {value}")]
    InvalidBaseCost { supplier: String, value: f64 },
    #[error("supplier {supplier}: price for {item} must be a non-negative amount, got {value}")]
    InvalidPrice {
        supplier: String,
        item: String,
        value: f64,
    },
    #[error("supplier {supplier}: inventory item name cannot be empty")]
    EmptyItemName { supplier: String },
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CatalogError> {
        let point = Self {
            latitude,
            longitude,
        };
        if point.is_well_formed() {
            Ok(point)
        } else {
            Err(CatalogError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl Display for GeoPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricedEntry {
    pub brand: String,
    pub price: f64,
}

impl PricedEntry {
    pub fn new(brand: impl Into<String>, price: f64) -> Self {
        Self {
            brand: brand.into(),
            price,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Supplier {
    id: String,
    name: String,
    base_cost: f64,
    location: GeoPoint,
    inventory: BTreeMap<String, PricedEntry>,
}

impl Supplier {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_cost(&self) -> f64 {
        self.base_cost
    }

    pub fn location(&self) -> GeoPoint {
        self.location
    }

    pub fn inventory(&self) -> &BTreeMap<String, PricedEntry> {
        &self.inventory
    }

    pub fn stocks(&self, item: &str) -> bool {
        self.inventory.contains_key(item)
    }

    pub fn entry(&self, item: &str) -> Option<&PricedEntry> {
        self.inventory.get(item)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupplierSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub base_cost: f64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub inventory: BTreeMap<String, PricedEntry>,
}

impl SupplierSpec {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_cost: 0.0,
            latitude: 0.0,
            longitude: 0.0,
            inventory: BTreeMap::new(),
        }
    }

    pub fn with_base_cost(mut self, base_cost: f64) -> Self {
        self.base_cost = base_cost;
        self
    }

    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    pub fn with_item(mut self, item: impl Into<String>, brand: impl Into<String>, price: f64) -> Self {
        self.inventory
            .insert(item.into(), PricedEntry::new(brand, price));
        self
    }

    fn validate(self) -> Result<Supplier, CatalogError> {
        if self.id.trim().is_empty() {
            return Err(CatalogError::EmptySupplierId);
        }
        if !is_amount(self.base_cost) {
            return Err(CatalogError::InvalidBaseCost {
                supplier: self.id,
                value: self.base_cost,
            });
        }
        let location = GeoPoint::new(self.latitude, self.longitude)?;
        for (item, entry) in &self.inventory {
            if item.trim().is_empty() {
                return Err(CatalogError::EmptyItemName { supplier: self.id });
            }
            if !is_amount(entry.price) {
                return Err(CatalogError::InvalidPrice {
                    supplier: self.id.clone(),
                    item: item.clone(),
                    value: entry.price,
                });
            }
        }
        Ok(Supplier {
            id: self.id,
            name: self.name,
            base_cost: self.base_cost,
            location,
            inventory: self.inventory,
        })
    }
}

impl From<&Supplier> for SupplierSpec {
    fn from(value: &Supplier) -> Self {
        Self {
            id: value.id.clone(),
            name: value.name.clone(),
            base_cost: value.base_cost,
            latitude: value.location.latitude,
            longitude: value.location.longitude,
            inventory: value.inventory.clone(),
        }
    }
}

fn is_amount(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Read-only collection of suppliers. Supplier order is insertion order and
/// is the index order used by the search and for tie-breaking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    suppliers: Vec<Supplier>,
    version: u64,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    pub fn suppliers(&self) -> &[Supplier] {
        &self.suppliers
    }

    pub fn len(&self) -> usize {
        self.suppliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suppliers.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Supplier> {
        self.suppliers.iter().find(|s| s.id == id)
    }

    pub fn stocked_items(&self) -> BTreeSet<&str> {
        self.suppliers
            .iter()
            .flat_map(|s| s.inventory.keys().map(String::as_str))
            .collect()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn to_specs(&self) -> Vec<SupplierSpec> {
        self.suppliers.iter().map(SupplierSpec::from).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    specs: Vec<SupplierSpec>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn supplier(mut self, spec: SupplierSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn suppliers(mut self, specs: impl IntoIterator<Item = SupplierSpec>) -> Self {
        self.specs.extend(specs);
        self
    }

    pub fn build(self) -> Result<Catalog, CatalogError> {
        let mut seen = HashSet::with_capacity(self.specs.len());
        let mut suppliers = Vec::with_capacity(self.specs.len());
        for spec in self.specs {
            if !seen.insert(spec.id.clone()) {
                return Err(CatalogError::DuplicateSupplier(spec.id));
            }
            suppliers.push(spec.validate()?);
        }
        Ok(Catalog {
            suppliers,
            version: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_shop_catalog() -> Catalog {
        Catalog::builder()
            .supplier(
                SupplierSpec::new("s1", "Jan Aushadhi")
                    .at(28.61, 77.20)
                    .with_item("Paracetamol", "Calpol", 12.5),
            )
            .supplier(
                SupplierSpec::new("s2", "DavaIndia")
                    .with_base_cost(3.0)
                    .at(28.62, 77.21)
                    .with_item("Amoxicillin", "Mox", 18.0)
                    .with_item("Paracetamol", "Dolo", 11.0),
            )
            .build()
            .expect("valid catalog")
    }

    #[test]
    fn builds_catalog_in_insertion_order() {
        let catalog = two_shop_catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.suppliers()[0].id(), "s1");
        assert_eq!(catalog.suppliers()[1].name(), "DavaIndia");
        assert!(catalog.suppliers()[1].stocks("Amoxicillin"));
        assert!(!catalog.suppliers()[0].stocks("Amoxicillin"));
        assert_eq!(
            catalog.stocked_items().into_iter().collect::<Vec<_>>(),
            vec!["Amoxicillin", "Paracetamol"]
        );
    }

    #[test]
    fn rejects_duplicate_supplier_ids() {
        let err = Catalog::builder()
            .supplier(SupplierSpec::new("s1", "A"))
            .supplier(SupplierSpec::new("s1", "B"))
            .build()
            .expect_err("duplicate ids must fail");
        assert_eq!(err, CatalogError::DuplicateSupplier("s1".to_string()));
    }

    #[test]
    fn rejects_negative_amounts_and_bad_coordinates() {
        let negative_price = Catalog::builder()
            .supplier(SupplierSpec::new("s1", "A").with_item("X", "b", -1.0))
            .build();
        assert!(matches!(
            negative_price,
            Err(CatalogError::InvalidPrice { .. })
        ));

        let negative_base = Catalog::builder()
            .supplier(SupplierSpec::new("s1", "A").with_base_cost(-0.5))
            .build();
        assert!(matches!(
            negative_base,
            Err(CatalogError::InvalidBaseCost { .. })
        ));

        let bad_point = Catalog::builder()
            .supplier(SupplierSpec::new("s1", "A").at(91.0, 0.0))
            .build();
        assert!(matches!(
            bad_point,
            Err(CatalogError::InvalidCoordinate { .. })
        ));
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }
}
