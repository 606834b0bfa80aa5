use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, GeoPoint, Supplier};
use crate::cost::{round_km, round_money, CostModel};
use crate::search::{Candidate, Requirement};

/// How to charge an item that several members of one combination stock.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPricing {
    #[default]
    ChargeEverySupplier,
    ChargeCheapestOnce,
}

impl OverlapPricing {
    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::ChargeEverySupplier => "charge_every_supplier",
            Self::ChargeCheapestOnce => "charge_cheapest_once",
        }
    }
}

impl Display for OverlapPricing {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_slug())
    }
}

#[derive(Debug, Error)]
#[error("unknown overlap pricing mode: {0}")]
pub struct OverlapParseError(pub String);

impl FromStr for OverlapPricing {
    type Err = OverlapParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "charge_every_supplier" | "every" | "all" => Ok(Self::ChargeEverySupplier),
            "charge_cheapest_once" | "cheapest" | "once" => Ok(Self::ChargeCheapestOnce),
            _ => Err(OverlapParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("candidate references supplier index {index} but the catalog has {len}")]
    UnknownSupplier { index: usize, len: usize },
    #[error("required item {0} is not stocked by any member of the combination")]
    UncoveredItem(String),
    #[error("non-finite total for combination {0:?}")]
    NonFinite(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FulfilledItem {
    pub item: String,
    pub brand: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupplierFulfillment {
    pub supplier_id: String,
    pub supplier_name: String,
    pub distance_km: f64,
    pub delivery_cost: f64,
    pub items: Vec<FulfilledItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricedCombination {
    pub suppliers: Vec<SupplierFulfillment>,
    pub total_medicine_cost: f64,
    pub total_delivery_cost: f64,
    pub grand_total: f64,
}

impl PricedCombination {
    pub fn num_suppliers(&self) -> usize {
        self.suppliers.len()
    }

    pub fn supplier_ids(&self) -> Vec<&str> {
        self.suppliers.iter().map(|s| s.supplier_id.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PricingContext {
    pub user_location: GeoPoint,
    pub demand_factor: f64,
    pub cost_model: CostModel,
    pub overlap: OverlapPricing,
}

pub fn price_candidates(
    catalog: &Catalog,
    requirement: &Requirement,
    candidates: &[Candidate],
    context: &PricingContext,
) -> Result<Vec<PricedCombination>, PricingError> {
    candidates
        .par_iter()
        .map(|candidate| price_candidate(catalog, requirement, candidate, context))
        .collect()
}

pub fn price_candidate(
    catalog: &Catalog,
    requirement: &Requirement,
    candidate: &Candidate,
    context: &PricingContext,
) -> Result<PricedCombination, PricingError> {
    let members = candidate
        .members
        .iter()
        .map(|&index| {
            catalog
                .suppliers()
                .get(index)
                .ok_or(PricingError::UnknownSupplier {
                    index,
                    len: catalog.len(),
                })
        })
        .collect::<Result<Vec<&Supplier>, _>>()?;

    let mut items: Vec<Vec<FulfilledItem>> = vec![Vec::new(); members.len()];
    let mut total_medicine_cost = 0.0;

    for item in requirement.items() {
        let stocking = members
            .iter()
            .enumerate()
            .filter_map(|(pos, supplier)| supplier.entry(item).map(|entry| (pos, entry)));

        let charged: Vec<_> = match context.overlap {
            OverlapPricing::ChargeEverySupplier => stocking.collect(),
            // min_by keeps the first of equal prices, i.e. the lowest index
            OverlapPricing::ChargeCheapestOnce => stocking
                .min_by(|(_, a), (_, b)| a.price.total_cmp(&b.price))
                .into_iter()
                .collect(),
        };
        if charged.is_empty() {
            return Err(PricingError::UncoveredItem(item.clone()));
        }

        for (pos, entry) in charged {
            total_medicine_cost += entry.price;
            items[pos].push(FulfilledItem {
                item: item.clone(),
                brand: entry.brand.clone(),
                price: entry.price,
            });
        }
    }

    let mut total_delivery_cost = 0.0;
    let mut suppliers = Vec::with_capacity(members.len());
    for (supplier, items) in members.iter().zip(items) {
        let (distance_km, delivery_cost) = context.cost_model.supplier_delivery(
            supplier,
            context.user_location,
            context.demand_factor,
        );
        total_delivery_cost += delivery_cost;
        suppliers.push(SupplierFulfillment {
            supplier_id: supplier.id().to_string(),
            supplier_name: supplier.name().to_string(),
            distance_km: round_km(distance_km),
            delivery_cost: round_money(delivery_cost),
            items,
        });
    }

    if !(total_medicine_cost + total_delivery_cost).is_finite() {
        return Err(PricingError::NonFinite(
            members.iter().map(|s| s.id().to_string()).collect(),
        ));
    }

    // grand total is the sum of the published totals, not a separate rounding
    let total_medicine_cost = round_money(total_medicine_cost);
    let total_delivery_cost = round_money(total_delivery_cost);
    Ok(PricedCombination {
        suppliers,
        total_medicine_cost,
        total_delivery_cost,
        grand_total: round_money(total_medicine_cost + total_delivery_cost),
    })
}
