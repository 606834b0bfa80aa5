use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::catalog::{Catalog, GeoPoint};
use crate::cost::CostModel;
use crate::pricing::{price_candidates, OverlapPricing, PricingContext};
use crate::ranking::{rank_combinations, RankedCombination};
use crate::search::{
    find_covering_combinations, uncovered_items, Requirement, SearchError, SearchOptions,
    SearchStrategy, MAX_REQUIREMENT_ITEMS,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FulfillmentRequest {
    pub requirement_items: Vec<String>,
    pub user_location: GeoPoint,
    #[serde(default)]
    pub demand_factor: f64,
    #[serde(default = "default_true")]
    pub prefer_convenience: bool,
}

impl FulfillmentRequest {
    pub fn new<I, S>(items: I, user_location: GeoPoint) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            requirement_items: items.into_iter().map(Into::into).collect(),
            user_location,
            demand_factor: 0.0,
            prefer_convenience: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchSummary {
    pub catalog_version: u64,
    pub catalog_suppliers: usize,
    pub distinct_items: usize,
    pub candidates: usize,
    pub strategy: SearchStrategy,
    pub overlap_pricing: OverlapPricing,
    pub elapsed_ms: u64,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FulfillmentResponse {
    pub requirement_items: Vec<String>,
    pub ranked_combinations: Vec<RankedCombination>,
    pub summary: SearchSummary,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("{}", describe_unfulfillable(.missing))]
    NotFulfillable { missing: Vec<String> },
    #[error("search budget exceeded: {0}")]
    BudgetExceeded(SearchError),
    #[error("internal computation error")]
    Internal,
}

impl EngineError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFulfillable { .. } => "not_fulfillable",
            Self::BudgetExceeded(_) => "budget_exceeded",
            Self::Internal => "internal",
        }
    }
}

fn describe_unfulfillable(missing: &[String]) -> String {
    if missing.is_empty() {
        "no combination of shops can fulfil every required item".to_string()
    } else {
        format!("no shop stocks: {}", missing.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub search: SearchOptions,
    pub cost_model: CostModel,
    pub overlap: OverlapPricing,
    pub max_requirement_items: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            search: SearchOptions::default(),
            cost_model: CostModel::default(),
            overlap: OverlapPricing::default(),
            max_requirement_items: MAX_REQUIREMENT_ITEMS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FulfillmentEngine {
    settings: EngineSettings,
}

impl FulfillmentEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn run(
        &self,
        catalog: &Catalog,
        request: &FulfillmentRequest,
    ) -> Result<FulfillmentResponse, EngineError> {
        let started = Instant::now();
        let requirement = self.validate(request)?;

        let candidates = find_covering_combinations(catalog, &requirement, &self.settings.search)
            .map_err(|err| match err {
                SearchError::TooManyItems { .. } => EngineError::Validation(err.to_string()),
                other => EngineError::BudgetExceeded(other),
            })?;
        if candidates.is_empty() {
            return Err(EngineError::NotFulfillable {
                missing: uncovered_items(catalog, &requirement),
            });
        }
        debug!(candidates = candidates.len(), "covering combinations found");

        let context = PricingContext {
            user_location: request.user_location,
            demand_factor: request.demand_factor,
            cost_model: self.settings.cost_model,
            overlap: self.settings.overlap,
        };
        let priced = price_candidates(catalog, &requirement, &candidates, &context).map_err(|err| {
            error!(
                error = %err,
                items = ?requirement.items(),
                catalog_version = catalog.version(),
                "pricing failed"
            );
            EngineError::Internal
        })?;

        if let Some(bad) = priced.iter().find(|p| {
            p.total_medicine_cost < 0.0 || p.total_delivery_cost < 0.0 || p.grand_total < 0.0
        }) {
            error!(
                suppliers = ?bad.supplier_ids(),
                grand_total = bad.grand_total,
                catalog_version = catalog.version(),
                "negative total on validated input"
            );
            return Err(EngineError::Internal);
        }

        let ranked_combinations = rank_combinations(priced, request.prefer_convenience);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            items = requirement.len(),
            suppliers = catalog.len(),
            combinations = ranked_combinations.len(),
            elapsed_ms,
            "fulfillment ranked"
        );

        Ok(FulfillmentResponse {
            requirement_items: request.requirement_items.clone(),
            summary: SearchSummary {
                catalog_version: catalog.version(),
                catalog_suppliers: catalog.len(),
                distinct_items: requirement.len(),
                candidates: ranked_combinations.len(),
                strategy: self.settings.search.strategy,
                overlap_pricing: self.settings.overlap,
                elapsed_ms,
                generated_at: Utc::now(),
            },
            ranked_combinations,
        })
    }

    pub fn validate(&self, request: &FulfillmentRequest) -> Result<Requirement, EngineError> {
        if request.requirement_items.is_empty() {
            return Err(EngineError::Validation(
                "requirement_items cannot be empty".to_string(),
            ));
        }
        if let Some(pos) = request
            .requirement_items
            .iter()
            .position(|item| item.trim().is_empty())
        {
            return Err(EngineError::Validation(format!(
                "requirement_items[{pos}] is blank"
            )));
        }
        if !request.user_location.is_well_formed() {
            return Err(EngineError::Validation(format!(
                "user_location {} is not a valid coordinate",
                request.user_location
            )));
        }
        if !request.demand_factor.is_finite() || request.demand_factor < 0.0 {
            return Err(EngineError::Validation(format!(
                "demand_factor must be a non-negative number, got {}",
                request.demand_factor
            )));
        }

        let requirement = Requirement::new(request.requirement_items.iter().map(|i| i.trim()))
            .map_err(|err| EngineError::Validation(err.to_string()))?;
        let limit = self.settings.max_requirement_items.min(MAX_REQUIREMENT_ITEMS);
        if requirement.len() > limit {
            return Err(EngineError::Validation(format!(
                "requirement has {} distinct items; at most {limit} are allowed",
                requirement.len()
            )));
        }
        Ok(requirement)
    }
}

fn default_true() -> bool {
    true
}
