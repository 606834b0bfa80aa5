use serde::{Deserialize, Serialize};

use crate::pricing::{PricedCombination, SupplierFulfillment};

pub const CONVENIENCE_REASON: &str = "fewest shops + reasonable cost";
pub const LOWEST_COST_REASON: &str = "lowest cost";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedCombination {
    pub rank: usize,
    pub num_suppliers: usize,
    pub total_medicine_cost: f64,
    pub total_delivery_cost: f64,
    pub grand_total: f64,
    pub priority_reason: String,
    pub suppliers: Vec<SupplierFulfillment>,
}

pub fn priority_reason(prefer_convenience: bool) -> &'static str {
    if prefer_convenience {
        CONVENIENCE_REASON
    } else {
        LOWEST_COST_REASON
    }
}

/// Orders by supplier count, then grand total. The sort is stable, so exact
/// ties keep their input order. `prefer_convenience` only picks the label.
pub fn rank_combinations(
    mut combinations: Vec<PricedCombination>,
    prefer_convenience: bool,
) -> Vec<RankedCombination> {
    combinations.sort_by(|a, b| {
        a.num_suppliers()
            .cmp(&b.num_suppliers())
            .then_with(|| a.grand_total.total_cmp(&b.grand_total))
    });

    let reason = priority_reason(prefer_convenience);
    combinations
        .into_iter()
        .enumerate()
        .map(|(idx, combination)| RankedCombination {
            rank: idx + 1,
            num_suppliers: combination.num_suppliers(),
            total_medicine_cost: combination.total_medicine_cost,
            total_delivery_cost: combination.total_delivery_cost,
            grand_total: combination.grand_total,
            priority_reason: reason.to_string(),
            suppliers: combination.suppliers,
        })
        .collect()
}
