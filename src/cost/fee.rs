use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cost::round_money;

#[derive(Debug, Error, PartialEq)]
pub enum FeeError {
    #[error("{field} must be a non-negative number, got {value}")]
    Negative { field: &'static str, value: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeeSchedule {
    #[serde(default = "default_small_order_threshold")]
    pub small_order_threshold: f64,
    #[serde(default = "default_base_distance_m")]
    pub base_distance_m: u64,
    #[serde(default = "default_base_fee")]
    pub base_fee: f64,
    #[serde(default = "default_block_m")]
    pub additional_block_m: u64,
    #[serde(default = "default_block_fee")]
    pub additional_block_fee: f64,
    #[serde(default = "default_surcharge_start")]
    pub item_surcharge_start_at: u32,
    #[serde(default = "default_surcharge_per_item")]
    pub item_surcharge_per_item: f64,
    #[serde(default = "default_free_delivery")]
    pub free_delivery_cart_value: f64,
    #[serde(default = "default_max_fee")]
    pub max_fee: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            small_order_threshold: default_small_order_threshold(),
            base_distance_m: default_base_distance_m(),
            base_fee: default_base_fee(),
            additional_block_m: default_block_m(),
            additional_block_fee: default_block_fee(),
            item_surcharge_start_at: default_surcharge_start(),
            item_surcharge_per_item: default_surcharge_per_item(),
            free_delivery_cart_value: default_free_delivery(),
            max_fee: default_max_fee(),
            currency: default_currency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeRequest {
    pub cart_value: f64,
    pub delivery_distance: u64,
    pub item_count: u32,
    /// Accepted for forward compatibility (rush-hour rules); unused.
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeeBreakdown {
    pub small_order_surcharge: f64,
    pub distance_fee: f64,
    pub item_surcharge: f64,
    pub capped: bool,
    pub free_delivery_applied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeeQuote {
    pub total_fee: f64,
    pub currency: String,
    pub breakdown: FeeBreakdown,
}

pub fn quote_fee(schedule: &FeeSchedule, request: &FeeRequest) -> Result<FeeQuote, FeeError> {
    if !request.cart_value.is_finite() || request.cart_value < 0.0 {
        return Err(FeeError::Negative {
            field: "cart_value",
            value: request.cart_value,
        });
    }

    if request.cart_value >= schedule.free_delivery_cart_value {
        return Ok(FeeQuote {
            total_fee: 0.0,
            currency: schedule.currency.clone(),
            breakdown: FeeBreakdown {
                small_order_surcharge: 0.0,
                distance_fee: 0.0,
                item_surcharge: 0.0,
                capped: false,
                free_delivery_applied: true,
            },
        });
    }

    let small_order_surcharge = if request.cart_value < schedule.small_order_threshold {
        schedule.small_order_threshold - request.cart_value
    } else {
        0.0
    };

    let mut distance_fee = schedule.base_fee;
    if request.delivery_distance > schedule.base_distance_m && schedule.additional_block_m > 0 {
        let extra = request.delivery_distance - schedule.base_distance_m;
        let blocks = extra.div_ceil(schedule.additional_block_m);
        distance_fee += blocks as f64 * schedule.additional_block_fee;
    }

    let surcharged_items = request
        .item_count
        .saturating_sub(schedule.item_surcharge_start_at.saturating_sub(1));
    let item_surcharge = f64::from(surcharged_items) * schedule.item_surcharge_per_item;

    let raw_total = small_order_surcharge + distance_fee + item_surcharge;
    let capped = raw_total > schedule.max_fee;
    let total_fee = if capped { schedule.max_fee } else { raw_total };

    Ok(FeeQuote {
        total_fee: round_money(total_fee),
        currency: schedule.currency.clone(),
        breakdown: FeeBreakdown {
            small_order_surcharge: round_money(small_order_surcharge),
            distance_fee: round_money(distance_fee),
            item_surcharge: round_money(item_surcharge),
            capped,
            free_delivery_applied: false,
        },
    })
}

fn default_small_order_threshold() -> f64 {
    10.0
}

fn default_base_distance_m() -> u64 {
    1000
}

fn default_base_fee() -> f64 {
    2.0
}

fn default_block_m() -> u64 {
    500
}

fn default_block_fee() -> f64 {
    1.0
}

fn default_surcharge_start() -> u32 {
    5
}

fn default_surcharge_per_item() -> f64 {
    0.5
}

fn default_free_delivery() -> f64 {
    100.0
}

fn default_max_fee() -> f64 {
    15.0
}

fn default_currency() -> String {
    "EUR".to_string()
}
