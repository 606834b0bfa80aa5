pub mod fee;

use serde::{Deserialize, Serialize};

use crate::catalog::{GeoPoint, Supplier};

pub const DEFAULT_KM_PER_DEGREE: f64 = 111.0;
pub const DEFAULT_PER_KM_RATE: f64 = 5.0;

/// Flat-earth approximation, fine within a city. Not a geodesic distance.
pub fn distance_km(a: GeoPoint, b: GeoPoint, km_per_degree: f64) -> f64 {
    let dlat = a.latitude - b.latitude;
    let dlon = a.longitude - b.longitude;
    (dlat * dlat + dlon * dlon).sqrt() * km_per_degree
}

pub fn delivery_cost(base_cost: f64, distance_km: f64, demand_factor: f64, per_km_rate: f64) -> f64 {
    base_cost + distance_km * per_km_rate + demand_factor
}

/// Rounds to cents, ties away from zero. The tiny nudge absorbs binary
/// representation error so that e.g. 1.005 rounds to 1.01.
pub fn round_money(value: f64) -> f64 {
    let nudged = value + value.signum() * 1e-9;
    (nudged * 100.0).round() / 100.0
}

pub fn round_km(km: f64) -> f64 {
    (km * 1_000.0).round() / 1_000.0
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CostModel {
    pub km_per_degree: f64,
    pub per_km_rate: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            km_per_degree: DEFAULT_KM_PER_DEGREE,
            per_km_rate: DEFAULT_PER_KM_RATE,
        }
    }
}

impl CostModel {
    pub fn distance_km(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        distance_km(a, b, self.km_per_degree)
    }

    pub fn supplier_delivery(&self, supplier: &Supplier, user: GeoPoint, demand_factor: f64) -> (f64, f64) {
        let distance = self.distance_km(supplier.location(), user);
        let cost = delivery_cost(supplier.base_cost(), distance, demand_factor, self.per_km_rate);
        (distance, cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_scales_degrees_to_km() {
        let a = GeoPoint {
            latitude: 0.0,
            longitude: 0.0,
        };
        let b = GeoPoint {
            latitude: 0.03,
            longitude: 0.04,
        };
        assert!((distance_km(a, b, 111.0) - 5.55).abs() < 1e-9);
        assert_eq!(distance_km(a, a, 111.0), 0.0);
    }

    #[test]
    fn delivery_cost_is_linear_in_distance() {
        assert!((delivery_cost(10.0, 2.0, 0.0, 5.0) - 20.0).abs() < 1e-9);
        assert!((delivery_cost(10.0, 2.0, 3.5, 5.0) - 23.5).abs() < 1e-9);
        // negative surge is passed through untouched
        assert!((delivery_cost(1.0, 0.0, -2.0, 5.0) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn rounds_money_half_away_from_zero() {
        assert_eq!(round_money(1.005), 1.01);
        assert_eq!(round_money(2.675), 2.68);
        assert_eq!(round_money(-1.005), -1.01);
        assert_eq!(round_money(5.0), 5.0);
        assert_eq!(round_money(0.0), 0.0);
        assert_eq!(round_money(3.14159), 3.14);
    }

    #[test]
    fn distances_round_to_metres() {
        assert_eq!(round_km(1.110_000_000_000_000_1), 1.11);
        assert_eq!(round_km(0.001_234_5), 0.001);
        assert_eq!(round_km(2.000_6), 2.001);
    }
}
