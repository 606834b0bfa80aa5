use shop_matcher::catalog::demo::{self, DEFAULT_CENTER};
use shop_matcher::catalog::{Catalog, GeoPoint, SupplierSpec};
use shop_matcher::engine::{
    EngineError, EngineSettings, FulfillmentEngine, FulfillmentRequest, FulfillmentResponse,
};
use shop_matcher::pricing::OverlapPricing;
use shop_matcher::ranking::{CONVENIENCE_REASON, LOWEST_COST_REASON};
use shop_matcher::search::{SearchOptions, SearchStrategy};

const HERE: GeoPoint = GeoPoint {
    latitude: 19.076,
    longitude: 72.8777,
};

fn three_shops() -> Catalog {
    Catalog::builder()
        .supplier(
            SupplierSpec::new("S1", "Shop One")
                .at(HERE.latitude, HERE.longitude)
                .with_item("A", "a-one", 1.0),
        )
        .supplier(
            SupplierSpec::new("S2", "Shop Two")
                .at(HERE.latitude, HERE.longitude)
                .with_item("B", "b-two", 2.0),
        )
        .supplier(
            SupplierSpec::new("S3", "Shop Three")
                .with_base_cost(1.0)
                .at(HERE.latitude, HERE.longitude)
                .with_item("A", "a-three", 1.5)
                .with_item("B", "b-three", 2.5),
        )
        .build()
        .expect("valid catalog")
}

fn engine(overlap: OverlapPricing, strategy: SearchStrategy) -> FulfillmentEngine {
    FulfillmentEngine::new(EngineSettings {
        overlap,
        search: SearchOptions {
            strategy,
            ..SearchOptions::default()
        },
        ..EngineSettings::default()
    })
}

fn supplier_sets(response: &FulfillmentResponse) -> Vec<Vec<String>> {
    response
        .ranked_combinations
        .iter()
        .map(|c| c.suppliers.iter().map(|s| s.supplier_id.clone()).collect())
        .collect()
}

fn assert_well_ranked(response: &FulfillmentResponse) {
    let ranked = &response.ranked_combinations;
    for (idx, combination) in ranked.iter().enumerate() {
        assert_eq!(combination.rank, idx + 1);
        assert_eq!(combination.num_suppliers, combination.suppliers.len());
        assert!(combination.total_medicine_cost >= 0.0);
        assert!(combination.total_delivery_cost >= 0.0);
        assert!(combination.grand_total >= 0.0);
    }
    for pair in ranked.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(
            (a.num_suppliers, a.grand_total) <= (b.num_suppliers, b.grand_total),
            "rank {} before rank {}",
            a.rank,
            b.rank
        );
    }
}

#[test]
fn single_shop_covering_everything_ranks_first() {
    for strategy in [SearchStrategy::Exhaustive, SearchStrategy::Pruned] {
        let response = engine(OverlapPricing::ChargeEverySupplier, strategy)
            .run(&three_shops(), &FulfillmentRequest::new(["A", "B"], HERE))
            .expect("fulfillable");

        assert_eq!(response.requirement_items, vec!["A", "B"]);
        assert_eq!(
            supplier_sets(&response),
            vec![
                vec!["S3"],
                vec!["S1", "S2"],
                vec!["S1", "S3"],
                vec!["S2", "S3"],
                vec!["S1", "S2", "S3"],
            ]
        );
        let best = &response.ranked_combinations[0];
        assert_eq!(best.total_medicine_cost, 4.0);
        assert_eq!(best.total_delivery_cost, 1.0);
        assert_eq!(best.grand_total, 5.0);
        assert_eq!(best.priority_reason, CONVENIENCE_REASON);
        assert_eq!(best.suppliers[0].items.len(), 2);
        assert_well_ranked(&response);
    }
}

#[test]
fn overlapping_stock_is_charged_by_every_shop_by_default() {
    let response = engine(OverlapPricing::ChargeEverySupplier, SearchStrategy::Pruned)
        .run(&three_shops(), &FulfillmentRequest::new(["A", "B"], HERE))
        .expect("fulfillable");
    let everyone = &response.ranked_combinations[4];
    assert_eq!(everyone.num_suppliers, 3);
    // A from S1 and S3, B from S2 and S3
    assert_eq!(everyone.total_medicine_cost, 7.0);
    assert_eq!(everyone.grand_total, 8.0);
    // {S1,S3} charges A twice, {S2,S3} charges B twice
    assert_eq!(response.ranked_combinations[2].grand_total, 6.0);
    assert_eq!(response.ranked_combinations[3].grand_total, 7.0);
}

#[test]
fn cheapest_once_buys_each_item_a_single_time() {
    let response = engine(OverlapPricing::ChargeCheapestOnce, SearchStrategy::Pruned)
        .run(&three_shops(), &FulfillmentRequest::new(["A", "B"], HERE))
        .expect("fulfillable");
    assert_eq!(
        supplier_sets(&response),
        vec![
            vec!["S3"],
            vec!["S1", "S2"],
            vec!["S1", "S3"],
            vec!["S2", "S3"],
            vec!["S1", "S2", "S3"],
        ]
    );
    let grand_totals: Vec<f64> = response
        .ranked_combinations
        .iter()
        .map(|c| c.grand_total)
        .collect();
    assert_eq!(grand_totals, vec![5.0, 3.0, 4.5, 4.5, 4.0]);
    assert_eq!(response.summary.overlap_pricing, OverlapPricing::ChargeCheapestOnce);

    let everyone = &response.ranked_combinations[4];
    assert!(everyone.suppliers[2].items.is_empty());
    assert_well_ranked(&response);
}

#[test]
fn lowest_cost_flag_only_changes_the_label() {
    let engine = FulfillmentEngine::default();
    let convenient = engine
        .run(&three_shops(), &FulfillmentRequest::new(["A", "B"], HERE))
        .expect("fulfillable");
    let cheapest = engine
        .run(
            &three_shops(),
            &FulfillmentRequest {
                prefer_convenience: false,
                ..FulfillmentRequest::new(["A", "B"], HERE)
            },
        )
        .expect("fulfillable");
    assert_eq!(supplier_sets(&convenient), supplier_sets(&cheapest));
    assert!(cheapest
        .ranked_combinations
        .iter()
        .all(|c| c.priority_reason == LOWEST_COST_REASON));
}

#[test]
fn item_nobody_stocks_is_not_fulfillable() {
    let err = FulfillmentEngine::default()
        .run(&three_shops(), &FulfillmentRequest::new(["A", "Q"], HERE))
        .expect_err("not fulfillable");
    assert!(matches!(err, EngineError::NotFulfillable { .. }));
    assert_eq!(err.kind(), "not_fulfillable");
    assert!(err.to_string().contains('Q'));
}

#[test]
fn demo_catalog_results_are_ranked_and_non_negative() {
    let catalog = demo::generate(10, 11, DEFAULT_CENTER).expect("demo catalog");
    let items: Vec<String> = catalog
        .stocked_items()
        .into_iter()
        .take(3)
        .map(str::to_string)
        .collect();
    let user = GeoPoint::new(28.60, 77.22).expect("valid point");
    let request = FulfillmentRequest {
        demand_factor: 2.5,
        ..FulfillmentRequest::new(items, user)
    };

    let pruned = engine(OverlapPricing::ChargeEverySupplier, SearchStrategy::Pruned)
        .run(&catalog, &request)
        .expect("fulfillable");
    let exhaustive = engine(OverlapPricing::ChargeEverySupplier, SearchStrategy::Exhaustive)
        .run(&catalog, &request)
        .expect("fulfillable");

    assert!(!pruned.ranked_combinations.is_empty());
    assert_eq!(pruned.ranked_combinations, exhaustive.ranked_combinations);
    assert_eq!(pruned.summary.catalog_suppliers, 10);
    assert_well_ranked(&pruned);
}
