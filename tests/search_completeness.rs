use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use shop_matcher::catalog::{Catalog, SupplierSpec};
use shop_matcher::search::{
    find_covering_combinations, Requirement, SearchOptions, SearchStrategy,
};

const ITEMS: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

fn random_catalog(rng: &mut StdRng, suppliers: usize) -> Catalog {
    let mut builder = Catalog::builder();
    for idx in 0..suppliers {
        let mut spec = SupplierSpec::new(format!("s{idx}"), format!("Shop {idx}"));
        for item in ITEMS {
            if rng.gen_bool(0.35) {
                spec = spec.with_item(item, "generic", rng.gen_range(1..=20) as f64);
            }
        }
        builder = builder.supplier(spec);
    }
    builder.build().expect("valid catalog")
}

/// Every non-empty subset, tested directly against the inventories.
fn brute_force(catalog: &Catalog, items: &[&str]) -> Vec<Vec<usize>> {
    let n = catalog.len();
    let mut covers = Vec::new();
    for subset in 1u32..(1 << n) {
        let members: Vec<usize> = (0..n).filter(|i| subset & (1 << i) != 0).collect();
        let covered = items.iter().all(|item| {
            members
                .iter()
                .any(|&m| catalog.suppliers()[m].stocks(item))
        });
        if covered {
            covers.push(members);
        }
    }
    covers.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    covers
}

fn search(
    catalog: &Catalog,
    requirement: &Requirement,
    strategy: SearchStrategy,
    parallel: bool,
) -> Vec<Vec<usize>> {
    let options = SearchOptions {
        strategy,
        parallel,
        ..SearchOptions::default()
    };
    find_covering_combinations(catalog, requirement, &options)
        .expect("within budget")
        .into_iter()
        .map(|c| c.members)
        .collect()
}

#[test]
fn every_strategy_matches_brute_force_on_random_catalogs() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for round in 0..40 {
        let suppliers = rng.gen_range(1..=11);
        let catalog = random_catalog(&mut rng, suppliers);
        let wanted = rng.gen_range(1..=4);
        let items: Vec<&str> = ITEMS.choose_multiple(&mut rng, wanted).copied().collect();
        let requirement = Requirement::new(items.iter().copied()).expect("requirement");

        let expected = brute_force(&catalog, &items);
        for strategy in [SearchStrategy::Exhaustive, SearchStrategy::Pruned] {
            for parallel in [false, true] {
                assert_eq!(
                    search(&catalog, &requirement, strategy, parallel),
                    expected,
                    "round {round}: {strategy} parallel={parallel} items={items:?}"
                );
            }
        }
    }
}

#[test]
fn every_returned_combination_covers_the_requirement() {
    let mut rng = StdRng::seed_from_u64(42);
    let catalog = random_catalog(&mut rng, 14);
    let requirement = Requirement::new(["A", "C", "E"]).expect("requirement");
    let found = search(&catalog, &requirement, SearchStrategy::Pruned, true);
    for members in &found {
        for item in requirement.items() {
            assert!(
                members
                    .iter()
                    .any(|&m| catalog.suppliers()[m].stocks(item)),
                "{members:?} misses {item}"
            );
        }
    }
    assert_eq!(found, brute_force(&catalog, &["A", "C", "E"]));
}

#[test]
fn unstocked_item_yields_no_combinations() {
    let mut rng = StdRng::seed_from_u64(9);
    let catalog = random_catalog(&mut rng, 8);
    let requirement = Requirement::new(["A", "Z"]).expect("requirement");
    for strategy in [SearchStrategy::Exhaustive, SearchStrategy::Pruned] {
        assert!(search(&catalog, &requirement, strategy, true).is_empty());
    }
}
