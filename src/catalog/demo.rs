use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::catalog::{Catalog, CatalogError, GeoPoint, SupplierSpec};

const SALTS: [(&str, [&str; 3]); 8] = [
    ("Paracetamol", ["Calpol", "Dolo", "Crocin"]),
    ("Amoxicillin", ["Mox", "Novamox", "Amoxil"]),
    ("Cetirizine", ["Zyrtec", "Okacet", "Alerid"]),
    ("Ibuprofen", ["Brufen", "Ibugesic", "Advil"]),
    ("Azithromycin", ["Azithral", "Azee", "Zithromax"]),
    ("Pantoprazole", ["Pan", "Pantocid", "Protonix"]),
    ("Metformin", ["Glycomet", "Glucophage", "Obimet"]),
    ("Amlodipine", ["Amlong", "Norvasc", "Amlopres"]),
];

const CHAINS: [&str; 5] = [
    "Jan Aushadhi",
    "DavaIndia",
    "Zeelab",
    "Apollo Pharmacy",
    "MedPlus",
];

pub const DEFAULT_CENTER: GeoPoint = GeoPoint {
    latitude: 28.6139,
    longitude: 77.2090,
};

pub fn salt_names() -> Vec<&'static str> {
    SALTS.iter().map(|(salt, _)| *salt).collect()
}

pub fn generate(shops: usize, seed: u64, center: GeoPoint) -> Result<Catalog, CatalogError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut specs = Vec::with_capacity(shops);

    for idx in 0..shops {
        let chain = CHAINS[idx % CHAINS.len()];
        let latitude = (center.latitude + rng.gen_range(-0.05..=0.05)).clamp(-90.0, 90.0);
        let longitude = (center.longitude + rng.gen_range(-0.05..=0.05)).clamp(-180.0, 180.0);
        let base_cost = round_cents(rng.gen_range(0.0..=30.0));

        let mut spec = SupplierSpec::new(
            format!("shop-{:02}", idx + 1),
            format!("{chain} #{}", idx / CHAINS.len() + 1),
        )
        .with_base_cost(base_cost)
        .at(latitude, longitude);

        let stocked = rng.gen_range(2..=6usize);
        for (salt, brands) in SALTS.choose_multiple(&mut rng, stocked) {
            let brand = brands.choose(&mut rng).copied().unwrap_or(brands[0]);
            let price = round_cents(rng.gen_range(5.0..=60.0));
            spec = spec.with_item(*salt, brand, price);
        }
        specs.push(spec);
    }

    Catalog::builder().suppliers(specs).build()
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
