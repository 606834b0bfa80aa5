use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cost::fee::FeeSchedule;
use crate::cost::{CostModel, DEFAULT_KM_PER_DEGREE, DEFAULT_PER_KM_RATE};
use crate::engine::EngineSettings;
use crate::pricing::OverlapPricing;
use crate::search::{SearchBudget, SearchOptions, SearchStrategy, MAX_REQUIREMENT_ITEMS};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub cost: CostConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub delivery_fee: FeeSchedule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_demo_shops")]
    pub demo_shops: usize,
    #[serde(default = "default_demo_seed")]
    pub demo_seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostConfig {
    #[serde(default = "default_km_per_degree")]
    pub km_per_degree: f64,
    #[serde(default = "default_per_km_rate")]
    pub per_km_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub strategy: SearchStrategy,
    // 0 disables the deadline, likewise the cap
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_combinations")]
    pub max_combinations: usize,
    #[serde(default = "default_true")]
    pub parallel: bool,
    #[serde(default = "default_max_requirement_items")]
    pub max_requirement_items: usize,
    #[serde(default = "default_exhaustive_max_suppliers")]
    pub exhaustive_max_suppliers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PricingConfig {
    #[serde(default)]
    pub overlap: OverlapPricing,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<String>,
    pub timeout_ms: Option<u64>,
    pub overlap: Option<OverlapPricing>,
    pub strategy: Option<SearchStrategy>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/shop-matcher/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(path) = overrides.catalog_path {
            self.catalog.path = Some(path);
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            self.search.timeout_ms = timeout_ms;
        }
        if let Some(overlap) = overrides.overlap {
            self.pricing.overlap = overlap;
        }
        if let Some(strategy) = overrides.strategy {
            self.search.strategy = strategy;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_catalog_path(&self) -> Option<PathBuf> {
        self.catalog.path.as_deref().map(expand_tilde)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            search: SearchOptions {
                strategy: self.search.strategy,
                parallel: self.search.parallel,
                exhaustive_max_suppliers: self.search.exhaustive_max_suppliers,
                budget: SearchBudget {
                    timeout: (self.search.timeout_ms > 0)
                        .then(|| Duration::from_millis(self.search.timeout_ms)),
                    max_combinations: (self.search.max_combinations > 0)
                        .then_some(self.search.max_combinations),
                },
            },
            cost_model: CostModel {
                km_per_degree: self.cost.km_per_degree,
                per_km_rate: self.cost.per_km_rate,
            },
            overlap: self.pricing.overlap,
            max_requirement_items: self.search.max_requirement_items.min(MAX_REQUIREMENT_ITEMS),
        }
    }

    pub fn default_template() -> String {
        let template = r#"[server]
host = "127.0.0.1"
port = 3002

[catalog]
# JSON catalog file; a seeded demo catalog is used when unset
# path = "~/.local/share/shop-matcher/catalog.json"
demo_shops = 6
demo_seed = 7

[cost]
km_per_degree = 111.0
per_km_rate = 5.0

[search]
strategy = "pruned"          # or "exhaustive"
timeout_ms = 2000            # 0 disables the deadline
max_combinations = 250000    # 0 disables the cap
parallel = true
max_requirement_items = 128
exhaustive_max_suppliers = 24

[pricing]
# "charge_every_supplier" sums the price of every shop in a combination that
# stocks an item; "charge_cheapest_once" buys it once from the cheapest.
overlap = "charge_every_supplier"

[delivery_fee]
small_order_threshold = 10.0
base_distance_m = 1000
base_fee = 2.0
additional_block_m = 500
additional_block_fee = 1.0
item_surcharge_start_at = 5
item_surcharge_per_item = 0.5
free_delivery_cart_value = 100.0
max_fee = 15.0
currency = "EUR"
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            demo_shops: default_demo_shops(),
            demo_seed: default_demo_seed(),
        }
    }
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            km_per_degree: default_km_per_degree(),
            per_km_rate: default_per_km_rate(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::default(),
            timeout_ms: default_timeout_ms(),
            max_combinations: default_max_combinations(),
            parallel: true,
            max_requirement_items: default_max_requirement_items(),
            exhaustive_max_suppliers: default_exhaustive_max_suppliers(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3002
}

fn default_demo_shops() -> usize {
    6
}

fn default_demo_seed() -> u64 {
    7
}

fn default_km_per_degree() -> f64 {
    DEFAULT_KM_PER_DEGREE
}

fn default_per_km_rate() -> f64 {
    DEFAULT_PER_KM_RATE
}

fn default_timeout_ms() -> u64 {
    2_000
}

fn default_max_combinations() -> usize {
    250_000
}

fn default_max_requirement_items() -> usize {
    MAX_REQUIREMENT_ITEMS
}

fn default_exhaustive_max_suppliers() -> usize {
    24
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_to_defaults() {
        let parsed: Config = toml::from_str(&Config::default_template()).expect("template parses");
        let defaults = Config::default();
        assert_eq!(parsed.server.port, defaults.server.port);
        assert_eq!(parsed.search.timeout_ms, defaults.search.timeout_ms);
        assert_eq!(parsed.search.strategy, SearchStrategy::Pruned);
        assert_eq!(parsed.pricing.overlap, OverlapPricing::ChargeEverySupplier);
        assert_eq!(parsed.delivery_fee, FeeSchedule::default());
        assert!(parsed.catalog.path.is_none());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
[pricing]
overlap = "charge_cheapest_once"

[search]
timeout_ms = 0
"#,
        )
        .expect("parses");
        assert_eq!(parsed.pricing.overlap, OverlapPricing::ChargeCheapestOnce);
        let settings = parsed.engine_settings();
        assert!(settings.search.budget.timeout.is_none());
        assert_eq!(settings.search.budget.max_combinations, Some(250_000));
        assert_eq!(settings.cost_model, CostModel::default());
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut config = Config::default();
        config.apply_overrides(ConfigOverrides {
            catalog_path: Some("/tmp/catalog.json".to_string()),
            timeout_ms: Some(50),
            overlap: Some(OverlapPricing::ChargeCheapestOnce),
            strategy: Some(SearchStrategy::Exhaustive),
        });
        let settings = config.engine_settings();
        assert_eq!(
            settings.search.budget.timeout,
            Some(Duration::from_millis(50))
        );
        assert_eq!(settings.search.strategy, SearchStrategy::Exhaustive);
        assert_eq!(settings.overlap, OverlapPricing::ChargeCheapestOnce);
        assert_eq!(
            config.resolved_catalog_path(),
            Some(PathBuf::from("/tmp/catalog.json"))
        );
    }
}
