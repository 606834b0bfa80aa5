pub mod exhaustive;
pub mod pruned;

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::catalog::Catalog;

pub const MAX_REQUIREMENT_ITEMS: usize = 128;

pub type CoverMask = u128;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SearchError {
    #[error("search budget exceeded after {elapsed_ms} ms (limit {limit_ms} ms)")]
    BudgetExceeded { elapsed_ms: u64, limit_ms: u64 },
    #[error("more than {limit} covering combinations")]
    TooManyCandidates { limit: usize },
    #[error("catalog has {suppliers} suppliers; exhaustive search is limited to {limit}")]
    CatalogTooLarge { suppliers: usize, limit: usize },
    #[error("requirement has {count} distinct items; at most {limit} are supported")]
    TooManyItems { count: usize, limit: usize },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    Exhaustive,
    #[default]
    Pruned,
}

impl SearchStrategy {
    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Exhaustive => "exhaustive",
            Self::Pruned => "pruned",
        }
    }
}

impl Display for SearchStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_slug())
    }
}

#[derive(Debug, Error)]
#[error("unknown search strategy: {0}")]
pub struct StrategyParseError(pub String);

impl FromStr for SearchStrategy {
    type Err = StrategyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exhaustive" | "naive" => Ok(Self::Exhaustive),
            "pruned" | "branch-and-bound" => Ok(Self::Pruned),
            _ => Err(StrategyParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    items: Vec<String>,
}

impl Requirement {
    pub fn new<I, S>(items: I) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut distinct = Vec::new();
        for item in items {
            let item = item.as_ref();
            if seen.insert(item.to_string()) {
                distinct.push(item.to_string());
            }
        }
        if distinct.len() > MAX_REQUIREMENT_ITEMS {
            return Err(SearchError::TooManyItems {
                count: distinct.len(),
                limit: MAX_REQUIREMENT_ITEMS,
            });
        }
        Ok(Self { items: distinct })
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn full_mask(&self) -> CoverMask {
        match self.items.len() {
            0 => 0,
            MAX_REQUIREMENT_ITEMS => CoverMask::MAX,
            n => (1 << n) - 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub members: Vec<usize>,
}

impl Candidate {
    pub fn new(members: Vec<usize>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn supplier_ids<'a>(&self, catalog: &'a Catalog) -> Vec<&'a str> {
        self.members
            .iter()
            .filter_map(|idx| catalog.suppliers().get(*idx))
            .map(|s| s.id())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchBudget {
    pub timeout: Option<Duration>,
    pub max_combinations: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub strategy: SearchStrategy,
    pub parallel: bool,
    pub exhaustive_max_suppliers: usize,
    pub budget: SearchBudget,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::Pruned,
            parallel: true,
            exhaustive_max_suppliers: 24,
            budget: SearchBudget::default(),
        }
    }
}

const STOP_NONE: u8 = 0;
const STOP_TIMEOUT: u8 = 1;
const STOP_TOO_MANY: u8 = 2;

// first worker to hit a limit records why; the rest unwind on their next check
#[derive(Debug)]
pub(crate) struct Budget {
    started: Instant,
    deadline: Option<Instant>,
    limit: SearchBudget,
    found: AtomicUsize,
    stop: AtomicU8,
}

impl Budget {
    pub(crate) fn start(limit: SearchBudget) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: limit.timeout.map(|t| started + t),
            limit,
            found: AtomicUsize::new(0),
            stop: AtomicU8::new(STOP_NONE),
        }
    }

    pub(crate) fn check(&self) -> Result<(), SearchError> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                self.stop.store(STOP_TIMEOUT, Ordering::Relaxed);
            }
        }
        self.stopped()
    }

    pub(crate) fn stopped(&self) -> Result<(), SearchError> {
        match self.stop.load(Ordering::Relaxed) {
            STOP_NONE => Ok(()),
            STOP_TOO_MANY => Err(SearchError::TooManyCandidates {
                limit: self.limit.max_combinations.unwrap_or(usize::MAX),
            }),
            _ => Err(SearchError::BudgetExceeded {
                elapsed_ms: self.started.elapsed().as_millis() as u64,
                limit_ms: self.limit.timeout.map(|t| t.as_millis() as u64).unwrap_or(0),
            }),
        }
    }

    pub(crate) fn record(&self) -> Result<(), SearchError> {
        let found = self.found.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(max) = self.limit.max_combinations {
            if found > max {
                self.stop.store(STOP_TOO_MANY, Ordering::Relaxed);
            }
        }
        self.stopped()
    }
}

pub fn coverage_masks(catalog: &Catalog, requirement: &Requirement) -> Vec<CoverMask> {
    catalog
        .suppliers()
        .iter()
        .map(|supplier| {
            requirement
                .items()
                .iter()
                .enumerate()
                .filter(|(_, item)| supplier.stocks(item))
                .fold(CoverMask::default(), |mask, (bit, _)| mask | (1 << bit))
        })
        .collect()
}

pub fn uncovered_items(catalog: &Catalog, requirement: &Requirement) -> Vec<String> {
    requirement
        .items()
        .iter()
        .filter(|item| !catalog.suppliers().iter().any(|s| s.stocks(item)))
        .cloned()
        .collect()
}

/// Every non-empty subset of the catalog whose members jointly stock all
/// required items, ordered by size and then by member indices.
pub fn find_covering_combinations(
    catalog: &Catalog,
    requirement: &Requirement,
    options: &SearchOptions,
) -> Result<Vec<Candidate>, SearchError> {
    let masks = coverage_masks(catalog, requirement);
    let full = requirement.full_mask();
    let budget = Budget::start(options.budget);

    let mut candidates = match options.strategy {
        SearchStrategy::Exhaustive => {
            exhaustive::enumerate(&masks, full, options.exhaustive_max_suppliers, &budget)?
        }
        SearchStrategy::Pruned => pruned::enumerate(&masks, full, options.parallel, &budget)?,
    };
    sort_candidates(&mut candidates);

    debug!(
        strategy = %options.strategy,
        suppliers = catalog.len(),
        items = requirement.len(),
        candidates = candidates.len(),
        "feasibility search finished"
    );
    Ok(candidates)
}

pub(crate) fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        a.members
            .len()
            .cmp(&b.members.len())
            .then_with(|| a.members.cmp(&b.members))
    });
}
