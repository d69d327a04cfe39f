//! Item categories and the chaos-denominated price table.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Item categories that get filter rules, in generation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Currency,
    Fragments,
    Scarabs,
    Fossils,
    Essences,
}

/// Which poe.ninja overview lists a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overview {
    Currency,
    Item,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Currency,
        Category::Fragments,
        Category::Scarabs,
        Category::Fossils,
        Category::Essences,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Currency => "Currency",
            Category::Fragments => "Fragments",
            Category::Scarabs => "Scarabs",
            Category::Fossils => "Fossils",
            Category::Essences => "Essences",
        }
    }

    pub fn overview(self) -> Overview {
        match self {
            Category::Currency | Category::Fragments => Overview::Currency,
            Category::Scarabs | Category::Fossils | Category::Essences => Overview::Item,
        }
    }

    /// The `type` query parameter the market API expects.
    pub fn api_type(self) -> &'static str {
        match self {
            Category::Currency => "Currency",
            Category::Fragments => "Fragment",
            Category::Scarabs => "Scarab",
            Category::Fossils => "Fossil",
            Category::Essences => "Essence",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Item prices per category, in chaos orbs.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    categories: HashMap<Category, BTreeMap<String, f64>>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: Category, item: impl Into<String>, value: f64) {
        self.categories
            .entry(category)
            .or_default()
            .insert(item.into(), value);
    }

    pub fn category(&self, category: Category) -> Option<&BTreeMap<String, f64>> {
        self.categories.get(&category)
    }

    pub fn get(&self, category: Category, item: &str) -> Option<f64> {
        self.category(category)?.get(item).copied()
    }

    /// Total number of priced items over all categories.
    pub fn len(&self) -> usize {
        self.categories.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The currencies the tier thresholds are measured against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePrices {
    pub chaos: f64,
    pub exalted: f64,
    pub divine: f64,
}

impl ReferencePrices {
    pub const CHAOS: f64 = 1.0;

    pub fn new(exalted: f64, divine: f64) -> Self {
        Self {
            chaos: Self::CHAOS,
            exalted,
            divine,
        }
    }

    /// Reads the exalted and divine prices off the currency listing.
    ///
    /// Either one missing from the table is priced at zero.
    pub fn from_table(table: &PriceTable) -> Self {
        let exalted = table.get(Category::Currency, "Exalted Orb");
        let divine = table.get(Category::Currency, "Divine Orb");
        if exalted.is_none() || divine.is_none() {
            tracing::warn!(
                "Reference currency missing from price table (exalted: {exalted:?}, divine: {divine:?})"
            );
        }

        Self::new(exalted.unwrap_or(0.0), divine.unwrap_or(0.0))
    }
}
