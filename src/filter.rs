//! Loot filter rule generation.
//!
//! Every priced item gets five `Show` rules, one per value tier, each matching
//! the smallest stack of that item worth the tier's price, followed by a
//! `Hide` rule that catches the stacks worth less than all of them.

use crate::{
    config::Config,
    prices::{Category, PriceTable, ReferencePrices},
};

/// Value tiers, from most to least valuable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    HalfDivine,
    Exalted,
    FiveChaos,
    OneChaos,
    SubOneChaos,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::HalfDivine,
        Tier::Exalted,
        Tier::FiveChaos,
        Tier::OneChaos,
        Tier::SubOneChaos,
    ];

    /// Written in the comment line heading the rule.
    pub fn label(self) -> &'static str {
        match self {
            Tier::HalfDivine => "Half Div Tier",
            Tier::Exalted => "Exalted Tier",
            Tier::FiveChaos => "5 Chaos Tier",
            Tier::OneChaos => "1 Chaos Tier",
            Tier::SubOneChaos => "Sub 1 Chaos Tier",
        }
    }

    /// Name of the configured style applied to the rule.
    pub fn style_key(self) -> &'static str {
        match self {
            Tier::HalfDivine => "Divine",
            Tier::Exalted => "Exalted",
            Tier::FiveChaos => "5 Chaos",
            Tier::OneChaos => "1 Chaos",
            Tier::SubOneChaos => "Sub 1 Chaos",
        }
    }

    /// Smallest stack of an item worth `value` chaos that reaches this tier.
    ///
    /// Worthless items never reach a tier, so their thresholds saturate at
    /// `i64::MAX`, as do those of items too cheap for any stack to count.
    pub fn stack_size(self, prices: &ReferencePrices, multiplier: f64, value: f64) -> i64 {
        if value == 0.0 {
            return i64::MAX;
        }

        match self {
            Tier::HalfDivine => ceil_stack_size(0.5 * prices.divine, value),
            Tier::Exalted => ceil_stack_size(prices.exalted, value),
            Tier::FiveChaos => ceil_stack_size(5.0 * prices.chaos, value),
            Tier::OneChaos => ceil_stack_size(prices.chaos, value),
            // Always one above the floor, even when the division is exact.
            Tier::SubOneChaos => {
                ((multiplier * prices.chaos / value).floor() as i64).saturating_add(1)
            }
        }
    }
}

/// `numerator / value` rounded up, checking exactness against the numerator.
fn ceil_stack_size(numerator: f64, value: f64) -> i64 {
    let mut size = (numerator / value).floor() as i64;
    if size as f64 * value != numerator {
        size = size.saturating_add(1);
    }
    size
}

/// Decides which item names are left out of the filter.
///
/// Some listings are near-duplicates of other items (the essence tiers below
/// `Screaming`, for example) and only clutter the output.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    excluded: Vec<String>,
}

impl NameFilter {
    /// Excludes every name containing one of `substrings`, case-sensitively.
    pub fn new(substrings: impl IntoIterator<Item = String>) -> Self {
        let excluded = substrings
            .into_iter()
            .filter(|substring| !substring.is_empty())
            .collect();
        Self { excluded }
    }

    /// Keeps every name.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        !self.excluded.is_empty()
    }

    pub fn excludes(&self, name: &str) -> bool {
        self.excluded
            .iter()
            .any(|substring| name.contains(substring.as_str()))
    }
}

impl From<&Config> for NameFilter {
    fn from(config: &Config) -> Self {
        if config.excluded_names.is_empty() {
            return Self::disabled();
        }
        Self::new(config.excluded_names.iter().cloned())
    }
}

/// Generates the filter rules for every item in `table`.
///
/// Each rule is its own block. Items come out category by category in
/// [`Category::ALL`] order, six blocks per item.
pub fn generate_blocks(
    config: &Config,
    table: &PriceTable,
    prices: &ReferencePrices,
    names: &NameFilter,
) -> Vec<String> {
    let mut blocks = Vec::new();
    if table.is_empty() {
        tracing::debug!("Price table is empty, no rules to generate");
        return blocks;
    }

    for category in Category::ALL {
        let Some(items) = table.category(category) else {
            tracing::debug!("No prices for {category}, skipping");
            continue;
        };

        for (name, &value) in items {
            if names.excludes(name) {
                tracing::trace!("Excluding {name} by name");
                continue;
            }
            if !(value.is_finite() && value >= 0.0) {
                tracing::debug!("Skipping {name}, unusable price {value}");
                continue;
            }

            for tier in Tier::ALL {
                let stack_size = tier.stack_size(prices, config.price_multiplier, value);
                blocks.push(show_block(tier, name, stack_size, config.style(tier.style_key())));
            }
            blocks.push(hide_block(name));
        }
    }

    blocks
}

/// Joins generated blocks into filter text.
pub fn render_blocks(blocks: &[String]) -> String {
    blocks.concat()
}

fn show_block(tier: Tier, name: &str, stack_size: i64, style: &[String]) -> String {
    let mut block = format!(
        "\n## {} ##\nShow\nBaseType == \"{name}\"\nStackSize >= {stack_size}\n",
        tier.label()
    );
    for line in style {
        block.push_str(line);
    }
    block
}

fn hide_block(name: &str) -> String {
    format!("\nHide\nBaseType == \"{name}\"\n")
}
