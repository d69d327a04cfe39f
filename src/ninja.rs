//! poe.ninja market data client.

use crate::prices::{Category, Overview, PriceTable};
use anyhow::{Context, bail};
use serde::Deserialize;
use std::{collections::BTreeMap, time::Duration};
use url::Url;

const BASE_URL: &str = "https://poe.ninja/api/data";

/// The body of both overview endpoints.
#[derive(Debug, Deserialize)]
struct OverviewResponse<T> {
    lines: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrencyLine {
    currency_type_name: String,
    chaos_equivalent: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemLine {
    name: String,
    chaos_value: f64,
}

pub struct NinjaClient {
    client: reqwest::Client,
    base_url: String,
}

impl NinjaClient {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches the prices of every category for `league`.
    ///
    /// Fails if any category can't be fetched or comes back empty, since a
    /// partial table would hide items that are still worth picking up.
    pub async fn fetch_price_table(&self, league: &str) -> anyhow::Result<PriceTable> {
        let mut table = PriceTable::new();

        for category in Category::ALL {
            let items = self
                .fetch_category(league, category)
                .await
                .with_context(|| format!("Failed to fetch {category} prices"))?;

            if items.is_empty() {
                bail!("No {category} prices listed for league {league:?}");
            }
            tracing::info!("Found {} {category}", items.len());

            for (name, value) in items {
                table.insert(category, name, value);
            }
        }

        Ok(table)
    }

    /// Fetches one category, item name to chaos value.
    pub async fn fetch_category(
        &self,
        league: &str,
        category: Category,
    ) -> anyhow::Result<BTreeMap<String, f64>> {
        let url = self.overview_url(league, category)?;
        tracing::debug!("Retrieving {category} prices from {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to HTTP GET overview")?
            .error_for_status()
            .context("Market API returned an error")?;

        let content = response.text().await.context("No text in response")?;

        parse_overview(category, &content)
    }

    fn overview_url(&self, league: &str, category: Category) -> anyhow::Result<Url> {
        let endpoint = match category.overview() {
            Overview::Currency => "currencyoverview",
            Overview::Item => "itemoverview",
        };

        Url::parse_with_params(
            &format!("{}/{endpoint}", self.base_url),
            &[("league", league), ("type", category.api_type())],
        )
        .context("Failed to build overview URL")
    }
}

fn parse_overview(category: Category, content: &str) -> anyhow::Result<BTreeMap<String, f64>> {
    let prices = match category.overview() {
        Overview::Currency => {
            let overview: OverviewResponse<CurrencyLine> =
                serde_json::from_str(content).context("Failed to parse currency overview")?;
            overview
                .lines
                .into_iter()
                .map(|line| (line.currency_type_name, line.chaos_equivalent))
                .collect()
        }
        Overview::Item => {
            let overview: OverviewResponse<ItemLine> =
                serde_json::from_str(content).context("Failed to parse item overview")?;
            overview
                .lines
                .into_iter()
                .map(|line| (line.name, line.chaos_value))
                .collect()
        }
    };

    Ok(prices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_url() {
        let client = NinjaClient::new().unwrap();

        let url = client
            .overview_url("Settlers of Kalguur", Category::Currency)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://poe.ninja/api/data/currencyoverview?league=Settlers+of+Kalguur&type=Currency"
        );

        let url = client.overview_url("Standard", Category::Fossils).unwrap();
        assert_eq!(
            url.as_str(),
            "https://poe.ninja/api/data/itemoverview?league=Standard&type=Fossil"
        );
    }

    #[test]
    fn test_parse_currency_overview() {
        let content = r#"{
            "lines": [
                {
                    "currencyTypeName": "Divine Orb",
                    "pay": {"id": 1, "value": 0.0055},
                    "receive": {"id": 2, "value": 181.0},
                    "chaosEquivalent": 180.5,
                    "detailsId": "divine-orb"
                },
                {
                    "currencyTypeName": "Exalted Orb",
                    "chaosEquivalent": 12.25,
                    "detailsId": "exalted-orb"
                }
            ],
            "currencyDetails": []
        }"#;

        let prices = parse_overview(Category::Currency, content).unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices["Divine Orb"], 180.5);
        assert_eq!(prices["Exalted Orb"], 12.25);
    }

    #[test]
    fn test_parse_item_overview() {
        let content = r#"{
            "lines": [
                {
                    "id": 7,
                    "name": "Deafening Essence of Greed",
                    "baseType": "Deafening Essence of Greed",
                    "stackSize": 9,
                    "chaosValue": 4.0,
                    "divineValue": 0.02,
                    "listingCount": 120
                }
            ]
        }"#;

        let prices = parse_overview(Category::Essences, content).unwrap();
        assert_eq!(prices["Deafening Essence of Greed"], 4.0);
    }

    #[test]
    fn test_parse_overview_rejects_garbage() {
        assert!(parse_overview(Category::Scarabs, "<html>rate limited</html>").is_err());
        assert!(parse_overview(Category::Currency, r#"{"lines": [{"name": "x"}]}"#).is_err());
    }
}
