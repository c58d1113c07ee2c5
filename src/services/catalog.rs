//! Catalog browsing: search with filters and sort orders, query suggestions,
//! recent searches and the deals list.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::domain::aggregates::Product;
use crate::domain::value_objects::ProductId;
use crate::repository::ProductRepository;
use crate::services::latency::{Cancellation, SimulatedLatency};
use crate::{Result, StorefrontError};

const SUGGESTION_SUFFIXES: [&str; 5] = ["pro", "wireless", "premium", "bluetooth", "ultra"];
const RECENT_SEARCHES: usize = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Catalog order.
    #[default]
    Featured,
    PriceLowHigh,
    PriceHighLow,
    Rating,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "featured" => Ok(Self::Featured),
            "price-low-high" => Ok(Self::PriceLowHigh),
            "price-high-low" => Ok(Self::PriceHighLow),
            "rating" => Ok(Self::Rating),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Empty means every category.
    pub categories: Vec<String>,
    pub sort: SortOrder,
}

impl SearchQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Self::default() }
    }

    pub fn sorted(mut self, sort: SortOrder) -> Self { self.sort = sort; self }

    pub fn price_between(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    fn admits(&self, product: &Product) -> bool {
        let price = product.price().amount();
        product.matches(self.text.trim())
            && self.min_price.map_or(true, |min| price >= min)
            && self.max_price.map_or(true, |max| price <= max)
            && (self.categories.is_empty() || self.categories.iter().any(|c| c.eq_ignore_ascii_case(product.category())))
    }
}

/// Most recent first, no duplicates, at most five.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RecentSearches(VecDeque<String>);

impl RecentSearches {
    pub fn record(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() { return; }
        self.0.retain(|q| q != query);
        self.0.push_front(query.to_string());
        self.0.truncate(RECENT_SEARCHES);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> { self.0.iter().map(String::as_str) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn clear(&mut self) { self.0.clear() }
}

/// Completions offered while typing.
pub fn suggestions(query: &str) -> Vec<String> {
    let query = query.trim();
    if query.is_empty() { return Vec::new(); }
    SUGGESTION_SUFFIXES.iter()
        .map(|suffix| format!("{query} {suffix}"))
        .filter(|s| !s.eq_ignore_ascii_case(query))
        .collect()
}

pub struct CatalogService<R: ProductRepository> {
    products: Arc<R>,
    latency: SimulatedLatency,
    cancellation: Cancellation,
    recent: Mutex<RecentSearches>,
}

impl<R: ProductRepository> CatalogService<R> {
    pub fn new(products: Arc<R>, latency: SimulatedLatency) -> Self {
        Self { products, latency, cancellation: Cancellation::new(), recent: Mutex::new(RecentSearches::default()) }
    }

    /// Abandons a pending search; a newer query supersedes it.
    pub fn cancel(&self) { self.cancellation.cancel() }

    /// Blank text finds nothing and skips the round trip.
    #[instrument(skip(self, query), fields(text = %query.text))]
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Product>> {
        if query.text.trim().is_empty() { return Ok(Vec::new()); }
        self.cancellation.guard(self.latency.round_trip()).await?;
        self.recent.lock().await.record(&query.text);

        let mut hits: Vec<Product> = self.products.list().await?.into_iter().filter(|p| query.admits(p)).collect();
        match query.sort {
            SortOrder::Featured => {}
            SortOrder::PriceLowHigh => hits.sort_by_key(|p| p.price().amount()),
            SortOrder::PriceHighLow => hits.sort_by_key(|p| Reverse(p.price().amount())),
            SortOrder::Rating => hits.sort_by_key(|p| Reverse(p.rating())),
        }
        debug!(hits = hits.len(), "search finished");
        Ok(hits)
    }

    pub async fn recent_searches(&self) -> Vec<String> {
        self.recent.lock().await.iter().map(str::to_string).collect()
    }

    pub async fn clear_recent_searches(&self) { self.recent.lock().await.clear() }

    pub async fn find(&self, id: &ProductId) -> Result<Product> {
        self.products.find(id).await?.ok_or_else(|| StorefrontError::ProductNotFound(id.clone()))
    }

    /// Products below their compare-at price, largest percentage off first.
    pub async fn deals(&self) -> Result<Vec<Product>> {
        let mut deals: Vec<Product> = self.products.list().await?.into_iter().filter(Product::is_on_sale).collect();
        deals.sort_by_key(|p| Reverse(p.percent_off()));
        Ok(deals)
    }

    /// Distinct categories in catalog order.
    pub async fn categories(&self) -> Result<Vec<String>> {
        let mut categories: Vec<String> = Vec::new();
        for product in self.products.list().await? {
            if !categories.iter().any(|c| c == product.category()) {
                categories.push(product.category().to_string());
            }
        }
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryCatalog;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn catalog() -> CatalogService<InMemoryCatalog> {
        CatalogService::new(Arc::new(InMemoryCatalog::techhub()), SimulatedLatency::default())
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id().as_str()).collect()
    }

    #[tokio::test]
    async fn test_search_matches_name_and_category() {
        let catalog = catalog();
        let hits = catalog.search(&SearchQuery::text("WIRELESS")).await.unwrap();
        assert_eq!(ids(&hits), vec!["2", "5", "10"]);
        let audio = catalog.search(&SearchQuery::text("audio")).await.unwrap();
        assert_eq!(ids(&audio), vec!["2", "7", "10"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_query_finds_nothing() {
        let catalog = CatalogService::new(
            Arc::new(InMemoryCatalog::techhub()),
            SimulatedLatency::new(Duration::from_millis(800)),
        );
        let start = tokio::time::Instant::now();
        assert!(catalog.search(&SearchQuery::text("   ").in_category("audio")).await.unwrap().is_empty());
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(catalog.recent_searches().await.is_empty());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("price-high-low".parse::<SortOrder>().unwrap(), SortOrder::PriceHighLow);
        assert_eq!("rating".parse::<SortOrder>().unwrap(), SortOrder::Rating);
        assert!("cheapest".parse::<SortOrder>().is_err());
    }

    #[tokio::test]
    async fn test_filters_and_sorting() {
        let query = SearchQuery::text("audio")
            .in_category("audio")
            .price_between(Some(dec!(100)), None)
            .sorted(SortOrder::PriceHighLow);
        let hits = catalog().search(&query).await.unwrap();
        assert_eq!(ids(&hits), vec!["2", "7"]);

        let by_rating = catalog().search(&SearchQuery::text("smart").sorted(SortOrder::Rating)).await.unwrap();
        assert_eq!(by_rating[0].id().as_str(), "4");
    }

    #[tokio::test]
    async fn test_recent_searches_are_capped_and_deduplicated() {
        let catalog = catalog();
        for text in ["a", "b", "c", "d", "e", "b", "f", "  "] {
            catalog.search(&SearchQuery::text(text)).await.unwrap();
        }
        assert_eq!(catalog.recent_searches().await, vec!["f", "b", "e", "d", "c"]);
        catalog.clear_recent_searches().await;
        assert!(catalog.recent_searches().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_waits_and_can_be_cancelled() {
        let catalog = Arc::new(CatalogService::new(
            Arc::new(InMemoryCatalog::techhub()),
            SimulatedLatency::new(Duration::from_millis(800)),
        ));
        let pending = tokio::spawn({
            let catalog = catalog.clone();
            async move { catalog.search(&SearchQuery::text("laptop")).await }
        });
        tokio::time::sleep(Duration::from_millis(200)).await;
        catalog.cancel();
        assert!(matches!(pending.await.unwrap(), Err(StorefrontError::Cancelled)));
        assert!(catalog.recent_searches().await.is_empty());
    }

    #[test]
    fn test_suggestions() {
        assert_eq!(
            suggestions("headphones"),
            vec!["headphones pro", "headphones wireless", "headphones premium", "headphones bluetooth", "headphones ultra"]
        );
        assert!(suggestions("   ").is_empty());
    }

    #[tokio::test]
    async fn test_deals_best_first() {
        let deals = catalog().deals().await.unwrap();
        assert_eq!(deals.len(), 10);
        assert!(deals.iter().all(Product::is_on_sale));
        assert_eq!(deals[0].id().as_str(), "9");
        assert_eq!(deals[0].percent_off(), Some(40));
    }

    #[tokio::test]
    async fn test_find_missing_product() {
        let catalog = catalog();
        assert_eq!(catalog.find(&"4".into()).await.unwrap().name(), "Premium Smartphone X");
        assert!(matches!(catalog.find(&"404".into()).await, Err(StorefrontError::ProductNotFound(_))));
        assert_eq!(catalog.categories().await.unwrap()[..3], ["Laptops", "Audio", "TVs"]);
    }
}
