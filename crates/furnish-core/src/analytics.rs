//! Analytics snapshot and the chart-ready series derived from it.
//!
//! A snapshot is fetched once per page load and never mutated. The derived
//! series are a pure function of it, computed when the snapshot arrives and
//! stored next to it in [`AnalyticsView::Loaded`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::Backend;

/// Label shown when there is no top brand to report
pub const NOT_AVAILABLE: &str = "N/A";

const CATEGORY_LABEL_WORDS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandCount {
    pub brand: String,
    pub count: u64,
}

/// One aggregate result from `GET /api/analytics`
///
/// Collections are read entry by entry: an entry that does not fit (a `null`
/// price, a fractional count, a missing name) is skipped, and a collection
/// that is missing or of the wrong shape reads as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub total_products: u64,
    #[serde(default, deserialize_with = "usable_entries")]
    pub top_categories: Vec<CategoryCount>,
    #[serde(default, deserialize_with = "usable_prices")]
    pub avg_price_by_material: BTreeMap<String, f64>,
    /// Expected sorted by count, descending; the first entry is the top brand
    #[serde(default, deserialize_with = "usable_entries")]
    pub brand_distribution: Vec<BrandCount>,
}

fn usable_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    let total = items.len();
    let entries: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if entries.len() < total {
        debug!(skipped = total - entries.len(), "skipped malformed analytics entries");
    }
    Ok(entries)
}

fn usable_prices<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(map) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(map
        .into_iter()
        .filter_map(|(material, price)| {
            let price = price.as_f64().filter(|p| p.is_finite())?;
            Some((material, price))
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySlice {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialPrice {
    pub material: String,
    pub avg_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandShare {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedChartData {
    pub top_categories: Vec<CategorySlice>,
    pub avg_price: Vec<MaterialPrice>,
    pub brand_distribution: Vec<BrandShare>,
}

impl DerivedChartData {
    pub fn is_empty(&self) -> bool {
        self.top_categories.is_empty() && self.avg_price.is_empty() && self.brand_distribution.is_empty()
    }

    pub fn top_brand(&self) -> Option<&BrandShare> {
        self.brand_distribution.first()
    }

    pub fn top_brand_label(&self) -> &str {
        self.top_brand().map(|b| b.name.as_str()).unwrap_or(NOT_AVAILABLE)
    }
}

/// Shorten a category name to its first three words, marking the cut with `...`
pub fn short_category_name(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let head = words
        .iter()
        .take(CATEGORY_LABEL_WORDS)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    if words.len() > CATEGORY_LABEL_WORDS {
        format!("{}...", head)
    } else {
        head
    }
}

pub fn derive_chart_data(snapshot: Option<&AnalyticsSnapshot>) -> DerivedChartData {
    let Some(snapshot) = snapshot else {
        return DerivedChartData::default();
    };

    let top_categories = snapshot
        .top_categories
        .iter()
        .map(|c| CategorySlice {
            name: short_category_name(&c.name),
            value: c.count,
        })
        .collect();

    let avg_price = snapshot
        .avg_price_by_material
        .iter()
        .map(|(material, price)| MaterialPrice {
            material: material.clone(),
            avg_price: *price,
        })
        .collect();

    let brand_distribution = snapshot
        .brand_distribution
        .iter()
        .map(|b| BrandShare {
            name: b.brand.clone(),
            count: b.count,
        })
        .collect();

    DerivedChartData {
        top_categories,
        avg_price,
        brand_distribution,
    }
}

/// State of the analytics page
#[derive(Debug, Clone, Default)]
pub enum AnalyticsView {
    #[default]
    Loading,
    Unavailable,
    Loaded {
        snapshot: Arc<AnalyticsSnapshot>,
        charts: DerivedChartData,
    },
}

impl AnalyticsView {
    pub fn from_snapshot(snapshot: Option<AnalyticsSnapshot>) -> Self {
        match snapshot {
            Some(snapshot) => {
                let charts = derive_chart_data(Some(&snapshot));
                AnalyticsView::Loaded {
                    snapshot: Arc::new(snapshot),
                    charts,
                }
            }
            None => AnalyticsView::Unavailable,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AnalyticsView::Loading)
    }

    pub fn charts(&self) -> Option<&DerivedChartData> {
        match self {
            AnalyticsView::Loaded { charts, .. } => Some(charts),
            _ => None,
        }
    }

    pub fn total_products(&self) -> Option<u64> {
        match self {
            AnalyticsView::Loaded { snapshot, .. } => Some(snapshot.total_products),
            _ => None,
        }
    }
}

/// Fetch the snapshot once; any failure becomes [`AnalyticsView::Unavailable`]
pub async fn fetch_analytics<B: Backend + ?Sized>(backend: &B) -> AnalyticsView {
    match backend.analytics().await {
        Ok(snapshot) => {
            info!(
                total_products = snapshot.total_products,
                categories = snapshot.top_categories.len(),
                "analytics snapshot loaded"
            );
            AnalyticsView::from_snapshot(Some(snapshot))
        }
        Err(e) => {
            warn!(error = %e, "analytics fetch failed");
            AnalyticsView::from_snapshot(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> AnalyticsSnapshot {
        serde_json::from_str(
            r#"{
                "total_products": 1024,
                "top_categories": [
                    {"name": "Home & Kitchen", "count": 450},
                    {"name": "Modern Living Room Sets", "count": 12}
                ],
                "avg_price_by_material": {"Wood": 199.5, "Metal": 89.0},
                "brand_distribution": [
                    {"brand": "Modway Store", "count": 55},
                    {"brand": "GOYMFK", "count": 40}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_derive_none_is_empty() {
        let charts = derive_chart_data(None);
        assert!(charts.top_categories.is_empty());
        assert!(charts.avg_price.is_empty());
        assert!(charts.brand_distribution.is_empty());
        assert!(charts.is_empty());
        assert_eq!(charts.top_brand_label(), NOT_AVAILABLE);
    }

    #[test]
    fn test_category_names_truncated() {
        let charts = derive_chart_data(Some(&sample_snapshot()));
        assert_eq!(
            charts.top_categories[1],
            CategorySlice { name: "Modern Living Room...".to_string(), value: 12 }
        );
        assert_eq!(charts.top_categories[0].name, "Home & Kitchen");
    }

    #[test]
    fn test_short_category_name_edges() {
        assert_eq!(short_category_name("Sofas"), "Sofas");
        assert_eq!(short_category_name("Patio  Garden   Decor"), "Patio Garden Decor");
        assert_eq!(short_category_name(""), "");
    }

    #[test]
    fn test_avg_price_one_entry_per_material() {
        let charts = derive_chart_data(Some(&sample_snapshot()));
        assert_eq!(charts.avg_price.len(), 2);
        assert!(charts.avg_price.contains(&MaterialPrice { material: "Wood".to_string(), avg_price: 199.5 }));
        assert!(charts.avg_price.contains(&MaterialPrice { material: "Metal".to_string(), avg_price: 89.0 }));
    }

    #[test]
    fn test_brand_passthrough_keeps_order() {
        let charts = derive_chart_data(Some(&sample_snapshot()));
        assert_eq!(charts.brand_distribution[0], BrandShare { name: "Modway Store".to_string(), count: 55 });
        assert_eq!(charts.brand_distribution[1].name, "GOYMFK");
        assert_eq!(charts.top_brand_label(), "Modway Store");
    }

    #[test]
    fn test_derive_leaves_snapshot_untouched() {
        let snapshot = sample_snapshot();
        let before = snapshot.clone();
        let _ = derive_chart_data(Some(&snapshot));
        assert_eq!(snapshot, before);
    }

    #[test]
    fn test_partial_snapshot_loads() {
        let snapshot: AnalyticsSnapshot = serde_json::from_str(r#"{"total_products": 3}"#).unwrap();
        let view = AnalyticsView::from_snapshot(Some(snapshot));
        assert_eq!(view.total_products(), Some(3));
        let charts = view.charts().unwrap();
        assert!(charts.is_empty());
        assert_eq!(charts.top_brand_label(), NOT_AVAILABLE);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let snapshot: AnalyticsSnapshot = serde_json::from_str(
            r#"{
                "total_products": 10,
                "top_categories": [{"name": "Chairs", "count": 4.5}, {"name": "Desks", "count": 3}],
                "avg_price_by_material": {"Wood": null, "Metal": 89.0, "Glass": "cheap"},
                "brand_distribution": "unknown"
            }"#,
        )
        .unwrap();

        let charts = derive_chart_data(Some(&snapshot));
        assert_eq!(charts.top_categories, vec![CategorySlice { name: "Desks".to_string(), value: 3 }]);
        assert_eq!(charts.avg_price, vec![MaterialPrice { material: "Metal".to_string(), avg_price: 89.0 }]);
        assert!(charts.brand_distribution.is_empty());
        assert_eq!(charts.top_brand_label(), NOT_AVAILABLE);
    }

    #[test]
    fn test_unavailable_view_has_no_totals() {
        let view = AnalyticsView::from_snapshot(None);
        assert!(matches!(view, AnalyticsView::Unavailable));
        assert_eq!(view.total_products(), None);
        assert!(view.charts().is_none());
        assert!(AnalyticsView::default().is_loading());
    }
}
