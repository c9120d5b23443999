//! # Inventory Insights
//!
//! A library for turning a snapshot of asset-tracker item records into business
//! analytics: active and stale inventory, marketplace listings, realised sales,
//! service revenue, business-asset expense and losses.
//!
//! ## Core Concepts
//!
//! - **Normalization**: Raw tracker records are coerced to cent-precision decimals and
//!   day-resolution dates. The tracker's `insured` flag becomes `is_posted`.
//! - **Classification**: Location and label text are matched against ordered keyword
//!   rules (Loss > Business Assets > Service) with `Inventory` as the fallback.
//! - **Status**: Sold, active, stale and days-held facts per item.
//! - **Aggregation**: Revenue, COGS, business-asset expense, losses, net profit,
//!   sell-through rate and sales velocity.
//! - **Data quality**: Bad records never abort a run; they are reported as issues.
//!
//! ## Example
//!
//! ```rust,ignore
//! use inventory_insights::*;
//! use chrono::NaiveDate;
//!
//! let items = vec![RawItem {
//!     location: "Warehouse A".to_string(),
//!     insured: true,
//!     purchase_price: Some(20.0),
//!     purchase_time: NaiveDate::from_ymd_opt(2025, 6, 1)
//!         .unwrap()
//!         .and_hms_opt(0, 0, 0),
//!     ..RawItem::new("lamp-1")
//! }];
//!
//! let config = InsightsConfig::default()
//!     .with_today(NaiveDate::from_ymd_opt(2025, 11, 30).unwrap());
//! let insights = process_inventory(&items, &config).unwrap();
//! assert_eq!(insights.summary.items_stale, 1);
//! ```

pub mod aggregator;
pub mod classifier;
pub mod error;
pub mod ingestion;
pub mod normalizer;
pub mod quality;
pub mod report;
pub mod schema;
pub mod status;
pub mod utils;

pub use aggregator::{
    aggregate, cost_basis, item_profit, item_roi, FinancialAggregator, FinancialSummary, Measure,
};
pub use classifier::{classify, KeywordClassifier};
pub use error::{InsightsError, Result};
pub use ingestion::*;
pub use normalizer::{normalize, NormalizedItem};
pub use quality::{detect_issues, DataQualityIssue, IssueKind};
pub use report::*;
pub use schema::*;
pub use status::{evaluate, SaleState, StatusFacts};
pub use utils::*;

use chrono::NaiveDate;
use log::{debug, info, warn};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedItem {
    #[serde(flatten)]
    pub item: NormalizedItem,
    pub category: Category,
    #[serde(flatten)]
    pub status: StatusFacts,
    /// Sold price minus cost basis, present only once sold.
    pub profit: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub today: NaiveDate,
    /// One entry per input record, in input order.
    pub items: Vec<ClassifiedItem>,
    pub summary: FinancialSummary,
    pub issues: Vec<DataQualityIssue>,
}

impl Insights {
    pub fn report(&self) -> InsightsReport {
        InsightsReport::from_insights(self)
    }

    pub fn issue_counts(&self) -> BTreeMap<IssueKind, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.kind).or_insert(0) += 1;
        }
        counts
    }
}

pub struct InsightsProcessor;

impl InsightsProcessor {
    pub fn process(items: &[RawItem], config: &InsightsConfig) -> Result<Insights> {
        let classifier = KeywordClassifier::new(&config.rules)?;
        let today = config.reference_date();

        info!(
            "Processing {} inventory records as of {}",
            items.len(),
            today
        );

        let evaluated: Vec<(ClassifiedItem, Vec<DataQualityIssue>)> = items
            .par_iter()
            .map(|raw| {
                let item = classify_item(raw, &classifier, today, config.stale_days);
                let issues = detect_issues(&item);
                (item, issues)
            })
            .collect();

        let mut classified = Vec::with_capacity(evaluated.len());
        let mut issues = Vec::new();
        for (item, item_issues) in evaluated {
            classified.push(item);
            issues.extend(item_issues);
        }

        debug!(
            "Classified {} records: {} inventory, {} service, {} business assets, {} losses",
            classified.len(),
            count_category(&classified, Category::Inventory),
            count_category(&classified, Category::ServiceRevenue),
            count_category(&classified, Category::BusinessAsset),
            count_category(&classified, Category::Loss)
        );

        let summary = FinancialAggregator::from_config(config).aggregate(&classified);

        let insights = Insights {
            today,
            items: classified,
            summary,
            issues,
        };

        if !insights.issues.is_empty() {
            let counts = insights.issue_counts();
            warn!(
                "{} data quality issue(s) found: {}",
                insights.issues.len(),
                counts
                    .iter()
                    .map(|(kind, count)| format!("{}={}", kind.as_str(), count))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        Ok(insights)
    }
}

/// Runs normalize, classify and evaluate for one record.
pub fn classify_item(
    raw: &RawItem,
    classifier: &KeywordClassifier,
    today: NaiveDate,
    stale_days: u32,
) -> ClassifiedItem {
    let item = normalize(raw);
    let category = classifier.classify(&item.location, &item.labels);
    let status = evaluate(&item, category, today, stale_days);
    let profit = item_profit(category, status.is_sold, item.purchase_price, item.sold_price);

    ClassifiedItem {
        item,
        category,
        status,
        profit,
    }
}

pub fn process_inventory(items: &[RawItem], config: &InsightsConfig) -> Result<Insights> {
    InsightsProcessor::process(items, config)
}

fn count_category(items: &[ClassifiedItem], category: Category) -> usize {
    items.iter().filter(|i| i.category == category).count()
}
