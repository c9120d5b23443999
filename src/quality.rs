use crate::schema::Category;
use crate::status::SaleState;
use crate::utils::MAX_MONEY;
use crate::ClassifiedItem;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Sold date without sold price, or the reverse. Excluded from sold, active and revenue sets.
    InconsistentSale,
    /// Inventory without a purchase date. Still counted, but excluded from aging.
    MissingPurchaseDate,
    /// No purchase price where a cost is needed. Treated as zero cost.
    MissingCostBasis,
    /// A price beyond `MAX_MONEY`. The item is kept but left out of every total.
    AmountOutOfRange,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::InconsistentSale => "inconsistent_sale",
            IssueKind::MissingPurchaseDate => "missing_purchase_date",
            IssueKind::MissingCostBasis => "missing_cost_basis",
            IssueKind::AmountOutOfRange => "amount_out_of_range",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityIssue {
    pub item_id: String,
    pub kind: IssueKind,
    pub details: String,
}

impl DataQualityIssue {
    fn new(item: &ClassifiedItem, kind: IssueKind, details: String) -> Self {
        Self {
            item_id: item.item.id.clone(),
            kind,
            details,
        }
    }
}

/// Lists the non-fatal problems found on one classified item, in `IssueKind` order.
pub fn detect_issues(item: &ClassifiedItem) -> Vec<DataQualityIssue> {
    let mut issues = Vec::new();
    let record = &item.item;

    if item.status.sale_state == SaleState::Inconsistent {
        let details = if record.sold_date.is_some() {
            "Sold date is recorded but sold price is missing"
        } else {
            "Sold price is recorded but sold date is missing"
        };
        issues.push(DataQualityIssue::new(
            item,
            IssueKind::InconsistentSale,
            details.to_string(),
        ));
    }

    let needs_aging = item.category == Category::Inventory
        && (item.status.is_active || item.status.is_sold);
    if needs_aging && record.purchase_date.is_none() {
        issues.push(DataQualityIssue::new(
            item,
            IssueKind::MissingPurchaseDate,
            "No purchase date; excluded from staleness and days-to-sale".to_string(),
        ));
    }

    let needs_cost = match item.category {
        Category::Inventory => item.status.is_sold,
        Category::BusinessAsset | Category::Loss => true,
        Category::ServiceRevenue => false,
    };
    if needs_cost && record.purchase_price.is_none() {
        issues.push(DataQualityIssue::new(
            item,
            IssueKind::MissingCostBasis,
            format!("No purchase price for {} item; treated as zero", item.category),
        ));
    }

    if !record.amounts_in_range() {
        issues.push(DataQualityIssue::new(
            item,
            IssueKind::AmountOutOfRange,
            format!("Recorded price exceeds {}; excluded from totals", MAX_MONEY),
        ));
    }

    issues
}
