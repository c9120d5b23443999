use crate::schema::RawItem;
use crate::utils::{money_in_range, to_money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Canonical item shape. Tracker flag names stop here: `insured` becomes `is_posted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub id: String,
    pub name: String,
    pub is_archived: bool,
    pub is_posted: bool,
    pub location: String,
    pub labels: BTreeSet<String>,
    pub purchase_date: Option<chrono::NaiveDate>,
    pub purchase_price: Option<Decimal>,
    pub sold_date: Option<chrono::NaiveDate>,
    pub sold_price: Option<Decimal>,
}

impl NormalizedItem {
    /// True when every recorded amount is within `MAX_MONEY`. Items failing this
    /// are kept in the output but left out of every total.
    pub fn amounts_in_range(&self) -> bool {
        [self.purchase_price, self.sold_price]
            .into_iter()
            .flatten()
            .all(money_in_range)
    }
}

pub fn normalize(raw: &RawItem) -> NormalizedItem {
    NormalizedItem {
        id: raw.id.clone(),
        name: raw.name.trim().to_string(),
        is_archived: raw.archived,
        is_posted: raw.insured,
        location: raw.location.trim().to_string(),
        labels: raw
            .labels
            .iter()
            .map(|label| label.trim())
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .collect(),
        purchase_date: raw.purchase_time.map(|t| t.date()),
        purchase_price: raw.purchase_price.and_then(to_money),
        sold_date: raw.sold_time.map(|t| t.date()),
        sold_price: raw.sold_price.and_then(to_money),
    }
}
