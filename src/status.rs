use crate::normalizer::NormalizedItem;
use crate::schema::Category;
use crate::utils::days_between;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How the sold-date / sold-price pair reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleState {
    Unsold,
    Sold,
    /// Exactly one of sold date and sold price is recorded.
    Inconsistent,
}

impl SaleState {
    pub fn of(item: &NormalizedItem) -> Self {
        match (item.sold_date.is_some(), item.sold_price.is_some()) {
            (true, true) => SaleState::Sold,
            (false, false) => SaleState::Unsold,
            _ => SaleState::Inconsistent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFacts {
    pub sale_state: SaleState,
    pub is_sold: bool,
    pub is_active: bool,
    pub is_stale: bool,
    pub days_held: Option<i64>,
}

pub fn evaluate(
    item: &NormalizedItem,
    category: Category,
    today: NaiveDate,
    stale_days: u32,
) -> StatusFacts {
    let sale_state = SaleState::of(item);
    let is_sold = sale_state == SaleState::Sold;

    let is_active = !item.is_archived
        && category == Category::Inventory
        && sale_state == SaleState::Unsold;

    let days_held = if is_sold {
        match (item.purchase_date, item.sold_date) {
            (Some(bought), Some(sold)) => Some(days_between(bought, sold)),
            _ => None,
        }
    } else if is_active {
        item.purchase_date.map(|bought| days_between(bought, today))
    } else {
        None
    };

    let is_stale = is_active && days_held.is_some_and(|days| days > i64::from(stale_days));

    StatusFacts {
        sale_state,
        is_sold,
        is_active,
        is_stale,
        days_held,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 30).unwrap()
    }

    fn days_ago(days: u64) -> NaiveDate {
        today().checked_sub_days(chrono::Days::new(days)).unwrap()
    }

    fn item() -> NormalizedItem {
        NormalizedItem {
            id: "i".to_string(),
            name: String::new(),
            is_archived: false,
            is_posted: false,
            location: "Warehouse A".to_string(),
            labels: BTreeSet::new(),
            purchase_date: None,
            purchase_price: None,
            sold_date: None,
            sold_price: None,
        }
    }

    #[test]
    fn test_stale_boundary() {
        let exactly = NormalizedItem {
            purchase_date: Some(days_ago(90)),
            ..item()
        };
        let facts = evaluate(&exactly, Category::Inventory, today(), 90);
        assert!(facts.is_active);
        assert!(!facts.is_stale);
        assert_eq!(facts.days_held, Some(90));

        let one_older = NormalizedItem {
            purchase_date: Some(days_ago(91)),
            ..item()
        };
        let facts = evaluate(&one_older, Category::Inventory, today(), 90);
        assert!(facts.is_stale);
        assert_eq!(facts.days_held, Some(91));
    }

    #[test]
    fn test_posted_item_still_ages() {
        let posted = NormalizedItem {
            is_posted: true,
            purchase_price: Some(dec!(20.00)),
            purchase_date: Some(days_ago(120)),
            ..item()
        };
        let facts = evaluate(&posted, Category::Inventory, today(), 90);
        assert!(facts.is_active);
        assert!(facts.is_stale);
    }

    #[test]
    fn test_missing_purchase_date_is_active_but_never_stale() {
        let facts = evaluate(&item(), Category::Inventory, today(), 90);
        assert!(facts.is_active);
        assert!(!facts.is_stale);
        assert_eq!(facts.days_held, None);
    }

    #[test]
    fn test_sold_archived_item_holds_sale_duration() {
        let sold = NormalizedItem {
            is_archived: true,
            purchase_date: Some(days_ago(30)),
            purchase_price: Some(dec!(10.00)),
            sold_date: Some(days_ago(5)),
            sold_price: Some(dec!(30.00)),
            ..item()
        };
        let facts = evaluate(&sold, Category::Inventory, today(), 90);
        assert!(facts.is_sold);
        assert!(!facts.is_active);
        assert!(!facts.is_stale);
        assert_eq!(facts.days_held, Some(25));
    }

    #[test]
    fn test_unarchived_sold_item_is_not_active() {
        let sold = NormalizedItem {
            purchase_date: Some(days_ago(200)),
            sold_date: Some(days_ago(1)),
            sold_price: Some(dec!(5)),
            ..item()
        };
        let facts = evaluate(&sold, Category::Inventory, today(), 90);
        assert!(facts.is_sold);
        assert!(!facts.is_active);
        assert!(!facts.is_stale);
    }

    #[test]
    fn test_inconsistent_sale_is_neither_sold_nor_active() {
        let half_sold = NormalizedItem {
            purchase_date: Some(days_ago(200)),
            sold_date: Some(days_ago(1)),
            ..item()
        };
        let facts = evaluate(&half_sold, Category::Inventory, today(), 90);
        assert_eq!(facts.sale_state, SaleState::Inconsistent);
        assert!(!facts.is_sold);
        assert!(!facts.is_active);
        assert!(!facts.is_stale);
        assert_eq!(facts.days_held, None);
    }

    #[test]
    fn test_non_inventory_is_never_active_or_stale() {
        let old = NormalizedItem {
            purchase_date: Some(days_ago(400)),
            ..item()
        };
        for category in [
            Category::ServiceRevenue,
            Category::BusinessAsset,
            Category::Loss,
        ] {
            let facts = evaluate(&old, category, today(), 90);
            assert!(!facts.is_active);
            assert!(!facts.is_stale);
            assert_eq!(facts.days_held, None);
        }
    }
}
