use crate::schema::{Category, InsightsConfig, LossSalePolicy, DEFAULT_QUICK_FLIP_DAYS};
use crate::utils::{round_money, RATIO_SCALE};
use crate::ClassifiedItem;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A ratio or average that may have an empty denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Value(Decimal),
    NotApplicable,
}

impl Measure {
    /// `NotApplicable` when the denominator is zero or the quotient overflows.
    pub fn ratio(numerator: Decimal, denominator: Decimal, scale: u32) -> Self {
        match numerator.checked_div(denominator) {
            Some(quotient) => Measure::Value(quotient.round_dp(scale).normalize()),
            None => Measure::NotApplicable,
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            Measure::Value(v) => Some(*v),
            Measure::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Measure::Value(_))
    }
}

impl std::fmt::Display for Measure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Measure::Value(v) => write!(f, "{}", v),
            Measure::NotApplicable => f.write_str("n/a"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_revenue: Decimal,
    pub product_revenue: Decimal,
    pub service_revenue: Decimal,
    pub total_cogs: Decimal,
    pub total_business_asset_expense: Decimal,
    pub total_losses: Decimal,
    pub net_profit: Decimal,
    pub items_sold: u64,
    pub items_service_sold: u64,
    pub free_items_sold: u64,
    pub items_active: u64,
    pub items_stale: u64,
    pub items_posted: u64,
    pub active_inventory_value: Decimal,
    pub stale_inventory_value: Decimal,
    pub posted_value: Decimal,
    pub quick_flips: u64,
    pub fastest_sale_days: Option<i64>,
    pub slowest_sale_days: Option<i64>,
    /// items_sold / (items_sold + items_active)
    pub sell_through_rate: Measure,
    pub average_days_to_sale: Measure,
    /// Mean per-item ROI in percent over sold inventory with a non-zero cost.
    pub average_roi: Measure,
}

/// Cost attributed to an item when computing its profit.
pub fn cost_basis(category: Category, purchase_price: Option<Decimal>) -> Decimal {
    match category {
        Category::ServiceRevenue => Decimal::ZERO,
        _ => purchase_price.unwrap_or(Decimal::ZERO),
    }
}

/// Sold price minus cost basis; `None` until the item is sold or if the difference overflows.
pub fn item_profit(
    category: Category,
    is_sold: bool,
    purchase_price: Option<Decimal>,
    sold_price: Option<Decimal>,
) -> Option<Decimal> {
    if !is_sold {
        return None;
    }
    sold_price.and_then(|price| price.checked_sub(cost_basis(category, purchase_price)))
}

/// Per-item ROI percentage, defined for sold items with a positive cost.
pub fn item_roi(item: &ClassifiedItem) -> Option<Decimal> {
    let cost = item.item.purchase_price.filter(|p| *p > Decimal::ZERO)?;
    let profit = item.profit?;
    let roi = profit
        .checked_div(cost)?
        .checked_mul(Decimal::ONE_HUNDRED)?;
    Some(roi.round_dp(RATIO_SCALE))
}

/// Adds an amount to a running total, saturating at the `Decimal` bounds.
fn add(total: &mut Decimal, amount: Decimal) {
    *total = total.saturating_add(amount);
}

/// Commutative, associative running totals. Two accumulators over disjoint
/// slices merge into the accumulator of their union.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SummaryAccumulator {
    product_revenue: Decimal,
    service_revenue: Decimal,
    loss_revenue: Decimal,
    cogs: Decimal,
    business_asset_expense: Decimal,
    losses: Decimal,
    items_sold: u64,
    items_service_sold: u64,
    free_items_sold: u64,
    items_active: u64,
    items_stale: u64,
    items_posted: u64,
    active_value: Decimal,
    stale_value: Decimal,
    posted_value: Decimal,
    quick_flips: u64,
    days_to_sale_total: i64,
    days_to_sale_count: u64,
    fastest: Option<i64>,
    slowest: Option<i64>,
    roi_total: Decimal,
    roi_count: u64,
}

impl SummaryAccumulator {
    fn merge(self, other: Self) -> Self {
        Self {
            product_revenue: self.product_revenue.saturating_add(other.product_revenue),
            service_revenue: self.service_revenue.saturating_add(other.service_revenue),
            loss_revenue: self.loss_revenue.saturating_add(other.loss_revenue),
            cogs: self.cogs.saturating_add(other.cogs),
            business_asset_expense: self
                .business_asset_expense
                .saturating_add(other.business_asset_expense),
            losses: self.losses.saturating_add(other.losses),
            items_sold: self.items_sold + other.items_sold,
            items_service_sold: self.items_service_sold + other.items_service_sold,
            free_items_sold: self.free_items_sold + other.free_items_sold,
            items_active: self.items_active + other.items_active,
            items_stale: self.items_stale + other.items_stale,
            items_posted: self.items_posted + other.items_posted,
            active_value: self.active_value.saturating_add(other.active_value),
            stale_value: self.stale_value.saturating_add(other.stale_value),
            posted_value: self.posted_value.saturating_add(other.posted_value),
            quick_flips: self.quick_flips + other.quick_flips,
            days_to_sale_total: self.days_to_sale_total.saturating_add(other.days_to_sale_total),
            days_to_sale_count: self.days_to_sale_count + other.days_to_sale_count,
            fastest: min_option(self.fastest, other.fastest),
            slowest: max_option(self.slowest, other.slowest),
            roi_total: self.roi_total.saturating_add(other.roi_total),
            roi_count: self.roi_count + other.roi_count,
        }
    }
}

fn min_option(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, y) => x.or(y),
    }
}

fn max_option(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, y) => x.or(y),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FinancialAggregator {
    loss_sale_policy: LossSalePolicy,
    quick_flip_days: u32,
}

impl Default for FinancialAggregator {
    fn default() -> Self {
        Self {
            loss_sale_policy: LossSalePolicy::default(),
            quick_flip_days: DEFAULT_QUICK_FLIP_DAYS,
        }
    }
}

impl FinancialAggregator {
    pub fn new(loss_sale_policy: LossSalePolicy, quick_flip_days: u32) -> Self {
        Self {
            loss_sale_policy,
            quick_flip_days,
        }
    }

    pub fn from_config(config: &InsightsConfig) -> Self {
        Self::new(config.loss_sale_policy, config.quick_flip_days)
    }

    pub fn aggregate(&self, items: &[ClassifiedItem]) -> FinancialSummary {
        let totals = items
            .par_iter()
            .fold(SummaryAccumulator::default, |mut acc, item| {
                self.accumulate(&mut acc, item);
                acc
            })
            .reduce(SummaryAccumulator::default, SummaryAccumulator::merge);

        self.finish(totals)
    }

    /// Items with an amount beyond `MAX_MONEY` contribute nothing; they are
    /// reported as data quality issues instead.
    fn accumulate(&self, acc: &mut SummaryAccumulator, item: &ClassifiedItem) {
        let record = &item.item;
        let status = &item.status;
        if !record.amounts_in_range() {
            return;
        }
        let cost = record.purchase_price.unwrap_or(Decimal::ZERO);
        let sold_price = record.sold_price.unwrap_or(Decimal::ZERO);

        if record.is_posted && !record.is_archived {
            acc.items_posted += 1;
            add(&mut acc.posted_value, cost);
        }

        match item.category {
            Category::ServiceRevenue => {
                if status.is_sold {
                    add(&mut acc.service_revenue, sold_price);
                    acc.items_service_sold += 1;
                }
            }
            Category::Inventory => {
                if status.is_sold {
                    add(&mut acc.product_revenue, sold_price);
                    add(&mut acc.cogs, cost);
                    acc.items_sold += 1;
                    if cost.is_zero() {
                        acc.free_items_sold += 1;
                    }
                    if let Some(days) = status.days_held {
                        acc.days_to_sale_total = acc.days_to_sale_total.saturating_add(days);
                        acc.days_to_sale_count += 1;
                        acc.fastest = min_option(acc.fastest, Some(days));
                        acc.slowest = max_option(acc.slowest, Some(days));
                        if days <= i64::from(self.quick_flip_days) {
                            acc.quick_flips += 1;
                        }
                    }
                    if let Some(roi) = item_roi(item) {
                        add(&mut acc.roi_total, roi);
                        acc.roi_count += 1;
                    }
                } else if status.is_active {
                    acc.items_active += 1;
                    add(&mut acc.active_value, cost);
                    if status.is_stale {
                        acc.items_stale += 1;
                        add(&mut acc.stale_value, cost);
                    }
                }
            }
            Category::BusinessAsset => {
                add(&mut acc.business_asset_expense, cost);
            }
            Category::Loss => {
                add(&mut acc.losses, cost);
                if status.is_sold && self.loss_sale_policy == LossSalePolicy::CountAsRevenue {
                    add(&mut acc.loss_revenue, sold_price);
                }
            }
        }
    }

    fn finish(&self, acc: SummaryAccumulator) -> FinancialSummary {
        let total_revenue = acc
            .product_revenue
            .saturating_add(acc.service_revenue)
            .saturating_add(acc.loss_revenue);
        let net_profit = total_revenue
            .saturating_sub(acc.cogs)
            .saturating_sub(acc.business_asset_expense)
            .saturating_sub(acc.losses);

        let sell_through_rate = Measure::ratio(
            Decimal::from(acc.items_sold),
            Decimal::from(acc.items_sold + acc.items_active),
            RATIO_SCALE,
        );
        let average_days_to_sale = Measure::ratio(
            Decimal::from(acc.days_to_sale_total),
            Decimal::from(acc.days_to_sale_count),
            2,
        );
        let average_roi = Measure::ratio(acc.roi_total, Decimal::from(acc.roi_count), 2);

        FinancialSummary {
            total_revenue: round_money(total_revenue),
            product_revenue: round_money(acc.product_revenue),
            service_revenue: round_money(acc.service_revenue),
            total_cogs: round_money(acc.cogs),
            total_business_asset_expense: round_money(acc.business_asset_expense),
            total_losses: round_money(acc.losses),
            net_profit: round_money(net_profit),
            items_sold: acc.items_sold,
            items_service_sold: acc.items_service_sold,
            free_items_sold: acc.free_items_sold,
            items_active: acc.items_active,
            items_stale: acc.items_stale,
            items_posted: acc.items_posted,
            active_inventory_value: round_money(acc.active_value),
            stale_inventory_value: round_money(acc.stale_value),
            posted_value: round_money(acc.posted_value),
            quick_flips: acc.quick_flips,
            fastest_sale_days: acc.fastest,
            slowest_sale_days: acc.slowest,
            sell_through_rate,
            average_days_to_sale,
            average_roi,
        }
    }
}

/// Aggregates with the default loss-sale policy and quick-flip window.
pub fn aggregate(items: &[ClassifiedItem]) -> FinancialSummary {
    FinancialAggregator::default().aggregate(items)
}
