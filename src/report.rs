use crate::aggregator::{FinancialSummary, Measure};
use crate::error::{InsightsError, Result};
use crate::quality::DataQualityIssue;
use crate::schema::Category;
use crate::utils::{money_in_range, parse_period_string, round_money, MONEY_SCALE};
use crate::{ClassifiedItem, Insights};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn within(date: Option<NaiveDate>, start: NaiveDate, end: NaiveDate) -> bool {
    date.is_some_and(|d| start <= d && d <= end)
}

/// Activity inside an inclusive date window: sales by sold date, spend by purchase date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub product_revenue: Decimal,
    pub service_revenue: Decimal,
    pub cogs: Decimal,
    pub gross_profit: Decimal,
    pub items_sold: u64,
    pub services_sold: u64,
    pub average_sale_price: Measure,
    pub average_profit_per_item: Measure,
    /// Purchase cost of everything acquired in the window, any category.
    pub acquisition_spend: Decimal,
    pub business_asset_spend: Decimal,
    /// Cost of Loss items whose sold (disposal) date falls in the window.
    pub realized_losses: Decimal,
    pub losses_realized: u64,
}

impl PeriodReport {
    pub fn build(items: &[ClassifiedItem], start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(InsightsError::InvalidPeriod { start, end });
        }

        let mut product_revenue = Decimal::ZERO;
        let mut service_revenue = Decimal::ZERO;
        let mut cogs = Decimal::ZERO;
        let mut items_sold = 0u64;
        let mut services_sold = 0u64;
        let mut acquisition_spend = Decimal::ZERO;
        let mut business_asset_spend = Decimal::ZERO;
        let mut realized_losses = Decimal::ZERO;
        let mut losses_realized = 0u64;

        for item in items.iter().filter(|i| i.item.amounts_in_range()) {
            let record = &item.item;
            let cost = record.purchase_price.unwrap_or(Decimal::ZERO);
            let sold_in_window = item.status.is_sold && within(record.sold_date, start, end);

            if within(record.purchase_date, start, end) {
                acquisition_spend = acquisition_spend.saturating_add(cost);
                if item.category == Category::BusinessAsset {
                    business_asset_spend = business_asset_spend.saturating_add(cost);
                }
            }

            match item.category {
                Category::Inventory if sold_in_window => {
                    product_revenue = product_revenue
                        .saturating_add(record.sold_price.unwrap_or(Decimal::ZERO));
                    cogs = cogs.saturating_add(cost);
                    items_sold += 1;
                }
                Category::ServiceRevenue if sold_in_window => {
                    service_revenue = service_revenue
                        .saturating_add(record.sold_price.unwrap_or(Decimal::ZERO));
                    services_sold += 1;
                }
                Category::Loss if within(record.sold_date, start, end) => {
                    realized_losses = realized_losses.saturating_add(cost);
                    losses_realized += 1;
                }
                _ => {}
            }
        }

        let gross_profit = product_revenue.saturating_sub(cogs);
        let sold = Decimal::from(items_sold);

        Ok(Self {
            start,
            end,
            product_revenue: round_money(product_revenue),
            service_revenue: round_money(service_revenue),
            cogs: round_money(cogs),
            gross_profit: round_money(gross_profit),
            items_sold,
            services_sold,
            average_sale_price: Measure::ratio(product_revenue, sold, MONEY_SCALE),
            average_profit_per_item: Measure::ratio(gross_profit, sold, MONEY_SCALE),
            acquisition_spend: round_money(acquisition_spend),
            business_asset_spend: round_money(business_asset_spend),
            realized_losses: round_money(realized_losses),
            losses_realized,
        })
    }

    /// Builds from a period string such as "2025-11" or "2025-09:2025-11".
    pub fn for_period(items: &[ClassifiedItem], period: &str) -> Result<Self> {
        let (start, end) = parse_period_string(period)?;
        Self::build(items, start, end)
    }

    pub fn total_revenue(&self) -> Decimal {
        self.product_revenue.saturating_add(self.service_revenue)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleItemView {
    pub id: String,
    pub name: String,
    pub location: String,
    pub days_held: i64,
    pub cost: Option<Decimal>,
    pub is_posted: bool,
}

/// Stale items, longest held first; ties ordered by id.
pub fn stale_inventory(items: &[ClassifiedItem]) -> Vec<StaleItemView> {
    let mut stale: Vec<StaleItemView> = items
        .iter()
        .filter(|i| i.status.is_stale)
        .filter_map(|i| {
            Some(StaleItemView {
                id: i.item.id.clone(),
                name: i.item.name.clone(),
                location: i.item.location.clone(),
                days_held: i.status.days_held?,
                cost: i.item.purchase_price,
                is_posted: i.item.is_posted,
            })
        })
        .collect();

    stale.sort_by(|a, b| b.days_held.cmp(&a.days_held).then_with(|| a.id.cmp(&b.id)));
    stale
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationBreakdown {
    pub location: String,
    pub count: u64,
    pub value: Decimal,
}

/// Count and cost value of unarchived items per location, ordered by location name.
pub fn inventory_by_location(items: &[ClassifiedItem]) -> Vec<LocationBreakdown> {
    let mut by_location: BTreeMap<String, LocationBreakdown> = BTreeMap::new();

    for item in items.iter().filter(|i| !i.item.is_archived) {
        let location = if item.item.location.is_empty() {
            "Unknown".to_string()
        } else {
            item.item.location.clone()
        };
        let entry = by_location
            .entry(location.clone())
            .or_insert_with(|| LocationBreakdown {
                location,
                ..LocationBreakdown::default()
            });
        entry.count += 1;
        if let Some(cost) = item.item.purchase_price.filter(|p| money_in_range(*p)) {
            entry.value = entry.value.saturating_add(cost);
        }
    }

    by_location.into_values().collect()
}

/// Items currently posted on a marketplace: posted and not archived.
pub fn marketplace_listings(items: &[ClassifiedItem]) -> Vec<&ClassifiedItem> {
    items
        .iter()
        .filter(|i| i.item.is_posted && !i.item.is_archived)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsReport {
    pub as_of: NaiveDate,
    pub summary: FinancialSummary,
    pub stale_inventory: Vec<StaleItemView>,
    pub inventory_by_location: Vec<LocationBreakdown>,
    pub issues: Vec<DataQualityIssue>,
    #[serde(skip)]
    items: Vec<ClassifiedItem>,
}

fn format_option<T: std::fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

impl InsightsReport {
    pub fn from_insights(insights: &Insights) -> Self {
        Self {
            as_of: insights.today,
            summary: insights.summary.clone(),
            stale_inventory: stale_inventory(&insights.items),
            inventory_by_location: inventory_by_location(&insights.items),
            issues: insights.issues.clone(),
            items: insights.items.clone(),
        }
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One row per classified item.
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str(
            "Id,Name,Location,Category,Archived,Posted,Sold,Active,Stale,Days Held,Purchase Price,Sold Price,Profit\n",
        );

        for item in &self.items {
            let record = &item.item;
            output.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
                csv_field(&record.id),
                csv_field(&record.name),
                csv_field(&record.location),
                item.category,
                record.is_archived,
                item.item.is_posted,
                item.status.is_sold,
                item.status.is_active,
                item.status.is_stale,
                format_option(&item.status.days_held),
                format_option(&record.purchase_price),
                format_option(&record.sold_price),
                format_option(&item.profit)
            ));
        }

        output
    }

    pub fn to_markdown(&self) -> String {
        let s = &self.summary;
        let mut output = String::new();

        output.push_str(&format!("# Inventory Insights - {}\n\n", self.as_of));

        output.push_str("## Financial Summary\n\n");
        output.push_str("| Metric | Value |\n|---|---|\n");
        output.push_str(&format!("| Total Revenue | ${} |\n", s.total_revenue));
        output.push_str(&format!("| Product Revenue | ${} |\n", s.product_revenue));
        output.push_str(&format!("| Service Revenue | ${} |\n", s.service_revenue));
        output.push_str(&format!("| COGS | ${} |\n", s.total_cogs));
        output.push_str(&format!(
            "| Business Asset Expense | ${} |\n",
            s.total_business_asset_expense
        ));
        output.push_str(&format!("| Losses | ${} |\n", s.total_losses));
        output.push_str(&format!("| Net Profit | ${} |\n", s.net_profit));
        output.push_str(&format!("| Items Sold | {} |\n", s.items_sold));
        output.push_str(&format!("| Active Items | {} |\n", s.items_active));
        output.push_str(&format!("| Stale Items | {} |\n", s.items_stale));
        output.push_str(&format!("| Sell-Through Rate | {} |\n", s.sell_through_rate));
        output.push_str(&format!(
            "| Avg Days to Sale | {} |\n",
            s.average_days_to_sale
        ));
        output.push_str(&format!("| Avg ROI % | {} |\n\n", s.average_roi));

        output.push_str("## Stale Inventory\n\n");
        if self.stale_inventory.is_empty() {
            output.push_str("_None_\n\n");
        } else {
            output.push_str("| Item | Location | Days Held | Cost |\n|---|---|---|---|\n");
            for stale in &self.stale_inventory {
                let label = if stale.name.is_empty() {
                    &stale.id
                } else {
                    &stale.name
                };
                output.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    label,
                    stale.location,
                    stale.days_held,
                    format_option(&stale.cost)
                ));
            }
            output.push('\n');
        }

        output.push_str("## Inventory by Location\n\n");
        output.push_str("| Location | Count | Value |\n|---|---|---|\n");
        for row in &self.inventory_by_location {
            output.push_str(&format!(
                "| {} | {} | ${} |\n",
                row.location, row.count, row.value
            ));
        }
        output.push('\n');

        if !self.issues.is_empty() {
            output.push_str("## Data Quality Issues\n\n");
            for issue in &self.issues {
                output.push_str(&format!(
                    "- `{}` {}: {}\n",
                    issue.item_id,
                    issue.kind.as_str(),
                    issue.details
                ));
            }
        }

        output
    }
}
