use crate::error::Result;
use crate::schema::RawItem;
use crate::utils::{parse_tracker_date, parse_tracker_price};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiLocation {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiLabel {
    #[serde(default)]
    pub name: String,
}

/// Item detail as returned by the asset tracker's `/api/v1/items/{id}` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub insured: bool,
    #[serde(default)]
    pub location: Option<ApiLocation>,
    #[serde(default)]
    pub labels: Vec<ApiLabel>,
    #[serde(default)]
    pub purchase_price: Option<f64>,
    #[serde(default)]
    pub purchase_time: Option<String>,
    #[serde(default)]
    pub sold_price: Option<f64>,
    #[serde(default)]
    pub sold_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ApiPayload {
    Page { items: Vec<ApiItem> },
    List(Vec<ApiItem>),
}

/// The tracker reports an unset price as 0 alongside an unset date. A zero with a real
/// date (a free pickup, a giveaway) is kept.
fn paired_price(price: Option<f64>, time: Option<NaiveDateTime>) -> Option<f64> {
    match (price, time) {
        (Some(p), None) if p == 0.0 => None,
        (p, _) => p,
    }
}

impl ApiItem {
    pub fn to_raw_item(&self) -> RawItem {
        let purchase_time = self.purchase_time.as_deref().and_then(parse_tracker_date);
        let sold_time = self.sold_time.as_deref().and_then(parse_tracker_date);

        RawItem {
            id: self.id.clone(),
            name: self.name.clone(),
            archived: self.archived,
            insured: self.insured,
            location: self
                .location
                .as_ref()
                .map(|l| l.name.clone())
                .unwrap_or_default(),
            labels: self
                .labels
                .iter()
                .map(|l| l.name.clone())
                .filter(|n| !n.trim().is_empty())
                .collect(),
            purchase_time,
            purchase_price: paired_price(self.purchase_price, purchase_time),
            sold_time,
            sold_price: paired_price(self.sold_price, sold_time),
        }
    }
}

pub fn convert_api_items(items: &[ApiItem]) -> Vec<RawItem> {
    items.iter().map(ApiItem::to_raw_item).collect()
}

/// Accepts either a bare JSON array of items or a page object `{ "items": [...] }`.
pub fn parse_api_items_json(json: &str) -> Result<Vec<RawItem>> {
    let items = match serde_json::from_str::<ApiPayload>(json)? {
        ApiPayload::Page { items } => items,
        ApiPayload::List(items) => items,
    };
    Ok(convert_api_items(&items))
}

/// One row of the tracker's CSV export. Every cell arrives as text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "HB.asset_id", default)]
    pub asset_id: String,
    #[serde(rename = "HB.name", default)]
    pub name: String,
    #[serde(rename = "HB.location", default)]
    pub location: String,
    #[serde(rename = "HB.labels", default)]
    pub labels: String,
    #[serde(rename = "HB.archived", default)]
    pub archived: String,
    #[serde(rename = "HB.insured", default)]
    pub insured: String,
    #[serde(rename = "HB.purchase_price", default)]
    pub purchase_price: String,
    #[serde(rename = "HB.purchase_time", default)]
    pub purchase_time: String,
    #[serde(rename = "HB.sold_price", default)]
    pub sold_price: String,
    #[serde(rename = "HB.sold_time", default)]
    pub sold_time: String,
}

fn parse_flag(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("true")
}

impl ExportRow {
    /// `fallback_id` identifies rows whose asset id cell is empty.
    pub fn to_raw_item(&self, fallback_id: &str) -> RawItem {
        let purchase_time = parse_tracker_date(&self.purchase_time);
        let sold_time = parse_tracker_date(&self.sold_time);

        let id = if self.asset_id.trim().is_empty() {
            fallback_id.to_string()
        } else {
            self.asset_id.trim().to_string()
        };

        let labels: BTreeSet<String> = self
            .labels
            .split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        RawItem {
            id,
            name: self.name.clone(),
            archived: parse_flag(&self.archived),
            insured: parse_flag(&self.insured),
            location: self.location.clone(),
            labels,
            purchase_time,
            purchase_price: paired_price(parse_tracker_price(&self.purchase_price), purchase_time),
            sold_time,
            sold_price: paired_price(parse_tracker_price(&self.sold_price), sold_time),
        }
    }
}

/// Converts export rows; rows without an asset id are named `row-<n>` (1-based).
pub fn convert_export_rows(rows: &[ExportRow]) -> Vec<RawItem> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| row.to_raw_item(&format!("row-{}", idx + 1)))
        .collect()
}
