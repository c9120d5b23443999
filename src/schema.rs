use crate::error::Result;
use chrono::{Local, NaiveDate, NaiveDateTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_STALE_DAYS: u32 = 90;
pub const DEFAULT_QUICK_FLIP_DAYS: u32 = 14;

/// One item record exactly as the asset tracker reports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub archived: bool,
    /// The tracker has no listing field, so "insured" is used to mark items posted for sale.
    #[serde(default)]
    pub insured: bool,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    pub purchase_time: Option<NaiveDateTime>,
    pub purchase_price: Option<f64>,
    pub sold_time: Option<NaiveDateTime>,
    pub sold_price: Option<f64>,
}

impl RawItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(rename_all = "PascalCase")]
pub enum Category {
    #[schemars(description = "Goods bought for resale. The fallback when no rule matches.")]
    Inventory,

    #[schemars(
        description = "Labor, services and other income. Sales carry no cost basis (100% margin)."
    )]
    ServiceRevenue,

    #[schemars(
        description = "Equipment and supplies used to run the business. Purchase cost is an operating expense, never COGS."
    )]
    BusinessAsset,

    #[schemars(
        description = "Items written off (theft, damage, disposal). Purchase cost is recorded as a loss."
    )]
    Loss,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Inventory => "Inventory",
            Category::ServiceRevenue => "ServiceRevenue",
            Category::BusinessAsset => "BusinessAsset",
            Category::Loss => "Loss",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ClassificationRule {
    #[schemars(description = "The category assigned when any keyword matches")]
    pub category: Category,

    #[schemars(
        description = "Case-insensitive keywords matched as substrings of the location name and of each label"
    )]
    pub keywords: Vec<String>,
}

impl ClassificationRule {
    pub fn new<I, S>(category: Category, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            category,
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

/// Loss precedence, then business assets, then service revenue.
pub fn default_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule::new(Category::Loss, ["Loss"]),
        ClassificationRule::new(Category::BusinessAsset, ["Business Assets"]),
        ClassificationRule::new(
            Category::ServiceRevenue,
            ["Service", "Labor", "Other Income"],
        ),
    ]
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum LossSalePolicy {
    #[default]
    #[schemars(
        description = "A sold price recorded on a Loss item is ignored; only the written-off cost is reported."
    )]
    ExcludeFromRevenue,

    #[schemars(
        description = "A sold price recorded on a Loss item counts as revenue (salvage); the cost is still written off."
    )]
    CountAsRevenue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct InsightsConfig {
    #[schemars(
        description = "Active inventory held strictly longer than this many days is stale. Defaults to 90."
    )]
    pub stale_days: u32,

    #[schemars(
        description = "Sold inventory held this many days or fewer counts as a quick flip. Defaults to 14."
    )]
    pub quick_flip_days: u32,

    #[schemars(
        description = "Ordered classification rules. The first rule with a matching keyword wins; unmatched items are Inventory."
    )]
    pub rules: Vec<ClassificationRule>,

    #[schemars(
        description = "Reference date in YYYY-MM-DD format for aging. Defaults to the local date at invocation."
    )]
    pub today: Option<NaiveDate>,

    #[schemars(description = "How a sold price on a Loss item is treated")]
    pub loss_sale_policy: LossSalePolicy,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            stale_days: DEFAULT_STALE_DAYS,
            quick_flip_days: DEFAULT_QUICK_FLIP_DAYS,
            rules: default_rules(),
            today: None,
            loss_sale_policy: LossSalePolicy::default(),
        }
    }
}

impl InsightsConfig {
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn with_stale_days(mut self, stale_days: u32) -> Self {
        self.stale_days = stale_days;
        self
    }

    pub fn with_loss_sale_policy(mut self, policy: LossSalePolicy) -> Self {
        self.loss_sale_policy = policy;
        self
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        crate::classifier::validate_rules(&self.rules)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(InsightsConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
