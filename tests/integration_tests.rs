use chrono::NaiveDate;
use inventory_insights::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const EXPORT_CSV: &str = "\
HB.import_ref,HB.location,HB.labels,HB.asset_id,HB.archived,HB.name,HB.insured,HB.purchase_price,HB.purchase_time,HB.sold_price,HB.sold_time
,📦 Garage Shelf,Electronics,000-001,false,Old Receiver,true,20.00,2025-08-01,0,0001-01-01
,📦 Garage Shelf,,000-002,false,Desk Lamp,false,8.00,2025-11-01,0,
,💵 Sold / November,Electronics,000-003,true,Camera,false,40.00,2025-09-01,95.50,2025-11-03
,💵 Sold / November,,000-004,true,Curb Find Chair,false,0,2025-10-20,35.00,2025-11-10
,💸 Other Income / November 2025,,000-005,true,TV Mounting,false,0,,75.00,2025-11-15
,,Labor,000-006,true,Moving Help,false,,,50.00,2025-10-02
,🏢 Business Assets,,000-007,false,Label Printer,false,120.00,2025-03-15,0,
,❌ Loss - Water Damage,,000-008,true,Speaker,false,30.00,2025-06-01,0,
,📦 Bin 7,,000-009,false,Mystery Box,false,15.00,,0,
,💵 Sold / November,,000-010,true,Record Player,false,25.00,2025-07-01,,2025-11-20
";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 30).unwrap()
}

fn load_export() -> anyhow::Result<Vec<RawItem>> {
    let mut reader = csv::Reader::from_reader(EXPORT_CSV.as_bytes());
    let rows = reader
        .deserialize::<ExportRow>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(convert_export_rows(&rows))
}

fn find<'a>(insights: &'a Insights, id: &str) -> &'a ClassifiedItem {
    insights
        .items
        .iter()
        .find(|i| i.item.id == id)
        .unwrap_or_else(|| panic!("missing item {}", id))
}

#[test]
fn test_export_snapshot_end_to_end() -> anyhow::Result<()> {
    let items = load_export()?;
    assert_eq!(items.len(), 10);

    let config = InsightsConfig::default().with_today(today());
    let insights = process_inventory(&items, &config)?;

    // Output order follows input order.
    let ids: Vec<&str> = insights.items.iter().map(|i| i.item.id.as_str()).collect();
    assert_eq!(ids[0], "000-001");
    assert_eq!(ids[9], "000-010");

    assert_eq!(find(&insights, "000-001").category, Category::Inventory);
    assert!(find(&insights, "000-001").status.is_stale);
    assert!(find(&insights, "000-001").item.is_posted);
    assert!(!find(&insights, "000-002").status.is_stale);
    assert_eq!(find(&insights, "000-003").profit, Some(dec!(55.50)));
    assert_eq!(find(&insights, "000-005").category, Category::ServiceRevenue);
    assert_eq!(find(&insights, "000-006").category, Category::ServiceRevenue);
    assert_eq!(find(&insights, "000-007").category, Category::BusinessAsset);
    assert_eq!(find(&insights, "000-008").category, Category::Loss);
    assert!(find(&insights, "000-009").status.is_active);
    assert_eq!(find(&insights, "000-009").status.days_held, None);
    assert!(!find(&insights, "000-010").status.is_sold);

    let s = &insights.summary;
    assert_eq!(s.product_revenue, dec!(130.50));
    assert_eq!(s.service_revenue, dec!(125.00));
    assert_eq!(s.total_revenue, dec!(255.50));
    assert_eq!(s.total_cogs, dec!(40.00));
    assert_eq!(s.total_business_asset_expense, dec!(120.00));
    assert_eq!(s.total_losses, dec!(30.00));
    assert_eq!(s.net_profit, dec!(65.50));
    assert_eq!(s.items_sold, 2);
    assert_eq!(s.items_service_sold, 2);
    assert_eq!(s.free_items_sold, 1);
    assert_eq!(s.items_active, 3);
    assert_eq!(s.items_stale, 1);
    assert_eq!(s.active_inventory_value, dec!(43.00));
    assert_eq!(s.stale_inventory_value, dec!(20.00));
    assert_eq!(s.items_posted, 1);
    assert_eq!(s.sell_through_rate, Measure::Value(dec!(0.4)));
    // Camera 63 days, chair 21 days.
    assert_eq!(s.average_days_to_sale, Measure::Value(dec!(42)));
    assert_eq!(s.fastest_sale_days, Some(21));
    assert_eq!(s.slowest_sale_days, Some(63));
    assert_eq!(s.quick_flips, 0);
    assert_eq!(s.average_roi, Measure::Value(dec!(138.75)));

    let issues: Vec<(&str, IssueKind)> = insights
        .issues
        .iter()
        .map(|i| (i.item_id.as_str(), i.kind))
        .collect();
    assert_eq!(
        issues,
        vec![
            ("000-009", IssueKind::MissingPurchaseDate),
            ("000-010", IssueKind::InconsistentSale),
        ]
    );

    Ok(())
}

#[test]
fn test_november_period_report() -> anyhow::Result<()> {
    let items = load_export()?;
    let config = InsightsConfig::default().with_today(today());
    let insights = process_inventory(&items, &config)?;

    let november = PeriodReport::for_period(&insights.items, "2025-11")?;
    assert_eq!(november.product_revenue, dec!(130.50));
    assert_eq!(november.service_revenue, dec!(75.00));
    assert_eq!(november.services_sold, 1);
    assert_eq!(november.cogs, dec!(40.00));
    assert_eq!(november.gross_profit, dec!(90.50));
    assert_eq!(november.acquisition_spend, dec!(8.00));

    let year = PeriodReport::for_period(&insights.items, "2025-01:2025-12")?;
    assert_eq!(year.total_revenue(), dec!(255.50));
    assert_eq!(year.business_asset_spend, dec!(120.00));
    assert_eq!(year.realized_losses, Decimal::ZERO);
    Ok(())
}

#[test]
fn test_report_renderers() -> anyhow::Result<()> {
    let items = load_export()?;
    let config = InsightsConfig::default().with_today(today());
    let report = process_inventory(&items, &config)?.report();

    assert_eq!(report.stale_inventory.len(), 1);
    assert_eq!(report.stale_inventory[0].id, "000-001");
    assert_eq!(report.stale_inventory[0].days_held, 121);

    let csv = report.to_csv();
    assert_eq!(csv.lines().count(), 11);
    assert!(csv.lines().next().unwrap().starts_with("Id,Name,Location,Category"));
    assert!(csv.contains("000-003,Camera,💵 Sold / November,Inventory,true"));

    let markdown = report.to_markdown();
    assert!(markdown.contains("# Inventory Insights - 2025-11-30"));
    assert!(markdown.contains("| Net Profit | $65.50 |"));
    assert!(markdown.contains("| Sell-Through Rate | 0.4 |"));
    assert!(markdown.contains("## Data Quality Issues"));
    assert!(markdown.contains("inconsistent_sale"));

    let json: serde_json::Value = serde_json::from_str(&report.to_json()?)?;
    assert_eq!(json["as_of"], "2025-11-30");
    assert_eq!(json["summary"]["items_sold"], 2);
    assert!(json.get("items").is_none());
    Ok(())
}

#[test]
fn test_api_payload_end_to_end() -> anyhow::Result<()> {
    let payload = r#"{
        "items": [
            {
                "id": "svc-1",
                "name": "Laptop Repair",
                "archived": true,
                "location": { "name": "Workbench" },
                "labels": [{ "name": "Service" }],
                "purchasePrice": 0,
                "purchaseTime": "0001-01-01T00:00:00Z",
                "soldPrice": 80,
                "soldTime": "2025-11-29T18:30:00Z"
            },
            {
                "id": "asset-1",
                "location": { "name": "Business Assets" },
                "labels": [{ "name": "Loss" }],
                "purchasePrice": 45.5,
                "purchaseTime": "2025-01-15T00:00:00Z"
            }
        ]
    }"#;

    let items = parse_api_items_json(payload)?;
    let insights = process_inventory(&items, &InsightsConfig::default().with_today(today()))?;

    assert_eq!(insights.items[0].category, Category::ServiceRevenue);
    assert_eq!(insights.items[0].profit, Some(dec!(80)));
    assert_eq!(insights.items[1].category, Category::Loss);
    assert_eq!(insights.summary.total_revenue, dec!(80));
    assert_eq!(insights.summary.total_losses, dec!(45.50));
    assert_eq!(insights.summary.total_business_asset_expense, Decimal::ZERO);
    assert_eq!(insights.summary.sell_through_rate, Measure::NotApplicable);
    assert!(insights.issues.is_empty());
    Ok(())
}

#[test]
fn test_near_max_prices_do_not_abort_the_run() -> anyhow::Result<()> {
    let payload = r#"[
        {
            "id": "whale",
            "location": { "name": "Warehouse A" },
            "purchasePrice": 0.01,
            "purchaseTime": "2025-10-01T00:00:00Z",
            "soldPrice": 1e27,
            "soldTime": "2025-11-01T00:00:00Z"
        },
        {
            "id": "wreck-1",
            "location": { "name": "Loss - Fire" },
            "purchasePrice": 5e28,
            "purchaseTime": "2025-09-01T00:00:00Z"
        },
        {
            "id": "wreck-2",
            "location": { "name": "Loss - Fire" },
            "purchasePrice": 5e28,
            "purchaseTime": "2025-09-01T00:00:00Z"
        }
    ]"#;

    let mut items = parse_api_items_json(payload)?;
    items.extend(load_export()?);
    let insights = process_inventory(&items, &InsightsConfig::default().with_today(today()))?;

    assert_eq!(insights.items.len(), 13);
    assert_eq!(insights.issue_counts()[&IssueKind::AmountOutOfRange], 3);
    // Totals match the export alone.
    assert_eq!(insights.summary.net_profit, dec!(65.50));
    assert_eq!(insights.summary.total_losses, dec!(30.00));
    assert_eq!(insights.summary.average_roi, Measure::Value(dec!(138.75)));

    let report = insights.report();
    assert!(report.to_markdown().contains("amount_out_of_range"));
    Ok(())
}

#[test]
fn test_custom_config_changes_classification_and_staleness() -> anyhow::Result<()> {
    let items = load_export()?;
    let config = InsightsConfig::from_json_str(
        r#"{
            "stale_days": 20,
            "today": "2025-11-30",
            "rules": [
                { "category": "Loss", "keywords": ["Loss"] },
                { "category": "BusinessAsset", "keywords": ["Business Assets", "Bin 7"] },
                { "category": "ServiceRevenue", "keywords": ["Other Income"] }
            ]
        }"#,
    )?;
    let insights = process_inventory(&items, &config)?;

    // "Labor" is no longer a service keyword.
    assert_eq!(find(&insights, "000-006").category, Category::Inventory);
    assert_eq!(find(&insights, "000-009").category, Category::BusinessAsset);
    // Desk lamp is 29 days old.
    assert!(find(&insights, "000-002").status.is_stale);
    assert_eq!(insights.summary.total_business_asset_expense, dec!(135.00));
    Ok(())
}

#[test]
fn test_rerun_is_identical() -> anyhow::Result<()> {
    let items = load_export()?;
    let config = InsightsConfig::default().with_today(today());
    let first = process_inventory(&items, &config)?;
    let second = process_inventory(&items, &config)?;
    assert_eq!(first, second);
    Ok(())
}
