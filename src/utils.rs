use crate::error::{InsightsError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use log::debug;
use rust_decimal::prelude::*;

/// Money is carried with cent precision.
pub const MONEY_SCALE: u32 = 2;
/// Scale for ratios and percentages before final rounding.
pub const RATIO_SCALE: u32 = 4;
/// Largest amount (one trillion) an item may carry and still count towards totals.
pub const MAX_MONEY: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// Whole days from `start` to `end`; negative when `end` precedes `start`.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Rounds to cents and pins the scale so amounts always render with two decimals.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp(MONEY_SCALE);
    rounded.rescale(MONEY_SCALE);
    rounded
}

pub fn money_in_range(amount: Decimal) -> bool {
    amount.abs() <= MAX_MONEY
}

/// Converts a wire float into cent-precision money. NaN and infinities are treated as absent.
pub fn to_money(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value).map(round_money)
}

/// Parses tracker date text: empty strings and the `0001-01-01` "unset" sentinel are absent,
/// and any `T...` time suffix is ignored.
pub fn parse_tracker_date(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.starts_with("0001") {
        return None;
    }

    let date_part = trimmed.split('T').next().unwrap_or(trimmed);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => date.and_hms_opt(0, 0, 0),
        Err(e) => {
            debug!("Ignoring unparseable tracker date '{}': {}", text, e);
            None
        }
    }
}

/// Parses tracker price text. Empty or unparseable values are absent.
pub fn parse_tracker_price(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            debug!("Ignoring unparseable tracker price '{}'", text);
            None
        }
    }
}

fn parse_period_bound(text: &str, is_end: bool) -> Result<NaiveDate> {
    let text = text.trim();

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }

    let month_start = NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d").map_err(
        |_| {
            InsightsError::DateError(format!(
                "Invalid date format in period: {}. Expected YYYY-MM or YYYY-MM-DD",
                text
            ))
        },
    )?;

    if is_end {
        last_day_of_month(month_start.year(), month_start.month()).ok_or_else(|| {
            InsightsError::DateError(format!("Month out of range in period: {}", text))
        })
    } else {
        Ok(month_start)
    }
}

/// Parses a period string in the format "YYYY-MM", "YYYY-MM:YYYY-MM" or
/// "YYYY-MM-DD:YYYY-MM-DD". Returns the inclusive (start_date, end_date).
pub fn parse_period_string(period: &str) -> Result<(NaiveDate, NaiveDate)> {
    let parts: Vec<&str> = period.split(':').collect();

    let (start, end) = match parts.as_slice() {
        [single] => (parse_period_bound(single, false)?, parse_period_bound(single, true)?),
        [from, to] => (parse_period_bound(from, false)?, parse_period_bound(to, true)?),
        _ => {
            return Err(InsightsError::DateError(format!(
                "Invalid period format: {}. Expected 'YYYY-MM' or 'YYYY-MM:YYYY-MM'",
                period
            )))
        }
    };

    if end < start {
        return Err(InsightsError::InvalidPeriod { start, end });
    }

    Ok((start, end))
}
