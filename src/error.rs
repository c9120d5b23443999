use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("Classification rule #{index} is invalid: {details}")]
    InvalidRule { index: usize, details: String },

    #[error("Invalid report period: end date {end} is before start date {start}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, InsightsError>;
