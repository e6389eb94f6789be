//! Database row types matching `migrations/0001_init.sql`.
//! Conversions into domain types validate the stored values.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{AppError, Result};
use crate::types::{AnalysisRecord, Draw, Period};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, sqlx::FromRow)]
pub struct DrawRow {
    pub period: String,
    pub draw_date: String,
    pub numbers: String,
    pub special_number: i64,
}

impl TryFrom<DrawRow> for Draw {
    type Error = AppError;

    fn try_from(row: DrawRow) -> Result<Self> {
        let date = NaiveDate::parse_from_str(&row.draw_date, DATE_FORMAT).map_err(|e| {
            AppError::Decode(format!("period {}: bad date {:?}: {e}", row.period, row.draw_date))
        })?;
        let numbers: Vec<u8> = serde_json::from_str(&row.numbers)?;
        let special = u8::try_from(row.special_number).map_err(|_| {
            AppError::Decode(format!(
                "period {}: special number {} out of range",
                row.period, row.special_number
            ))
        })?;
        Draw::new(row.period, date, &numbers, special)
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct AnalysisRow {
    pub period: String,
    pub avoid_numbers: String,
    pub frequency_data: String,
    pub gap_analysis: String,
    pub total_periods: i64,
    pub analysis_date: i64,
}

impl TryFrom<AnalysisRow> for AnalysisRecord {
    type Error = AppError;

    fn try_from(row: AnalysisRow) -> Result<Self> {
        let analysis_date = DateTime::<Utc>::from_timestamp_millis(row.analysis_date)
            .ok_or_else(|| {
                AppError::Decode(format!(
                    "analysis {}: bad timestamp {}",
                    row.period, row.analysis_date
                ))
            })?;
        Ok(AnalysisRecord {
            period: Period::new(row.period),
            avoid_numbers: serde_json::from_str(&row.avoid_numbers)?,
            frequency_data: serde_json::from_str(&row.frequency_data)?,
            gap_analysis: serde_json::from_str(&row.gap_analysis)?,
            total_periods: usize::try_from(row.total_periods).unwrap_or(0),
            analysis_date,
        })
    }
}
