use std::sync::OnceLock;

use chrono::NaiveDate;
use flowlens_core::MigrationRecord;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::error::SourceError;

/// One row as it appears in a dataset file. Periods arrive as labels and
/// are normalized to the first day they cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub period: String,
    #[serde(alias = "origin")]
    pub origin_id: String,
    #[serde(alias = "destination")]
    pub destination_id: String,
    #[serde(alias = "value", alias = "count")]
    pub magnitude: f64,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub sub_region: Option<String>,
}

/// Dataset files hold either a bare array or an envelope naming the dataset.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DatasetFile {
    Records(Vec<RawRecord>),
    Envelope {
        #[serde(default)]
        dataset: Option<String>,
        records: Vec<RawRecord>,
    },
}

impl DatasetFile {
    pub fn into_records(self) -> Vec<RawRecord> {
        match self {
            Self::Records(records) | Self::Envelope { records, .. } => records,
        }
    }
}

impl RawRecord {
    pub fn into_record(self, index: usize) -> Result<MigrationRecord, SourceError> {
        let period = parse_period_label(&self.period).ok_or_else(|| SourceError::InvalidPeriod {
            index,
            label: self.period.clone(),
        })?;
        Ok(MigrationRecord {
            period,
            origin_id: self.origin_id,
            destination_id: self.destination_id,
            magnitude: self.magnitude,
            industry: self.industry,
            sub_region: self.sub_region,
        })
    }
}

static PERIOD_LABEL: OnceLock<Option<Regex>> = OnceLock::new();

fn period_label() -> Option<&'static Regex> {
    PERIOD_LABEL
        .get_or_init(|| {
            Regex::new(
                r"^(?P<year>\d{4})(?:-(?:(?P<month>\d{1,2})(?:-(?P<day>\d{1,2}))?|[Qq](?P<quarter>[1-4])))?$",
            )
            .ok()
        })
        .as_ref()
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM`, `YYYY-Qn` and `YYYY`.
pub fn parse_period_label(label: &str) -> Option<NaiveDate> {
    let captures = period_label()?.captures(label.trim())?;
    let year: i32 = captures.name("year")?.as_str().parse().ok()?;
    if let Some(quarter) = captures.name("quarter") {
        let quarter: u32 = quarter.as_str().parse().ok()?;
        return NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1);
    }
    let month: u32 = match captures.name("month") {
        Some(month) => month.as_str().parse().ok()?,
        None => 1,
    };
    let day: u32 = match captures.name("day") {
        Some(day) => day.as_str().parse().ok()?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn parse_records(raw: Vec<RawRecord>) -> Result<Vec<MigrationRecord>, SourceError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, record)| record.into_record(index))
        .collect()
}
