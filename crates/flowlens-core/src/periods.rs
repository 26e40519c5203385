use chrono::Datelike;
use chrono::Duration;
use chrono::Local;
use chrono::Months;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

use crate::datasets::DatasetMetadata;

/// Months looked back by the fallback window used when no explicit range exists.
pub const FALLBACK_WINDOW_MONTHS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeriodId {
    FullYear,
    Q1,
    Q2,
    Q3,
    Q4,
    Custom,
}

impl PeriodId {
    pub const PREDEFINED: [PeriodId; 5] = [
        PeriodId::FullYear,
        PeriodId::Q1,
        PeriodId::Q2,
        PeriodId::Q3,
        PeriodId::Q4,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullYear => "full-year",
            Self::Q1 => "q1",
            Self::Q2 => "q2",
            Self::Q3 => "q3",
            Self::Q4 => "q4",
            Self::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FullYear => "Full year",
            Self::Q1 => "Q1 (Jan - Mar)",
            Self::Q2 => "Q2 (Apr - Jun)",
            Self::Q3 => "Q3 (Jul - Sep)",
            Self::Q4 => "Q4 (Oct - Dec)",
            Self::Custom => "Custom range",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full-year" | "fullyear" | "year" => Some(Self::FullYear),
            "q1" => Some(Self::Q1),
            "q2" => Some(Self::Q2),
            "q3" => Some(Self::Q3),
            "q4" => Some(Self::Q4),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    /// Inclusive month span within the reference year, `None` for custom.
    fn month_span(self) -> Option<(u32, u32)> {
        match self {
            Self::FullYear => Some((1, 12)),
            Self::Q1 => Some((1, 3)),
            Self::Q2 => Some((4, 6)),
            Self::Q3 => Some((7, 9)),
            Self::Q4 => Some((10, 12)),
            Self::Custom => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    /// Builds a range, swapping the bounds if they arrive reversed.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        if start_date <= end_date {
            Self {
                start_date,
                end_date,
            }
        } else {
            Self {
                start_date: end_date,
                end_date: start_date,
            }
        }
    }

    /// Widens the range outward to whole months.
    pub fn snap_to_months(self) -> Self {
        Self {
            start_date: first_day_of_month(self.start_date),
            end_date: last_day_of_month(self.end_date).unwrap_or(self.end_date),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start_date <= other.end_date && other.start_date <= self.end_date
    }

    pub fn summary(&self) -> String {
        format!(
            "{} - {}",
            self.start_date.format("%Y-%m-%d"),
            self.end_date.format("%Y-%m-%d")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub id: PeriodId,
    pub label: String,
    pub is_enabled: bool,
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

pub fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    let first = first_day_of_month(date);
    let next = first.checked_add_months(Months::new(1))?;
    next.checked_sub_signed(Duration::days(1))
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// The trailing window ending today.
pub fn last_three_months(today: NaiveDate) -> DateRange {
    let start = today
        .checked_sub_months(Months::new(FALLBACK_WINDOW_MONTHS))
        .unwrap_or(today);
    DateRange::new(start, today)
}

/// Year that predefined periods resolve against: the dataset's first covered
/// year when known, otherwise the current year.
pub fn reference_year(metadata: Option<&DatasetMetadata>, today: NaiveDate) -> i32 {
    metadata
        .and_then(|metadata| metadata.start_date)
        .map_or_else(|| today.year(), |start| start.year())
}

pub fn resolve_period(
    period_id: PeriodId,
    reference_year: i32,
    month_granularity: bool,
    custom_start: Option<NaiveDate>,
    custom_end: Option<NaiveDate>,
) -> DateRange {
    resolve_period_at(
        period_id,
        reference_year,
        month_granularity,
        custom_start,
        custom_end,
        today(),
    )
}

pub fn resolve_period_at(
    period_id: PeriodId,
    reference_year: i32,
    month_granularity: bool,
    custom_start: Option<NaiveDate>,
    custom_end: Option<NaiveDate>,
    today: NaiveDate,
) -> DateRange {
    let range = match period_id.month_span() {
        Some((first_month, last_month)) => {
            fixed_year_range(reference_year, first_month, last_month)
                .unwrap_or_else(|| last_three_months(today))
        }
        None => match (custom_start, custom_end) {
            (Some(start), Some(end)) => DateRange::new(start, end),
            _ => last_three_months(today),
        },
    };

    if month_granularity {
        range.snap_to_months()
    } else {
        range
    }
}

fn fixed_year_range(year: i32, first_month: u32, last_month: u32) -> Option<DateRange> {
    let start = NaiveDate::from_ymd_opt(year, first_month, 1)?;
    let end = last_day_of_month(NaiveDate::from_ymd_opt(year, last_month, 1)?)?;
    Some(DateRange::new(start, end))
}

/// Selectable periods for a dataset. A predefined period is disabled when it
/// falls entirely outside the dataset's coverage.
pub fn time_periods(metadata: Option<&DatasetMetadata>, today: NaiveDate) -> Vec<TimePeriod> {
    let year = reference_year(metadata, today);
    let coverage = metadata.and_then(|metadata| match (metadata.start_date, metadata.end_date) {
        (Some(start), Some(end)) => Some(DateRange::new(start, end)),
        _ => None,
    });

    PeriodId::PREDEFINED
        .iter()
        .copied()
        .map(|id| {
            let range = resolve_period_at(id, year, false, None, None, today);
            TimePeriod {
                id,
                label: id.label().to_string(),
                is_enabled: coverage.map_or(true, |coverage| coverage.overlaps(&range)),
            }
        })
        .chain(std::iter::once(TimePeriod {
            id: PeriodId::Custom,
            label: PeriodId::Custom.label().to_string(),
            is_enabled: true,
        }))
        .collect()
}
