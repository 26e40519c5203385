use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

use crate::datasets::Subaction;
use crate::periods::DateRange;
use crate::periods::PeriodId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
}

impl Location {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    Location,
    Industry,
    SubRegion,
    DateTime,
    Subaction,
}

impl FilterKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Industry => "industry",
            Self::SubRegion => "subRegion",
            Self::DateTime => "dateTime",
            Self::Subaction => "subaction",
        }
    }
}

/// A single constraint. Multi-valued payloads match any of their values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Filter {
    Location {
        id: String,
        locations: Vec<Location>,
    },
    Industry {
        id: String,
        industries: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    SubRegion {
        id: String,
        sub_regions: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    DateTime {
        id: String,
        period_id: PeriodId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    Subaction {
        id: String,
        subaction: Subaction,
    },
}

impl Filter {
    pub fn kind(&self) -> FilterKind {
        match self {
            Self::Location { .. } => FilterKind::Location,
            Self::Industry { .. } => FilterKind::Industry,
            Self::SubRegion { .. } => FilterKind::SubRegion,
            Self::DateTime { .. } => FilterKind::DateTime,
            Self::Subaction { .. } => FilterKind::Subaction,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Location { id, .. }
            | Self::Industry { id, .. }
            | Self::SubRegion { id, .. }
            | Self::DateTime { id, .. }
            | Self::Subaction { id, .. } => id,
        }
    }

    pub fn locations(locations: Vec<Location>) -> Self {
        Self::Location {
            id: "location".to_string(),
            locations,
        }
    }

    pub fn industries(industries: Vec<String>) -> Self {
        Self::Industry {
            id: "industry".to_string(),
            industries,
        }
    }

    pub fn sub_regions(sub_regions: Vec<String>) -> Self {
        Self::SubRegion {
            id: "subRegion".to_string(),
            sub_regions,
        }
    }

    pub fn date_time(period_id: PeriodId, range: DateRange) -> Self {
        Self::DateTime {
            id: format!("dateTime:{}", period_id.as_str()),
            period_id,
            start_date: range.start_date,
            end_date: range.end_date,
        }
    }

    pub fn subaction(subaction: Subaction) -> Self {
        Self::Subaction {
            id: format!("subaction:{}", subaction.as_str()),
            subaction,
        }
    }
}

/// Copy-on-write collection holding at most one filter per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet {
    filters: Arc<[Filter]>,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self {
            filters: Arc::from(Vec::new()),
        }
    }
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any filter of the same kind. A kind that was already present
    /// keeps its position; a new kind is appended.
    pub fn upsert(&self, filter: Filter) -> Self {
        let kind = filter.kind();
        let mut next: Vec<Filter> = Vec::with_capacity(self.filters.len() + 1);
        let mut pending = Some(filter);
        for existing in self.filters.iter() {
            if existing.kind() == kind {
                if let Some(replacement) = pending.take() {
                    next.push(replacement);
                }
            } else {
                next.push(existing.clone());
            }
        }
        if let Some(appended) = pending {
            next.push(appended);
        }
        Self {
            filters: next.into(),
        }
    }

    pub fn remove(&self, kind: FilterKind, id: &str) -> Self {
        if !self
            .filters
            .iter()
            .any(|filter| filter.kind() == kind && filter.id() == id)
        {
            return self.clone();
        }
        Self {
            filters: self
                .filters
                .iter()
                .filter(|filter| !(filter.kind() == kind && filter.id() == id))
                .cloned()
                .collect(),
        }
    }

    pub fn remove_kind(&self, kind: FilterKind) -> Self {
        match self.get(kind) {
            Some(filter) => {
                let id = filter.id().to_string();
                self.remove(kind, &id)
            }
            None => self.clone(),
        }
    }

    pub fn clear() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: FilterKind) -> Option<&Filter> {
        self.filters.iter().find(|filter| filter.kind() == kind)
    }

    pub fn contains_kind(&self, kind: FilterKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    pub fn as_slice(&self) -> &[Filter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn subaction(&self) -> Option<Subaction> {
        match self.get(FilterKind::Subaction) {
            Some(Filter::Subaction { subaction, .. }) => Some(*subaction),
            _ => None,
        }
    }

    pub fn location_ids(&self) -> Vec<String> {
        match self.get(FilterKind::Location) {
            Some(Filter::Location { locations, .. }) => {
                locations.iter().map(|location| location.id.clone()).collect()
            }
            _ => Vec::new(),
        }
    }
}

impl FromIterator<Filter> for FilterSet {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        iter.into_iter()
            .fold(FilterSet::new(), |set, filter| set.upsert(filter))
    }
}
