// 🔎 Filter Engine - scope, categorical equality, date range, free-text search
// All active criteria combine with AND. Criteria are applied cheapest-first;
// the result set does not depend on the order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::records::{parse_day, Donation, PersonRecord, Project};

/// Category value that disables a filter
pub const ALL: &str = "all";

// ============================================================================
// FILTERABLE RECORDS
// ============================================================================

/// How a record type exposes itself to the filter engine
pub trait Filterable {
    /// Ownership key compared against `owner_scope`; None means the record
    /// type is not scoped and is visible to every actor
    fn owner_key(&self) -> Option<&str>;

    /// Value of a categorical field by its wire name
    fn category(&self, field: &str) -> Option<&str>;

    /// Day the record is dated on, if the record type carries a date
    fn record_date(&self) -> Option<NaiveDate>;

    /// Text fields searched by `search_term`
    fn search_fields(&self) -> Vec<&str>;
}

impl Filterable for PersonRecord {
    fn owner_key(&self) -> Option<&str> {
        Some(self.family_name.as_str())
    }

    fn category(&self, field: &str) -> Option<&str> {
        match field {
            "tribeName" => Some(self.tribe_name.as_str()),
            "familyName" => Some(self.family_name.as_str()),
            "residentialArea" => Some(self.residential_area.as_str()),
            "employmentStatus" => Some(self.employment_status.as_str()),
            "traditionalInstitution" => Some(self.traditional_institution.map_or("", |i| i.as_str())),
            _ => None,
        }
    }

    fn record_date(&self) -> Option<NaiveDate> {
        None
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.first_name.as_str(),
            self.family_name.as_str(),
            self.father_name.as_str(),
            self.mother_name.as_str(),
        ]
    }
}

impl Filterable for Donation {
    fn owner_key(&self) -> Option<&str> {
        None
    }

    fn category(&self, field: &str) -> Option<&str> {
        match field {
            "purpose" => Some(self.purpose.as_str()),
            _ => None,
        }
    }

    fn record_date(&self) -> Option<NaiveDate> {
        parse_day(&self.date)
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.donor_name.as_str(), self.verified_by.as_str()];
        if let Some(contact) = &self.donor_contact {
            fields.push(contact.as_str());
        }
        fields
    }
}

impl Filterable for Project {
    fn owner_key(&self) -> Option<&str> {
        Some(self.tribe.as_str())
    }

    fn category(&self, field: &str) -> Option<&str> {
        match field {
            "tribe" => Some(self.tribe.as_str()),
            "status" => Some(self.status.as_str()),
            _ => None,
        }
    }

    fn record_date(&self) -> Option<NaiveDate> {
        parse_day(&self.start_date)
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.description.as_str(), self.objective.as_str()]
    }
}

// ============================================================================
// CRITERIA
// ============================================================================

/// Inclusive day bounds; either side may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        DateRange { from, to }
    }

    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Restrict to records whose owner key equals this value
    pub owner_scope: Option<String>,

    /// field → exact value; `"all"` and `""` are ignored
    pub category_filters: BTreeMap<String, String>,

    pub date_range: Option<DateRange>,

    /// Case-insensitive substring over the record's search fields
    pub search_term: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: restrict to one owner
    pub fn with_owner_scope(mut self, owner: Option<&str>) -> Self {
        self.owner_scope = owner.map(|o| o.to_string());
        self
    }

    /// Builder pattern: add a categorical equality filter
    pub fn with_category(mut self, field: &str, value: &str) -> Self {
        self.category_filters.insert(field.to_string(), value.to_string());
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_search(mut self, term: &str) -> Self {
        self.search_term = Some(term.to_string());
        self
    }

    fn active_categories(&self) -> Vec<(&str, &str)> {
        self.category_filters
            .iter()
            .filter(|(_, value)| !value.is_empty() && value.as_str() != ALL)
            .map(|(field, value)| (field.as_str(), value.as_str()))
            .collect()
    }

    fn active_range(&self) -> Option<DateRange> {
        self.date_range.filter(|range| !range.is_open())
    }

    fn active_term(&self) -> Option<String> {
        self.search_term
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }

    /// True when no criterion would narrow anything
    pub fn is_empty(&self) -> bool {
        self.owner_scope.is_none()
            && self.active_categories().is_empty()
            && self.active_range().is_none()
            && self.active_term().is_none()
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Apply every active criterion; returns clones of the matching records in
/// input order
pub fn apply_filters<T: Filterable + Clone>(records: &[T], criteria: &FilterCriteria) -> Vec<T> {
    let categories = criteria.active_categories();
    let range = criteria.active_range();
    let term = criteria.active_term();

    records
        .iter()
        .filter(|r| in_scope(*r, criteria.owner_scope.as_deref()))
        .filter(|r| {
            categories
                .iter()
                .all(|(field, value)| r.category(field) == Some(*value))
        })
        .filter(|r| match range {
            Some(range) => r.record_date().map_or(false, |day| range.contains(day)),
            None => true,
        })
        .filter(|r| match &term {
            Some(term) => matches_term(*r, term),
            None => true,
        })
        .cloned()
        .collect()
}

fn in_scope<T: Filterable>(record: &T, scope: Option<&str>) -> bool {
    match (scope, record.owner_key()) {
        (None, _) => true,
        // Unscoped record types are shared across actors
        (Some(_), None) => true,
        (Some(scope), Some(owner)) => owner == scope,
    }
}

/// `term` must already be lower-cased
pub fn matches_term<T: Filterable>(record: &T, term: &str) -> bool {
    record
        .search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(term))
}

// ============================================================================
// TESTS
// ============================================================================
