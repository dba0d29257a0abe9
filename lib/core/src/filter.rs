// Criteria filters over school records
use crate::criteria::SearchCriteria;
use crate::facility;
use crate::school::SchoolRecord;

pub trait Filter {
    fn matches(&self, school: &SchoolRecord) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    /// Exact, case-sensitive.
    City(String),
    /// Exact, case-sensitive.
    Board(String),
    /// Exact, case-insensitive.
    SchoolType(String),
    /// Keep schools whose lower fee bound is known and at most this amount.
    FeesAtMost(i64),
    /// Keep schools whose upper fee bound is known and at least this amount.
    FeesAtLeast(i64),
    /// Case-insensitive substring of `medium` or `languages`.
    Medium(String),
    /// Every named facility must be offered.
    Facilities(Vec<String>),
    And(Vec<FilterCondition>),
}

/// The conjunction of conditions derived from a `SearchCriteria`, in the
/// order they are evaluated.
pub struct CriteriaFilter {
    condition: FilterCondition,
}

impl CriteriaFilter {
    pub fn new(condition: FilterCondition) -> Self {
        Self { condition }
    }

    pub fn from_criteria(criteria: &SearchCriteria) -> Self {
        let mut conditions = Vec::new();

        if let Some(city) = &criteria.city {
            conditions.push(FilterCondition::City(city.clone()));
        }
        if let Some(board) = &criteria.board {
            conditions.push(FilterCondition::Board(board.clone()));
        }
        if let Some(school_type) = &criteria.school_type {
            conditions.push(FilterCondition::SchoolType(school_type.clone()));
        }
        if let Some(max) = criteria.fees_max {
            conditions.push(FilterCondition::FeesAtMost(max));
        }
        if let Some(min) = criteria.fees_min {
            conditions.push(FilterCondition::FeesAtLeast(min));
        }
        if let Some(medium) = &criteria.medium {
            conditions.push(FilterCondition::Medium(medium.clone()));
        }

        let wanted: Vec<String> = criteria
            .facilities
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();
        if !wanted.is_empty() {
            conditions.push(FilterCondition::Facilities(wanted));
        }

        Self::new(FilterCondition::And(conditions))
    }

    pub fn condition(&self) -> &FilterCondition {
        &self.condition
    }

    fn matches_condition(condition: &FilterCondition, school: &SchoolRecord) -> bool {
        match condition {
            FilterCondition::City(city) => school.city.as_deref() == Some(city.as_str()),
            FilterCondition::Board(board) => school.board.as_deref() == Some(board.as_str()),
            FilterCondition::SchoolType(wanted) => school
                .school_type
                .as_deref()
                .map(|t| t.to_lowercase() == wanted.to_lowercase())
                .unwrap_or(false),
            FilterCondition::FeesAtMost(max) => {
                school.fees_min.map(|min| min <= *max).unwrap_or(false)
            }
            FilterCondition::FeesAtLeast(min) => {
                school.fees_max.map(|max| max >= *min).unwrap_or(false)
            }
            FilterCondition::Medium(wanted) => {
                let wanted = wanted.to_lowercase();
                let in_medium = school
                    .medium
                    .as_deref()
                    .map(|m| m.to_lowercase().contains(&wanted))
                    .unwrap_or(false);
                in_medium
                    || school
                        .languages
                        .as_ref()
                        .map(|l| l.as_text().to_lowercase().contains(&wanted))
                        .unwrap_or(false)
            }
            FilterCondition::Facilities(names) => facility::offers_all(school, names),
            FilterCondition::And(conditions) => {
                conditions.iter().all(|c| Self::matches_condition(c, school))
            }
        }
    }
}

impl Filter for CriteriaFilter {
    fn matches(&self, school: &SchoolRecord) -> bool {
        Self::matches_condition(&self.condition, school)
    }
}
