use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::school::{SchoolId, SchoolRecord};
use crate::Result;

/// Filters a `CandidateSource` applies before handing records back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFilters {
    /// Empty means any city; several means any of them.
    #[serde(default)]
    pub cities: Vec<String>,
    pub board: Option<String>,
    pub featured: Option<bool>,
    pub is_public: Option<bool>,
    /// Case-insensitive substring over name, city, and address.
    pub search: Option<String>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

impl CandidateFilters {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    /// Whether `school` passes every push-down filter. Paging is not
    /// considered.
    pub fn admits(&self, school: &SchoolRecord) -> bool {
        if !self.cities.is_empty()
            && !school
                .city
                .as_ref()
                .is_some_and(|city| self.cities.iter().any(|c| c == city))
        {
            return false;
        }
        if let Some(board) = &self.board {
            if school.board.as_ref() != Some(board) {
                return false;
            }
        }
        if let Some(featured) = self.featured {
            if school.featured != featured {
                return false;
            }
        }
        if let Some(is_public) = self.is_public {
            if school.is_public != is_public {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = |field: Option<&str>| {
                field.is_some_and(|v| v.to_lowercase().contains(&needle))
            };
            let found = hit(Some(school.name.as_str()))
                || hit(school.city.as_deref())
                || hit(school.address.as_deref());
            if !found {
                return false;
            }
        }
        true
    }
}

/// The storage collaborator the matcher reads from.
///
/// Records come back in storage order; the matcher's ranking is stable with
/// respect to it.
pub trait CandidateSource: Send + Sync {
    fn fetch_candidates(
        &self,
        filters: &CandidateFilters,
    ) -> impl Future<Output = Result<Vec<SchoolRecord>>> + Send;

    fn fetch_school(&self, id: SchoolId) -> impl Future<Output = Result<Option<SchoolRecord>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn school(name: &str, city: &str, board: &str) -> SchoolRecord {
        let mut s = SchoolRecord::new(1, name);
        s.city = Some(city.into());
        s.board = Some(board.into());
        s
    }

    #[test]
    fn test_default_admits_all() {
        assert!(CandidateFilters::default().admits(&SchoolRecord::new(1, "x")));
    }

    #[test]
    fn test_cities_any_of() {
        let filters = CandidateFilters {
            cities: vec!["Delhi".into(), "Pune".into()],
            ..Default::default()
        };
        assert!(filters.admits(&school("A", "Pune", "CBSE")));
        assert!(!filters.admits(&school("B", "Surat", "CBSE")));
        assert!(!filters.admits(&SchoolRecord::new(3, "No city")));
    }

    #[test]
    fn test_search_covers_name_city_address() {
        let filters = CandidateFilters {
            search: Some("VALLEY".into()),
            ..Default::default()
        };
        let mut by_address = school("Orbit", "Surat", "ICSE");
        by_address.address = Some("12 Valley Road".into());
        assert!(filters.admits(&school("Lotus Valley", "Noida", "CBSE")));
        assert!(filters.admits(&by_address));
        assert!(!filters.admits(&school("Orbit", "Surat", "ICSE")));
    }

    #[test]
    fn test_flags() {
        let mut featured = school("F", "Delhi", "CBSE");
        featured.featured = true;
        let filters = CandidateFilters {
            featured: Some(true),
            is_public: Some(true),
            ..Default::default()
        };
        assert!(filters.admits(&featured));
        featured.is_public = false;
        assert!(!filters.admits(&featured));
    }
}
