use ahash::AHashMap;
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::criteria::SearchCriteria;
use crate::filter::{CriteriaFilter, Filter};
use crate::retry::{with_retry, RetryPolicy};
use crate::school::{SchoolId, SchoolRecord, SchoolSummary};
use crate::source::{CandidateFilters, CandidateSource};
use crate::Result;

/// Candidates pulled from storage for an interactive search.
pub const INTERACTIVE_POOL: usize = 20;
/// Results returned from an interactive search.
pub const RESULT_CAP: usize = 10;
/// Records scanned for city and board listings.
pub const AGGREGATE_POOL: usize = 1000;

/// Size bounds for the matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchLimits {
    pub candidate_pool: usize,
    pub result_cap: usize,
    pub aggregate_pool: usize,
}

impl Default for MatchLimits {
    fn default() -> Self {
        Self {
            candidate_pool: INTERACTIVE_POOL,
            result_cap: RESULT_CAP,
            aggregate_pool: AGGREGATE_POOL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityCount {
    pub city: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardCount {
    pub board: String,
    pub count: usize,
}

/// Filter `pool` by `criteria` and order by rating, highest first.
///
/// Ties keep their pool order. No truncation happens here.
pub fn rank(criteria: &SearchCriteria, mut pool: Vec<SchoolRecord>) -> Vec<SchoolRecord> {
    let filter = CriteriaFilter::from_criteria(criteria);
    pool.retain(|school| filter.matches(school));
    pool.sort_by(|a, b| rating_key(b).total_cmp(&rating_key(a)));
    pool
}

#[inline]
fn rating_key(school: &SchoolRecord) -> f64 {
    let rating = school.rating_or_zero();
    if rating.is_nan() {
        0.0
    } else {
        rating
    }
}

/// Counts per non-empty name, most frequent first, ties in first-seen order.
fn tally<'a>(names: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut positions: AHashMap<&'a str, usize> = AHashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for name in names.filter(|n| !n.is_empty()) {
        match positions.get(name) {
            Some(&idx) => counts[idx].1 += 1,
            None => {
                positions.insert(name, counts.len());
                counts.push((name.to_string(), 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Criteria search over a `CandidateSource`.
pub struct SchoolMatcher<S> {
    source: Arc<S>,
    limits: MatchLimits,
    retry: Option<RetryPolicy>,
}

impl<S> Clone for SchoolMatcher<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            limits: self.limits,
            retry: self.retry,
        }
    }
}

impl<S: CandidateSource> SchoolMatcher<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            limits: MatchLimits::default(),
            retry: None,
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: MatchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Route every storage call through [`with_retry`].
    #[must_use]
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    pub fn limits(&self) -> MatchLimits {
        self.limits
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    async fn fetch(&self, filters: &CandidateFilters) -> Result<Vec<SchoolRecord>> {
        let source = &*self.source;
        match &self.retry {
            Some(policy) => with_retry(policy, move || source.fetch_candidates(filters)).await,
            None => source.fetch_candidates(filters).await,
        }
    }

    /// Ranked records for `criteria`, capped at `result_cap`.
    pub async fn search_records(&self, criteria: &SearchCriteria) -> Result<Vec<SchoolRecord>> {
        let filters = CandidateFilters {
            cities: criteria.city.iter().cloned().collect(),
            board: criteria.board.clone(),
            search: criteria.name.clone(),
            limit: Some(self.limits.candidate_pool),
            ..Default::default()
        };

        let pool = self.fetch(&filters).await?;
        let pool_size = pool.len();
        let mut ranked = rank(criteria, pool);
        ranked.truncate(self.limits.result_cap);

        debug!(pool_size, matched = ranked.len(), "criteria search");
        Ok(ranked)
    }

    /// Ranked summaries for `criteria`, capped at `result_cap`.
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<SchoolSummary>> {
        let records = self.search_records(criteria).await?;
        Ok(records.iter().map(SchoolRecord::summary).collect())
    }

    pub async fn school_details(&self, id: SchoolId) -> Result<Option<SchoolRecord>> {
        let source = &*self.source;
        match &self.retry {
            Some(policy) => with_retry(policy, move || source.fetch_school(id)).await,
            None => source.fetch_school(id).await,
        }
    }

    /// Full records for `ids` in request order; unknown ids are dropped.
    pub async fn compare(&self, ids: &[SchoolId]) -> Result<Vec<SchoolRecord>> {
        let found = try_join_all(ids.iter().map(|&id| self.school_details(id))).await?;
        Ok(found.into_iter().flatten().collect())
    }

    pub async fn cities_with_counts(&self) -> Result<Vec<CityCount>> {
        let schools = self
            .fetch(&CandidateFilters::with_limit(self.limits.aggregate_pool))
            .await?;
        Ok(tally(schools.iter().filter_map(|s| s.city.as_deref()))
            .into_iter()
            .map(|(city, count)| CityCount { city, count })
            .collect())
    }

    pub async fn boards_with_counts(&self) -> Result<Vec<BoardCount>> {
        let schools = self
            .fetch(&CandidateFilters::with_limit(self.limits.aggregate_pool))
            .await?;
        Ok(tally(schools.iter().filter_map(|s| s.board.as_deref()))
            .into_iter()
            .map(|(board, count)| BoardCount { board, count })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct VecSource {
        schools: Vec<SchoolRecord>,
    }

    impl CandidateSource for VecSource {
        async fn fetch_candidates(&self, filters: &CandidateFilters) -> Result<Vec<SchoolRecord>> {
            Ok(self
                .schools
                .iter()
                .filter(|s| filters.admits(s))
                .skip(filters.offset)
                .take(filters.limit.unwrap_or(usize::MAX))
                .cloned()
                .collect())
        }

        async fn fetch_school(&self, id: SchoolId) -> Result<Option<SchoolRecord>> {
            Ok(self.schools.iter().find(|s| s.id == id).cloned())
        }
    }

    struct FlakySource {
        failures_left: AtomicU32,
        inner: VecSource,
    }

    impl CandidateSource for FlakySource {
        async fn fetch_candidates(&self, filters: &CandidateFilters) -> Result<Vec<SchoolRecord>> {
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(Error::upstream("fetch failed").with_code("UND_ERR_SOCKET"));
            }
            self.inner.fetch_candidates(filters).await
        }

        async fn fetch_school(&self, id: SchoolId) -> Result<Option<SchoolRecord>> {
            self.inner.fetch_school(id).await
        }
    }

    fn rated(id: SchoolId, rating: Option<f64>) -> SchoolRecord {
        let mut s = SchoolRecord::new(id, format!("School {id}"));
        s.rating = rating;
        s
    }

    fn matcher(schools: Vec<SchoolRecord>) -> SchoolMatcher<VecSource> {
        SchoolMatcher::new(Arc::new(VecSource { schools }))
    }

    #[test]
    fn test_rank_orders_by_rating_stable() {
        let pool = vec![
            rated(1, Some(3.0)),
            rated(2, None),
            rated(3, Some(4.5)),
            rated(4, Some(3.0)),
            rated(5, Some(0.0)),
        ];
        let ids: Vec<_> = rank(&SearchCriteria::new(), pool).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![3, 1, 4, 2, 5]);
    }

    #[test]
    fn test_rank_tolerates_nan() {
        let pool = vec![rated(1, Some(f64::NAN)), rated(2, Some(1.0))];
        let ids: Vec<_> = rank(&SearchCriteria::new(), pool).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_tally_ordering() {
        let counts = tally(["Pune", "Delhi", "", "Delhi", "Surat", "Pune"].into_iter());
        assert_eq!(
            counts,
            vec![("Pune".to_string(), 2), ("Delhi".to_string(), 2), ("Surat".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_empty_criteria_returns_top_ten() {
        let schools: Vec<_> = (1..=15).map(|i| rated(i, Some(i as f64 / 3.0))).collect();
        let results = matcher(schools).search(&SearchCriteria::new()).await.unwrap();
        let ids: Vec<_> = results.iter().map(|s| s.id).collect();
        assert_eq!(ids, (6..=15).rev().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_candidate_pool_bounds_search() {
        // Only the first 20 stored schools are considered.
        let mut schools: Vec<_> = (1..=20).map(|i| rated(i, Some(1.0))).collect();
        schools.push(rated(21, Some(5.0)));
        let results = matcher(schools).search(&SearchCriteria::new()).await.unwrap();
        assert!(results.iter().all(|s| s.id != 21));
        assert_eq!(results.len(), 10);
    }

    #[tokio::test]
    async fn test_city_is_pushed_down() {
        let mut schools: Vec<_> = (1..=25).map(|i| rated(i, Some(1.0))).collect();
        let mut pune = rated(30, Some(2.0));
        pune.city = Some("Pune".into());
        schools.push(pune);

        let results = matcher(schools)
            .search(&SearchCriteria::new().city("Pune"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 30);
    }

    #[tokio::test]
    async fn test_custom_limits() {
        let schools: Vec<_> = (1..=8).map(|i| rated(i, Some(i as f64))).collect();
        let m = matcher(schools).with_limits(MatchLimits {
            candidate_pool: 5,
            result_cap: 2,
            aggregate_pool: 100,
        });
        let ids: Vec<_> = m.search(&SearchCriteria::new()).await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![5, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_survives_transient_faults() {
        let source = FlakySource {
            failures_left: AtomicU32::new(2),
            inner: VecSource { schools: vec![rated(1, Some(4.0))] },
        };
        let m = SchoolMatcher::new(Arc::new(source))
            .with_retry(RetryPolicy::new(5, Duration::from_millis(50)));

        let results = m.search(&SearchCriteria::new()).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_search_without_retry_propagates_fault() {
        let source = FlakySource {
            failures_left: AtomicU32::new(1),
            inner: VecSource { schools: vec![rated(1, Some(4.0))] },
        };
        let m = SchoolMatcher::new(Arc::new(source));
        assert!(matches!(
            m.search(&SearchCriteria::new()).await,
            Err(Error::Upstream { .. })
        ));
    }

    #[tokio::test]
    async fn test_compare_keeps_request_order_and_drops_unknown() {
        let m = matcher(vec![rated(1, None), rated(2, None), rated(3, None)]);
        let ids: Vec<_> = m.compare(&[3, 99, 1]).await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_city_and_board_listings() {
        let mut schools = Vec::new();
        for (id, city, board) in [
            (1, "Delhi", "CBSE"),
            (2, "Pune", "ICSE"),
            (3, "Pune", "CBSE"),
            (4, "", "CBSE"),
        ] {
            let mut s = rated(id, None);
            s.city = Some(city.into());
            s.board = Some(board.into());
            schools.push(s);
        }
        let m = matcher(schools);

        let cities = m.cities_with_counts().await.unwrap();
        assert_eq!(
            cities,
            vec![
                CityCount { city: "Pune".into(), count: 2 },
                CityCount { city: "Delhi".into(), count: 1 },
            ]
        );

        let boards = m.boards_with_counts().await.unwrap();
        assert_eq!(boards[0], BoardCount { board: "CBSE".into(), count: 3 });
        assert_eq!(boards[1], BoardCount { board: "ICSE".into(), count: 1 });
    }
}
