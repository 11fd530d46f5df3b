//! Pagination over the calls endpoint
//!
//! The calls endpoint pages with skip/limit offsets: the first request sends
//! only `limit`, later requests add `skip`, and the sequence ends when a page
//! comes back with fewer records than the limit.

use crate::types::QueryPairs;
use serde_json::Value;

// ============================================================================
// Pagination Types
// ============================================================================

/// Result of the next page computation
#[derive(Debug, Clone)]
pub enum NextPage {
    /// More pages available with these parameters
    Continue {
        /// Query parameters to add/replace
        query_params: QueryPairs,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Create a continuation with query parameters
    pub fn with_params(params: QueryPairs) -> Self {
        Self::Continue {
            query_params: params,
        }
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

/// Tracks pagination state during iteration
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Current page number (zero-based)
    pub page: u32,
    /// Current offset into the result set
    pub offset: u32,
    /// Total records fetched so far
    pub total_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Increment page number
    pub fn next_page(&mut self) {
        self.page += 1;
    }

    /// Add offset
    pub fn add_offset(&mut self, amount: u32) {
        self.offset += amount;
    }

    /// Add to total fetched
    pub fn add_fetched(&mut self, count: u64) {
        self.total_fetched += count;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Get initial query parameters for the first request
    fn initial_params(&self, state: &PaginationState) -> QueryPairs;

    /// Process a response and determine if there's a next page
    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage;
}

// ============================================================================
// Skip/Limit Pagination
// ============================================================================

/// Offset pagination in the calls endpoint's dialect.
///
/// The first page carries no `skip` parameter at all; every following page
/// sends `skip=<records seen so far>`. A page shorter than the limit is the
/// last one, so a full final page costs one extra empty request.
#[derive(Debug, Clone)]
pub struct SkipPaginator {
    /// Query parameter name for the offset
    pub skip_param: String,
    /// Query parameter name for the page size
    pub limit_param: String,
    /// Number of records per page
    pub limit: u32,
}

impl SkipPaginator {
    /// Create a new skip paginator
    pub fn new(skip_param: impl Into<String>, limit_param: impl Into<String>, limit: u32) -> Self {
        Self {
            skip_param: skip_param.into(),
            limit_param: limit_param.into(),
            limit,
        }
    }

    /// Create a paginator with the calls endpoint's parameter names
    pub fn calls(limit: u32) -> Self {
        Self::new("skip", "limit", limit)
    }
}

impl Paginator for SkipPaginator {
    fn initial_params(&self, _state: &PaginationState) -> QueryPairs {
        vec![(self.limit_param.clone(), self.limit.to_string())]
    }

    fn process_response(
        &self,
        _body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.add_fetched(records_count as u64);

        // A short page is the last page
        if records_count < self.limit as usize {
            state.mark_done();
            return NextPage::Done;
        }

        state.add_offset(self.limit);
        state.next_page();

        NextPage::with_params(vec![
            (self.limit_param.clone(), self.limit.to_string()),
            (self.skip_param.clone(), state.offset.to_string()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_page_omits_skip() {
        let paginator = SkipPaginator::calls(100);
        let state = PaginationState::new();

        let params = paginator.initial_params(&state);
        assert_eq!(params, vec![("limit".to_string(), "100".to_string())]);
        assert!(!params.iter().any(|(k, _)| k == "skip"));
    }

    #[test]
    fn test_full_page_advances_offset() {
        let paginator = SkipPaginator::calls(100);
        let mut state = PaginationState::new();
        let body = json!({"calls": []});

        let next = paginator.process_response(&body, 100, &mut state);
        match next {
            NextPage::Continue { query_params } => {
                assert!(query_params.contains(&("skip".to_string(), "100".to_string())));
                assert!(query_params.contains(&("limit".to_string(), "100".to_string())));
            }
            NextPage::Done => panic!("expected continuation"),
        }
        assert_eq!(state.offset, 100);
        assert_eq!(state.page, 1);

        let next = paginator.process_response(&body, 100, &mut state);
        match next {
            NextPage::Continue { query_params } => {
                assert!(query_params.contains(&("skip".to_string(), "200".to_string())));
            }
            NextPage::Done => panic!("expected continuation"),
        }
    }

    #[test]
    fn test_short_page_stops() {
        let paginator = SkipPaginator::calls(100);
        let mut state = PaginationState::new();
        let body = json!({"calls": []});

        let next = paginator.process_response(&body, 37, &mut state);
        assert!(next.is_done());
        assert!(state.done);
        assert_eq!(state.total_fetched, 37);
    }

    #[test]
    fn test_empty_page_stops() {
        let paginator = SkipPaginator::calls(100);
        let mut state = PaginationState::new();
        let body = json!({"calls": []});

        let next = paginator.process_response(&body, 0, &mut state);
        assert!(next.is_done());
    }

    #[test]
    fn test_pagination_terminates() {
        // Simulate a fetch loop over a fixed dataset: it must visit each
        // page exactly once and stop.
        let paginator = SkipPaginator::calls(100);
        let mut state = PaginationState::new();
        let body = json!({"calls": []});

        let page_sizes = [100usize, 100, 37];
        let mut pages = 0;
        for size in page_sizes {
            assert!(!state.done);
            pages += 1;
            if paginator.process_response(&body, size, &mut state).is_done() {
                break;
            }
        }

        assert_eq!(pages, 3);
        assert!(state.done);
        assert_eq!(state.total_fetched, 237);
    }

    #[test]
    fn test_next_page_helpers() {
        assert!(NextPage::Done.is_done());
        assert!(!NextPage::Done.is_continue());

        let next = NextPage::with_params(vec![("skip".to_string(), "100".to_string())]);
        assert!(next.is_continue());
        assert!(!next.is_done());
    }
}
