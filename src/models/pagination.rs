//! Offset/limit pagination for list endpoints.

use serde::Deserialize;
use validator::Validate;

/// Page size for attendee listings when `limit` is omitted.
pub const DEFAULT_LIMIT: i64 = 100;

/// Largest page a client may request.
pub const MAX_LIMIT: i64 = 200;

/// Offset/limit window applied to a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    offset: i64,
    /// `None` means no upper bound (`LIMIT NULL` in Postgres).
    limit: Option<i64>,
}

impl Pagination {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset: offset.max(0),
            limit: Some(limit.max(0)),
        }
    }

    /// Every row from the start.
    pub fn unbounded() -> Self {
        Self {
            offset: 0,
            limit: None,
        }
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(0, DEFAULT_LIMIT)
    }
}

/// `?skip=&limit=` query parameters.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PaginationParams {
    #[validate(range(min = 0, message = "skip must not be negative"))]
    pub skip: Option<i64>,
    #[validate(range(min = 1, max = MAX_LIMIT, message = "limit must be between 1 and 200"))]
    pub limit: Option<i64>,
}

impl PaginationParams {
    /// Window with defaults filled in.
    pub fn page(&self) -> Pagination {
        Pagination::new(self.skip.unwrap_or(0), self.limit.unwrap_or(DEFAULT_LIMIT))
    }

    /// `None` when the client asked for neither bound.
    pub fn optional_page(&self) -> Option<Pagination> {
        match (self.skip, self.limit) {
            (None, None) => None,
            (skip, Some(limit)) => Some(Pagination::new(skip.unwrap_or(0), limit)),
            (Some(skip), None) => Some(Pagination {
                offset: skip.max(0),
                limit: None,
            }),
        }
    }
}
