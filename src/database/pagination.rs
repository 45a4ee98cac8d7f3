use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Highest page number that keeps `offset` inside `i64` at any allowed limit.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

/// Page number and size requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Builds a request from raw query values; garbage falls back to defaults.
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.parse::<i64>().ok())
            .filter(|p| *p > 0)
            .map(|p| p.min(MAX_PAGE))
            .unwrap_or(1);
        let limit = limit
            .and_then(|l| l.parse::<i64>().ok())
            .filter(|l| *l > 0)
            .map(|l| l.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, request: PageRequest) -> Self {
        let page_count = (total_rows + request.limit - 1) / request.limit;

        let next = if request.page < page_count {
            Some(request.page + 1)
        } else {
            None
        };
        let previous = if request.page > 1 {
            Some((request.page - 1).min(page_count.max(1)))
        } else {
            None
        };

        Self {
            count: total_rows,
            next,
            previous,
            results: rows,
        }
    }

    /// Same page metadata over a different result set.
    pub fn with_results<U>(self, results: Vec<U>) -> PageContext<U> {
        PageContext {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results,
        }
    }
}
