//! # Pagination
//!
//! Page requests and page envelopes shared by every list operation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::ValidationResult;
use crate::DEFAULT_PER_PAGE;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        PageRequest { page, per_page }
    }

    /// Checks `page >= 1` and `1 <= per_page <= max_per_page`.
    pub fn validate(&self, max_per_page: u32) -> ValidationResult<()> {
        if self.page == 0 {
            return Err(ValidationError::must_be_positive("page"));
        }

        if self.per_page == 0 || self.per_page > max_per_page {
            return Err(ValidationError::OutOfRange {
                field: "per_page".to_string(),
                min: 1,
                max: max_per_page as i64,
            });
        }

        Ok(())
    }

    /// Rows to skip for this page.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }

    #[inline]
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// One page of results plus the totals needed to render a pager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        Page {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
            total_pages: total_pages(total, request.per_page),
        }
    }
}

/// `ceil(total / per_page)`, zero for an empty result.
pub fn total_pages(total: i64, per_page: u32) -> i64 {
    if total <= 0 || per_page == 0 {
        return 0;
    }
    let per_page = per_page as i64;
    (total + per_page - 1) / per_page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(PageRequest::new(1, 10).validate(100).is_ok());
        assert!(PageRequest::new(0, 10).validate(100).is_err());
        assert!(PageRequest::new(1, 0).validate(100).is_err());
        assert!(PageRequest::new(1, 101).validate(100).is_err());
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 25).offset(), 50);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn test_default_request() {
        let req = PageRequest::default();
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, DEFAULT_PER_PAGE);
    }
}
