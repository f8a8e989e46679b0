//! Page requests and paginated result wrappers.

use serde::Serialize;

use crate::{config::PaginationConfig, error::AppError};

/// A validated request for one page of results. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Resolve optional query parameters against the configured limits.
    pub fn resolve(
        page: Option<u32>,
        page_size: Option<u32>,
        config: PaginationConfig,
    ) -> Result<Self, AppError> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(config.default_page_size);

        if page == 0 {
            return Err(AppError::InvalidRequest(
                "page must be at least 1".to_string(),
            ));
        }
        if page_size == 0 || page_size > config.max_page_size {
            return Err(AppError::InvalidRequest(format!(
                "page_size must be between 1 and {}",
                config.max_page_size
            )));
        }

        Ok(Self { page, page_size })
    }

    /// Number of records to skip before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

/// One page of items plus the counts needed to navigate the rest.
///
/// # JSON Example
///
/// ```json
/// {
///   "items": [],
///   "total_count": 25,
///   "page_size": 10,
///   "current_page": 2,
///   "total_pages": 3,
///   "has_previous_page": true,
///   "has_next_page": true
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedList<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page_size: u32,
    pub current_page: u32,
    pub total_pages: u64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> PaginatedList<T> {
    pub fn new(items: Vec<T>, total_count: u64, page: PageRequest) -> Self {
        let total_pages = total_count.div_ceil(u64::from(page.page_size));
        Self {
            items,
            total_count,
            page_size: page.page_size,
            current_page: page.page,
            total_pages,
            has_previous_page: page.page > 1,
            has_next_page: u64::from(page.page) < total_pages,
        }
    }

    /// Convert the items while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedList<U> {
        PaginatedList {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page_size: self.page_size,
            current_page: self.current_page,
            total_pages: self.total_pages,
            has_previous_page: self.has_previous_page,
            has_next_page: self.has_next_page,
        }
    }
}
