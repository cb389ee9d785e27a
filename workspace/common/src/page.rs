use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One window of a paginated result set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Page<T> {
    /// Records on this page, at most `per_page` of them
    pub items: Vec<T>,
    /// 1-based number of this page
    pub number: u64,
    /// Total number of pages, never less than 1
    pub num_pages: u64,
    /// Total number of records across all pages
    pub count: u64,
    /// Page size the result set was split with
    pub per_page: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the records of this page, keeping its bookkeeping.
    pub fn with_items<U>(self, items: Vec<U>) -> Page<U> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            per_page: self.per_page,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }

    /// Convert every record while keeping the page bookkeeping.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            per_page: self.per_page,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}
