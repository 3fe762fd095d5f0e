//! Pagination value types shared by listing queries.

use super::TicketDomainError;
use serde::{Deserialize, Serialize};

/// Page size restricted to the values the helpdesk UI offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageSize(u32);

impl PageSize {
    /// Page sizes accepted by listing queries.
    pub const ALLOWED: [u32; 4] = [10, 25, 50, 100];

    /// Creates a validated page size.
    ///
    /// # Errors
    ///
    /// Returns [`TicketDomainError::InvalidPageSize`] for values outside
    /// [`Self::ALLOWED`].
    pub fn new(value: u32) -> Result<Self, TicketDomainError> {
        if !Self::ALLOWED.contains(&value) {
            return Err(TicketDomainError::InvalidPageSize(value));
        }
        Ok(Self(value))
    }

    /// Returns the number of items per page.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(10)
    }
}

impl TryFrom<u32> for PageSize {
    type Error = TicketDomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageSize> for u32 {
    fn from(size: PageSize) -> Self {
        size.0
    }
}

/// One-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    number: u32,
    size: PageSize,
}

impl PageRequest {
    /// Creates a validated page request.
    ///
    /// # Errors
    ///
    /// Returns [`TicketDomainError::InvalidPageNumber`] when `number` is zero
    /// and [`TicketDomainError::InvalidPageSize`] when `size` is not allowed.
    pub fn new(number: u32, size: u32) -> Result<Self, TicketDomainError> {
        if number == 0 {
            return Err(TicketDomainError::InvalidPageNumber(number));
        }
        Ok(Self {
            number,
            size: PageSize::new(size)?,
        })
    }

    /// Returns the first page with the default size.
    #[must_use]
    pub fn first() -> Self {
        Self {
            number: 1,
            size: PageSize::default(),
        }
    }

    /// Returns the one-based page number.
    #[must_use]
    pub const fn number(self) -> u32 {
        self.number
    }

    /// Returns the page size.
    #[must_use]
    pub const fn size(self) -> PageSize {
        self.size
    }

    /// Number of items preceding this page.
    #[must_use]
    pub const fn offset(self) -> u64 {
        (self.number as u64 - 1) * self.size.value() as u64
    }

    /// Maximum number of items on this page.
    #[must_use]
    pub const fn limit(self) -> u64 {
        self.size.value() as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// A page of results together with the total match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// One-based page number.
    pub page_number: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Number of items across all pages.
    pub total_count: u64,
}

impl<T> Page<T> {
    /// Assembles a page for `request`.
    #[must_use]
    pub const fn new(items: Vec<T>, request: PageRequest, total_count: u64) -> Self {
        Self {
            items,
            page_number: request.number(),
            page_size: request.size().value(),
            total_count,
        }
    }

    /// Slices a fully materialised, already ordered result set.
    #[must_use]
    pub fn from_ordered(all: Vec<T>, request: PageRequest) -> Self {
        let total_count = all.len() as u64;
        let skip = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(request.limit()).unwrap_or(usize::MAX);
        let items = all.into_iter().skip(skip).take(take).collect();
        Self::new(items, request, total_count)
    }

    /// Total number of pages, never less than one.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        let size = u64::from(self.page_size.max(1));
        self.total_count.div_ceil(size).max(1)
    }
}
