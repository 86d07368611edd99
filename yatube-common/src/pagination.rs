//! Page arithmetic shared by every feed.
//!
//! Page numbers are 1-based. A request above the last page lands on the last page, anything
//! below 1 or unparsable lands on the first one, and an empty listing still has one (empty)
//! page.

use serde::Serialize;
use std::num::NonZeroU64;

pub const PAGE_SIZE: NonZeroU64 = NonZeroU64::new(10).unwrap();

/// Which page the client asked for, after interpreting the raw `page` query value.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum PageSelector {
    Number(NonZeroU64),
    Last,
}

impl Default for PageSelector {
    fn default() -> Self {
        Self::Number(NonZeroU64::MIN)
    }
}

impl PageSelector {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim) else {
            return Self::default();
        };

        if raw == "last" {
            return Self::Last;
        }

        match raw.parse::<i64>() {
            Ok(number) => u64::try_from(number)
                .ok()
                .and_then(NonZeroU64::new)
                .map_or_else(Self::default, Self::Number),
            // Too many digits for any real page count.
            Err(_) if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) => Self::Last,
            Err(_) => Self::default(),
        }
    }
}

/// The slice of a listing that makes up one page.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct PageWindow {
    pub number: u64,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct Paginator {
    total_items: u64,
    page_size: NonZeroU64,
}

impl Paginator {
    #[must_use]
    pub fn new(total_items: u64) -> Self {
        Self::with_page_size(total_items, PAGE_SIZE)
    }

    #[must_use]
    pub fn with_page_size(total_items: u64, page_size: NonZeroU64) -> Self {
        Self {
            total_items,
            page_size,
        }
    }

    #[must_use]
    pub fn total_items(self) -> u64 {
        self.total_items
    }

    #[must_use]
    pub fn total_pages(self) -> u64 {
        self.total_items.div_ceil(self.page_size.get()).max(1)
    }

    #[must_use]
    pub fn window(self, selector: PageSelector) -> PageWindow {
        let number = match selector {
            PageSelector::Number(number) => number.get().min(self.total_pages()),
            PageSelector::Last => self.total_pages(),
        };
        let page_size = self.page_size.get();

        PageWindow {
            number,
            offset: (number - 1) * page_size,
            limit: page_size,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, paginator: Paginator, window: PageWindow) -> Self {
        Self {
            items,
            current_page: window.number,
            total_pages: paginator.total_pages(),
            total_items: paginator.total_items(),
        }
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}
