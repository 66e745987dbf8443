//! Pagination over a normalized article collection
//!
//! Slicing is plain offset arithmetic. The page-number sequence is a display
//! affordance only: first and last page, a window of up to three pages around
//! the current one, and ellipsis markers for the gaps.

use serde::{Serialize, Serializer};

/// Above this many pages the sequence is elided.
pub const MAX_PAGES_SHOWN: usize = 5;

/// One entry of the page-number sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(usize),
    Ellipsis,
}

impl Serialize for PageLink {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageLink::Page(n) => serializer.serialize_u64(*n as u64),
            PageLink::Ellipsis => serializer.serialize_str("..."),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub page_numbers: Vec<PageLink>,
}

/// `ceil(total_items / page_size)`; a zero page size counts as one.
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    total_items.div_ceil(page_size.max(1))
}

/// Cuts page `current_page` (1-based) out of `items`.
///
/// Out-of-range pages are clamped to `[1, total_pages]`.
pub fn paginate<T: Clone>(items: &[T], page_size: usize, current_page: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(items.len(), page_size);
    let current_page = current_page.clamp(1, total_pages.max(1));

    let start = ((current_page - 1) * page_size).min(items.len());
    let end = (current_page * page_size).min(items.len());

    Page {
        items: items[start..end].to_vec(),
        current_page,
        page_size,
        total_pages,
        total_items: items.len(),
        page_numbers: page_numbers(total_pages, current_page),
    }
}

/// Page numbers to render for navigation.
///
/// ```
/// use image_articles::pagination::{page_numbers, PageLink::{Ellipsis, Page}};
///
/// assert_eq!(
///     page_numbers(10, 5),
///     vec![Page(1), Ellipsis, Page(4), Page(5), Page(6), Ellipsis, Page(10)]
/// );
/// ```
pub fn page_numbers(total_pages: usize, current_page: usize) -> Vec<PageLink> {
    if total_pages <= MAX_PAGES_SHOWN {
        return (1..=total_pages).map(PageLink::Page).collect();
    }

    let current = current_page.clamp(1, total_pages);
    let last_inner = total_pages - 1;

    let mut start = current.saturating_sub(1).max(2);
    let mut end = (current + 1).min(last_inner);

    // Near an edge the window shrinks; widen it toward the side with room.
    if end - start < 2 {
        if current < total_pages / 2 {
            end = (start + 2).min(last_inner);
        } else {
            start = end.saturating_sub(2).max(2);
        }
    }

    let mut links = Vec::with_capacity(7);
    links.push(PageLink::Page(1));
    if start > 2 {
        links.push(PageLink::Ellipsis);
    }
    links.extend((start..=end).map(PageLink::Page));
    if end < last_inner {
        links.push(PageLink::Ellipsis);
    }
    links.push(PageLink::Page(total_pages));
    links
}

/// Current-page state of one viewing session.
#[derive(Debug, Clone)]
pub struct Pager {
    total_items: usize,
    page_size: usize,
    current_page: usize,
}

impl Pager {
    pub fn new(total_items: usize, page_size: usize) -> Self {
        Self {
            total_items,
            page_size: page_size.max(1),
            current_page: 1,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.total_items, self.page_size)
    }

    /// Moves to `page`. Pages outside `[1, total_pages]` leave the state
    /// unchanged and return `false`.
    pub fn go_to(&mut self, page: usize) -> bool {
        if page == 0 || page > self.total_pages() {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.current_page + 1)
    }

    pub fn previous(&mut self) -> bool {
        self.go_to(self.current_page.saturating_sub(1))
    }

    pub fn page_numbers(&self) -> Vec<PageLink> {
        page_numbers(self.total_pages(), self.current_page)
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = ((self.current_page - 1) * self.page_size).min(items.len());
        let end = (self.current_page * self.page_size).min(items.len());
        &items[start..end]
    }
}
