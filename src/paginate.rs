//! Page slicing over a snapshot.

use crate::models::{Item, Snapshot};

/// Items shown per page.
pub const PAGE_SIZE: usize = 10;

/// One page of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a> {
    pub items: &'a [Item],
    /// The 1-indexed page actually served, after clamping.
    pub page: usize,
    pub total_pages: usize,
}

impl Page<'_> {
    /// Zero-based position of the first item on this page within the snapshot.
    pub fn offset(&self, page_size: usize) -> usize {
        self.page.saturating_sub(1).saturating_mul(page_size.max(1))
    }
}

/// Slices `snapshot` into page `page_number` of `page_size` items.
///
/// `page_number` is 1-indexed and values below 1 are served as page 1. A
/// page past the end is an empty slice, not an error. `total_pages` is 0
/// for an empty snapshot.
pub fn paginate(snapshot: &Snapshot, page_number: i64, page_size: usize) -> Page<'_> {
    let page_size = page_size.max(1);
    let page = usize::try_from(page_number.max(1)).unwrap_or(usize::MAX);
    let items = snapshot.items();
    let total_pages = items.len().div_ceil(page_size);

    let start = (page - 1).saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());

    Page {
        items: &items[start..end],
        page,
        total_pages,
    }
}
