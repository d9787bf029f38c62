//! Page arithmetic for the directory listing.

/// Metadata of one valid directory page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub page: u64,
    /// Previous page, clamped at 0 on the first page.
    pub prev_page: u64,
    /// Next page; not clamped at the last page.
    pub next_page: u64,
    pub last_page: u64,
}

/// Index of the last addressable page: `ceil(total / limit) - 1`.
///
/// Returns -1 when the corpus is empty, in which case every page request is
/// out of range.
pub fn last_page(total: u64, limit: u64) -> i64 {
    (total.div_ceil(limit) as i64) - 1
}

/// Compute the metadata for `page`, or `None` when it is past the last page.
pub fn page_meta(page: u64, total: u64, limit: u64) -> Option<PageMeta> {
    let last = last_page(total, limit);
    if (page as i64) > last {
        return None;
    }
    Some(PageMeta {
        page,
        prev_page: page.saturating_sub(1),
        next_page: page + 1,
        last_page: last as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_page_formula() {
        assert_eq!(last_page(25, 10), 2);
        assert_eq!(last_page(20, 10), 1);
        assert_eq!(last_page(1, 10), 0);
        assert_eq!(last_page(10, 10), 0);
        assert_eq!(last_page(11, 10), 1);
    }

    #[test]
    fn test_empty_corpus_has_no_pages() {
        assert_eq!(last_page(0, 10), -1);
        assert_eq!(page_meta(0, 0, 10), None);
        assert_eq!(page_meta(5, 0, 10), None);
    }

    #[test]
    fn test_first_page_of_25() {
        let meta = page_meta(0, 25, 10).unwrap();
        assert_eq!(meta.prev_page, 0);
        assert_eq!(meta.next_page, 1);
        assert_eq!(meta.last_page, 2);
    }

    #[test]
    fn test_last_page_of_25_is_valid() {
        let meta = page_meta(2, 25, 10).unwrap();
        assert_eq!(meta.prev_page, 1);
        assert_eq!(meta.last_page, 2);
        // next_page is reported unclamped even on the last page.
        assert_eq!(meta.next_page, 3);
    }

    #[test]
    fn test_page_past_last_is_rejected() {
        assert_eq!(page_meta(3, 25, 10), None);
        assert_eq!(page_meta(100, 25, 10), None);
    }
}
