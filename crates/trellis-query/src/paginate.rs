//! Pagination stage.

use std::ops::Range;

use trellis_model::Layout;

/// Index range of the current page within a result of `total` items.
///
/// `[(page - 1) * size, page * size)`, clipped to `total`.
pub fn page_range(layout: &Layout, total: usize) -> Range<usize> {
    let size = layout.page_size();
    let start = layout.page.saturating_sub(1).saturating_mul(size).min(total);
    let end = start.saturating_add(size).min(total);
    start..end
}

pub fn apply<'a>(layout: &Layout, indices: &'a [usize]) -> &'a [usize] {
    &indices[page_range(layout, indices.len())]
}

/// Clamp a requested page into `[1, total_pages]`; 1 when there are no pages.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(ncol: usize, nrow: usize, page: usize) -> Layout {
        Layout {
            ncol,
            nrow,
            page,
            ..Layout::default()
        }
    }

    #[test]
    fn test_last_page_is_partial() {
        assert_eq!(page_range(&layout(2, 2, 3), 10), 8..10);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        assert!(page_range(&layout(2, 1, 9), 4).is_empty());
    }

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(0, 3), 1);
        assert_eq!(clamp_page(7, 3), 3);
        assert_eq!(clamp_page(4, 0), 1);
    }
}
