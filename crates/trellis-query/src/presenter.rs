//! Presentation seam.

use crate::engine::PageView;

/// Something that renders a page of results, e.g. a terminal table or a
/// web grid.
pub trait GridPresenter {
    type Output;

    fn present(&mut self, page: &PageView<'_>) -> Self::Output;
}
