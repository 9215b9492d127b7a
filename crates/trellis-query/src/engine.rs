//! Session state machine over one display's records.
//!
//! Every transition is total: out-of-range input is clamped and nothing here
//! returns an error. The ordered result (filter, search, sort) is cached by
//! query fingerprint; pagination is applied on top of it per call.

use std::rc::Rc;

use trellis_model::{
    Arrangement, DisplaySchema, DisplayState, FilterEntry, FilterSpec, Layout, MetaDescriptor,
    Record, SortDirection, SortKey, View,
};

use crate::cache::{CacheStats, ResultCache, fingerprint};
use crate::{filter, paginate, search, sort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Number of distinct orderings kept; 0 disables the cache.
    pub cache_capacity: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self { cache_capacity: 32 }
    }
}

/// One page of results, as handed to a presenter.
#[derive(Debug, Clone)]
pub struct PageView<'a> {
    pub records: Vec<&'a Record>,
    pub labels: &'a [String],
    pub metas: &'a [MetaDescriptor],
    pub layout: Layout,
    pub total_pages: usize,
    /// Records left after filtering and search.
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct QueryEngine {
    metas: Vec<MetaDescriptor>,
    records: Vec<Record>,
    state: DisplayState,
    search: String,
    cache: ResultCache,
}

impl QueryEngine {
    pub fn new(
        metas: Vec<MetaDescriptor>,
        records: Vec<Record>,
        state: DisplayState,
        options: QueryOptions,
    ) -> Self {
        Self {
            metas,
            records,
            state,
            search: String::new(),
            cache: ResultCache::new(options.cache_capacity),
        }
    }

    /// Engine starting from the schema's stored state.
    pub fn from_schema(schema: &DisplaySchema, records: Vec<Record>, options: QueryOptions) -> Self {
        Self::new(schema.metas.clone(), records, schema.state.clone(), options)
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn metas(&self) -> &[MetaDescriptor] {
        &self.metas
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn search_query(&self) -> &str {
        &self.search
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // === Filters ===

    /// Set the filter on `varname`; an empty spec removes it. Resets to page 1.
    pub fn set_filter(&mut self, varname: impl Into<String>, spec: FilterSpec) {
        let varname = varname.into();
        let filters = &mut self.state.filter;
        let existing = filters.iter().position(|entry| entry.varname == varname);
        match (existing, spec.is_empty()) {
            (Some(idx), true) => {
                filters.remove(idx);
            }
            (Some(idx), false) => filters[idx].spec = spec,
            (None, true) => {}
            (None, false) => filters.push(FilterEntry { varname, spec }),
        }
        self.state.layout.page = 1;
        tracing::debug!(filters = self.state.filter.len(), "filter updated");
    }

    pub fn filter(&self, varname: &str) -> Option<&FilterSpec> {
        self.state
            .filter
            .iter()
            .find(|entry| entry.varname == varname)
            .map(|entry| &entry.spec)
    }

    pub fn clear_filters(&mut self) {
        self.state.filter.clear();
        self.state.layout.page = 1;
    }

    // === Sorting ===

    /// Make `varname` the top-priority sort key.
    pub fn set_sort(&mut self, varname: impl Into<String>, dir: SortDirection) {
        let varname = varname.into();
        self.state.sort.retain(|key| key.varname != varname);
        self.state.sort.insert(0, SortKey::new(varname, dir));
        tracing::debug!(sort = ?self.state.sort, "sort updated");
    }

    pub fn remove_sort(&mut self, varname: &str) {
        self.state.sort.retain(|key| key.varname != varname);
    }

    pub fn clear_sorts(&mut self) {
        self.state.sort.clear();
    }

    // === Layout and paging ===

    /// Change the grid; dimensions are floored at 1. Resets to page 1.
    pub fn set_layout(
        &mut self,
        ncol: Option<usize>,
        nrow: Option<usize>,
        arrangement: Option<Arrangement>,
    ) {
        let layout = &mut self.state.layout;
        if let Some(ncol) = ncol {
            layout.ncol = ncol.max(1);
        }
        if let Some(nrow) = nrow {
            layout.nrow = nrow.max(1);
        }
        if let Some(arrangement) = arrangement {
            layout.arrangement = arrangement;
        }
        layout.page = 1;
    }

    pub fn layout(&self) -> &Layout {
        &self.state.layout
    }

    /// Jump to page `n`, clamped to the pages of the current result.
    pub fn set_page(&mut self, n: usize) {
        let kept = self.result_len();
        let total_pages = self.total_pages(kept);
        self.state.layout.page = paginate::clamp_page(n, total_pages);
    }

    pub fn next_page(&mut self, total_pages: usize) {
        let next = self.state.layout.page.saturating_add(1);
        self.state.layout.page = paginate::clamp_page(next, total_pages);
    }

    pub fn prev_page(&mut self) {
        self.state.layout.page = self.state.layout.page.saturating_sub(1).max(1);
    }

    pub fn total_pages(&self, n: usize) -> usize {
        self.state.layout.total_pages(n)
    }

    // === Labels and search ===

    pub fn set_labels<I, S>(&mut self, varnames: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.labels = varnames.into_iter().map(Into::into).collect();
    }

    /// Add `varname` to the labels, or remove it if already shown.
    pub fn toggle_label(&mut self, varname: &str) {
        match self.state.labels.iter().position(|label| label == varname) {
            Some(idx) => {
                self.state.labels.remove(idx);
            }
            None => self.state.labels.push(varname.to_string()),
        }
    }

    /// Set the free-text search. Not stored in views. Resets to page 1.
    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
        self.state.layout.page = 1;
    }

    // === Views ===

    pub fn save_view(&self, name: impl Into<String>) -> View {
        View::new(name, self.state.clone())
    }

    /// Replace the whole session state with the view's. Clears the search.
    pub fn load_view(&mut self, view: &View) {
        self.state = view.state.clone();
        self.search.clear();
        tracing::debug!(view = %view.name, "loaded view");
    }

    // === Results ===

    /// Indices of all records passing filters and search, in sort order.
    pub fn ordered_indices(&mut self) -> Rc<[usize]> {
        let key = fingerprint(&self.state.filter, &self.search, &self.state.sort);
        if let Some(key) = key.as_deref()
            && let Some(indices) = self.cache.get(key)
        {
            return indices;
        }

        let all: Vec<usize> = (0..self.records.len()).collect();
        let kept = filter::apply(&self.records, &self.metas, &self.state.filter, all);
        let kept = search::apply(&self.records, &self.metas, &self.search, kept);
        let ordered: Rc<[usize]> =
            sort::apply(&self.records, &self.metas, &self.state.sort, kept).into();
        tracing::debug!(
            total = self.records.len(),
            kept = ordered.len(),
            "computed ordering"
        );
        if let Some(key) = key {
            self.cache.insert(key, Rc::clone(&ordered));
        }
        ordered
    }

    /// Number of records passing filters and search.
    pub fn result_len(&mut self) -> usize {
        self.ordered_indices().len()
    }

    pub fn current_page(&mut self) -> PageView<'_> {
        let ordered = self.ordered_indices();
        let layout = self.state.layout;
        let records = paginate::apply(&layout, &ordered)
            .iter()
            .map(|&idx| &self.records[idx])
            .collect();
        PageView {
            records,
            labels: &self.state.labels,
            metas: &self.metas,
            layout,
            total_pages: layout.total_pages(ordered.len()),
            total: ordered.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(values: &[i64]) -> QueryEngine {
        let records = values
            .iter()
            .map(|v| Record::new(format!("k{v}")).with("value", *v))
            .collect();
        QueryEngine::new(
            vec![MetaDescriptor::number("value", "Value")],
            records,
            DisplayState::default(),
            QueryOptions::default(),
        )
    }

    #[test]
    fn test_set_filter_with_empty_spec_removes() {
        let mut engine = engine(&[1, 2]);
        engine.set_filter("value", FilterSpec::range(Some(2.0), None));
        assert!(engine.filter("value").is_some());
        engine.set_filter("value", FilterSpec::range(None, None));
        assert!(engine.filter("value").is_none());
    }

    #[test]
    fn test_layout_floors_dimensions() {
        let mut engine = engine(&[1]);
        engine.set_layout(Some(0), Some(3), None);
        assert_eq!(engine.layout().ncol, 1);
        assert_eq!(engine.layout().nrow, 3);
    }

    #[test]
    fn test_paging_reuses_cached_ordering() {
        let mut engine = engine(&[5, 4, 3, 2, 1]);
        engine.set_layout(Some(2), Some(1), None);
        engine.current_page();
        engine.next_page(3);
        engine.current_page();
        let stats = engine.cache_stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_toggle_label() {
        let mut engine = engine(&[1]);
        engine.set_labels(["value"]);
        engine.toggle_label("value");
        assert!(engine.state().labels.is_empty());
        engine.toggle_label("value");
        assert_eq!(engine.state().labels, vec!["value"]);
    }
}
