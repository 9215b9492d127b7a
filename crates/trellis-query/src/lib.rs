//! Query pipeline over decoded trellis records.
//!
//! Filter, search, sort and paginate run in that order, each as a pure
//! function over record indices. [`QueryEngine`] holds the session state and
//! drives the pipeline.

pub mod cache;
pub mod engine;
pub mod filter;
pub mod format;
pub mod paginate;
pub mod presenter;
pub mod search;
pub mod sort;

pub use cache::{CacheStats, ResultCache};
pub use engine::{PageView, QueryEngine, QueryOptions};
pub use format::{format_number, format_value};
pub use presenter::GridPresenter;
