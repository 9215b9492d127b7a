//! Interactive state: filters, sorts, layout, labels and named views.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(format!("Unknown sort direction: {s}")),
        }
    }
}

/// One entry of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub varname: String,
    pub dir: SortDirection,
}

impl SortKey {
    pub fn new(varname: impl Into<String>, dir: SortDirection) -> Self {
        Self {
            varname: varname.into(),
            dir,
        }
    }
}

/// Order in which panels fill the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arrangement {
    #[default]
    Rows,
    Cols,
}

impl FromStr for Arrangement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rows" | "row" => Ok(Arrangement::Rows),
            "cols" | "col" | "columns" => Ok(Arrangement::Cols),
            _ => Err(format!("Unknown arrangement: {s}")),
        }
    }
}

/// Grid layout and current page (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layout {
    pub ncol: usize,
    pub nrow: usize,
    pub page: usize,
    #[serde(default)]
    pub arrangement: Arrangement,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            ncol: 1,
            nrow: 1,
            page: 1,
            arrangement: Arrangement::Rows,
        }
    }
}

impl Layout {
    /// Panels per page; dimensions below 1 count as 1.
    pub fn page_size(&self) -> usize {
        self.ncol.max(1).saturating_mul(self.nrow.max(1))
    }

    /// Number of pages needed for `n` panels (0 when there are none).
    pub fn total_pages(&self, n: usize) -> usize {
        if n == 0 { 0 } else { n.div_ceil(self.page_size()) }
    }
}

/// A per-column filter value.
///
/// An empty value means "no filter" and is never stored in active state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilterSpec {
    /// Allowed factor labels.
    Select { values: BTreeSet<String> },
    /// Inclusive numeric range; a missing bound is open.
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    DateRange {
        #[serde(default)]
        start: Option<NaiveDate>,
        #[serde(default)]
        end: Option<NaiveDate>,
    },
    TimeRange {
        #[serde(default)]
        start: Option<NaiveDateTime>,
        #[serde(default)]
        end: Option<NaiveDateTime>,
    },
    /// Case-insensitive substring.
    Substring { value: String },
}

impl FilterSpec {
    pub fn select<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterSpec::Select {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        FilterSpec::Range { min, max }
    }

    pub fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        FilterSpec::DateRange { start, end }
    }

    pub fn substring(value: impl Into<String>) -> Self {
        FilterSpec::Substring {
            value: value.into(),
        }
    }

    /// True when the filter would not restrict anything.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterSpec::Select { values } => values.is_empty(),
            FilterSpec::Range { min, max } => {
                min.is_none_or(f64::is_nan) && max.is_none_or(f64::is_nan)
            }
            FilterSpec::DateRange { start, end } => start.is_none() && end.is_none(),
            FilterSpec::TimeRange { start, end } => start.is_none() && end.is_none(),
            FilterSpec::Substring { value } => value.trim().is_empty(),
        }
    }
}

/// A filter as stored in the wire `state.filter` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub varname: String,
    #[serde(flatten)]
    pub spec: FilterSpec,
}

/// Serializable interactive state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayState {
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub sort: Vec<SortKey>,
    #[serde(default)]
    pub filter: Vec<FilterEntry>,
}

/// A named snapshot of interactive state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    pub state: DisplayState,
}

impl View {
    pub fn new(name: impl Into<String>, state: DisplayState) -> Self {
        Self {
            name: name.into(),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        let layout = Layout {
            ncol: 2,
            nrow: 2,
            ..Layout::default()
        };
        assert_eq!(layout.total_pages(0), 0);
        assert_eq!(layout.total_pages(1), 1);
        assert_eq!(layout.total_pages(4), 1);
        assert_eq!(layout.total_pages(5), 2);
    }

    #[test]
    fn test_zero_dimensions_count_as_one() {
        let layout = Layout {
            ncol: 0,
            nrow: 0,
            ..Layout::default()
        };
        assert_eq!(layout.page_size(), 1);
    }

    #[test]
    fn test_huge_dimensions_saturate() {
        let layout = Layout {
            ncol: usize::MAX,
            nrow: 2,
            ..Layout::default()
        };
        assert_eq!(layout.page_size(), usize::MAX);
        assert_eq!(layout.total_pages(10), 1);
    }

    #[test]
    fn test_empty_filters() {
        assert!(FilterSpec::select(Vec::<String>::new()).is_empty());
        assert!(FilterSpec::range(None, None).is_empty());
        assert!(FilterSpec::substring("  ").is_empty());
        assert!(!FilterSpec::range(Some(1.0), None).is_empty());
    }

    #[test]
    fn test_sort_direction_from_str() {
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("up".parse::<SortDirection>().is_err());
    }
}
