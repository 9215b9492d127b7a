//! Cognostic values and records.

use chrono::{NaiveDate, NaiveDateTime};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A decoded factor value: the 0-based level code with its label cached so
/// downstream stages never go back to the level list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FactorValue {
    pub code: usize,
    pub label: String,
}

/// A single cognostic value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CogValue {
    #[default]
    Null,
    Int(i64),
    Number(f64),
    Text(String),
    Factor(FactorValue),
    Date(NaiveDate),
    Time(NaiveDateTime),
}

static NULL_VALUE: CogValue = CogValue::Null;

impl CogValue {
    pub fn factor(code: usize, label: impl Into<String>) -> Self {
        CogValue::Factor(FactorValue {
            code,
            label: label.into(),
        })
    }

    /// Null, or a number that carries no value (NaN).
    pub fn is_null(&self) -> bool {
        match self {
            CogValue::Null => true,
            CogValue::Number(value) => value.is_nan(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CogValue::Int(value) => Some(*value as f64),
            CogValue::Number(value) if !value.is_nan() => Some(*value),
            _ => None,
        }
    }

    /// Textual content for label-like values (text and factor labels).
    pub fn as_label(&self) -> Option<&str> {
        match self {
            CogValue::Text(value) => Some(value),
            CogValue::Factor(factor) => Some(&factor.label),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CogValue::Date(date) => Some(*date),
            CogValue::Time(time) => Some(time.date()),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveDateTime> {
        match self {
            CogValue::Time(time) => Some(*time),
            CogValue::Date(date) => date.and_hms_opt(0, 0, 0),
            _ => None,
        }
    }

    /// Plain rendering without any meta-specific formatting.
    pub fn to_plain_string(&self) -> Cow<'_, str> {
        match self {
            CogValue::Null => Cow::Borrowed(""),
            CogValue::Int(value) => Cow::Owned(value.to_string()),
            CogValue::Number(value) if value.is_nan() => Cow::Borrowed(""),
            CogValue::Number(value) => Cow::Owned(value.to_string()),
            CogValue::Text(value) => Cow::Borrowed(value),
            CogValue::Factor(factor) => Cow::Borrowed(&factor.label),
            CogValue::Date(date) => Cow::Owned(date.format("%Y-%m-%d").to_string()),
            CogValue::Time(time) => Cow::Owned(time.format("%Y-%m-%dT%H:%M:%S").to_string()),
        }
    }
}

impl From<&str> for CogValue {
    fn from(value: &str) -> Self {
        CogValue::Text(value.to_string())
    }
}

impl From<String> for CogValue {
    fn from(value: String) -> Self {
        CogValue::Text(value)
    }
}

impl From<i64> for CogValue {
    fn from(value: i64) -> Self {
        CogValue::Int(value)
    }
}

impl From<f64> for CogValue {
    fn from(value: f64) -> Self {
        CogValue::Number(value)
    }
}

impl From<NaiveDate> for CogValue {
    fn from(value: NaiveDate) -> Self {
        CogValue::Date(value)
    }
}

impl From<NaiveDateTime> for CogValue {
    fn from(value: NaiveDateTime) -> Self {
        CogValue::Time(value)
    }
}

impl<T: Into<CogValue>> From<Option<T>> for CogValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CogValue::Null, Into::into)
    }
}

/// Payload family of a panel file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelPayload {
    Image,
    Markup,
}

/// Where a resolved panel can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelLocation {
    File(PathBuf),
    Url(String),
}

/// A record's panel reference after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRef {
    /// Reference as stored in the wire artifact, relative to the panel interface prefix.
    pub reference: String,
    /// `None` when the panel could not be resolved; the record is still kept.
    pub location: Option<PanelLocation>,
    pub payload: PanelPayload,
}

/// One row of a display: a stable panel key and its cognostic values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub panel_key: String,
    pub values: BTreeMap<String, CogValue>,
    pub panel: Option<PanelRef>,
}

impl Record {
    pub fn new(panel_key: impl Into<String>) -> Self {
        Self {
            panel_key: panel_key.into(),
            values: BTreeMap::new(),
            panel: None,
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, varname: impl Into<String>, value: impl Into<CogValue>) -> Self {
        self.values.insert(varname.into(), value.into());
        self
    }

    pub fn insert(&mut self, varname: impl Into<String>, value: impl Into<CogValue>) {
        self.values.insert(varname.into(), value.into());
    }

    /// Value of a column, `Null` when absent.
    pub fn get(&self, varname: &str) -> &CogValue {
        self.values.get(varname).unwrap_or(&NULL_VALUE)
    }

    pub fn contains(&self, varname: &str) -> bool {
        self.values.contains_key(varname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_is_null() {
        assert!(CogValue::Number(f64::NAN).is_null());
        assert!(CogValue::Null.is_null());
        assert!(!CogValue::Int(0).is_null());
        assert_eq!(CogValue::Number(f64::NAN).as_f64(), None);
    }

    #[test]
    fn test_record_get_missing_is_null() {
        let record = Record::new("a").with("value", 10_i64);
        assert_eq!(record.get("value"), &CogValue::Int(10));
        assert_eq!(record.get("missing"), &CogValue::Null);
    }

    #[test]
    fn test_date_widens_to_time() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let time = CogValue::Date(date).as_time().unwrap();
        assert_eq!(time.date(), date);
    }
}
