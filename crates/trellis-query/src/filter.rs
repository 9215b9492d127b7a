//! Filter stage: keep records that satisfy every active filter.

use trellis_model::{CogValue, FilterEntry, FilterSpec, MetaDescriptor, Record, find_meta};

/// Whether a single value satisfies a filter. Nulls never match.
pub fn matches(spec: &FilterSpec, value: &CogValue) -> bool {
    if value.is_null() {
        return false;
    }
    match spec {
        FilterSpec::Select { values } => values.contains(value.to_plain_string().as_ref()),
        FilterSpec::Range { min, max } => value.as_f64().is_some_and(|v| {
            min.is_none_or(|min| min.is_nan() || v >= min)
                && max.is_none_or(|max| max.is_nan() || v <= max)
        }),
        FilterSpec::DateRange { start, end } => value.as_date().is_some_and(|date| {
            start.is_none_or(|start| date >= start) && end.is_none_or(|end| date <= end)
        }),
        FilterSpec::TimeRange { start, end } => value.as_time().is_some_and(|time| {
            start.is_none_or(|start| time >= start) && end.is_none_or(|end| time <= end)
        }),
        FilterSpec::Substring { value: needle } => value
            .to_plain_string()
            .to_lowercase()
            .contains(&needle.to_lowercase()),
    }
}

/// Apply the AND of `filters` to `indices`.
///
/// Entries naming a variable that is not a filterable meta are skipped.
pub fn apply(
    records: &[Record],
    metas: &[MetaDescriptor],
    filters: &[FilterEntry],
    indices: Vec<usize>,
) -> Vec<usize> {
    let active: Vec<&FilterEntry> = filters
        .iter()
        .filter(|entry| {
            let filterable = find_meta(metas, &entry.varname).is_some_and(|meta| !meta.is_panel());
            if !filterable {
                tracing::debug!(varname = %entry.varname, "ignoring filter on unknown variable");
            }
            filterable && !entry.spec.is_empty()
        })
        .collect();
    if active.is_empty() {
        return indices;
    }
    indices
        .into_iter()
        .filter(|&idx| {
            let record = &records[idx];
            active
                .iter()
                .all(|entry| matches(&entry.spec, record.get(&entry.varname)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_range_is_inclusive() {
        let spec = FilterSpec::range(Some(15.0), Some(30.0));
        assert!(matches(&spec, &CogValue::Int(15)));
        assert!(matches(&spec, &CogValue::Number(30.0)));
        assert!(!matches(&spec, &CogValue::Int(10)));
        assert!(!matches(&spec, &CogValue::Null));
    }

    #[test]
    fn test_open_range() {
        let spec = FilterSpec::range(None, Some(0.0));
        assert!(matches(&spec, &CogValue::Number(-4.5)));
        assert!(!matches(&spec, &CogValue::Number(f64::NAN)));
    }

    #[test]
    fn test_select_uses_factor_label() {
        let spec = FilterSpec::select(["Denmark"]);
        assert!(matches(&spec, &CogValue::factor(1, "Denmark")));
        assert!(!matches(&spec, &CogValue::factor(0, "Algeria")));
        assert!(matches(&spec, &"Denmark".into()));
    }

    #[test]
    fn test_date_range() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let spec = FilterSpec::date_range(Some(day(5)), None);
        assert!(matches(&spec, &CogValue::Date(day(5))));
        assert!(!matches(&spec, &CogValue::Date(day(4))));
    }

    #[test]
    fn test_substring_ignores_case() {
        let spec = FilterSpec::substring("ERM");
        assert!(matches(&spec, &"Germany".into()));
    }

    #[test]
    fn test_unknown_variable_is_ignored() {
        let metas = vec![MetaDescriptor::number("v", "V")];
        let records = vec![Record::new("a").with("v", 1_i64)];
        let filters = vec![FilterEntry {
            varname: "missing".to_string(),
            spec: FilterSpec::range(Some(5.0), None),
        }];
        assert_eq!(apply(&records, &metas, &filters, vec![0]), vec![0]);
    }
}
