//! Sort stage: stable multi-key ordering.
//!
//! Keys are applied in list order (first key has top priority). Within a
//! column, nulls come last and values that do not fit the column type (for
//! example factor text outside the levels) come after typed values, in both
//! directions.

use chrono::NaiveDateTime;
use std::borrow::Cow;
use std::cmp::Ordering;

use trellis_model::{CogValue, MetaDescriptor, MetaKind, Record, SortDirection, SortKey, find_meta};

enum Rank<'a> {
    Code(usize),
    Number(f64),
    Instant(NaiveDateTime),
    Text(Cow<'a, str>),
    Null,
}

impl Rank<'_> {
    fn class(&self) -> u8 {
        match self {
            Rank::Code(_) | Rank::Number(_) | Rank::Instant(_) => 0,
            Rank::Text(_) => 1,
            Rank::Null => 2,
        }
    }
}

fn rank<'a>(meta: &MetaDescriptor, value: &'a CogValue) -> Rank<'a> {
    if value.is_null() {
        return Rank::Null;
    }
    match &meta.kind {
        MetaKind::Factor { .. } => match value {
            CogValue::Factor(factor) => Rank::Code(factor.code),
            other => Rank::Text(other.to_plain_string()),
        },
        MetaKind::Number { .. } | MetaKind::Currency { .. } => value
            .as_f64()
            .map_or_else(|| Rank::Text(value.to_plain_string()), Rank::Number),
        MetaKind::Date { .. } | MetaKind::Time { .. } => value
            .as_time()
            .map_or_else(|| Rank::Text(value.to_plain_string()), Rank::Instant),
        MetaKind::Href { .. }
        | MetaKind::Graph { .. }
        | MetaKind::String {}
        | MetaKind::Panel { .. } => Rank::Text(value.to_plain_string()),
    }
}

fn compare_ranks(a: &Rank<'_>, b: &Rank<'_>, dir: SortDirection) -> Ordering {
    let by_class = a.class().cmp(&b.class());
    if by_class != Ordering::Equal {
        return by_class;
    }
    let ordering = match (a, b) {
        (Rank::Code(x), Rank::Code(y)) => x.cmp(y),
        (Rank::Number(x), Rank::Number(y)) => x.total_cmp(y),
        (Rank::Instant(x), Rank::Instant(y)) => x.cmp(y),
        (Rank::Text(x), Rank::Text(y)) => x.cmp(y),
        _ => Ordering::Equal,
    };
    match dir {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Compare two values of the column described by `meta`.
pub fn compare(meta: &MetaDescriptor, a: &CogValue, b: &CogValue, dir: SortDirection) -> Ordering {
    compare_ranks(&rank(meta, a), &rank(meta, b), dir)
}

/// Order `indices` by `sorts`. Keys on unknown variables are skipped.
pub fn apply(
    records: &[Record],
    metas: &[MetaDescriptor],
    sorts: &[SortKey],
    mut indices: Vec<usize>,
) -> Vec<usize> {
    let keys: Vec<(&MetaDescriptor, &SortKey)> = sorts
        .iter()
        .filter_map(|key| match find_meta(metas, &key.varname) {
            Some(meta) if !meta.is_panel() => Some((meta, key)),
            _ => {
                tracing::debug!(varname = %key.varname, "ignoring sort on unknown variable");
                None
            }
        })
        .collect();
    if keys.is_empty() {
        return indices;
    }
    indices.sort_by(|&a, &b| {
        keys.iter()
            .map(|(meta, key)| {
                compare(
                    meta,
                    records[a].get(&key.varname),
                    records[b].get(&key.varname),
                    key.dir,
                )
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number() -> MetaDescriptor {
        MetaDescriptor::number("v", "V")
    }

    #[test]
    fn test_nulls_last_both_directions() {
        let meta = number();
        let null = CogValue::Null;
        let one = CogValue::Int(1);
        assert_eq!(compare(&meta, &null, &one, SortDirection::Asc), Ordering::Greater);
        assert_eq!(compare(&meta, &null, &one, SortDirection::Desc), Ordering::Greater);
    }

    #[test]
    fn test_factor_sorts_by_code_then_passthrough() {
        let meta = MetaDescriptor::factor("c", "C", ["Zambia", "Angola"]);
        let zambia = CogValue::factor(0, "Zambia");
        let angola = CogValue::factor(1, "Angola");
        let other = CogValue::Text("Aruba".to_string());
        assert_eq!(compare(&meta, &zambia, &angola, SortDirection::Asc), Ordering::Less);
        assert_eq!(compare(&meta, &other, &zambia, SortDirection::Asc), Ordering::Greater);
        assert_eq!(compare(&meta, &other, &zambia, SortDirection::Desc), Ordering::Greater);
    }

    #[test]
    fn test_multi_key_is_stable() {
        let metas = vec![number(), MetaDescriptor::string("s", "S")];
        let records = vec![
            Record::new("a").with("v", 1_i64).with("s", "x"),
            Record::new("b").with("v", 2_i64).with("s", "x"),
            Record::new("c").with("v", 1_i64).with("s", "y"),
            Record::new("d").with("v", 1_i64).with("s", "x"),
        ];
        let sorts = vec![
            SortKey::new("s", SortDirection::Asc),
            SortKey::new("v", SortDirection::Desc),
        ];
        assert_eq!(apply(&records, &metas, &sorts, vec![0, 1, 2, 3]), vec![1, 0, 3, 2]);
    }
}
