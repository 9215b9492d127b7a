//! Search stage: free-text match across the label-like columns.

use trellis_model::{MetaDescriptor, Record};

/// Keep records where the query occurs (case-insensitively) in the panel key
/// or in any factor, string or href column. An empty query keeps everything.
pub fn apply(
    records: &[Record],
    metas: &[MetaDescriptor],
    query: &str,
    indices: Vec<usize>,
) -> Vec<usize> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return indices;
    }
    let columns: Vec<&str> = metas
        .iter()
        .filter(|meta| meta.meta_type().is_searchable())
        .map(|meta| meta.varname.as_str())
        .collect();
    indices
        .into_iter()
        .filter(|&idx| {
            let record = &records[idx];
            record.panel_key.to_lowercase().contains(&needle)
                || columns.iter().any(|varname| {
                    record
                        .get(varname)
                        .to_plain_string()
                        .to_lowercase()
                        .contains(&needle)
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Vec<MetaDescriptor>, Vec<Record>) {
        let metas = vec![
            MetaDescriptor::factor("country", "Country", ["Algeria", "Denmark"]),
            MetaDescriptor::number("pop", "Population"),
        ];
        let records = vec![
            Record::new("dz")
                .with("country", trellis_model::CogValue::factor(0, "Algeria"))
                .with("pop", 44_i64),
            Record::new("dk")
                .with("country", trellis_model::CogValue::factor(1, "Denmark"))
                .with("pop", 5_i64),
        ];
        (metas, records)
    }

    #[test]
    fn test_matches_factor_label_and_panel_key() {
        let (metas, records) = fixture();
        assert_eq!(apply(&records, &metas, "DEN", vec![0, 1]), vec![1]);
        assert_eq!(apply(&records, &metas, "dz", vec![0, 1]), vec![0]);
    }

    #[test]
    fn test_numeric_columns_are_not_searched() {
        let (metas, records) = fixture();
        assert!(apply(&records, &metas, "44", vec![0, 1]).is_empty());
    }

    #[test]
    fn test_empty_query_is_identity() {
        let (metas, records) = fixture();
        assert_eq!(apply(&records, &metas, "  ", vec![1, 0]), vec![1, 0]);
    }
}
