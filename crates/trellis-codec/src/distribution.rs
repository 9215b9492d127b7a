//! Per-column distributions embedded in the artifact for filter widgets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use trellis_model::{CogValue, MetaDescriptor, MetaKind, Record};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CogDistribution {
    /// Counts per level, in level order.
    Factor { counts: Vec<LevelCount> },
    /// Equal-width histogram. When `log` is set, `breaks` are on the log10 scale.
    Numeric {
        log: bool,
        breaks: Vec<f64>,
        freq: Vec<usize>,
    },
}

/// Compute distributions for every factor and numeric meta.
///
/// Columns without any usable value get no entry.
pub fn compute_distributions(
    metas: &[MetaDescriptor],
    records: &[Record],
) -> BTreeMap<String, CogDistribution> {
    let mut distns = BTreeMap::new();
    for meta in metas {
        let distn = match &meta.kind {
            MetaKind::Factor { levels } => factor_distribution(&meta.varname, levels, records),
            MetaKind::Number { log, .. } => numeric_distribution(&meta.varname, *log, records),
            MetaKind::Currency { .. } => numeric_distribution(&meta.varname, false, records),
            MetaKind::Date { .. }
            | MetaKind::Time { .. }
            | MetaKind::Href { .. }
            | MetaKind::Graph { .. }
            | MetaKind::String {}
            | MetaKind::Panel { .. } => None,
        };
        if let Some(distn) = distn {
            distns.insert(meta.varname.clone(), distn);
        }
    }
    distns
}

fn factor_distribution(
    varname: &str,
    levels: &[String],
    records: &[Record],
) -> Option<CogDistribution> {
    if levels.is_empty() {
        return None;
    }
    let mut counts = vec![0usize; levels.len()];
    for record in records {
        let code = match record.get(varname) {
            CogValue::Factor(factor) => Some(factor.code),
            CogValue::Int(code) => usize::try_from(*code).ok(),
            CogValue::Text(label) => levels.iter().position(|level| level == label),
            _ => None,
        };
        if let Some(slot) = code.and_then(|code| counts.get_mut(code)) {
            *slot += 1;
        }
    }
    Some(CogDistribution::Factor {
        counts: levels
            .iter()
            .zip(counts)
            .map(|(label, count)| LevelCount {
                label: label.clone(),
                count,
            })
            .collect(),
    })
}

fn numeric_distribution(varname: &str, log: bool, records: &[Record]) -> Option<CogDistribution> {
    let mut values: Vec<f64> = records
        .iter()
        .filter_map(|record| record.get(varname).as_f64())
        .filter(|value| value.is_finite())
        .collect();
    if values.is_empty() {
        return None;
    }
    let log = log && values.iter().all(|value| *value > 0.0);
    if log {
        values.iter_mut().for_each(|value| *value = value.log10());
    }
    let (breaks, freq) = histogram(&values);
    Some(CogDistribution::Numeric { log, breaks, freq })
}

/// Sturges-rule histogram over non-empty finite values.
fn histogram(values: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return (vec![min, max], vec![values.len()]);
    }
    let bins = (values.len() as f64).log2().ceil() as usize + 1;
    let width = (max - min) / bins as f64;
    let mut breaks: Vec<f64> = (0..bins).map(|idx| min + idx as f64 * width).collect();
    breaks.push(max);
    let mut freq = vec![0usize; bins];
    for value in values {
        let idx = (((value - min) / width).floor() as usize).min(bins - 1);
        freq[idx] += 1;
    }
    (breaks, freq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_counts_in_level_order() {
        let metas = vec![MetaDescriptor::factor("c", "C", ["a", "b", "c"])];
        let records = vec![
            Record::new("1").with("c", "b"),
            Record::new("2").with("c", 0_i64),
            Record::new("3").with("c", "b"),
            Record::new("4").with("c", "zzz"),
        ];
        let distns = compute_distributions(&metas, &records);
        let CogDistribution::Factor { counts } = &distns["c"] else {
            panic!("expected factor distribution");
        };
        let got: Vec<usize> = counts.iter().map(|c| c.count).collect();
        assert_eq!(got, vec![1, 2, 0]);
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let metas = vec![MetaDescriptor::number("v", "V")];
        let records: Vec<Record> = [10.0, 15.0, 20.0, 25.0, 30.0]
            .into_iter()
            .enumerate()
            .map(|(idx, value)| Record::new(idx.to_string()).with("v", value))
            .collect();
        let distns = compute_distributions(&metas, &records);
        let CogDistribution::Numeric { breaks, freq, log } = &distns["v"] else {
            panic!("expected numeric distribution");
        };
        assert!(!log);
        assert_eq!(freq.iter().sum::<usize>(), 5);
        assert_eq!(breaks.len(), freq.len() + 1);
        assert_eq!(breaks.first(), Some(&10.0));
        assert_eq!(breaks.last(), Some(&30.0));
    }

    #[test]
    fn test_constant_column_single_bin() {
        let metas = vec![MetaDescriptor::number("v", "V")];
        let records = vec![Record::new("a").with("v", 3.0), Record::new("b").with("v", 3.0)];
        let distns = compute_distributions(&metas, &records);
        assert_eq!(
            distns["v"],
            CogDistribution::Numeric {
                log: false,
                breaks: vec![3.0, 3.0],
                freq: vec![2],
            }
        );
    }
}
