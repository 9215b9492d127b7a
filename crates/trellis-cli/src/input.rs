//! Reading producer input: meta descriptors (JSON) and cognostic rows (CSV).

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use trellis_codec::{PANEL_KEY_FIELD, parse_date, parse_metas, parse_time};
use trellis_model::{CogValue, MetaDescriptor, MetaKind, PanelSource, PanelType, Record};

/// Name of the panel column added by [`apply_panel_base`] when none exists.
pub const DEFAULT_PANEL_COL: &str = "panel";

pub fn read_metas(path: &Path) -> Result<Vec<MetaDescriptor>> {
    let json =
        fs::read_to_string(path).with_context(|| format!("read metas {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&json).with_context(|| format!("parse metas {}", path.display()))?;
    let metas = parse_metas(&value).with_context(|| format!("invalid metas {}", path.display()))?;
    Ok(metas)
}

/// Point file panels at `base`, adding an image panel column if there is none.
pub fn apply_panel_base(metas: &mut Vec<MetaDescriptor>, base: &str) {
    match metas.iter_mut().find(|meta| meta.is_panel()) {
        Some(meta) => {
            if let MetaKind::Panel { source, .. } = &mut meta.kind {
                *source = PanelSource::file(base);
            }
        }
        None => metas.push(MetaDescriptor::panel(
            DEFAULT_PANEL_COL,
            PanelType::Img,
            PanelSource::file(base),
        )),
    }
}

pub fn read_records_file(path: &Path, metas: &[MetaDescriptor]) -> Result<Vec<Record>> {
    let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    read_records(file, metas).with_context(|| format!("read rows from {}", path.display()))
}

/// Read CSV rows into records. Columns without a meta are ignored; empty
/// cells are null.
pub fn read_records<R: Read>(reader: R, metas: &[MetaDescriptor]) -> Result<Vec<Record>> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv.headers().context("read CSV header")?.clone();
    let Some(key_idx) = headers.iter().position(|name| name == PANEL_KEY_FIELD) else {
        bail!("CSV has no '{PANEL_KEY_FIELD}' column");
    };

    let columns: Vec<(usize, &MetaDescriptor)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            let meta = metas.iter().find(|meta| meta.varname == name && !meta.is_panel());
            if meta.is_none() && idx != key_idx {
                tracing::debug!(column = name, "ignoring column without a meta");
            }
            meta.map(|meta| (idx, meta))
        })
        .collect();

    let mut records = Vec::new();
    for (row_idx, row) in csv.records().enumerate() {
        let row = row.with_context(|| format!("CSV row {}", row_idx + 1))?;
        let panel_key = row.get(key_idx).unwrap_or_default();
        if panel_key.is_empty() {
            bail!("CSV row {} has an empty {PANEL_KEY_FIELD}", row_idx + 1);
        }
        let mut record = Record::new(panel_key);
        for (idx, meta) in &columns {
            let raw = row.get(*idx).unwrap_or_default();
            record.insert(meta.varname.clone(), parse_cell(meta, raw));
        }
        records.push(record);
    }
    tracing::info!(rows = records.len(), columns = columns.len(), "read cognostic rows");
    Ok(records)
}

/// Interpret one CSV cell according to its meta. Text that does not fit the
/// type is kept as text and left for the encoder to judge.
pub fn parse_cell(meta: &MetaDescriptor, raw: &str) -> CogValue {
    if raw.is_empty() {
        return CogValue::Null;
    }
    match &meta.kind {
        MetaKind::Number { .. } | MetaKind::Currency { .. } => raw
            .parse::<i64>()
            .map(CogValue::Int)
            .or_else(|_| raw.parse::<f64>().map(CogValue::Number))
            .unwrap_or_else(|_| CogValue::from(raw)),
        MetaKind::Date { .. } => parse_date(raw).map_or_else(|| CogValue::from(raw), CogValue::Date),
        MetaKind::Time { .. } => parse_time(raw).map_or_else(|| CogValue::from(raw), CogValue::Time),
        MetaKind::Factor { .. }
        | MetaKind::Href { .. }
        | MetaKind::Graph { .. }
        | MetaKind::String {}
        | MetaKind::Panel { .. } => CogValue::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metas() -> Vec<MetaDescriptor> {
        vec![
            MetaDescriptor::factor("country", "Country", ["Algeria", "Denmark"]),
            MetaDescriptor::number("lexp", "Life expectancy"),
            MetaDescriptor::date("surveyed", "Surveyed"),
        ]
    }

    #[test]
    fn test_read_records() {
        let csv = "panelKey,country,lexp,surveyed,extra\n\
                   dz, Algeria ,70.5,2020-01-02,x\n\
                   dk,Denmark,,not a date,y\n";
        let records = read_records(csv.as_bytes(), &metas()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("country"), &CogValue::from("Algeria"));
        assert_eq!(records[0].get("lexp"), &CogValue::Number(70.5));
        assert!(records[1].get("lexp").is_null());
        assert_eq!(records[1].get("surveyed"), &CogValue::from("not a date"));
        assert!(!records[0].contains("extra"));
    }

    #[test]
    fn test_missing_panel_key_column() {
        let err = read_records("country\nAlgeria\n".as_bytes(), &metas()).unwrap_err();
        assert!(err.to_string().contains("panelKey"));
    }

    #[test]
    fn test_panel_base_adds_column() {
        let mut metas = metas();
        apply_panel_base(&mut metas, "plots");
        let panel = metas.last().unwrap();
        assert!(panel.is_panel());
        assert_eq!(panel.varname, DEFAULT_PANEL_COL);

        apply_panel_base(&mut metas, "renders");
        assert_eq!(metas.iter().filter(|meta| meta.is_panel()).count(), 1);
        match &metas.last().unwrap().kind {
            MetaKind::Panel { source, .. } => assert_eq!(source.base.as_deref(), Some("renders")),
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
