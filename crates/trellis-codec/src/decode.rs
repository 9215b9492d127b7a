//! Decoding wire artifacts back into typed records.
//!
//! Fatal problems (missing keys, unknown meta types) fail the whole call.
//! Problems with a single value are collected as [`PartialDecodeWarning`]s and
//! the row is kept.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::path::PathBuf;

use trellis_model::{
    CogValue, DisplaySchema, MetaDescriptor, MetaKind, MetaType, PanelInterface, PanelType,
    Record,
};

use crate::error::{CodecError, PartialDecodeWarning, Result, WarningKind};
use crate::panel::PanelResolver;
use crate::wire::{PANEL_KEY_FIELD, WireArtifact, WireRow};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Default)]
pub struct DecodeContext {
    /// Directory holding the artifact; panel files are looked up relative to it.
    pub base_dir: Option<PathBuf>,
}

impl DecodeContext {
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedDisplay {
    pub schema: DisplaySchema,
    pub records: Vec<Record>,
    pub keysig: String,
    pub panel_interface: Option<PanelInterface>,
    pub warnings: Vec<PartialDecodeWarning>,
}

/// Parse and decode a wire document.
pub fn decode(json: &str, context: &DecodeContext) -> Result<DecodedDisplay> {
    let artifact = WireArtifact::from_json_str(json)?;
    decode_artifact(&artifact, context)
}

/// Decode an already parsed artifact.
pub fn decode_artifact(artifact: &WireArtifact, context: &DecodeContext) -> Result<DecodedDisplay> {
    let span = tracing::info_span!("decode", display = %artifact.name);
    let _enter = span.enter();

    let schema = DisplaySchema {
        name: artifact.name.clone(),
        description: artifact.description.clone(),
        metas: artifact.metas.clone(),
        state: artifact.state.clone(),
        views: artifact.views.clone(),
    };
    let panel_interface = artifact
        .panel_interface
        .clone()
        .or_else(|| schema.panel_interface());
    let paneltype = schema
        .panel_settings()
        .map_or(PanelType::Img, |(paneltype, _)| paneltype);
    let resolver = panel_interface.as_ref().map(|interface| {
        PanelResolver::new(
            interface.source.clone(),
            paneltype,
            context.base_dir.as_deref(),
        )
    });

    let mut warnings = Vec::new();
    let mut records = Vec::with_capacity(artifact.cog_data.len());
    for (idx, row) in artifact.cog_data.iter().enumerate() {
        let panel_key = panel_key_of(row, idx)?;
        let mut record = Record::new(panel_key.clone());
        for meta in &schema.metas {
            if meta.is_panel() {
                continue;
            }
            let raw = row.get(&meta.varname).unwrap_or(&Value::Null);
            let value = decode_value(meta, raw, &panel_key, &mut warnings);
            record.values.insert(meta.varname.clone(), value);
        }
        if let (Some(interface), Some(resolver)) = (&panel_interface, &resolver) {
            let reference = row.get(&interface.panel_col).and_then(Value::as_str);
            let panel = reference.map(|reference| resolver.resolve(reference));
            let resolved = panel.as_ref().is_some_and(|panel| panel.location.is_some());
            if !resolved && context.base_dir.is_some() {
                warnings.push(PartialDecodeWarning {
                    panel_key: panel_key.clone(),
                    varname: interface.panel_col.clone(),
                    kind: WarningKind::UnresolvedPanel {
                        reference: reference.map(str::to_string),
                    },
                });
            }
            record.panel = panel;
        }
        records.push(record);
    }

    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    if artifact.n != 0 && artifact.n != records.len() {
        tracing::warn!(
            declared = artifact.n,
            actual = records.len(),
            "row count differs from declared n"
        );
    }
    tracing::info!(
        records = records.len(),
        warnings = warnings.len(),
        "decoded display"
    );

    Ok(DecodedDisplay {
        schema,
        records,
        keysig: artifact.keysig.clone(),
        panel_interface,
        warnings,
    })
}

fn panel_key_of(row: &WireRow, idx: usize) -> Result<String> {
    match row.get(PANEL_KEY_FIELD) {
        Some(Value::String(key)) => Ok(key.clone()),
        Some(Value::Number(key)) => Ok(key.to_string()),
        _ => Err(CodecError::invalid(format!(
            "cogData row {idx} has no '{PANEL_KEY_FIELD}'"
        ))),
    }
}

/// Decode one wire value according to its meta.
pub fn decode_value(
    meta: &MetaDescriptor,
    raw: &Value,
    panel_key: &str,
    warnings: &mut Vec<PartialDecodeWarning>,
) -> CogValue {
    if raw.is_null() {
        return CogValue::Null;
    }
    let mut warn = |kind: WarningKind| {
        warnings.push(PartialDecodeWarning {
            panel_key: panel_key.to_string(),
            varname: meta.varname.clone(),
            kind,
        });
    };
    match &meta.kind {
        MetaKind::Factor { levels } => match raw {
            Value::Number(number) => match number.as_i64() {
                Some(encoded) => {
                    let code = encoded
                        .checked_sub(1)
                        .and_then(|code| usize::try_from(code).ok());
                    match code.and_then(|code| {
                        levels.get(code).map(|label| CogValue::factor(code, label.clone()))
                    }) {
                        Some(value) => value,
                        None => {
                            warn(WarningKind::FactorCodeOutOfRange { code: encoded });
                            CogValue::Int(encoded)
                        }
                    }
                }
                None => {
                    warn(WarningKind::UnparsableValue {
                        expected: MetaType::Factor,
                        raw: number.to_string(),
                    });
                    number.as_f64().map_or(CogValue::Null, CogValue::Number)
                }
            },
            Value::String(text) => match levels.iter().position(|level| level == text) {
                Some(code) => CogValue::factor(code, text.clone()),
                None => CogValue::Text(text.clone()),
            },
            other => CogValue::Text(other.to_string()),
        },
        MetaKind::Number { .. } | MetaKind::Currency { .. } => match raw {
            Value::Number(number) => number_value(number),
            Value::String(text) => match text.trim().parse::<f64>() {
                Ok(value) => CogValue::Number(value),
                Err(_) => {
                    warn(WarningKind::UnparsableValue {
                        expected: meta.meta_type(),
                        raw: text.clone(),
                    });
                    CogValue::Text(text.clone())
                }
            },
            other => CogValue::Text(other.to_string()),
        },
        MetaKind::Date { .. } => match raw {
            Value::String(text) => match parse_date(text) {
                Some(date) => CogValue::Date(date),
                None => {
                    warn(WarningKind::UnparsableValue {
                        expected: MetaType::Date,
                        raw: text.clone(),
                    });
                    CogValue::Text(text.clone())
                }
            },
            Value::Number(number) => number_value(number),
            other => CogValue::Text(other.to_string()),
        },
        MetaKind::Time { .. } => match raw {
            Value::String(text) => match parse_time(text) {
                Some(time) => CogValue::Time(time),
                None => {
                    warn(WarningKind::UnparsableValue {
                        expected: MetaType::Time,
                        raw: text.clone(),
                    });
                    CogValue::Text(text.clone())
                }
            },
            Value::Number(number) => number_value(number),
            other => CogValue::Text(other.to_string()),
        },
        MetaKind::Href { .. } | MetaKind::Graph { .. } | MetaKind::String {} => match raw {
            Value::String(text) => CogValue::Text(text.clone()),
            other => CogValue::Text(other.to_string()),
        },
        MetaKind::Panel { .. } => match raw {
            Value::String(text) => CogValue::Text(text.clone()),
            other => CogValue::Text(other.to_string()),
        },
    }
}

fn number_value(number: &serde_json::Number) -> CogValue {
    match number.as_i64() {
        Some(value) => CogValue::Int(value),
        None => number.as_f64().map_or(CogValue::Null, CogValue::Number),
    }
}

/// Parse a date written as `%Y-%m-%d` or as any accepted time stamp.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .or_else(|| parse_time(text).map(|time| time.date()))
}

/// Parse a time stamp (RFC 3339 or a few ISO-like forms); a bare date is midnight.
pub fn parse_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(time.naive_utc());
    }
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
