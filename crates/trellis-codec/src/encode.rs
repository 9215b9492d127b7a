//! Encoding typed records into the wire artifact and its companion files.
//!
//! Factor values go on the wire as 1-based indices into `levels`. The panel
//! column is rewritten to a reference relative to the display's panel
//! interface, so the base directory or endpoint appears once per artifact.

use serde_json::{Number, Value};
use std::collections::BTreeSet;

use trellis_model::{CogValue, DisplaySchema, MetaDescriptor, MetaKind, Record};

use crate::distribution::compute_distributions;
use crate::error::{CodecError, Result};
use crate::keysig::keysig;
use crate::panel::{PanelExtensions, panel_reference, prefixed_reference};
use crate::wire::{PANEL_KEY_FIELD, WireArtifact, WireRow, script_text};

/// What to do with a factor string that is not one of the levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FactorPolicy {
    /// Write the string through unchanged.
    #[default]
    Lenient,
    /// Fail with [`CodecError::UnknownLevel`].
    Strict,
}

#[derive(Debug, Clone)]
pub struct EncodeOptions {
    pub factor_policy: FactorPolicy,
    /// Extensions reported by the panel renderer.
    pub panel_extensions: PanelExtensions,
    /// Embed per-column distributions (`cogDistns`).
    pub distributions: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            factor_policy: FactorPolicy::Lenient,
            panel_extensions: PanelExtensions::default(),
            distributions: true,
        }
    }
}

impl EncodeOptions {
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.factor_policy = FactorPolicy::Strict;
        self
    }

    #[must_use]
    pub fn with_panel_extensions(mut self, extensions: PanelExtensions) -> Self {
        self.panel_extensions = extensions;
        self
    }
}

/// The three outputs of an encode: the artifact with embedded `cogData`, the
/// standalone row array, and the script form of that array.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedDisplay {
    pub artifact: WireArtifact,
    /// Same rows as `artifact.cog_data`, with the panel prefix spelled out.
    pub flat: Vec<WireRow>,
    pub script: String,
}

/// Encode a display schema and its records.
pub fn encode(
    schema: &DisplaySchema,
    records: &[Record],
    options: &EncodeOptions,
) -> Result<EncodedDisplay> {
    let span = tracing::info_span!("encode", display = %schema.name, records = records.len());
    let _enter = span.enter();

    let mut seen = BTreeSet::new();
    for record in records {
        if !seen.insert(record.panel_key.as_str()) {
            return Err(CodecError::DuplicatePanelKey {
                panel_key: record.panel_key.clone(),
            });
        }
    }

    let panel_settings = schema.panel_settings();
    let panel_col = schema.panel_meta().map(|meta| meta.varname.as_str());

    let mut cog_data = Vec::with_capacity(records.len());
    let mut flat = Vec::with_capacity(records.len());
    for record in records {
        let mut row = WireRow::new();
        row.insert(
            PANEL_KEY_FIELD.to_string(),
            Value::String(record.panel_key.clone()),
        );
        for meta in &schema.metas {
            if meta.is_panel() {
                continue;
            }
            let Some(value) = record.values.get(&meta.varname) else {
                return Err(CodecError::SchemaMismatch {
                    panel_key: record.panel_key.clone(),
                    varname: meta.varname.clone(),
                });
            };
            let encoded = encode_value(meta, value, &record.panel_key, options.factor_policy)?;
            row.insert(meta.varname.clone(), encoded);
        }

        let mut flat_row = row.clone();
        if let (Some(varname), Some((paneltype, source))) = (panel_col, panel_settings) {
            let extension = options
                .panel_extensions
                .get(&record.panel_key)
                .unwrap_or(paneltype.default_extension());
            let reference = panel_reference(source, &record.panel_key, extension);
            flat_row.insert(
                varname.to_string(),
                Value::String(prefixed_reference(source, &reference)),
            );
            row.insert(varname.to_string(), Value::String(reference));
        }
        cog_data.push(row);
        flat.push(flat_row);
    }

    let cog_distns = if options.distributions {
        compute_distributions(&schema.metas, records)
    } else {
        Default::default()
    };

    let artifact = WireArtifact {
        name: schema.name.clone(),
        description: schema.description.clone(),
        keysig: keysig(records.iter().map(|record| record.panel_key.as_str())),
        n: records.len(),
        metas: schema.metas.clone(),
        state: schema.state.clone(),
        views: schema.views.clone(),
        panel_interface: schema.panel_interface(),
        cog_distns,
        cog_data,
        extra: Default::default(),
    };
    let script = script_text(&schema.name, &flat)?;

    tracing::info!(
        n = artifact.n,
        metas = artifact.metas.len(),
        keysig = %artifact.keysig,
        "encoded display"
    );
    Ok(EncodedDisplay {
        artifact,
        flat,
        script,
    })
}

/// Encode one value according to its meta. Panel metas are handled by [`encode`].
pub fn encode_value(
    meta: &MetaDescriptor,
    value: &CogValue,
    panel_key: &str,
    policy: FactorPolicy,
) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match &meta.kind {
        MetaKind::Factor { levels } => encode_factor(meta, levels, value, panel_key, policy),
        MetaKind::Number { .. } | MetaKind::Currency { .. } => Ok(match value {
            CogValue::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map_or_else(|| Value::String(text.clone()), Value::Number),
            other => plain_value(other),
        }),
        MetaKind::Date { .. } => Ok(match value {
            CogValue::Date(date) => Value::String(date.format("%Y-%m-%d").to_string()),
            CogValue::Time(time) => Value::String(time.date().format("%Y-%m-%d").to_string()),
            other => plain_value(other),
        }),
        MetaKind::Time { .. } => Ok(match value {
            CogValue::Date(date) => Value::String(format!("{}T00:00:00", date.format("%Y-%m-%d"))),
            other => plain_value(other),
        }),
        MetaKind::Href { .. } | MetaKind::Graph { .. } | MetaKind::String {} => Ok(match value {
            CogValue::Int(_) | CogValue::Number(_) => plain_value(value),
            other => Value::String(other.to_plain_string().into_owned()),
        }),
        MetaKind::Panel { .. } => Ok(plain_value(value)),
    }
}

/// Factor: integer input is a 0-based code and is shifted by one; strings are
/// looked up in `levels`. Codes outside `levels` follow the factor policy.
fn encode_factor(
    meta: &MetaDescriptor,
    levels: &[String],
    value: &CogValue,
    panel_key: &str,
    policy: FactorPolicy,
) -> Result<Value> {
    let unknown = |raw: String| -> Result<Value> {
        match policy {
            FactorPolicy::Lenient => {
                tracing::debug!(
                    varname = %meta.varname,
                    panel_key,
                    "factor value is not a level, passing through"
                );
                Ok(Value::String(raw))
            }
            FactorPolicy::Strict => Err(CodecError::UnknownLevel {
                panel_key: panel_key.to_string(),
                varname: meta.varname.clone(),
                value: raw,
            }),
        }
    };
    let code = match value {
        CogValue::Int(code) => usize::try_from(*code).ok(),
        CogValue::Number(number) if number.fract() == 0.0 && *number >= 0.0 => {
            level_code_of(*number)
        }
        CogValue::Factor(factor) => Some(factor.code),
        CogValue::Text(text) => levels.iter().position(|level| level == text),
        _ => None,
    };
    match code.filter(|code| *code < levels.len()) {
        Some(code) => Ok(Value::from(code as u64 + 1)),
        None => match value {
            CogValue::Int(_) | CogValue::Number(_) => match policy {
                FactorPolicy::Lenient => Ok(plain_value(value)),
                FactorPolicy::Strict => unknown(value.to_plain_string().into_owned()),
            },
            CogValue::Text(text) => unknown(text.clone()),
            other => unknown(other.to_plain_string().into_owned()),
        },
    }
}

/// Whole, non-negative numbers that fit a level index.
fn level_code_of(number: f64) -> Option<usize> {
    if number <= u32::MAX as f64 {
        Some(number as usize)
    } else {
        None
    }
}

fn plain_value(value: &CogValue) -> Value {
    match value {
        CogValue::Null => Value::Null,
        CogValue::Int(value) => Value::from(*value),
        CogValue::Number(value) => Number::from_f64(*value).map_or(Value::Null, Value::Number),
        CogValue::Text(value) => Value::String(value.clone()),
        CogValue::Factor(factor) => Value::String(factor.label.clone()),
        CogValue::Date(_) | CogValue::Time(_) => Value::String(value.to_plain_string().into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn country() -> MetaDescriptor {
        MetaDescriptor::factor("country", "Country", ["Algeria", "Denmark", "Germany"])
    }

    #[test]
    fn test_factor_string_is_one_based() {
        let encoded = encode_value(&country(), &"Algeria".into(), "k", FactorPolicy::Lenient);
        assert_eq!(encoded.unwrap(), json!(1));
    }

    #[test]
    fn test_factor_integer_is_shifted() {
        let encoded = encode_value(&country(), &CogValue::Int(2), "k", FactorPolicy::Lenient);
        assert_eq!(encoded.unwrap(), json!(3));
    }

    #[test]
    fn test_factor_code_outside_levels() {
        for code in [-1, 3, 7, i64::MAX] {
            let strict = encode_value(&country(), &CogValue::Int(code), "k", FactorPolicy::Strict);
            assert!(
                matches!(strict, Err(CodecError::UnknownLevel { .. })),
                "code {code}"
            );
            let lenient =
                encode_value(&country(), &CogValue::Int(code), "k", FactorPolicy::Lenient);
            assert_eq!(lenient.unwrap(), json!(code));
        }
        let huge = encode_value(&country(), &CogValue::Number(1e300), "k", FactorPolicy::Lenient);
        assert_eq!(huge.unwrap(), json!(1e300));
        let whole = encode_value(&country(), &CogValue::Number(1.0), "k", FactorPolicy::Strict);
        assert_eq!(whole.unwrap(), json!(2));
    }

    #[test]
    fn test_factor_unknown_string_passes_through() {
        let encoded = encode_value(&country(), &"France".into(), "k", FactorPolicy::Lenient);
        assert_eq!(encoded.unwrap(), json!("France"));
    }

    #[test]
    fn test_factor_unknown_string_strict() {
        let err = encode_value(&country(), &"France".into(), "k", FactorPolicy::Strict);
        assert!(matches!(err, Err(CodecError::UnknownLevel { .. })));
    }

    #[test]
    fn test_nan_is_null() {
        let encoded = encode_value(
            &country(),
            &CogValue::Number(f64::NAN),
            "k",
            FactorPolicy::Strict,
        );
        assert_eq!(encoded.unwrap(), Value::Null);
        let number = MetaDescriptor::number("v", "V");
        let encoded = encode_value(&number, &CogValue::Number(f64::NAN), "k", FactorPolicy::Strict);
        assert_eq!(encoded.unwrap(), Value::Null);
    }

    #[test]
    fn test_numeric_string_is_parsed() {
        let number = MetaDescriptor::number("v", "V");
        let encoded = encode_value(&number, &" 2.5 ".into(), "k", FactorPolicy::Lenient);
        assert_eq!(encoded.unwrap(), json!(2.5));
    }
}
