//! The wire artifact: the JSON document a viewer loads for one display.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use trellis_model::{DisplayState, MetaDescriptor, MetaType, PanelInterface, View};

use crate::distribution::CogDistribution;
use crate::error::{CodecError, Result};

/// Key holding the synthetic per-record identifier in every `cogData` row.
pub const PANEL_KEY_FIELD: &str = "panelKey";

/// Top-level keys a wire document must carry.
pub const REQUIRED_KEYS: [&str; 3] = ["name", "cogData", "metas"];

const GLOBAL_VAR_PREFIX: &str = "__trellis_cogData__";

/// One encoded `cogData` row.
pub type WireRow = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireArtifact {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keysig: String,
    #[serde(default)]
    pub n: usize,
    pub metas: Vec<MetaDescriptor>,
    #[serde(default)]
    pub state: DisplayState,
    #[serde(default)]
    pub views: Vec<View>,
    #[serde(
        rename = "panelInterface",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub panel_interface: Option<PanelInterface>,
    #[serde(
        rename = "cogDistns",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub cog_distns: BTreeMap<String, CogDistribution>,
    #[serde(rename = "cogData")]
    pub cog_data: Vec<WireRow>,
    /// Keys this version does not interpret; kept so rewrites don't drop them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WireArtifact {
    /// Parse and validate a wire document.
    ///
    /// Missing required keys and shape errors are `InvalidSchema`; a meta with an
    /// unknown `type` tag is `UnsupportedMetaType`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| CodecError::invalid(format!("not valid JSON: {e}")))?;
        Self::from_value(value)
    }

    pub fn from_value(mut value: Value) -> Result<Self> {
        let Some(object) = value.as_object_mut() else {
            return Err(CodecError::invalid("top level is not a JSON object"));
        };
        for key in REQUIRED_KEYS {
            if !object.contains_key(key) {
                return Err(CodecError::invalid(format!("missing top-level key '{key}'")));
            }
        }
        let metas = object
            .get_mut("metas")
            .ok_or_else(|| CodecError::invalid("missing top-level key 'metas'"))?;
        normalize_meta_types(metas)?;
        serde_json::from_value(value).map_err(|e| CodecError::invalid(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parse a JSON array of meta descriptors, reporting unknown type tags.
pub fn parse_metas(value: &Value) -> Result<Vec<MetaDescriptor>> {
    let mut metas = value.clone();
    normalize_meta_types(&mut metas)?;
    serde_json::from_value(metas).map_err(|e| CodecError::invalid(e.to_string()))
}

/// Rewrites each meta's `type` tag to its canonical spelling.
fn normalize_meta_types(metas: &mut Value) -> Result<()> {
    let Some(entries) = metas.as_array_mut() else {
        return Err(CodecError::invalid("'metas' is not an array"));
    };
    for (idx, entry) in entries.iter_mut().enumerate() {
        let varname = entry
            .get("varname")
            .and_then(Value::as_str)
            .map_or_else(|| format!("#{idx}"), str::to_string);
        let Some(type_tag) = entry.get("type").and_then(Value::as_str) else {
            return Err(CodecError::invalid(format!("meta '{varname}' has no type")));
        };
        let meta_type = type_tag.parse::<MetaType>().map_err(|_| {
            CodecError::UnsupportedMetaType {
                varname: varname.clone(),
                type_tag: type_tag.to_string(),
            }
        })?;
        if let Some(object) = entry.as_object_mut() {
            object.insert("type".to_string(), Value::from(meta_type.as_str()));
        }
    }
    Ok(())
}

/// Name of the global the script companion assigns to.
pub fn global_var_name(display_name: &str) -> String {
    let suffix: String = display_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{GLOBAL_VAR_PREFIX}{suffix}")
}

/// Render the script companion: `<global> = <rows>;`.
pub fn script_text(display_name: &str, rows: &[WireRow]) -> Result<String> {
    let json = serde_json::to_string(rows)?;
    Ok(format!("{} = {};\n", global_var_name(display_name), json))
}

/// Extract the rows from a script companion produced by [`script_text`].
pub fn parse_script(script: &str) -> Result<Vec<WireRow>> {
    let trimmed = script.trim();
    let (_, rest) = trimmed
        .split_once('=')
        .ok_or_else(|| CodecError::invalid("script has no assignment"))?;
    let body = rest.trim().trim_end_matches(';');
    serde_json::from_str(body).map_err(|e| CodecError::invalid(e.to_string()))
}
