//! Meta descriptors for cognostic columns.
//!
//! Every column of a display is described by a [`MetaDescriptor`]. The wire
//! format is a flat JSON object with a `type` tag; in Rust the type-specific
//! fields live in the closed [`MetaKind`] union so that every operation over
//! metas (encode, decode, filter, sort, format) is an exhaustive `match`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type tag of a meta column as it appears in the wire `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaType {
    Factor,
    Number,
    Date,
    Time,
    Currency,
    Href,
    Graph,
    String,
    Panel,
}

impl MetaType {
    pub const ALL: [MetaType; 9] = [
        MetaType::Factor,
        MetaType::Number,
        MetaType::Date,
        MetaType::Time,
        MetaType::Currency,
        MetaType::Href,
        MetaType::Graph,
        MetaType::String,
        MetaType::Panel,
    ];

    /// Returns the wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetaType::Factor => "factor",
            MetaType::Number => "number",
            MetaType::Date => "date",
            MetaType::Time => "time",
            MetaType::Currency => "currency",
            MetaType::Href => "href",
            MetaType::Graph => "graph",
            MetaType::String => "string",
            MetaType::Panel => "panel",
        }
    }

    /// Returns true for columns whose values are compared numerically.
    pub fn is_numeric(&self) -> bool {
        matches!(self, MetaType::Number | MetaType::Currency)
    }

    /// Returns true for columns that take part in free-text search.
    ///
    /// Numeric and temporal columns are excluded, as is the panel column.
    pub fn is_searchable(&self) -> bool {
        matches!(self, MetaType::Factor | MetaType::String | MetaType::Href)
    }
}

impl fmt::Display for MetaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MetaType {
    type Err = String;

    /// Parse a wire type tag (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        MetaType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("Unknown meta type: {s}"))
    }
}

/// How a panel is embedded by a viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelType {
    /// Raster or vector image.
    #[default]
    Img,
    /// Interactive markup loaded in a frame.
    Iframe,
}

impl PanelType {
    /// File extension assumed when the renderer did not report one.
    pub fn default_extension(&self) -> &'static str {
        match self {
            PanelType::Img => "png",
            PanelType::Iframe => "html",
        }
    }
}

/// Where panel payloads are served from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PanelSourceKind {
    #[default]
    #[serde(rename = "file")]
    File,
    #[serde(rename = "REST")]
    Rest,
    #[serde(rename = "localWebSocket")]
    LocalWebSocket,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSource {
    #[serde(rename = "type", default)]
    pub kind: PanelSourceKind,
    /// Directory holding panel files, relative to the display directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Endpoint serving panels for remote sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "isLocal", default)]
    pub is_local: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl PanelSource {
    /// Local files stored under `base`.
    pub fn file(base: impl Into<String>) -> Self {
        Self {
            kind: PanelSourceKind::File,
            base: Some(base.into()),
            url: None,
            is_local: true,
            port: None,
        }
    }

    /// Panels fetched from a REST endpoint.
    pub fn rest(url: impl Into<String>) -> Self {
        Self {
            kind: PanelSourceKind::Rest,
            base: None,
            url: Some(url.into()),
            is_local: false,
            port: None,
        }
    }

    pub fn is_remote(&self) -> bool {
        !matches!(self.kind, PanelSourceKind::File)
    }

    /// The single prefix shared by every panel reference: the base directory
    /// for file sources, the endpoint for remote ones.
    pub fn prefix(&self) -> &str {
        let prefix = if self.is_remote() {
            self.url.as_deref()
        } else {
            self.base.as_deref()
        };
        prefix.unwrap_or("").trim_end_matches('/')
    }
}

/// Edge direction of a graph cognostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphDirection {
    To,
    From,
    None,
}

/// Type-specific part of a meta descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetaKind {
    Factor {
        levels: Vec<String>,
    },
    Number {
        #[serde(default)]
        digits: Option<u32>,
        #[serde(default)]
        locale: bool,
        #[serde(default)]
        log: bool,
    },
    Date {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    Time {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timezone: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    Currency {
        code: String,
        #[serde(default)]
        digits: Option<u32>,
        #[serde(default)]
        locale: bool,
    },
    Href {
        #[serde(
            rename = "labelCol",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        label_col: Option<String>,
    },
    Graph {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        direction: Option<GraphDirection>,
        #[serde(rename = "idVar", default, skip_serializing_if = "Option::is_none")]
        id_var: Option<String>,
    },
    String {},
    Panel {
        #[serde(default)]
        paneltype: PanelType,
        #[serde(default = "default_aspect")]
        aspect: f64,
        #[serde(default)]
        source: PanelSource,
    },
}

fn default_aspect() -> f64 {
    1.0
}

impl MetaKind {
    pub fn meta_type(&self) -> MetaType {
        match self {
            MetaKind::Factor { .. } => MetaType::Factor,
            MetaKind::Number { .. } => MetaType::Number,
            MetaKind::Date { .. } => MetaType::Date,
            MetaKind::Time { .. } => MetaType::Time,
            MetaKind::Currency { .. } => MetaType::Currency,
            MetaKind::Href { .. } => MetaType::Href,
            MetaKind::Graph { .. } => MetaType::Graph,
            MetaKind::String {} => MetaType::String,
            MetaKind::Panel { .. } => MetaType::Panel,
        }
    }
}

/// A cognostic column: name, display label and type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaDescriptor {
    pub varname: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(flatten)]
    pub kind: MetaKind,
}

impl MetaDescriptor {
    pub fn new(varname: impl Into<String>, label: impl Into<String>, kind: MetaKind) -> Self {
        Self {
            varname: varname.into(),
            label: label.into(),
            group: None,
            desc: None,
            kind,
        }
    }

    pub fn factor<I, S>(varname: impl Into<String>, label: impl Into<String>, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            varname,
            label,
            MetaKind::Factor {
                levels: levels.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn number(varname: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(
            varname,
            label,
            MetaKind::Number {
                digits: None,
                locale: true,
                log: false,
            },
        )
    }

    pub fn string(varname: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(varname, label, MetaKind::String {})
    }

    pub fn date(varname: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(varname, label, MetaKind::Date { format: None })
    }

    pub fn panel(varname: impl Into<String>, paneltype: PanelType, source: PanelSource) -> Self {
        Self::new(
            varname,
            "",
            MetaKind::Panel {
                paneltype,
                aspect: 1.0,
                source,
            },
        )
    }

    /// Set the cognostic group.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn meta_type(&self) -> MetaType {
        self.kind.meta_type()
    }

    pub fn is_panel(&self) -> bool {
        matches!(self.kind, MetaKind::Panel { .. })
    }

    /// Factor levels, `None` for every other type.
    pub fn levels(&self) -> Option<&[String]> {
        match &self.kind {
            MetaKind::Factor { levels } => Some(levels),
            _ => None,
        }
    }

    /// Label shown to users, falling back to the varname.
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.varname
        } else {
            &self.label
        }
    }
}

/// Find a meta by varname.
pub fn find_meta<'a>(metas: &'a [MetaDescriptor], varname: &str) -> Option<&'a MetaDescriptor> {
    metas.iter().find(|meta| meta.varname == varname)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_type_from_str() {
        assert_eq!("factor".parse::<MetaType>().unwrap(), MetaType::Factor);
        assert_eq!(" Currency ".parse::<MetaType>().unwrap(), MetaType::Currency);
        assert!("histogram".parse::<MetaType>().is_err());
    }

    #[test]
    fn test_searchable_types() {
        assert!(MetaType::Factor.is_searchable());
        assert!(MetaType::Href.is_searchable());
        assert!(!MetaType::Number.is_searchable());
        assert!(!MetaType::Date.is_searchable());
        assert!(!MetaType::Panel.is_searchable());
    }

    #[test]
    fn test_panel_source_prefix() {
        assert_eq!(PanelSource::file("panels/").prefix(), "panels");
        assert_eq!(
            PanelSource::rest("http://localhost:8000/api").prefix(),
            "http://localhost:8000/api"
        );
        assert!(PanelSource::rest("http://x").is_remote());
    }

    #[test]
    fn test_display_label_falls_back_to_varname() {
        let meta = MetaDescriptor::string("country", " ");
        assert_eq!(meta.display_label(), "country");
    }
}
