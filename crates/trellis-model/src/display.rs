use serde::{Deserialize, Serialize};

use crate::meta::{MetaDescriptor, MetaKind, PanelSource, PanelType, find_meta};
use crate::state::{DisplayState, View};

/// Shared description of how panels are located, written once per display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelInterface {
    #[serde(rename = "panelCol")]
    pub panel_col: String,
    #[serde(flatten)]
    pub source: PanelSource,
}

/// Everything a producer declares about a display apart from its rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplaySchema {
    pub name: String,
    pub description: String,
    pub metas: Vec<MetaDescriptor>,
    pub state: DisplayState,
    pub views: Vec<View>,
}

impl DisplaySchema {
    pub fn new(name: impl Into<String>, metas: Vec<MetaDescriptor>) -> Self {
        Self {
            name: name.into(),
            metas,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_state(mut self, state: DisplayState) -> Self {
        self.state = state;
        self
    }

    pub fn meta(&self, varname: &str) -> Option<&MetaDescriptor> {
        find_meta(&self.metas, varname)
    }

    /// The designated panel column, if the display declares one.
    pub fn panel_meta(&self) -> Option<&MetaDescriptor> {
        self.metas.iter().find(|meta| meta.is_panel())
    }

    /// Panel type and source of the designated panel column.
    pub fn panel_settings(&self) -> Option<(PanelType, &PanelSource)> {
        self.panel_meta().and_then(|meta| match &meta.kind {
            MetaKind::Panel {
                paneltype, source, ..
            } => Some((*paneltype, source)),
            _ => None,
        })
    }

    /// Derive the panel interface descriptor from the panel column.
    pub fn panel_interface(&self) -> Option<PanelInterface> {
        let meta = self.panel_meta()?;
        let (_, source) = self.panel_settings()?;
        Some(PanelInterface {
            panel_col: meta.varname.clone(),
            source: source.clone(),
        })
    }

    /// Metas that can be filtered on: every non-panel meta.
    pub fn filterable_metas(&self) -> Vec<&MetaDescriptor> {
        self.metas.iter().filter(|meta| !meta.is_panel()).collect()
    }

    /// Metas that can be sorted on. Currently the same set as the filterable ones.
    pub fn sortable_metas(&self) -> Vec<&MetaDescriptor> {
        self.metas.iter().filter(|meta| !meta.is_panel()).collect()
    }
}
