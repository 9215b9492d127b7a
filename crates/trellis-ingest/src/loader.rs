//! Loading a display artifact into decoded records.

use std::path::{Path, PathBuf};

use trellis_codec::{DecodeContext, DecodedDisplay, WireArtifact, decode_artifact, read_artifact};
use trellis_model::{DisplaySchema, MetaDescriptor, Record};

use crate::discovery::{locate, locate_named};
use crate::error::Result;

/// A display read from disk.
///
/// Keeps the raw artifact alongside the decoded form so the view store can
/// rewrite the file without re-encoding rows.
#[derive(Debug, Clone)]
pub struct LoadedDisplay {
    pub path: PathBuf,
    pub artifact: WireArtifact,
    pub display: DecodedDisplay,
}

impl LoadedDisplay {
    /// Directory holding the artifact.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn schema(&self) -> &DisplaySchema {
        &self.display.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.display.records
    }

    pub fn filterable_metas(&self) -> Vec<&MetaDescriptor> {
        self.display.schema.filterable_metas()
    }

    pub fn sortable_metas(&self) -> Vec<&MetaDescriptor> {
        self.display.schema.sortable_metas()
    }
}

/// Locate and load the display under `root`.
pub fn load(root: &Path) -> Result<LoadedDisplay> {
    let path = locate(root)?;
    load_file(&path)
}

/// Load a named display from the nested layout.
pub fn load_named(root: &Path, name: &str) -> Result<LoadedDisplay> {
    let path = locate_named(root, name)?;
    load_file(&path)
}

/// Load an artifact file; panels resolve relative to its directory.
pub fn load_file(path: &Path) -> Result<LoadedDisplay> {
    let artifact = read_artifact(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let decoded = decode_artifact(&artifact, &DecodeContext::with_base_dir(base_dir))?;
    tracing::info!(
        path = %path.display(),
        display = %decoded.schema.name,
        records = decoded.records.len(),
        warnings = decoded.warnings.len(),
        "loaded display"
    );
    Ok(LoadedDisplay {
        path: path.to_path_buf(),
        artifact,
        display: decoded,
    })
}
