//! Panel references: building them at encode time and resolving them at decode time.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use trellis_model::{PanelLocation, PanelPayload, PanelRef, PanelSource, PanelType};

use crate::error::{CodecError, Result};

/// Directory the panel renderer writes into, relative to a display directory.
pub const PANELS_DIR: &str = "panels";

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "svg", "webp", "bmp"];
const MARKUP_EXTENSIONS: [&str; 2] = ["html", "htm"];

/// File extensions reported by the panel renderer, keyed by panel key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelExtensions {
    by_key: BTreeMap<String, String>,
}

impl PanelExtensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, panel_key: impl Into<String>, extension: impl Into<String>) {
        let extension = extension.into();
        self.by_key.insert(
            panel_key.into(),
            extension.trim_start_matches('.').to_string(),
        );
    }

    pub fn get(&self, panel_key: &str) -> Option<&str> {
        self.by_key.get(panel_key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Build the table from files already rendered into `dir` (`<panelKey>.<ext>`).
    pub fn scan(dir: &Path) -> Result<Self> {
        let mut extensions = Self::new();
        let entries =
            std::fs::read_dir(dir).map_err(|e| CodecError::io("read directory", dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| CodecError::io("read directory", dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let stem = path.file_stem().and_then(|v| v.to_str());
            let ext = path.extension().and_then(|v| v.to_str());
            if let (Some(stem), Some(ext)) = (stem, ext) {
                extensions.insert(stem, ext);
            }
        }
        tracing::debug!(
            dir = %dir.display(),
            panels = extensions.len(),
            "scanned rendered panels"
        );
        Ok(extensions)
    }
}

/// Reference stored in the embedded `cogData`: relative to the panel interface prefix.
pub fn panel_reference(source: &PanelSource, panel_key: &str, extension: &str) -> String {
    if source.is_remote() {
        panel_key.to_string()
    } else {
        format!("{panel_key}.{extension}")
    }
}

/// Reference as written to the standalone companion files: prefix included.
pub fn prefixed_reference(source: &PanelSource, reference: &str) -> String {
    let prefix = source.prefix();
    if prefix.is_empty() {
        reference.to_string()
    } else {
        format!("{prefix}/{reference}")
    }
}

/// Classify a panel payload by file extension, falling back to the declared panel type.
pub fn classify_payload(reference: &str, fallback: PanelType) -> PanelPayload {
    let extension = Path::new(reference)
        .extension()
        .and_then(|v| v.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => PanelPayload::Image,
        Some(ext) if MARKUP_EXTENSIONS.contains(&ext) => PanelPayload::Markup,
        _ => match fallback {
            PanelType::Img => PanelPayload::Image,
            PanelType::Iframe => PanelPayload::Markup,
        },
    }
}

/// Find the directory holding panel files for a display rooted at `root`.
///
/// Candidates in order: the source's `base` (relative to `root` unless
/// absolute), `root/panels`, `root` itself.
pub fn discover_base_dir(root: &Path, source: &PanelSource) -> Option<PathBuf> {
    let mut candidates = Vec::with_capacity(3);
    if let Some(base) = source.base.as_deref().filter(|base| !base.trim().is_empty()) {
        let base = Path::new(base);
        candidates.push(if base.is_absolute() {
            base.to_path_buf()
        } else {
            root.join(base)
        });
    }
    candidates.push(root.join(PANELS_DIR));
    candidates.push(root.to_path_buf());
    candidates.into_iter().find(|candidate| candidate.is_dir())
}

/// Resolves wire panel references into locations for one display.
#[derive(Debug, Clone)]
pub struct PanelResolver {
    source: PanelSource,
    paneltype: PanelType,
    base_dir: Option<PathBuf>,
}

impl PanelResolver {
    /// `root` is the directory holding the wire artifact, when known.
    pub fn new(source: PanelSource, paneltype: PanelType, root: Option<&Path>) -> Self {
        let base_dir = if source.is_remote() {
            None
        } else {
            root.and_then(|root| discover_base_dir(root, &source))
        };
        Self {
            source,
            paneltype,
            base_dir,
        }
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Resolve one reference. A missing file gives a `None` location.
    pub fn resolve(&self, reference: &str) -> PanelRef {
        let location = if self.source.is_remote() {
            let prefix = self.source.prefix();
            (!prefix.is_empty()).then(|| PanelLocation::Url(format!("{prefix}/{reference}")))
        } else {
            self.base_dir
                .as_ref()
                .filter(|_| is_contained(reference))
                .map(|base| base.join(reference))
                .filter(|path| path.is_file())
                .map(PanelLocation::File)
        };
        PanelRef {
            reference: reference.to_string(),
            location,
            payload: classify_payload(reference, self.paneltype),
        }
    }
}

/// True when `reference` stays below the directory it is joined to.
fn is_contained(reference: &str) -> bool {
    Path::new(reference)
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}
