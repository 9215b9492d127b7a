//! Finding display artifacts under an app root.
//!
//! Two layouts are accepted: a flat root holding `displayInfo.json` directly,
//! and the nested `displays/<name>/displayInfo.json` layout written by the
//! codec.

use std::path::{Path, PathBuf};

use trellis_codec::{DISPLAY_FILE, DISPLAYS_DIR, display_dir};

use crate::error::{IngestError, Result};

/// Locate the artifact to load from `root`.
///
/// Tries the flat layout first, then the first nested display (by directory
/// name) that holds an artifact. A missing root is reported like an empty one.
pub fn locate(root: &Path) -> Result<PathBuf> {
    let mut tried = Vec::new();
    let flat = root.join(DISPLAY_FILE);
    if flat.is_file() {
        tracing::debug!(path = %flat.display(), "found flat display");
        return Ok(flat);
    }
    tried.push(flat);

    let displays = root.join(DISPLAYS_DIR);
    if displays.is_dir() {
        for dir in display_dirs(&displays)? {
            let candidate = dir.join(DISPLAY_FILE);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "found nested display");
                return Ok(candidate);
            }
            tried.push(candidate);
        }
    } else {
        tried.push(displays);
    }

    Err(IngestError::MissingWireFile {
        root: root.to_path_buf(),
        tried,
    })
}

/// Locate a named display in the nested layout.
pub fn locate_named(root: &Path, name: &str) -> Result<PathBuf> {
    let candidate = display_dir(root, name).join(DISPLAY_FILE);
    if candidate.is_file() {
        return Ok(candidate);
    }
    Err(IngestError::MissingWireFile {
        root: root.to_path_buf(),
        tried: vec![candidate],
    })
}

/// Lists the nested displays under `root` that hold an artifact.
///
/// Returns directory names sorted by name. A root without a `displays/`
/// directory has no nested displays.
pub fn list_displays(root: &Path) -> Result<Vec<String>> {
    let displays = root.join(DISPLAYS_DIR);
    if !displays.is_dir() {
        return Ok(Vec::new());
    }
    let names = display_dirs(&displays)?
        .into_iter()
        .filter(|dir| dir.join(DISPLAY_FILE).is_file())
        .filter_map(|dir| {
            dir.file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string)
        })
        .collect();
    Ok(names)
}

fn display_dirs(displays: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(displays).map_err(|e| IngestError::directory_read(displays, e))?;
    let mut dirs = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::directory_read(displays, e))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "{}").unwrap();
    }

    #[test]
    fn test_flat_layout_wins() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("displayInfo.json"));
        touch(&dir.path().join("displays/a/displayInfo.json"));
        assert_eq!(
            locate(dir.path()).unwrap(),
            dir.path().join("displayInfo.json")
        );
    }

    #[test]
    fn test_nested_layout_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("displays/zeta/displayInfo.json"));
        touch(&dir.path().join("displays/alpha/displayInfo.json"));
        std::fs::create_dir_all(dir.path().join("displays/aaa_empty")).unwrap();
        assert_eq!(
            locate(dir.path()).unwrap(),
            dir.path().join("displays/alpha/displayInfo.json")
        );
        assert_eq!(list_displays(dir.path()).unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_missing_artifact_lists_tried() {
        let dir = TempDir::new().unwrap();
        let err = locate(dir.path()).unwrap_err();
        match err {
            IngestError::MissingWireFile { tried, .. } => assert_eq!(tried.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_root_is_missing_wire_file() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("absent");
        match locate(&root).unwrap_err() {
            IngestError::MissingWireFile { tried, .. } => assert_eq!(
                tried,
                vec![root.join("displayInfo.json"), root.join("displays")]
            ),
            other => panic!("unexpected error: {other}"),
        }

        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(
            locate(&file),
            Err(IngestError::MissingWireFile { .. })
        ));
    }
}
