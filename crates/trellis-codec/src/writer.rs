//! Writing display artifacts to disk.
//!
//! Layout of an app directory:
//!
//! ```text
//! <root>/displays/displayList.json
//! <root>/displays/<name>/displayInfo.json   wire artifact with embedded cogData
//! <root>/displays/<name>/cogData.json       standalone row array
//! <root>/displays/<name>/cogData.js         row array as a global assignment
//! <root>/displays/<name>/panels/            panel files, written by the renderer
//! ```

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::encode::EncodedDisplay;
use crate::error::{CodecError, Result};
use crate::wire::WireArtifact;

pub const DISPLAY_FILE: &str = "displayInfo.json";
pub const FLAT_FILE: &str = "cogData.json";
pub const SCRIPT_FILE: &str = "cogData.js";
pub const DISPLAYS_DIR: &str = "displays";
pub const DISPLAY_LIST_FILE: &str = "displayList.json";

/// Summary of one display for the app-level listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayListEntry {
    pub name: String,
    pub description: String,
    pub n: usize,
    pub keysig: String,
}

/// Directory of a named display under an app root.
pub fn display_dir(app_root: &Path, name: &str) -> PathBuf {
    let dir_name: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    app_root.join(DISPLAYS_DIR).join(dir_name)
}

/// Write the artifact and both companion files into `dir`.
pub fn write_display(dir: &Path, encoded: &EncodedDisplay) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| CodecError::io("create directory", dir, e))?;
    write_artifact(&dir.join(DISPLAY_FILE), &encoded.artifact)?;
    let flat = serde_json::to_vec(&encoded.flat)?;
    write_atomic(&dir.join(FLAT_FILE), &flat)?;
    write_atomic(&dir.join(SCRIPT_FILE), encoded.script.as_bytes())?;
    tracing::info!(
        dir = %dir.display(),
        display = %encoded.artifact.name,
        "wrote display files"
    );
    Ok(())
}

/// Write (or rewrite) a wire artifact.
pub fn write_artifact(path: &Path, artifact: &WireArtifact) -> Result<()> {
    let json = artifact.to_json_pretty()?;
    write_atomic(path, json.as_bytes())
}

/// Read and validate a wire artifact file.
pub fn read_artifact(path: &Path) -> Result<WireArtifact> {
    let json = fs::read_to_string(path).map_err(|e| CodecError::io("read", path, e))?;
    WireArtifact::from_json_str(&json)
}

/// Rebuild `displays/displayList.json` from the displays present under `app_root`.
///
/// Unreadable displays are skipped with a warning.
pub fn write_display_list(app_root: &Path) -> Result<Vec<DisplayListEntry>> {
    let displays_dir = app_root.join(DISPLAYS_DIR);
    let mut entries = Vec::new();
    let dir_entries = fs::read_dir(&displays_dir)
        .map_err(|e| CodecError::io("read directory", &displays_dir, e))?;
    let mut dirs: Vec<PathBuf> = Vec::new();
    for entry in dir_entries {
        let entry = entry.map_err(|e| CodecError::io("read directory", &displays_dir, e))?;
        if entry.path().is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    for dir in dirs {
        let path = dir.join(DISPLAY_FILE);
        if !path.is_file() {
            continue;
        }
        match read_artifact(&path) {
            Ok(artifact) => entries.push(DisplayListEntry {
                name: artifact.name,
                description: artifact.description,
                n: artifact.n,
                keysig: artifact.keysig,
            }),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping unreadable display");
            }
        }
    }
    let json = serde_json::to_vec_pretty(&entries)?;
    write_atomic(&displays_dir.join(DISPLAY_LIST_FILE), &json)?;
    Ok(entries)
}

/// Write via a temp file and rename so readers never see a partial file.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CodecError::io("create directory", parent, e))?;
    }
    let temp_path = temp_path_for(path);

    let result = write_and_rename(&temp_path, path, bytes);
    if result.is_err()
        && temp_path.exists()
        && let Err(error) = fs::remove_file(&temp_path)
    {
        tracing::warn!(path = %temp_path.display(), %error, "failed to remove temp file");
    }
    result?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote file");
    Ok(())
}

fn write_and_rename(temp_path: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(temp_path).map_err(|e| CodecError::io("create", temp_path, e))?;
    file.write_all(bytes)
        .map_err(|e| CodecError::io("write", temp_path, e))?;
    file.sync_all()
        .map_err(|e| CodecError::io("sync", temp_path, e))?;
    drop(file);

    fs::rename(temp_path, path).map_err(|e| CodecError::AtomicWriteFailed {
        temp_path: temp_path.to_path_buf(),
        target_path: path.to_path_buf(),
        source: e,
    })
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_display_dir_sanitizes_name() {
        let root = Path::new("/app");
        assert_eq!(
            display_dir(root, "life exp/by country"),
            PathBuf::from("/app/displays/life_exp_by_country")
        );
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.json");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"two");
        assert!(!dir.path().join("a.json.tmp").exists());
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("occupied");
        fs::create_dir_all(target.join("child")).unwrap();
        let err = write_atomic(&target, b"data").unwrap_err();
        assert!(matches!(err, CodecError::AtomicWriteFailed { .. }));
        assert!(!dir.path().join("occupied.tmp").exists());
    }
}
