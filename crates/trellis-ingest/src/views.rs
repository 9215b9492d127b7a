//! Named views persisted inside the display artifact.
//!
//! The store edits the `views` array of the artifact it was opened from and
//! rewrites the whole file after every change. Other top-level keys are kept
//! as read.

use std::path::{Path, PathBuf};

use trellis_codec::{WireArtifact, read_artifact, write_artifact};
use trellis_model::View;

use crate::error::Result;
use crate::loader::LoadedDisplay;

#[derive(Debug, Clone)]
pub struct ViewStore {
    path: PathBuf,
    artifact: WireArtifact,
}

impl ViewStore {
    /// Open the store backed by the artifact at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let artifact = read_artifact(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            artifact,
        })
    }

    /// Store over an already loaded display.
    pub fn from_loaded(loaded: &LoadedDisplay) -> Self {
        Self {
            path: loaded.path.clone(),
            artifact: loaded.artifact.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.artifact.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifact.views.is_empty()
    }

    /// Insert or replace (by name) and persist.
    ///
    /// The store is left unchanged when the write fails.
    pub fn save(&mut self, view: View) -> Result<()> {
        let mut views = self.artifact.views.clone();
        match views.iter().position(|existing| existing.name == view.name) {
            Some(idx) => {
                tracing::info!(view = %view.name, index = idx, "replacing view");
                views[idx] = view;
            }
            None => {
                tracing::info!(view = %view.name, index = views.len(), "adding view");
                views.push(view);
            }
        }
        self.commit(views)
    }

    /// Remove the view at `index`. Returns `false` when out of range.
    pub fn delete(&mut self, index: usize) -> Result<bool> {
        if index >= self.artifact.views.len() {
            tracing::debug!(index, "no view to delete");
            return Ok(false);
        }
        let mut views = self.artifact.views.clone();
        let removed = views.remove(index);
        tracing::info!(view = %removed.name, index, "deleting view");
        self.commit(views)?;
        Ok(true)
    }

    pub fn get(&self, index: usize) -> Option<View> {
        self.artifact.views.get(index).cloned()
    }

    pub fn get_all(&self) -> Vec<View> {
        self.artifact.views.clone()
    }

    pub fn find(&self, name: &str) -> Option<View> {
        self.artifact
            .views
            .iter()
            .find(|view| view.name == name)
            .cloned()
    }

    /// Write the artifact with `views`; keep the previous views if that fails.
    fn commit(&mut self, views: Vec<View>) -> Result<()> {
        let previous = std::mem::replace(&mut self.artifact.views, views);
        if let Err(error) = write_artifact(&self.path, &self.artifact) {
            self.artifact.views = previous;
            return Err(error.into());
        }
        Ok(())
    }
}
