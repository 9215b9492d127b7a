//! Locating, loading and rewriting trellis displays on disk.
//!
//! - [`locate`] / [`load`] find the artifact under an app root (flat or nested layout)
//! - [`ViewStore`] edits the named views stored in that artifact

pub mod discovery;
pub mod error;
pub mod loader;
pub mod paths;
pub mod views;

pub use discovery::{list_displays, locate, locate_named};
pub use error::{IngestError, Result};
pub use loader::{LoadedDisplay, load, load_file, load_named};
pub use paths::{APP_DIR_ENV_VAR, app_root, default_app_root};
pub use views::ViewStore;
