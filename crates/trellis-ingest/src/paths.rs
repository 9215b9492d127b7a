//! App root resolution.

use std::path::PathBuf;

/// Environment variable for overriding the app root.
pub const APP_DIR_ENV_VAR: &str = "TRELLIS_APP_DIR";

/// Get the app root directory.
///
/// Resolution order:
/// 1. `TRELLIS_APP_DIR` environment variable
/// 2. the current directory
pub fn default_app_root() -> PathBuf {
    match std::env::var_os(APP_DIR_ENV_VAR) {
        Some(root) if !root.is_empty() => PathBuf::from(root),
        _ => PathBuf::from("."),
    }
}

/// An explicit root wins over the default.
pub fn app_root(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(default_app_root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_root_wins() {
        let root = app_root(Some(PathBuf::from("/srv/app")));
        assert_eq!(root, PathBuf::from("/srv/app"));
    }
}
