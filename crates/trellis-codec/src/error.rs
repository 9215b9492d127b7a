//! Error and warning types for encoding and decoding displays.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use trellis_model::MetaType;

/// Errors that abort an encode or decode call.
#[derive(Debug, Error)]
pub enum CodecError {
    // === Encode ===
    /// A declared meta column is absent from a record.
    #[error("record '{panel_key}' has no value for meta '{varname}'")]
    SchemaMismatch { panel_key: String, varname: String },

    /// A factor value is not one of the declared levels (strict mode only).
    #[error("value '{value}' of record '{panel_key}' is not a level of factor '{varname}'")]
    UnknownLevel {
        panel_key: String,
        varname: String,
        value: String,
    },

    /// Two records share a panel key.
    #[error("duplicate panel key '{panel_key}'")]
    DuplicatePanelKey { panel_key: String },

    // === Schema ===
    /// A meta descriptor carries a type tag this codec does not know.
    #[error("meta '{varname}' has unsupported type '{type_tag}'")]
    UnsupportedMetaType { varname: String, type_tag: String },

    /// The wire document is malformed or lacks required keys.
    #[error("invalid display artifact: {reason}")]
    InvalidSchema { reason: String },

    #[error("failed to serialize display artifact: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    // === File System ===
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temp file was written but could not replace the target.
    #[error("failed to replace {target_path}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CodecError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// What went wrong with a single value during decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// The panel file could not be found; the record keeps a null location.
    UnresolvedPanel { reference: Option<String> },
    /// A factor code outside `1..=levels.len()`.
    FactorCodeOutOfRange { code: i64 },
    /// A value that does not parse as the declared type.
    UnparsableValue { expected: MetaType, raw: String },
}

/// A recoverable, per-row decode problem. The row is always kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialDecodeWarning {
    pub panel_key: String,
    pub varname: String,
    pub kind: WarningKind,
}

impl fmt::Display for PartialDecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::UnresolvedPanel { reference } => write!(
                f,
                "{}: panel '{}' not found",
                self.panel_key,
                reference.as_deref().unwrap_or("<none>")
            ),
            WarningKind::FactorCodeOutOfRange { code } => write!(
                f,
                "{}: factor code {} out of range for '{}'",
                self.panel_key, code, self.varname
            ),
            WarningKind::UnparsableValue { expected, raw } => write!(
                f,
                "{}: '{}' is not a valid {} for '{}'",
                self.panel_key, raw, expected, self.varname
            ),
        }
    }
}
