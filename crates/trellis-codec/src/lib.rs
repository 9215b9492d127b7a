//! Wire codec for trellis displays.
//!
//! [`encode`] turns a [`DisplaySchema`](trellis_model::DisplaySchema) and its
//! records into the JSON artifact a viewer loads, plus two companion copies of
//! the row array. [`decode`] is the inverse and resolves panel references
//! against the files on disk.

pub mod decode;
pub mod distribution;
pub mod encode;
pub mod error;
pub mod keysig;
pub mod panel;
pub mod wire;
pub mod writer;

pub use decode::{
    DecodeContext, DecodedDisplay, decode, decode_artifact, decode_value, parse_date, parse_time,
};
pub use distribution::{CogDistribution, LevelCount, compute_distributions};
pub use encode::{EncodeOptions, EncodedDisplay, FactorPolicy, encode, encode_value};
pub use error::{CodecError, PartialDecodeWarning, Result, WarningKind};
pub use keysig::keysig;
pub use panel::{
    PANELS_DIR, PanelExtensions, PanelResolver, classify_payload, discover_base_dir,
    panel_reference, prefixed_reference,
};
pub use wire::{
    PANEL_KEY_FIELD, WireArtifact, WireRow, global_var_name, parse_metas, parse_script,
    script_text,
};
pub use writer::{
    DISPLAY_FILE, DISPLAY_LIST_FILE, DISPLAYS_DIR, DisplayListEntry, FLAT_FILE, SCRIPT_FILE,
    display_dir, read_artifact, write_artifact, write_display, write_display_list,
};
