//! Data model for trellis displays.
//!
//! A display is a collection of panels, one per record, plus typed metadata
//! ("cognostics") describing each record. This crate holds the types shared by
//! the codec, the loader and the query engine; it does no I/O.

pub mod display;
pub mod meta;
pub mod state;
pub mod value;

pub use display::{DisplaySchema, PanelInterface};
pub use meta::{
    GraphDirection, MetaDescriptor, MetaKind, MetaType, PanelSource, PanelSourceKind, PanelType,
    find_meta,
};
pub use state::{
    Arrangement, DisplayState, FilterEntry, FilterSpec, Layout, SortDirection, SortKey, View,
};
pub use value::{CogValue, FactorValue, PanelLocation, PanelPayload, PanelRef, Record};
