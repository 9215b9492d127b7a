//! Library side of the trellis command line tool.

pub mod expr;
pub mod input;
pub mod logging;
