//! # Built-in handlers
//!
//! Small, self-contained handlers useful for demos and debugging.
//!
//! - [`LogWriter`]: traces every delivered event.

mod log;

pub use log::LogWriter;
