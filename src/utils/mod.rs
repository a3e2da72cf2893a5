//! Generic utility primitives with zero domain knowledge.
//!
//! - `artifact` - Artifact path resolution with glob support
//! - `command` - Process invocation with error handling
//! - `io` - File I/O with consistent error handling
//! - `template` - String template rendering

pub mod artifact;
pub mod command;
pub mod io;
pub mod template;
