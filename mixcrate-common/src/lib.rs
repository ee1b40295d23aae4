//! Shared foundation for the mixcrate workspace
//!
//! Holds the workspace-wide error type and configuration resolution used by
//! every mixcrate service.

pub mod config;
pub mod error;

pub use error::{Error, Result};
