//! Shared helpers.
//!
//! - [`path`]: web-root relative reference math and validation
//! - [`mime`]: Content-Type for the bundle server

pub mod mime;
pub mod path;
