//! FOLIO Application Library
//!
//! This library provides the catalog modules and shared helpers for the
//! FOLIO book-review service.

pub mod modules;
pub mod utils;
