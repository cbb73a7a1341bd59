//! Core traits, settings, and module registry for the FOLIO service.

pub mod module;
pub mod registry;
pub mod settings;
pub mod state;

pub use module::{InitCtx, Migration, Module};
pub use registry::ModuleRegistry;
pub use state::{AppState, IdentityResolver, Stores};
