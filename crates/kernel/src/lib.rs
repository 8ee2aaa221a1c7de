//! Shared kernel for the reading list services: layered settings and the
//! module lifecycle used to mount API surfaces.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
