//! Reading list application library
//!
//! The books resource (model, partial-update merge, stores and JSON handlers)
//! packaged as a module for the HTTP server.

pub mod modules;

pub use modules::books::{
    models::{Book, CreateBook, UpdateBook},
    store::{BookStore, MemoryBookStore, PgBookStore, StoreError},
};
