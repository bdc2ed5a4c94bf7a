//! Handler modules: dispatcher schema, dependencies, command endpoints

pub mod commands;
pub mod schema;
pub mod types;

pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
