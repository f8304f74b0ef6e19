//! Configuration management for rondo server

mod defaults;
mod loader;
mod schema;

pub use loader::ConfigLoader;
pub use schema::*;
