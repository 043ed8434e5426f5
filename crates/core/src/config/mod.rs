//! Configuration loading and schema definitions
//!
//! The admin tools read an optional TOML file; every field has a default.

mod loader;
mod schema;

pub use loader::{default_config_path, Config};
pub use schema::*;
