//! Core types for the Comércio Assim admin tools
//!
//! This crate holds everything the admin front end needs that does not talk
//! to the network:
//!
//! - **Errors**: local failures with a code, context and a hint for the user
//! - **Configuration**: TOML-based configuration with validation
//! - **Validation**: fluent field validation for form input
//! - **Documents**: CPF/CNPJ checksums and CEP/phone formatting
//! - **Schedule**: fair operating hours keyed by weekday
//! - **Session**: the authenticated identity and its persistence adapter
//! - **Guard**: the pure access decision for every admin route
//!
//! # Example
//!
//! ```rust
//! use comercio_core::guard::{authorize, Access, Resource, Route};
//! use comercio_core::session::{MemoryStore, RoleRef, Session, SessionState};
//!
//! let store = MemoryStore::new();
//! Session::new("token", vec![RoleRef::new(1, "administrador")], Some("7".into()))
//!     .save(&store)
//!     .unwrap();
//!
//! let state = SessionState::load(&store).unwrap();
//! assert_eq!(authorize(&state, &Route::List(Resource::Feiras)), Access::Allow);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod documents;
pub mod error;
pub mod guard;
pub mod schedule;
pub mod session;
pub mod validation;

pub use error::{Error, ErrorCode, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema};
    pub use crate::documents::{is_valid_cnpj, is_valid_cpf};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result};
    pub use crate::guard::{authorize, Access, Resource, Role, Route};
    pub use crate::schedule::{OperatingHours, Weekday};
    pub use crate::session::{FileStore, MemoryStore, RoleRef, Session, SessionState, SessionStore};
    pub use crate::validation::{ValidationError, ValidationResult, Validator};
}
