//! Typed client for the Comércio Assim management API
//!
//! This crate wraps the marketplace backend (a token-authenticated JSON API)
//! behind one [`AdminClient`] with an interface per resource.
//!
//! # Features
//!
//! - **Environment-based configuration**: base URL, postal-code service and
//!   timeout from `COMERCIO_*` variables or a TOML file
//! - **Bearer authentication**: the session token rides on every protected call
//! - **Request correlation**: each request carries a unique `X-Request-ID`
//! - **Local screening**: malformed forms are refused before any request is made
//! - **Edit forms**: blank fields fall back to the stored record
//!
//! # Example
//!
//! ```rust,no_run
//! use comercio_api_client::{AdminClient, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AdminClient::with_config(ClientConfig::from_env()?)?;
//!
//!     let session = client.auth().login("admin@example.com", "segredo123").await?;
//!     let client = client.with_token(&session.token);
//!
//!     for feira in client.feiras().list().await? {
//!         println!("{} {}", feira.id, feira.nome);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod models;

pub use client::AdminClient;
pub use config::{ClientConfig, Environment};
pub use error::{ApiError, ApiResult, Rejection};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::AdminClient;
    pub use crate::config::{ClientConfig, Environment};
    pub use crate::endpoints::{
        AssociacoesApi, AuthApi, BairrosApi, BancasApi, CepApi, CidadesApi, EstadosApi, FeirasApi,
        Listing, OcsApi, ReunioesApi, UsersApi, delete_and_refresh,
    };
    pub use crate::error::{ApiError, ApiResult, Rejection};
    pub use crate::models::*;
}
