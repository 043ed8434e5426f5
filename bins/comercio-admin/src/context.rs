//! Composition root
//!
//! Everything a command needs is built here once: the configuration (file,
//! then environment, then flags), the session store, and the API client.

use anyhow::Result;
use comercio_api_client::{AdminClient, ApiResult, ClientConfig};
use comercio_cli::output::{OutputFormat, Status, print_json};
use comercio_cli::progress;
use comercio_core::config::Config;
use comercio_core::guard::{Access, Route, authorize};
use comercio_core::session::{FileStore, SessionState};
use comercio_core::Error;
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use tracing::debug;

/// Flags shared by every command
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub config: Option<PathBuf>,
    pub api_url: Option<String>,
    pub format: Option<OutputFormat>,
}

/// Loaded configuration and the output format every later step follows
pub struct Settings {
    pub config: Config,
    pub format: OutputFormat,
}

impl Settings {
    /// The `--format` flag wins over the configured format
    pub fn resolve(options: &Options) -> Result<Self> {
        let config = Config::load(options.config.as_deref())?;
        let format = match options.format {
            Some(format) => format,
            None => config.schema.output.format.parse()?,
        };
        Ok(Self { config, format })
    }
}

pub struct Context {
    pub format: OutputFormat,
    store: FileStore,
    client: AdminClient,
}

impl Context {
    pub fn build(options: &Options, settings: Settings) -> Result<Self> {
        let Settings { config, format } = settings;

        let mut client_config = ClientConfig::from_schema(&config.schema)?;
        if let Some(url) = &options.api_url {
            client_config = client_config.with_base_url(url.clone());
        }
        let client = AdminClient::with_config(client_config)?;
        let store = FileStore::new(config.schema.session.resolved_path());

        debug!(
            config = ?config.path,
            api = client.base_url(),
            session = %store.path().display(),
            "Context ready"
        );
        Ok(Self {
            format,
            store,
            client,
        })
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn session_state(&self) -> Result<SessionState> {
        Ok(SessionState::load(&self.store)?)
    }

    /// Client for a screen, after the access guard allowed it
    ///
    /// Public screens get a client without a token. A missing or unreadable
    /// session fails as "not logged in"; a restricted role fails as "access
    /// restricted".
    pub fn open(&self, route: &Route) -> Result<AdminClient> {
        if route.is_public() {
            return Ok(self.client.clone());
        }

        let state = self.session_state()?;
        match authorize(&state, route) {
            Access::Allow => {
                let session = state.require()?;
                Ok(self.client.clone().with_token(&session.token))
            }
            Access::Redirect(Route::Root) => Err(match state.require() {
                Err(e) => e,
                Ok(_) => Error::not_authenticated(),
            }
            .into()),
            Access::Redirect(_) => {
                debug!(route = %route, "Guard refused route");
                Err(Error::access_restricted(&route.path()).into())
            }
        }
    }

    /// Await a request behind a spinner
    pub async fn fetch<T, F>(&self, message: &str, request: F) -> ApiResult<T>
    where
        F: Future<Output = ApiResult<T>>,
    {
        let pb = self.spinner(message);
        let result = request.await;
        match &result {
            Ok(_) => pb.finish_and_clear(),
            Err(_) => progress::finish_error(&pb, message),
        }
        result
    }

    /// Await a change and announce it
    pub async fn change<T, F>(&self, message: &str, done: &str, request: F) -> ApiResult<T>
    where
        F: Future<Output = ApiResult<T>>,
    {
        let pb = self.spinner(message);
        let result = request.await;
        match &result {
            Ok(_) if pb.is_hidden() => {
                if !self.format.is_json() {
                    Status::success(done);
                }
            }
            Ok(_) => progress::finish_success(&pb, done),
            Err(_) => progress::finish_error(&pb, message),
        }
        result
    }

    fn spinner(&self, message: &str) -> indicatif::ProgressBar {
        if self.format.is_json() || !console::user_attended_stderr() {
            progress::hidden()
        } else {
            progress::spinner(message)
        }
    }

    /// Print `value` as JSON, or run `text` for the human rendering
    pub fn emit<T, F>(&self, value: &T, text: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(),
    {
        if self.format.is_json() {
            print_json(value)?;
        } else {
            text();
        }
        Ok(())
    }
}
