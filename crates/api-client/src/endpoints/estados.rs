//! State endpoints

use crate::client::AdminClient;
use crate::endpoints::envelope;
use crate::error::ApiResult;
use crate::models::Estado;
use serde_json::Value;
use tracing::instrument;

/// States API interface
#[derive(Clone)]
pub struct EstadosApi {
    client: AdminClient,
}

impl EstadosApi {
    /// Create a new states API interface
    pub(crate) fn new(client: AdminClient) -> Self {
        Self { client }
    }

    /// List every state
    ///
    /// GET /api/estados
    #[instrument(skip(self))]
    pub async fn list(&self) -> ApiResult<Vec<Estado>> {
        let body: Value = self.client.get("/api/estados").await?;
        envelope(body, "estados")
    }
}
