//! Neighborhood endpoints

use crate::client::AdminClient;
use crate::endpoints::{check, envelope, pick, record};
use crate::error::ApiResult;
use crate::models::Bairro;
use comercio_core::validation::{ValidationResult, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

/// Neighborhoods API interface
#[derive(Clone)]
pub struct BairrosApi {
    client: AdminClient,
}

impl BairrosApi {
    /// Create a new neighborhoods API interface
    pub(crate) fn new(client: AdminClient) -> Self {
        Self { client }
    }

    /// List every neighborhood
    ///
    /// GET /api/bairros
    #[instrument(skip(self))]
    pub async fn list(&self) -> ApiResult<Vec<Bairro>> {
        let body: Value = self.client.get("/api/bairros").await?;
        envelope(body, "bairros")
    }

    /// Get one neighborhood
    ///
    /// GET /api/bairros/{id}
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ApiResult<Bairro> {
        let body: Value = self.client.get(&format!("/api/bairros/{id}")).await?;
        envelope(body, "bairro")
    }

    /// Neighborhoods of one city
    ///
    /// GET /api/bairros/cidade/{id}
    #[instrument(skip(self))]
    pub async fn by_cidade(&self, cidade_id: i64) -> ApiResult<Vec<Bairro>> {
        let body: Value = self
            .client
            .get(&format!("/api/bairros/cidade/{cidade_id}"))
            .await?;
        envelope(body, "bairros")
    }

    /// Create a neighborhood
    ///
    /// POST /api/bairros
    #[instrument(skip(self))]
    pub async fn create(&self, draft: &BairroDraft) -> ApiResult<Bairro> {
        check(draft.validate())?;
        let body: Value = self.client.post("/api/bairros", draft).await?;
        record(body, "bairro")
    }

    /// Replace a neighborhood's fields
    ///
    /// PATCH /api/bairros/{id}
    #[instrument(skip(self))]
    pub async fn update(&self, id: i64, update: &BairroDraft) -> ApiResult<Bairro> {
        check(update.validate())?;
        let body: Value = self
            .client
            .patch(&format!("/api/bairros/{id}"), update)
            .await?;
        record(body, "bairro")
    }

    /// Fetch the neighborhood, fill blanks in `edit` from it, and send the result
    pub async fn edit(&self, id: i64, edit: &BairroEdit) -> ApiResult<Bairro> {
        let current = self.get(id).await?;
        self.update(id, &edit.resolve(&current)).await
    }

    /// Delete a neighborhood
    ///
    /// DELETE /api/bairros/{id}
    #[instrument(skip(self))]
    pub async fn remove(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&format!("/api/bairros/{id}")).await
    }
}

impl_listing!(BairrosApi, Bairro);

/// Neighborhood form, used for both creation and updates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BairroDraft {
    /// Name
    pub nome: String,
    /// City the neighborhood belongs to
    pub cidade_id: Option<i64>,
}

impl BairroDraft {
    /// Check that the form is complete
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        Validator::new()
            .required("nome", &self.nome)
            .required_id("cidade_id", self.cidade_id)
            .validate()
    }
}

/// Neighborhood edit form
#[derive(Debug, Clone, Default)]
pub struct BairroEdit {
    /// New name
    pub nome: Option<String>,
    /// New city
    pub cidade_id: Option<i64>,
}

impl BairroEdit {
    /// Merge the form with the stored neighborhood
    #[must_use]
    pub fn resolve(&self, current: &Bairro) -> BairroDraft {
        BairroDraft {
            nome: pick(self.nome.as_ref(), &current.nome),
            cidade_id: self.cidade_id.or(current.cidade_id),
        }
    }
}
