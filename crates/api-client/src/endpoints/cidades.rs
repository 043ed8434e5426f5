//! City endpoints

use crate::client::AdminClient;
use crate::endpoints::{check, envelope, pick, record};
use crate::error::ApiResult;
use crate::models::{Bairro, Cidade};
use comercio_core::validation::{ValidationResult, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

/// Cities API interface
#[derive(Clone)]
pub struct CidadesApi {
    client: AdminClient,
}

impl CidadesApi {
    /// Create a new cities API interface
    pub(crate) fn new(client: AdminClient) -> Self {
        Self { client }
    }

    /// List every city
    ///
    /// GET /api/cidades
    #[instrument(skip(self))]
    pub async fn list(&self) -> ApiResult<Vec<Cidade>> {
        let body: Value = self.client.get("/api/cidades").await?;
        envelope(body, "cidades")
    }

    /// Get one city
    ///
    /// GET /api/cidades/{id}
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ApiResult<Cidade> {
        let body: Value = self.client.get(&format!("/api/cidades/{id}")).await?;
        envelope(body, "cidade")
    }

    /// Search cities by name
    ///
    /// GET /api/cidades/buscar?q={query}
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> ApiResult<Vec<Cidade>> {
        let body: Value = self
            .client
            .get_query("/api/cidades/buscar", &[("q", query.trim())])
            .await?;
        envelope(body, "cidades")
    }

    /// Neighborhoods of a city
    ///
    /// GET /api/bairros/cidade/{id}
    pub async fn bairros(&self, id: i64) -> ApiResult<Vec<Bairro>> {
        self.client.bairros().by_cidade(id).await
    }

    /// Create a city
    ///
    /// POST /api/cidades
    #[instrument(skip(self))]
    pub async fn create(&self, draft: &CidadeDraft) -> ApiResult<Cidade> {
        check(draft.validate())?;
        let body: Value = self.client.post("/api/cidades", draft).await?;
        record(body, "cidade")
    }

    /// Replace a city's fields
    ///
    /// PATCH /api/cidades/{id}
    #[instrument(skip(self))]
    pub async fn update(&self, id: i64, update: &CidadeDraft) -> ApiResult<Cidade> {
        check(update.validate())?;
        let body: Value = self
            .client
            .patch(&format!("/api/cidades/{id}"), update)
            .await?;
        record(body, "cidade")
    }

    /// Fetch the city, fill blanks in `edit` from it, and send the result
    pub async fn edit(&self, id: i64, edit: &CidadeEdit) -> ApiResult<Cidade> {
        let current = self.get(id).await?;
        self.update(id, &edit.resolve(&current)).await
    }

    /// Delete a city
    ///
    /// DELETE /api/cidades/{id}
    #[instrument(skip(self))]
    pub async fn remove(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&format!("/api/cidades/{id}")).await
    }
}

impl_listing!(CidadesApi, Cidade);

/// City form, used for both creation and updates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CidadeDraft {
    /// Name
    pub nome: String,
    /// State the city belongs to
    pub estado_id: Option<i64>,
}

impl CidadeDraft {
    /// Check that the form is complete
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        Validator::new()
            .required("nome", &self.nome)
            .required_id("estado_id", self.estado_id)
            .validate()
    }
}

/// City edit form
#[derive(Debug, Clone, Default)]
pub struct CidadeEdit {
    /// New name
    pub nome: Option<String>,
    /// New state
    pub estado_id: Option<i64>,
}

impl CidadeEdit {
    /// Merge the form with the stored city
    #[must_use]
    pub fn resolve(&self, current: &Cidade) -> CidadeDraft {
        CidadeDraft {
            nome: pick(self.nome.as_ref(), &current.nome),
            estado_id: self
                .estado_id
                .or(current.estado_id)
                .or(current.estado.as_ref().map(|e| e.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Estado;

    #[test]
    fn test_resolve_takes_state_from_nested_record() {
        let current = Cidade {
            id: Some(5),
            nome: "Garanhuns".into(),
            estado_id: None,
            estado: Some(Estado {
                id: 17,
                nome: "Pernambuco".into(),
                sigla: "PE".into(),
            }),
            ..Cidade::default()
        };

        let update = CidadeEdit::default().resolve(&current);
        assert_eq!(update.nome, "Garanhuns");
        assert_eq!(update.estado_id, Some(17));
    }
}
