//! Meeting endpoints

use crate::client::AdminClient;
use crate::endpoints::{check, envelope, pick, pick_opt, record};
use crate::error::ApiResult;
use crate::models::{Participante, Reuniao};
use comercio_core::schedule::parse_date;
use comercio_core::validation::{ValidationResult, Validator};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

/// Meetings API interface
#[derive(Clone)]
pub struct ReunioesApi {
    client: AdminClient,
}

impl ReunioesApi {
    /// Create a new meetings API interface
    pub(crate) fn new(client: AdminClient) -> Self {
        Self { client }
    }

    /// List every meeting
    ///
    /// GET /api/reunioes
    #[instrument(skip(self))]
    pub async fn list(&self) -> ApiResult<Vec<Reuniao>> {
        let body: Value = self.client.get("/api/reunioes").await?;
        envelope(body, "reunioes")
    }

    /// Get one meeting
    ///
    /// GET /api/reunioes/{id}
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ApiResult<Reuniao> {
        let body: Value = self.client.get(&format!("/api/reunioes/{id}")).await?;
        envelope(body, "reuniao")
    }

    /// Schedule a meeting
    ///
    /// POST /api/reunioes
    #[instrument(skip(self, draft), fields(titulo = %draft.titulo))]
    pub async fn create(&self, draft: &ReuniaoDraft) -> ApiResult<Reuniao> {
        check(draft.validate())?;
        let body: Value = self.client.post("/api/reunioes", draft).await?;
        record(body, "reuniao")
    }

    /// Replace a meeting's fields
    ///
    /// PATCH /api/reunioes/{id}
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: i64, update: &ReuniaoDraft) -> ApiResult<Reuniao> {
        check(update.validate())?;
        let body: Value = self
            .client
            .patch(&format!("/api/reunioes/{id}"), update)
            .await?;
        record(body, "reuniao")
    }

    /// Fetch the meeting, fill blanks in `edit` from it, and send the result
    pub async fn edit(&self, id: i64, edit: &ReuniaoEdit) -> ApiResult<Reuniao> {
        let current = self.get(id).await?;
        self.update(id, &edit.resolve(&current)).await
    }

    /// Cancel a meeting
    ///
    /// DELETE /api/reunioes/{id}
    #[instrument(skip(self))]
    pub async fn remove(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&format!("/api/reunioes/{id}")).await
    }
}

impl_listing!(ReunioesApi, Reuniao);

/// Meeting form, used for both creation and updates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReuniaoDraft {
    /// Title
    pub titulo: String,
    /// Agenda
    pub pauta: String,
    /// Date
    pub data: String,
    /// Kind, e.g. `ordinaria`
    pub tipo: String,
    /// Status label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Attendees
    pub participantes: Vec<Participante>,
    /// Association holding the meeting
    pub associacao_id: Option<i64>,
    /// Organization holding the meeting
    pub organizacao_id: Option<i64>,
}

impl ReuniaoDraft {
    /// Check that the form is complete
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        Validator::new()
            .required("titulo", &self.titulo)
            .required("pauta", &self.pauta)
            .required("data", &self.data)
            .custom("data", || {
                let data = self.data.trim();
                (!data.is_empty() && parse_date(data).is_err())
                    .then(|| "Must be a date like 25/03/2019".to_string())
            })
            .required("tipo", &self.tipo)
            .custom("associacao_id", || {
                (self.associacao_id.is_none() && self.organizacao_id.is_none())
                    .then(|| "An association or an organization is required".to_string())
            })
            .validate()
    }
}

/// Meeting edit form
#[derive(Debug, Clone, Default)]
pub struct ReuniaoEdit {
    /// New title
    pub titulo: Option<String>,
    /// New agenda
    pub pauta: Option<String>,
    /// New date
    pub data: Option<String>,
    /// New kind
    pub tipo: Option<String>,
    /// New status
    pub status: Option<String>,
    /// New attendee list
    pub participantes: Option<Vec<i64>>,
}

impl ReuniaoEdit {
    /// Merge the form with the stored meeting
    #[must_use]
    pub fn resolve(&self, current: &Reuniao) -> ReuniaoDraft {
        ReuniaoDraft {
            titulo: pick(self.titulo.as_ref(), &current.titulo),
            pauta: pick(self.pauta.as_ref(), &current.pauta),
            data: pick(self.data.as_ref(), &current.data),
            tipo: pick(self.tipo.as_ref(), &current.tipo),
            status: pick_opt(self.status.as_ref(), current.status.as_deref()),
            participantes: match &self.participantes {
                Some(ids) if !ids.is_empty() => {
                    ids.iter().map(|&id| Participante { id }).collect()
                }
                _ => current.participantes.clone(),
            },
            associacao_id: current.associacao_id,
            organizacao_id: current.organizacao_id,
        }
    }
}
