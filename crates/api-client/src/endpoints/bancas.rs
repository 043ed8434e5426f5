//! Vendor stall endpoints

use crate::client::AdminClient;
use crate::endpoints::{check, envelope, pick, pick_opt, record};
use crate::error::ApiResult;
use crate::models::{Agricultor, Banca};
use comercio_core::schedule::DayHours;
use comercio_core::validation::{ValidationResult, Validator};
use reqwest::multipart::Form;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

/// Stalls API interface
#[derive(Clone)]
pub struct BancasApi {
    client: AdminClient,
}

impl BancasApi {
    /// Create a new stalls API interface
    pub(crate) fn new(client: AdminClient) -> Self {
        Self { client }
    }

    /// List every stall
    ///
    /// GET /api/bancas
    #[instrument(skip(self))]
    pub async fn list(&self) -> ApiResult<Vec<Banca>> {
        let body: Value = self.client.get("/api/bancas").await?;
        envelope(body, "bancas")
    }

    /// Get one stall
    ///
    /// GET /api/bancas/{id}
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ApiResult<Banca> {
        let body: Value = self.client.get(&format!("/api/bancas/{id}")).await?;
        envelope(body, "banca")
    }

    /// Create a stall
    ///
    /// POST /api/bancas (multipart)
    #[instrument(skip(self, draft), fields(nome = %draft.nome))]
    pub async fn create(&self, draft: &BancaDraft) -> ApiResult<Banca> {
        check(draft.validate())?;
        let body: Value = self
            .client
            .post_multipart("/api/bancas", draft.to_form())
            .await?;
        record(body, "banca")
    }

    /// Replace a stall's fields
    ///
    /// PATCH /api/bancas/{id}
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: i64, update: &BancaDraft) -> ApiResult<Banca> {
        check(update.validate())?;
        let body: Value = self
            .client
            .patch(&format!("/api/bancas/{id}"), update)
            .await?;
        record(body, "banca")
    }

    /// Fetch the stall, fill blanks in `edit` from it, and send the result
    pub async fn edit(&self, id: i64, edit: &BancaEdit) -> ApiResult<Banca> {
        let current = self.get(id).await?;
        self.update(id, &edit.resolve(&current)).await
    }

    /// Delete a stall
    ///
    /// DELETE /api/bancas/{id}
    #[instrument(skip(self))]
    pub async fn remove(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&format!("/api/bancas/{id}")).await
    }

    /// Farmer who owns stalls
    ///
    /// GET /api/bancas/agricultores/{id}
    #[instrument(skip(self))]
    pub async fn agricultor(&self, id: i64) -> ApiResult<Agricultor> {
        let body: Value = self
            .client
            .get(&format!("/api/bancas/agricultores/{id}"))
            .await?;
        envelope(body, "agricultor")
    }
}

impl_listing!(BancasApi, Banca);

/// Stall form, used for both creation and updates
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BancaDraft {
    /// Name
    pub nome: String,
    /// Description
    pub descricao: String,
    /// Opening time, `HH:MM`
    pub horario_abertura: String,
    /// Closing time, `HH:MM`
    pub horario_fechamento: String,
    /// Minimum order value
    pub preco_minimo: f64,
    /// Whether the stall delivers
    pub entrega: bool,
    /// Fair the stall belongs to
    pub feira_id: Option<i64>,
    /// Owner
    pub agricultor_id: Option<i64>,
    /// PIX key for payments
    pub pix: Option<String>,
}

impl BancaDraft {
    /// Check that the form is complete and the hours make sense
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        Validator::new()
            .required("nome", &self.nome)
            .required("horario_abertura", &self.horario_abertura)
            .required("horario_fechamento", &self.horario_fechamento)
            .custom("horario_fechamento", || {
                if self.horario_abertura.is_empty() || self.horario_fechamento.is_empty() {
                    return None;
                }
                match DayHours::parse(&self.horario_abertura, &self.horario_fechamento) {
                    Ok(h) if h.closing <= h.opening => {
                        Some("Closing time must be after opening time".to_string())
                    }
                    Ok(_) => None,
                    Err(e) => Some(e.message),
                }
            })
            .custom("preco_minimo", || {
                (!self.preco_minimo.is_finite() || self.preco_minimo < 0.0)
                    .then(|| "Must be zero or more".to_string())
            })
            .required_id("feira_id", self.feira_id)
            .required_id("agricultor_id", self.agricultor_id)
            .validate()
    }

    fn to_form(&self) -> Form {
        let mut form = Form::new()
            .text("nome", self.nome.clone())
            .text("descricao", self.descricao.clone())
            .text("horario_abertura", self.horario_abertura.clone())
            .text("horario_fechamento", self.horario_fechamento.clone())
            .text("preco_minimo", format!("{:.2}", self.preco_minimo))
            // booleans travel as 1/0 so the backend's boolean rule accepts them
            .text("entrega", if self.entrega { "1" } else { "0" });
        if let Some(id) = self.feira_id {
            form = form.text("feira_id", id.to_string());
        }
        if let Some(id) = self.agricultor_id {
            form = form.text("agricultor_id", id.to_string());
        }
        if let Some(pix) = self.pix.as_ref().filter(|p| !p.trim().is_empty()) {
            form = form.text("pix", pix.trim().to_string());
        }
        form
    }
}

/// Stall edit form
#[derive(Debug, Clone, Default)]
pub struct BancaEdit {
    /// New name
    pub nome: Option<String>,
    /// New description
    pub descricao: Option<String>,
    /// New opening time
    pub horario_abertura: Option<String>,
    /// New closing time
    pub horario_fechamento: Option<String>,
    /// New minimum order value
    pub preco_minimo: Option<f64>,
    /// New delivery flag
    pub entrega: Option<bool>,
    /// New fair
    pub feira_id: Option<i64>,
    /// New owner
    pub agricultor_id: Option<i64>,
    /// New PIX key
    pub pix: Option<String>,
}

impl BancaEdit {
    /// Merge the form with the stored stall
    #[must_use]
    pub fn resolve(&self, current: &Banca) -> BancaDraft {
        BancaDraft {
            nome: pick(self.nome.as_ref(), &current.nome),
            descricao: pick(self.descricao.as_ref(), &current.descricao),
            horario_abertura: pick(self.horario_abertura.as_ref(), &current.horario_abertura),
            horario_fechamento: pick(
                self.horario_fechamento.as_ref(),
                &current.horario_fechamento,
            ),
            preco_minimo: self.preco_minimo.unwrap_or(current.preco_minimo),
            entrega: self.entrega.unwrap_or(current.entrega),
            feira_id: self.feira_id.or(current.feira_id),
            agricultor_id: self
                .agricultor_id
                .or(current.agricultor_id)
                .or(current.agricultor.as_ref().map(|a| a.id)),
            pix: pick_opt(self.pix.as_ref(), current.pix.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> BancaDraft {
        BancaDraft {
            nome: "Banca da Ana".into(),
            descricao: "Verduras".into(),
            horario_abertura: "07:00".into(),
            horario_fechamento: "12:00".into(),
            preco_minimo: 10.0,
            entrega: true,
            feira_id: Some(1),
            agricultor_id: Some(8),
            pix: Some("ana@example.com".into()),
        }
    }

    #[test]
    fn test_valid_draft() {
        assert!(draft().validate().is_valid());
    }

    #[test]
    fn test_closing_before_opening() {
        let d = BancaDraft {
            horario_fechamento: "06:00".into(),
            ..draft()
        };
        assert_eq!(d.validate().first().unwrap().field, "horario_fechamento");
    }

    #[test]
    fn test_negative_price() {
        let d = BancaDraft {
            preco_minimo: -1.0,
            ..draft()
        };
        assert_eq!(d.validate().first().unwrap().field, "preco_minimo");
    }

    #[test]
    fn test_resolve_falls_back() {
        let current = Banca {
            id: 3,
            nome: "Banca da Ana".into(),
            horario_abertura: "07:00".into(),
            horario_fechamento: "12:00".into(),
            preco_minimo: 10.0,
            entrega: true,
            feira_id: Some(1),
            agricultor: Some(Agricultor {
                id: 8,
                name: "Ana".into(),
            }),
            ..Banca::default()
        };
        let update = BancaEdit {
            entrega: Some(false),
            horario_fechamento: Some(String::new()),
            ..BancaEdit::default()
        }
        .resolve(&current);

        assert!(!update.entrega);
        assert_eq!(update.horario_fechamento, "12:00");
        assert_eq!(update.agricultor_id, Some(8));
        assert!((update.preco_minimo - 10.0).abs() < f64::EPSILON);
    }
}
