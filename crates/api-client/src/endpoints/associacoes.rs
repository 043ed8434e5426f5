//! Association endpoints

use crate::client::AdminClient;
use crate::endpoints::{check, envelope, pick, pick_opt, record};
use crate::error::ApiResult;
use crate::models::Associacao;
use comercio_core::schedule::parse_date;
use comercio_core::validation::{ValidationResult, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

/// Associations API interface
#[derive(Clone)]
pub struct AssociacoesApi {
    client: AdminClient,
}

impl AssociacoesApi {
    /// Create a new associations API interface
    pub(crate) fn new(client: AdminClient) -> Self {
        Self { client }
    }

    /// List every association
    ///
    /// GET /api/associacoes
    #[instrument(skip(self))]
    pub async fn list(&self) -> ApiResult<Vec<Associacao>> {
        let body: Value = self.client.get("/api/associacoes").await?;
        envelope(body, "associacoes")
    }

    /// Get one association
    ///
    /// GET /api/associacoes/{id}
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ApiResult<Associacao> {
        let body: Value = self
            .client
            .get(&format!("/api/associacoes/{id}"))
            .await?;
        envelope(body, "associacao")
    }

    /// Create an association
    ///
    /// POST /api/associacoes
    #[instrument(skip(self, draft), fields(nome = %draft.nome))]
    pub async fn create(&self, draft: &AssociacaoDraft) -> ApiResult<Associacao> {
        let body = draft.normalized()?;
        let body: Value = self.client.post("/api/associacoes", &body).await?;
        record(body, "associacao")
    }

    /// Replace an association's fields
    ///
    /// PATCH /api/associacoes/{id}
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: i64, update: &AssociacaoDraft) -> ApiResult<Associacao> {
        let body = update.normalized()?;
        let body: Value = self
            .client
            .patch(&format!("/api/associacoes/{id}"), &body)
            .await?;
        record(body, "associacao")
    }

    /// Fetch the association, fill blanks in `edit` from it, and send the result
    pub async fn edit(&self, id: i64, edit: &AssociacaoEdit) -> ApiResult<Associacao> {
        let current = self.get(id).await?;
        self.update(id, &edit.resolve(&current)).await
    }

    /// Delete an association
    ///
    /// DELETE /api/associacoes/{id}
    #[instrument(skip(self))]
    pub async fn remove(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&format!("/api/associacoes/{id}")).await
    }
}

impl_listing!(AssociacoesApi, Associacao);

/// Association form, used for both creation and updates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociacaoDraft {
    /// Name
    pub nome: String,
    /// Contact e-mail
    pub email: String,
    /// Contact phone
    pub telefone: String,
    /// Foundation date, `dd/mm/yyyy` or ISO
    pub data_fundacao: String,
    /// Street
    pub rua: String,
    /// Number
    pub numero: String,
    /// Postal code
    pub cep: String,
    /// Neighborhood
    pub bairro_id: Option<i64>,
    /// Presidents' user ids
    pub presidentes_id: Vec<i64>,
    /// Secretaries' user ids
    #[serde(default)]
    pub secretarios_id: Vec<i64>,
}

impl AssociacaoDraft {
    /// Check that the form is complete
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        Validator::new()
            .required("nome", &self.nome)
            .required("email", &self.email)
            .email("email", &self.email)
            .required("data_fundacao", &self.data_fundacao)
            .custom("data_fundacao", || {
                let date = self.data_fundacao.trim();
                (!date.is_empty() && parse_date(date).is_err())
                    .then(|| "Must be a date like 25/03/2019".to_string())
            })
            .cep("cep", &self.cep)
            .required_id("bairro_id", self.bairro_id)
            .custom("presidentes_id", || {
                self.presidentes_id
                    .is_empty()
                    .then(|| "At least one president is required".to_string())
            })
            .validate()
    }

    /// Validated copy with the foundation date in ISO form
    pub fn normalized(&self) -> ApiResult<Self> {
        check(self.validate())?;
        let mut body = self.clone();
        body.data_fundacao = parse_date(&self.data_fundacao)?
            .format("%Y-%m-%d")
            .to_string();
        Ok(body)
    }
}

/// Association edit form
#[derive(Debug, Clone, Default)]
pub struct AssociacaoEdit {
    /// New name
    pub nome: Option<String>,
    /// New e-mail
    pub email: Option<String>,
    /// New phone
    pub telefone: Option<String>,
    /// New foundation date
    pub data_fundacao: Option<String>,
    /// New street
    pub rua: Option<String>,
    /// New number
    pub numero: Option<String>,
    /// New postal code
    pub cep: Option<String>,
    /// New neighborhood
    pub bairro_id: Option<i64>,
    /// New presidents
    pub presidentes_id: Option<Vec<i64>>,
    /// New secretaries
    pub secretarios_id: Option<Vec<i64>>,
}

impl AssociacaoEdit {
    /// Merge the form with the stored association
    #[must_use]
    pub fn resolve(&self, current: &Associacao) -> AssociacaoDraft {
        let address = current.endereco.as_ref();
        let stored_presidents = if current.presidentes_id.is_empty() {
            current.presidentes.iter().map(|p| p.id).collect()
        } else {
            current.presidentes_id.clone()
        };

        AssociacaoDraft {
            nome: pick(self.nome.as_ref(), &current.nome),
            email: pick(self.email.as_ref(), current.email().unwrap_or_default()),
            telefone: pick(self.telefone.as_ref(), current.telefone().unwrap_or_default()),
            data_fundacao: pick(
                self.data_fundacao.as_ref(),
                current.data_fundacao.as_deref().unwrap_or_default(),
            ),
            rua: pick_opt(self.rua.as_ref(), address.map(|a| a.rua.as_str())).unwrap_or_default(),
            numero: pick_opt(self.numero.as_ref(), address.map(|a| a.numero.as_str()))
                .unwrap_or_default(),
            cep: pick_opt(self.cep.as_ref(), address.map(|a| a.cep.as_str())).unwrap_or_default(),
            bairro_id: self.bairro_id.or(current.bairro_id()),
            presidentes_id: non_empty_or(self.presidentes_id.as_ref(), stored_presidents),
            secretarios_id: non_empty_or(
                self.secretarios_id.as_ref(),
                current.secretarios_id.clone(),
            ),
        }
    }
}

fn non_empty_or(input: Option<&Vec<i64>>, current: Vec<i64>) -> Vec<i64> {
    match input {
        Some(ids) if !ids.is_empty() => ids.clone(),
        _ => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contato, Endereco, Presidente};

    fn draft() -> AssociacaoDraft {
        AssociacaoDraft {
            nome: "Associação Rural".into(),
            email: "assoc@example.com".into(),
            telefone: "(87) 99999-0000".into(),
            data_fundacao: "25/03/2019".into(),
            cep: "55290-000".into(),
            bairro_id: Some(2),
            presidentes_id: vec![9],
            ..AssociacaoDraft::default()
        }
    }

    #[test]
    fn test_normalized_converts_date() {
        assert_eq!(draft().normalized().unwrap().data_fundacao, "2019-03-25");
    }

    #[test]
    fn test_bad_date_is_a_field_error() {
        let d = AssociacaoDraft {
            data_fundacao: "ontem".into(),
            ..draft()
        };
        let err = d.normalized().unwrap_err();
        assert_eq!(err.field_messages()[0].0, "data_fundacao");
    }

    #[test]
    fn test_resolve_uses_nested_blocks() {
        let current = Associacao {
            id: Some(1),
            nome: "Associação Rural".into(),
            data_fundacao: Some("2019-03-25".into()),
            presidentes: vec![Presidente {
                id: 9,
                ..Presidente::default()
            }],
            contato: Some(Contato {
                email: "assoc@example.com".into(),
                telefone: "87999990000".into(),
            }),
            endereco: Some(Endereco {
                rua: "Rua B".into(),
                numero: "20".into(),
                cep: "55290000".into(),
                bairro_id: Some(4),
                ..Endereco::default()
            }),
            ..Associacao::default()
        };

        let update = AssociacaoEdit {
            telefone: Some("87988887777".into()),
            ..AssociacaoEdit::default()
        }
        .resolve(&current);

        assert_eq!(update.email, "assoc@example.com");
        assert_eq!(update.telefone, "87988887777");
        assert_eq!(update.rua, "Rua B");
        assert_eq!(update.bairro_id, Some(4));
        assert_eq!(update.presidentes_id, vec![9]);
        assert!(update.validate().is_valid());
    }
}
