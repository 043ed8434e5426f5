//! Social control organization (OCS) endpoints
//!
//! Creation checks, in order: the e-mail is present and well formed, the
//! CNPJ checksum holds, no organization uses the e-mail, no organization
//! uses the CNPJ. The first failure is returned as a [`Rejection`] and
//! nothing is created.

use crate::client::AdminClient;
use crate::endpoints::{check, envelope, pick, pick_opt, record, same_email};
use crate::error::{ApiError, ApiResult, Rejection};
use crate::models::{Ocs, User};
use comercio_core::documents::{is_valid_cnpj, only_digits};
use comercio_core::validation::{ValidationResult, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Organizations API interface
#[derive(Clone)]
pub struct OcsApi {
    client: AdminClient,
}

impl OcsApi {
    /// Create a new organizations API interface
    pub(crate) fn new(client: AdminClient) -> Self {
        Self { client }
    }

    /// List every organization
    ///
    /// GET /api/ocs
    #[instrument(skip(self))]
    pub async fn list(&self) -> ApiResult<Vec<Ocs>> {
        let body: Value = self.client.get("/api/ocs").await?;
        envelope(body, "ocs")
    }

    /// Get one organization
    ///
    /// GET /api/ocs/{id}
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ApiResult<Ocs> {
        let body: Value = self.client.get(&format!("/api/ocs/{id}")).await?;
        envelope(body, "ocs")
    }

    /// Members of one organization
    ///
    /// GET /api/ocs/participantes/{id}
    #[instrument(skip(self))]
    pub async fn participantes(&self, id: i64) -> ApiResult<Vec<User>> {
        let body: Value = self
            .client
            .get(&format!("/api/ocs/participantes/{id}"))
            .await?;
        envelope(body, "users")
    }

    /// Create an organization after local and duplicate checks
    ///
    /// POST /api/ocs
    #[instrument(skip(self, draft), fields(nome = %draft.nome))]
    pub async fn create(&self, draft: &OcsDraft) -> ApiResult<Ocs> {
        check(draft.validate())?;

        if draft.email.trim().is_empty()
            || !Validator::new().email("email", &draft.email).validate().is_valid()
        {
            return Err(rejected(Rejection::InvalidEmail));
        }
        if !is_valid_cnpj(&draft.cnpj) {
            return Err(rejected(Rejection::InvalidCnpj));
        }

        let existing = self.list().await?;
        if existing.iter().any(|o| same_email(o.email().unwrap_or_default(), &draft.email)) {
            return Err(rejected(Rejection::EmailTaken));
        }
        if existing.iter().any(|o| same_cnpj(&o.cnpj, &draft.cnpj)) {
            return Err(rejected(Rejection::CnpjTaken));
        }

        let body: Value = self.client.post("/api/ocs", draft).await?;
        record(body, "ocs")
    }

    /// Replace an organization's fields
    ///
    /// PATCH /api/ocs/{id}
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: i64, update: &OcsDraft) -> ApiResult<Ocs> {
        check(update.validate())?;
        check(Validator::new().cnpj("cnpj", &update.cnpj).validate())?;
        let body: Value = self
            .client
            .patch(&format!("/api/ocs/{id}"), update)
            .await?;
        record(body, "ocs")
    }

    /// Fetch the organization, fill blanks in `edit` from it, and send the result
    pub async fn edit(&self, id: i64, edit: &OcsEdit) -> ApiResult<Ocs> {
        let current = self.get(id).await?;
        self.update(id, &edit.resolve(&current)).await
    }

    /// Delete an organization
    ///
    /// DELETE /api/ocs/{id}
    #[instrument(skip(self))]
    pub async fn remove(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&format!("/api/ocs/{id}")).await
    }

    /// Attach a farmer to an organization
    ///
    /// PUT /api/agricultores/vincular/{user}
    #[instrument(skip(self))]
    pub async fn link_agricultor(&self, user_id: i64, organizacao_id: i64) -> ApiResult<()> {
        let _: Value = self
            .client
            .put(
                &format!("/api/agricultores/vincular/{user_id}"),
                &serde_json::json!({ "organizacao_id": organizacao_id }),
            )
            .await?;
        info!(user_id, organizacao_id, "Farmer linked");
        Ok(())
    }

    /// Detach a farmer from its organization
    ///
    /// DELETE /api/agricultores/desvincular/{user}
    #[instrument(skip(self))]
    pub async fn unlink_agricultor(&self, user_id: i64) -> ApiResult<()> {
        self.client
            .delete(&format!("/api/agricultores/desvincular/{user_id}"))
            .await?;
        info!(user_id, "Farmer unlinked");
        Ok(())
    }

    /// Whether any organization already uses this e-mail
    pub async fn email_exists(&self, email: &str) -> ApiResult<bool> {
        let existing = self.list().await?;
        Ok(existing
            .iter()
            .any(|o| same_email(o.email().unwrap_or_default(), email)))
    }

    /// Whether any organization already uses this CNPJ (punctuation ignored)
    pub async fn cnpj_exists(&self, cnpj: &str) -> ApiResult<bool> {
        let existing = self.list().await?;
        Ok(existing.iter().any(|o| same_cnpj(&o.cnpj, cnpj)))
    }
}

impl_listing!(OcsApi, Ocs);

fn rejected(rejection: Rejection) -> ApiError {
    warn!(rejection = ?rejection, "Organization creation refused");
    ApiError::Rejected(rejection)
}

fn same_cnpj(stored: &str, cnpj: &str) -> bool {
    let wanted = only_digits(cnpj);
    !wanted.is_empty() && only_digits(stored) == wanted
}

fn filled<'a>(own: Option<&'a str>, nested: Option<&'a str>) -> &'a str {
    own.filter(|v| !v.is_empty())
        .or(nested)
        .unwrap_or_default()
}

/// Organization form, used for both creation and updates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcsDraft {
    /// Name
    pub nome: String,
    /// CNPJ, with or without punctuation
    pub cnpj: String,
    /// Contact e-mail
    pub email: String,
    /// Contact phone
    pub telefone: String,
    /// Street
    pub rua: String,
    /// Number
    pub numero: String,
    /// Postal code
    pub cep: String,
    /// Address complement
    #[serde(default)]
    pub complemento: Option<String>,
    /// Neighborhood
    pub bairro_id: Option<i64>,
    /// Parent association
    pub associacao_id: Option<i64>,
    /// Member farmers
    #[serde(default)]
    pub agricultores_id: Vec<i64>,
}

impl OcsDraft {
    /// Check that the form is complete
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        Validator::new()
            .required("nome", &self.nome)
            .required("cnpj", &self.cnpj)
            .cep("cep", &self.cep)
            .required_id("associacao_id", self.associacao_id)
            .validate()
    }
}

/// Organization edit form
#[derive(Debug, Clone, Default)]
pub struct OcsEdit {
    /// New name
    pub nome: Option<String>,
    /// New CNPJ
    pub cnpj: Option<String>,
    /// New e-mail
    pub email: Option<String>,
    /// New phone
    pub telefone: Option<String>,
    /// New street
    pub rua: Option<String>,
    /// New number
    pub numero: Option<String>,
    /// New postal code
    pub cep: Option<String>,
    /// New complement
    pub complemento: Option<String>,
    /// New neighborhood
    pub bairro_id: Option<i64>,
    /// New association
    pub associacao_id: Option<i64>,
    /// New member list
    pub agricultores_id: Option<Vec<i64>>,
}

impl OcsEdit {
    /// Merge the form with the stored organization
    #[must_use]
    pub fn resolve(&self, current: &Ocs) -> OcsDraft {
        let address = current.endereco.as_ref();

        OcsDraft {
            nome: pick(self.nome.as_ref(), &current.nome),
            cnpj: pick(self.cnpj.as_ref(), &current.cnpj),
            email: pick(self.email.as_ref(), current.email().unwrap_or_default()),
            telefone: pick(self.telefone.as_ref(), current.telefone().unwrap_or_default()),
            rua: pick(
                self.rua.as_ref(),
                filled(current.rua.as_deref(), address.map(|a| a.rua.as_str())),
            ),
            numero: pick(
                self.numero.as_ref(),
                filled(current.numero.as_deref(), address.map(|a| a.numero.as_str())),
            ),
            cep: pick(
                self.cep.as_ref(),
                filled(current.cep.as_deref(), address.map(|a| a.cep.as_str())),
            ),
            complemento: pick_opt(
                self.complemento.as_ref(),
                current
                    .complemento
                    .as_deref()
                    .or(address.and_then(|a| a.complemento.as_deref())),
            ),
            bairro_id: self
                .bairro_id
                .or(current.bairro_id)
                .or(address.and_then(|a| a.bairro_id)),
            associacao_id: self.associacao_id.or(current.associacao_id),
            agricultores_id: match &self.agricultores_id {
                Some(ids) if !ids.is_empty() => ids.clone(),
                _ => current.agricultores_id.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contato, Endereco};

    #[test]
    fn test_same_cnpj_ignores_punctuation() {
        assert!(same_cnpj("11222333000181", "11.222.333/0001-81"));
        assert!(!same_cnpj("11222333000181", ""));
    }

    #[test]
    fn test_draft_requires_association() {
        let draft = OcsDraft {
            nome: "OCS Serra".into(),
            cnpj: "11222333000181".into(),
            ..OcsDraft::default()
        };
        assert_eq!(draft.validate().first().unwrap().field, "associacao_id");
    }

    #[test]
    fn test_resolve_reads_nested_blocks() {
        let current = Ocs {
            id: Some(2),
            nome: "OCS Serra".into(),
            cnpj: "11222333000181".into(),
            associacao_id: Some(1),
            agricultores_id: vec![3, 4],
            contato: Some(Contato {
                email: "ocs@example.com".into(),
                telefone: "87999990000".into(),
            }),
            endereco: Some(Endereco {
                rua: "Rua C".into(),
                numero: "5".into(),
                cep: "55290000".into(),
                bairro_id: Some(6),
                ..Endereco::default()
            }),
            ..Ocs::default()
        };

        let update = OcsEdit {
            nome: Some("OCS Serra Verde".into()),
            ..OcsEdit::default()
        }
        .resolve(&current);

        assert_eq!(update.nome, "OCS Serra Verde");
        assert_eq!(update.email, "ocs@example.com");
        assert_eq!(update.rua, "Rua C");
        assert_eq!(update.bairro_id, Some(6));
        assert_eq!(update.agricultores_id, vec![3, 4]);
    }
}
