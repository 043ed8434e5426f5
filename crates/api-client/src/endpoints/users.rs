//! User endpoints
//!
//! Account creation screens the draft locally before anything is sent: the
//! form must be complete, the e-mail well formed and the CPF checksum valid.
//! Only then is the user list fetched to refuse an e-mail or CPF that is
//! already registered, and only then is the user created.

use crate::client::AdminClient;
use crate::endpoints::{check, envelope, envelope_any, pick, pick_opt, record, same_email};
use crate::error::{ApiError, ApiResult, Rejection};
use crate::models::{Presidente, User};
use comercio_core::documents::{is_valid_cpf, only_digits};
use comercio_core::guard::Role;
use comercio_core::session::RoleRef;
use comercio_core::validation::{ValidationResult, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{instrument, warn};

/// Users API interface
#[derive(Clone)]
pub struct UsersApi {
    client: AdminClient,
}

impl UsersApi {
    /// Create a new users API interface
    pub(crate) fn new(client: AdminClient) -> Self {
        Self { client }
    }

    /// List every user
    ///
    /// GET /api/users
    #[instrument(skip(self))]
    pub async fn list(&self) -> ApiResult<Vec<User>> {
        let body: Value = self.client.get("/api/users").await?;
        envelope(body, "users")
    }

    /// Get one user
    ///
    /// GET /api/users/{id}
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ApiResult<User> {
        let body: Value = self.client.get(&format!("/api/users/{id}")).await?;
        envelope(body, "user")
    }

    /// Create a user after local and duplicate checks
    ///
    /// POST /api/users
    #[instrument(skip(self, draft), fields(email = %draft.email))]
    pub async fn create(&self, draft: &UserDraft) -> ApiResult<User> {
        draft.screen()?;
        self.refuse_duplicates(draft).await?;
        let body: Value = self.client.post("/api/users", draft).await?;
        record(body, "user")
    }

    /// Self-registration as a farmer
    ///
    /// Without a session the duplicate checks cannot list users, so the
    /// backend's own uniqueness validation answers instead.
    #[instrument(skip(self, draft), fields(email = %draft.email))]
    pub async fn register(&self, draft: &UserDraft) -> ApiResult<User> {
        let draft = UserDraft {
            roles: vec![Role::Agricultor.id()],
            ..draft.clone()
        };

        if self.client.token().is_some() {
            return self.create(&draft).await;
        }

        draft.screen()?;
        let body: Value = self.client.post_public("/api/users", &draft).await?;
        record(body, "user")
    }

    /// Replace a user's fields
    ///
    /// PATCH /api/users/{id}
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: i64, update: &UserUpdate) -> ApiResult<User> {
        check(update.validate())?;
        let body: Value = self
            .client
            .patch(&format!("/api/users/{id}"), update)
            .await?;
        record(body, "user")
    }

    /// Fetch the user, fill blanks in `edit` from it, and send the result
    pub async fn edit(&self, id: i64, edit: &UserEdit) -> ApiResult<User> {
        let current = self.get(id).await?;
        self.update(id, &edit.resolve(&current)).await
    }

    /// Delete a user
    ///
    /// DELETE /api/users/{id}
    #[instrument(skip(self))]
    pub async fn remove(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&format!("/api/users/{id}")).await
    }

    /// Users eligible to preside an association
    ///
    /// GET /api/users/presidents
    #[instrument(skip(self))]
    pub async fn presidents(&self) -> ApiResult<Vec<Presidente>> {
        let body: Value = self.client.get("/api/users/presidents").await?;
        envelope_any(body, &["users", "data"])
    }

    /// Every role a user can be given
    ///
    /// GET /api/roles
    #[instrument(skip(self))]
    pub async fn roles(&self) -> ApiResult<Vec<RoleRef>> {
        let body: Value = self.client.get("/api/roles").await?;
        if body.is_array() {
            Ok(serde_json::from_value(body)?)
        } else {
            envelope(body, "roles")
        }
    }

    /// Whether any user already has this e-mail
    pub async fn email_exists(&self, email: &str) -> ApiResult<bool> {
        let users = self.list().await?;
        Ok(users.iter().any(|u| same_email(u.email(), email)))
    }

    /// Whether any user already has this CPF (punctuation ignored)
    pub async fn cpf_exists(&self, cpf: &str) -> ApiResult<bool> {
        let users = self.list().await?;
        Ok(users.iter().any(|u| same_cpf(u.cpf.as_deref(), cpf)))
    }

    async fn refuse_duplicates(&self, draft: &UserDraft) -> ApiResult<()> {
        let users = self.list().await?;
        let rejection = if users.iter().any(|u| same_email(u.email(), &draft.email)) {
            Some(Rejection::EmailTaken)
        } else if users.iter().any(|u| same_cpf(u.cpf.as_deref(), &draft.cpf)) {
            Some(Rejection::CpfTaken)
        } else {
            None
        };

        match rejection {
            Some(r) => {
                warn!(rejection = ?r, "User creation refused");
                Err(ApiError::Rejected(r))
            }
            None => Ok(()),
        }
    }
}

impl_listing!(UsersApi, User);

fn same_cpf(stored: Option<&str>, cpf: &str) -> bool {
    let wanted = only_digits(cpf);
    !wanted.is_empty() && stored.is_some_and(|s| only_digits(s) == wanted)
}

/// New user form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    /// Full name
    pub name: String,
    /// Login e-mail
    pub email: String,
    /// Initial password
    pub password: String,
    /// CPF, with or without punctuation
    pub cpf: String,
    /// Nickname
    #[serde(default)]
    pub apelido: Option<String>,
    /// Phone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefone: Option<String>,
    /// Street
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rua: Option<String>,
    /// House number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numero: Option<String>,
    /// Postal code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cep: Option<String>,
    /// Address complement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complemento: Option<String>,
    /// Neighborhood
    #[serde(default)]
    pub bairro_id: Option<i64>,
    /// Role ids
    #[serde(default)]
    pub roles: Vec<u32>,
}

impl UserDraft {
    /// Check that the form is complete
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        Validator::new()
            .required("name", &self.name)
            .required("email", &self.email)
            .required("password", &self.password)
            .min_length("password", &self.password, 8)
            .required("cpf", &self.cpf)
            .cep("cep", self.cep.as_deref().unwrap_or_default())
            .required_id("bairro_id", self.bairro_id)
            .custom("roles", || {
                self.roles
                    .is_empty()
                    .then(|| "At least one role is required".to_string())
            })
            .validate()
    }

    /// Every check that needs no network: completeness, e-mail shape, CPF
    pub fn screen(&self) -> ApiResult<()> {
        check(self.validate())?;

        let reject = |r: Rejection| {
            warn!(rejection = ?r, "User creation refused");
            Err(ApiError::Rejected(r))
        };
        if !Validator::new().email("email", &self.email).validate().is_valid() {
            return reject(Rejection::InvalidEmail);
        }
        if !is_valid_cpf(&self.cpf) {
            return reject(Rejection::InvalidCpf);
        }
        Ok(())
    }
}

/// User edit form; blank fields keep the stored value
#[derive(Debug, Clone, Default)]
pub struct UserEdit {
    /// Full name
    pub name: Option<String>,
    /// E-mail
    pub email: Option<String>,
    /// New password; left out of the update when blank
    pub password: Option<String>,
    /// Phone
    pub telefone: Option<String>,
    /// CPF
    pub cpf: Option<String>,
    /// Street
    pub rua: Option<String>,
    /// House number
    pub numero: Option<String>,
    /// Postal code
    pub cep: Option<String>,
    /// Neighborhood
    pub bairro_id: Option<i64>,
    /// Role ids
    pub roles: Option<Vec<u32>>,
}

impl UserEdit {
    /// Merge the form with the stored user
    #[must_use]
    pub fn resolve(&self, current: &User) -> UserUpdate {
        let address = current.endereco.as_ref();
        UserUpdate {
            name: pick(self.name.as_ref(), &current.name),
            email: pick(self.email.as_ref(), current.email()),
            password: pick_opt(self.password.as_ref(), None),
            telefone: pick_opt(self.telefone.as_ref(), current.telefone()),
            cpf: pick_opt(self.cpf.as_ref(), current.cpf.as_deref()),
            rua: pick_opt(
                self.rua.as_ref(),
                current.rua.as_deref().or(address.map(|a| a.rua.as_str())),
            ),
            numero: pick_opt(
                self.numero.as_ref(),
                current.numero.as_deref().or(address.map(|a| a.numero.as_str())),
            ),
            cep: pick_opt(
                self.cep.as_ref(),
                current.cep.as_deref().or(address.map(|a| a.cep.as_str())),
            ),
            bairro_id: self
                .bairro_id
                .or(current.bairro_id)
                .or(address.and_then(|a| a.bairro_id)),
            roles: match &self.roles {
                Some(roles) if !roles.is_empty() => roles.clone(),
                _ => current.roles.iter().map(|r| r.id).collect(),
            },
        }
    }
}

/// Body of a user update
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub telefone: Option<String>,
    pub cpf: Option<String>,
    pub rua: Option<String>,
    pub numero: Option<String>,
    pub cep: Option<String>,
    pub bairro_id: Option<i64>,
    pub roles: Vec<u32>,
}

impl UserUpdate {
    fn validate(&self) -> ValidationResult {
        let cpf = self.cpf.as_deref().unwrap_or_default();
        Validator::new()
            .required("name", &self.name)
            .required("email", &self.email)
            .email("email", &self.email)
            .cpf("cpf", cpf)
            .cep("cep", self.cep.as_deref().unwrap_or_default())
            .validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Endereco;

    fn draft() -> UserDraft {
        UserDraft {
            name: "Ana Souza".into(),
            email: "ana@example.com".into(),
            password: "segredo123".into(),
            cpf: "529.982.247-25".into(),
            bairro_id: Some(3),
            roles: vec![4],
            ..UserDraft::default()
        }
    }

    #[test]
    fn test_screen_accepts_valid_draft() {
        assert!(draft().screen().is_ok());
    }

    #[test]
    fn test_screen_rejects_bad_cpf() {
        let d = UserDraft {
            cpf: "529.982.247-26".into(),
            ..draft()
        };
        assert_eq!(d.screen().unwrap_err().rejection(), Some(Rejection::InvalidCpf));
    }

    #[test]
    fn test_screen_rejects_bad_email() {
        let d = UserDraft {
            email: "ana.example.com".into(),
            ..draft()
        };
        assert_eq!(d.screen().unwrap_err().rejection(), Some(Rejection::InvalidEmail));
    }

    #[test]
    fn test_incomplete_draft_lists_fields() {
        let err = UserDraft::default().screen().unwrap_err();
        let fields: Vec<String> = err.field_messages().into_iter().map(|(f, _)| f).collect();
        assert!(fields.contains(&"name".to_string()));
        assert!(fields.contains(&"bairro_id".to_string()));
        assert!(fields.contains(&"roles".to_string()));
    }

    #[test]
    fn test_same_cpf_ignores_punctuation() {
        assert!(same_cpf(Some("52998224725"), "529.982.247-25"));
        assert!(!same_cpf(None, "529.982.247-25"));
        assert!(!same_cpf(Some(""), ""));
    }

    #[test]
    fn test_edit_falls_back_to_stored_values() {
        let current = User {
            id: Some(7),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            cpf: Some("52998224725".into()),
            roles: vec![RoleRef::new(2, "presidente")],
            endereco: Some(Endereco {
                rua: "Rua A".into(),
                numero: "10".into(),
                cep: "55290000".into(),
                bairro_id: Some(4),
                ..Endereco::default()
            }),
            ..User::default()
        };
        let edit = UserEdit {
            name: Some("Ana Maria".into()),
            email: Some("  ".into()),
            ..UserEdit::default()
        };

        let update = edit.resolve(&current);
        assert_eq!(update.name, "Ana Maria");
        assert_eq!(update.email, "ana@example.com");
        assert_eq!(update.password, None);
        assert_eq!(update.rua.as_deref(), Some("Rua A"));
        assert_eq!(update.bairro_id, Some(4));
        assert_eq!(update.roles, vec![2]);

        let body = serde_json::to_value(&update).unwrap();
        assert!(body.get("password").is_none());
    }
}
