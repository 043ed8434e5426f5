//! Endpoint-specific API implementations
//!
//! Each module provides a typed interface for one resource of the backend.
//! Responses arrive wrapped in an envelope named after the resource; the
//! modules unwrap it so callers get records.
//!
//! | Module | Path | Envelope |
//! |--------|------|----------|
//! | `auth` | `/api/sanctum/token`, `/api/forgot-password`, `/api/reset-password` | - |
//! | `users` | `/api/users`, `/api/roles` | `users` / `user` |
//! | `associacoes` | `/api/associacoes` | `associacoes` / `associacao` |
//! | `bairros` | `/api/bairros` | `bairros` / `bairro` |
//! | `cidades` | `/api/cidades` | `cidades` / `cidade` |
//! | `estados` | `/api/estados` | `estados` |
//! | `feiras` | `/api/feiras` | `feiras` / `feira` |
//! | `bancas` | `/api/bancas` | `bancas` / `banca` |
//! | `ocs` | `/api/ocs`, `/api/agricultores` | `ocs` |
//! | `reunioes` | `/api/reunioes` | `reunioes` / `reuniao` |
//! | `cep` | postal-code service | - |

use crate::error::{ApiError, ApiResult};
use comercio_core::validation::ValidationResult;
use serde::de::DeserializeOwned;
use serde_json::Value;

macro_rules! impl_listing {
    ($api:ty, $item:ty) => {
        impl $crate::endpoints::Listing for $api {
            type Item = $item;

            async fn list(&self) -> $crate::error::ApiResult<Vec<$item>> {
                <$api>::list(self).await
            }

            async fn remove(&self, id: i64) -> $crate::error::ApiResult<()> {
                <$api>::remove(self, id).await
            }
        }
    };
}

pub mod associacoes;
pub mod auth;
pub mod bairros;
pub mod bancas;
pub mod cep;
pub mod cidades;
pub mod estados;
pub mod feiras;
pub mod ocs;
pub mod reunioes;
pub mod users;

pub use associacoes::AssociacoesApi;
pub use auth::AuthApi;
pub use bairros::BairrosApi;
pub use bancas::BancasApi;
pub use cep::CepApi;
pub use cidades::CidadesApi;
pub use estados::EstadosApi;
pub use feiras::FeirasApi;
pub use ocs::OcsApi;
pub use reunioes::ReunioesApi;
pub use users::UsersApi;

/// A collection that can be listed and have rows deleted
#[allow(async_fn_in_trait)]
pub trait Listing {
    /// Row type
    type Item;

    /// Fetch every row
    async fn list(&self) -> ApiResult<Vec<Self::Item>>;

    /// Delete one row
    async fn remove(&self, id: i64) -> ApiResult<()>;
}

/// Delete a row, then fetch the list again
///
/// Exactly one DELETE is issued. The list is only refetched when the delete
/// succeeded; a failed delete returns its error and leaves the caller's list
/// as it was.
pub async fn delete_and_refresh<L: Listing>(api: &L, id: i64) -> ApiResult<Vec<L::Item>> {
    api.remove(id).await?;
    api.list().await
}

/// Take `key` out of a response envelope
pub(crate) fn envelope<T: DeserializeOwned>(body: Value, key: &'static str) -> ApiResult<T> {
    envelope_any(body, &[key])
}

/// Take the first of `keys` present in a response envelope
pub(crate) fn envelope_any<T: DeserializeOwned>(
    mut body: Value,
    keys: &[&'static str],
) -> ApiResult<T> {
    for key in keys {
        if let Some(field) = body.get_mut(*key) {
            return Ok(serde_json::from_value(field.take())?);
        }
    }
    let missing = keys.first().copied().unwrap_or("data");
    Err(<serde_json::Error as serde::de::Error>::missing_field(missing).into())
}

/// Record from a create/update response, wrapped or not
pub(crate) fn record<T: DeserializeOwned>(mut body: Value, key: &'static str) -> ApiResult<T> {
    match body.get_mut(key) {
        Some(field) if field.is_object() => Ok(serde_json::from_value(field.take())?),
        _ => Ok(serde_json::from_value(body)?),
    }
}

/// Confirmation text of an action endpoint
pub(crate) fn acknowledgement(body: &Value) -> String {
    ["message", "status"]
        .iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str))
        .unwrap_or("OK")
        .to_string()
}

/// Turn failed form validation into an error
pub(crate) fn check(result: ValidationResult) -> ApiResult<()> {
    if result.is_valid() {
        Ok(())
    } else {
        Err(ApiError::InvalidInput(result.into_errors()))
    }
}

/// Edited text, or the fetched value when the input was left blank
pub(crate) fn pick(input: Option<&String>, current: &str) -> String {
    match input.map(|s| s.trim()) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => current.to_string(),
    }
}

/// Optional variant of [`pick`]
pub(crate) fn pick_opt(input: Option<&String>, current: Option<&str>) -> Option<String> {
    match input.map(|s| s.trim()) {
        Some(value) if !value.is_empty() => Some(value.to_string()),
        _ => current.map(str::to_string),
    }
}

/// Whether two e-mails name the same mailbox
pub(crate) fn same_email(a: &str, b: &str) -> bool {
    let a = a.trim();
    !a.is_empty() && a.eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_unwraps_key() {
        let names: Vec<String> = envelope(json!({"bairros": ["Centro", "Boa Vista"]}), "bairros").unwrap();
        assert_eq!(names, vec!["Centro", "Boa Vista"]);
    }

    #[test]
    fn test_envelope_missing_key() {
        let err = envelope::<Vec<String>>(json!({"data": []}), "bairros").unwrap_err();
        assert!(matches!(err, ApiError::Json(_)));
    }

    #[test]
    fn test_envelope_any_alias() {
        let ids: Vec<i64> = envelope_any(json!({"data": [1, 2]}), &["users", "data"]).unwrap();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_record_wrapped_or_bare() {
        let wrapped: Value = record(json!({"bairro": {"id": 1}}), "bairro").unwrap();
        assert_eq!(wrapped, json!({"id": 1}));
        let bare: Value = record(json!({"id": 2}), "bairro").unwrap();
        assert_eq!(bare, json!({"id": 2}));
    }

    #[test]
    fn test_pick_falls_back_on_blank_input() {
        let current = "Centro";
        assert_eq!(pick(None, current), "Centro");
        assert_eq!(pick(Some(&"   ".to_string()), current), "Centro");
        assert_eq!(pick(Some(&" Boa Vista ".to_string()), current), "Boa Vista");
        assert_eq!(pick_opt(Some(&String::new()), None), None);
        assert_eq!(pick_opt(None, Some("x")), Some("x".to_string()));
    }

    #[test]
    fn test_acknowledgement() {
        assert_eq!(acknowledgement(&json!({"status": "We have emailed your password reset link."})),
            "We have emailed your password reset link.");
        assert_eq!(acknowledgement(&Value::Null), "OK");
    }
}
