//! Postal code lookup against the public ViaCEP service
//!
//! The lookup never carries the session token; it only needs the postal
//! code. Forms use the result to prefill the street and to preselect the
//! neighborhood with [`match_bairro`].

use crate::client::AdminClient;
use crate::endpoints::check;
use crate::error::{ApiError, ApiResult};
use crate::models::Bairro;
use comercio_core::documents::{format_cep, only_digits};
use comercio_core::validation::Validator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

/// Address returned for a postal code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Postal code as formatted by the service
    #[serde(default)]
    pub cep: String,
    /// Street
    #[serde(default)]
    pub logradouro: String,
    /// Complement
    #[serde(default)]
    pub complemento: String,
    /// Neighborhood name
    #[serde(default)]
    pub bairro: String,
    /// City name
    #[serde(default)]
    pub localidade: String,
    /// State abbreviation
    #[serde(default)]
    pub uf: String,
}

/// Postal code API interface
#[derive(Clone)]
pub struct CepApi {
    client: AdminClient,
}

impl CepApi {
    /// Create a new postal code API interface
    pub(crate) fn new(client: AdminClient) -> Self {
        Self { client }
    }

    /// Resolve a postal code to an address
    ///
    /// GET {cep_url}/{digits}/json/
    #[instrument(skip(self))]
    pub async fn lookup(&self, cep: &str) -> ApiResult<Address> {
        check(
            Validator::new()
                .required("cep", cep)
                .cep("cep", cep)
                .validate(),
        )?;
        let digits = only_digits(cep);
        let url = format!(
            "{}/{digits}/json/",
            self.client.config().cep_url.trim_end_matches('/')
        );

        let body: Value = self.client.get_external(&url).await?;
        if not_found(&body) {
            debug!(cep = %digits, "Unknown postal code");
            return Err(ApiError::NotFound {
                resource: format!("CEP {}", format_cep(&digits).unwrap_or(digits)),
            });
        }
        Ok(serde_json::from_value(body)?)
    }
}

fn not_found(body: &Value) -> bool {
    match body.get("erro") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Find the neighborhood whose name matches the address, ignoring case and
/// spacing
#[must_use]
pub fn match_bairro<'a>(address: &Address, bairros: &'a [Bairro]) -> Option<&'a Bairro> {
    let wanted = fold(&address.bairro);
    if wanted.is_empty() {
        return None;
    }
    bairros.iter().find(|b| fold(&b.nome) == wanted)
}

fn fold(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    fn bairros() -> Vec<Bairro> {
        vec![
            Bairro {
                id: 1,
                nome: "Centro".into(),
                cidade_id: Some(1),
            },
            Bairro {
                id: 2,
                nome: "Boa Vista".into(),
                cidade_id: Some(1),
            },
        ]
    }

    #[test]
    fn test_match_bairro_ignores_case_and_spacing() {
        let address = Address {
            bairro: "  boa   VISTA ".into(),
            ..Address::default()
        };
        let list = bairros();
        assert_eq!(match_bairro(&address, &list).map(|b| b.id), Some(2));
    }

    #[test]
    fn test_match_bairro_none() {
        let list = bairros();
        let unknown = Address {
            bairro: "Heliópolis".into(),
            ..Address::default()
        };
        assert!(match_bairro(&unknown, &list).is_none());
        assert!(match_bairro(&Address::default(), &list).is_none());
    }

    #[test]
    fn test_not_found_flag_forms() {
        assert!(not_found(&serde_json::json!({"erro": true})));
        assert!(not_found(&serde_json::json!({"erro": "true"})));
        assert!(!not_found(&serde_json::json!({"cep": "55290-000"})));
    }

    #[tokio::test]
    async fn test_malformed_cep_makes_no_request() {
        // nothing listens here; a request would surface as a transport error
        let config = ClientConfig::development().with_cep_url("http://127.0.0.1:9");
        let client = AdminClient::with_config(config).unwrap();

        let err = client.cep().lookup("1234").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert_eq!(err.field_messages()[0].0, "cep");
    }
}
