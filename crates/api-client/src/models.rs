//! Records returned by the API
//!
//! The backend is not strict about shapes: ids arrive as numbers or strings,
//! lists as `null`, decimals as strings and flags as `0`/`1`. The
//! deserializers in [`de`] absorb those differences so the rest of the crate
//! sees one shape per record.

#![allow(missing_docs)]

use comercio_core::schedule::OperatingHours;
use comercio_core::session::RoleRef;
use serde::{Deserialize, Serialize};

/// Lenient field deserializers
pub mod de {
    use comercio_core::guard::Role;
    use comercio_core::session::RoleRef;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    fn parse_id<E: serde::de::Error>(raw: RawId) -> Result<i64, E> {
        match raw {
            RawId::Number(n) => Ok(n),
            RawId::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid id {s:?}"))),
        }
    }

    /// Id given as a number or a numeric string
    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        parse_id(RawId::deserialize(d)?)
    }

    /// Optional id given as a number, a numeric string, `null` or `""`
    pub fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        match Option::<RawId>::deserialize(d)? {
            None => Ok(None),
            Some(RawId::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(raw) => parse_id(raw).map(Some),
        }
    }

    /// List of ids in either representation
    pub fn ids<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<i64>, D::Error> {
        Option::<Vec<RawId>>::deserialize(d)?
            .unwrap_or_default()
            .into_iter()
            .map(parse_id)
            .collect()
    }

    /// `null` reads as the type's default
    pub fn nullable<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
    }

    /// Decimal given as a number or a string
    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64().ok_or_else(|| D::Error::custom("number out of range")),
            Value::String(s) => s
                .trim()
                .replace(',', ".")
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid number {s:?}"))),
            Value::Null => Ok(0.0),
            other => Err(D::Error::custom(format!("expected a number, got {other}"))),
        }
    }

    /// Flag given as a bool, `0`/`1` or `"0"`/`"1"`/`"true"`/`"false"`
    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        match Value::deserialize(d)? {
            Value::Bool(b) => Ok(b),
            Value::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "1" | "true" | "sim" => Ok(true),
                "0" | "false" | "nao" | "não" | "" => Ok(false),
                _ => Err(D::Error::custom(format!("invalid flag {s:?}"))),
            },
            Value::Null => Ok(false),
            other => Err(D::Error::custom(format!("expected a flag, got {other}"))),
        }
    }

    /// Role list given as objects, bare ids, or role names
    pub fn roles<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<RoleRef>, D::Error> {
        let raw = Option::<Vec<Value>>::deserialize(d)?.unwrap_or_default();
        raw.into_iter()
            .map(|v| match v {
                Value::Object(_) => RoleRef::deserialize(v).map_err(D::Error::custom),
                Value::Number(n) => n
                    .as_u64()
                    .and_then(|id| u32::try_from(id).ok())
                    .map(|id| RoleRef::new(id, Role::from_id(id).to_string()))
                    .ok_or_else(|| D::Error::custom("invalid role id")),
                Value::String(s) => role_from_text(&s)
                    .ok_or_else(|| D::Error::custom(format!("unknown role {s:?}"))),
                other => Err(D::Error::custom(format!("unexpected role {other}"))),
            })
            .collect()
    }

    fn role_from_text(text: &str) -> Option<RoleRef> {
        if let Ok(id) = text.trim().parse::<u32>() {
            return Some(RoleRef::new(id, Role::from_id(id).to_string()));
        }
        (1..=5)
            .map(Role::from_id)
            .find(|r| r.to_string().eq_ignore_ascii_case(text.trim()))
            .map(|r| RoleRef::new(r.id(), r.to_string()))
    }
}

/// Contact block nested in users, associations and organizations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contato {
    #[serde(default, deserialize_with = "de::nullable")]
    pub email: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub telefone: String,
}

/// Street address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endereco {
    #[serde(default, deserialize_with = "de::nullable")]
    pub rua: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub numero: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub cep: String,
    #[serde(default)]
    pub complemento: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub bairro_id: Option<i64>,
    #[serde(default)]
    pub bairro: Option<Bairro>,
}

/// Neighborhood
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bairro {
    #[serde(deserialize_with = "de::id")]
    pub id: i64,
    pub nome: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub cidade_id: Option<i64>,
}

/// State
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estado {
    #[serde(deserialize_with = "de::id")]
    pub id: i64,
    pub nome: String,
    #[serde(default)]
    pub sigla: String,
}

/// City
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cidade {
    #[serde(default, deserialize_with = "de::opt_id")]
    pub id: Option<i64>,
    pub nome: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub estado_id: Option<i64>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub bairros: Vec<Bairro>,
    #[serde(default)]
    pub estado: Option<Estado>,
}

/// User account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, deserialize_with = "de::opt_id")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub email: String,
    #[serde(default)]
    pub apelido: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub rua: Option<String>,
    #[serde(default)]
    pub numero: Option<String>,
    #[serde(default)]
    pub cep: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub bairro_id: Option<i64>,
    #[serde(default, deserialize_with = "de::roles")]
    pub roles: Vec<RoleRef>,
    #[serde(default)]
    pub contato: Option<Contato>,
    #[serde(default)]
    pub endereco: Option<Endereco>,
}

impl User {
    /// E-mail, falling back to the contact block
    #[must_use]
    pub fn email(&self) -> &str {
        if self.email.is_empty() {
            self.contato.as_ref().map_or("", |c| c.email.as_str())
        } else {
            &self.email
        }
    }

    /// Phone, falling back to the contact block
    #[must_use]
    pub fn telefone(&self) -> Option<&str> {
        self.telefone
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.contato.as_ref().map(|c| c.telefone.as_str()))
            .filter(|t| !t.is_empty())
    }

    /// Comma-separated role names
    #[must_use]
    pub fn role_names(&self) -> String {
        self.roles
            .iter()
            .map(|r| {
                if r.nome.is_empty() {
                    r.role().to_string()
                } else {
                    r.nome.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// President of an association
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presidente {
    #[serde(deserialize_with = "de::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "de::nullable")]
    pub name: String,
    #[serde(default)]
    pub apelido: Option<String>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub email: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub cpf: String,
}

/// Association of producers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Associacao {
    #[serde(default, deserialize_with = "de::opt_id")]
    pub id: Option<i64>,
    pub nome: String,
    #[serde(default)]
    pub data_fundacao: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default, alias = "presidente", deserialize_with = "de::nullable")]
    pub presidentes: Vec<Presidente>,
    #[serde(default, deserialize_with = "de::ids")]
    pub presidentes_id: Vec<i64>,
    #[serde(default, deserialize_with = "de::ids")]
    pub secretarios_id: Vec<i64>,
    #[serde(default)]
    pub contato: Option<Contato>,
    #[serde(default)]
    pub endereco: Option<Endereco>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub bairro_id: Option<i64>,
}

impl Associacao {
    /// E-mail, falling back to the contact block
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .or_else(|| self.contato.as_ref().map(|c| c.email.as_str()))
            .filter(|e| !e.is_empty())
    }

    /// Phone, falling back to the contact block
    #[must_use]
    pub fn telefone(&self) -> Option<&str> {
        self.telefone
            .as_deref()
            .or_else(|| self.contato.as_ref().map(|c| c.telefone.as_str()))
            .filter(|t| !t.is_empty())
    }

    /// Neighborhood id, falling back to the address block
    #[must_use]
    pub fn bairro_id(&self) -> Option<i64> {
        self.bairro_id
            .or_else(|| self.endereco.as_ref().and_then(|e| e.bairro_id))
    }
}

/// Name-only reference to a parent record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default, deserialize_with = "de::nullable")]
    pub nome: String,
}

/// Social control organization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ocs {
    #[serde(default, deserialize_with = "de::opt_id")]
    pub id: Option<i64>,
    pub nome: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub cnpj: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    pub rua: Option<String>,
    #[serde(default)]
    pub numero: Option<String>,
    #[serde(default)]
    pub cep: Option<String>,
    #[serde(default)]
    pub complemento: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub bairro_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub associacao_id: Option<i64>,
    #[serde(default)]
    pub associacao: Option<NamedRef>,
    #[serde(default, deserialize_with = "de::ids")]
    pub agricultores_id: Vec<i64>,
    #[serde(default)]
    pub contato: Option<Contato>,
    #[serde(default)]
    pub endereco: Option<Endereco>,
}

impl Ocs {
    /// E-mail, preferring the contact block the backend fills in
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.contato
            .as_ref()
            .map(|c| c.email.as_str())
            .filter(|e| !e.is_empty())
            .or(self.email.as_deref())
            .filter(|e| !e.is_empty())
    }

    /// Phone, preferring the contact block
    #[must_use]
    pub fn telefone(&self) -> Option<&str> {
        self.contato
            .as_ref()
            .map(|c| c.telefone.as_str())
            .filter(|t| !t.is_empty())
            .or(self.telefone.as_deref())
            .filter(|t| !t.is_empty())
    }
}

/// Participant reference in a meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participante {
    #[serde(deserialize_with = "de::id")]
    pub id: i64,
}

/// Meeting of an association or organization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reuniao {
    #[serde(default, deserialize_with = "de::opt_id")]
    pub id: Option<i64>,
    pub titulo: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub pauta: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub data: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub tipo: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub ata: Vec<String>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub participantes: Vec<Participante>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub associacao_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub organizacao_id: Option<i64>,
}

/// Open-air fair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feira {
    #[serde(deserialize_with = "de::id")]
    pub id: i64,
    pub nome: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub descricao: String,
    #[serde(default)]
    pub localizacao: Option<String>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub horarios_funcionamento: OperatingHours,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub bairro_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub associacao_id: Option<i64>,
    #[serde(default)]
    pub imagem: Option<String>,
}

/// Farmer owning a stall
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agricultor {
    #[serde(deserialize_with = "de::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "de::nullable")]
    pub name: String,
}

/// Product sold at a stall
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Produto {
    #[serde(deserialize_with = "de::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "de::nullable")]
    pub nome: String,
}

/// Accepted payment method
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormaPagamento {
    #[serde(deserialize_with = "de::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "de::nullable")]
    pub nome: String,
}

/// Vendor stall inside a fair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banca {
    #[serde(deserialize_with = "de::id")]
    pub id: i64,
    pub nome: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub descricao: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub horario_abertura: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub horario_fechamento: String,
    #[serde(default, deserialize_with = "de::number")]
    pub preco_minimo: f64,
    #[serde(default, deserialize_with = "de::flag")]
    pub entrega: bool,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub feira_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub agricultor_id: Option<i64>,
    #[serde(default)]
    pub pix: Option<String>,
    #[serde(default)]
    pub feira: Option<Feira>,
    #[serde(default)]
    pub agricultor: Option<Agricultor>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub produtos: Vec<Produto>,
    #[serde(default, rename = "formasPagamento", alias = "formas_pagamento", deserialize_with = "de::nullable")]
    pub formas_pagamento: Vec<FormaPagamento>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub bairros_info_entrega: Vec<Bairro>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ids_as_strings() {
        let ocs: Ocs = serde_json::from_value(json!({
            "id": "7",
            "nome": "OCS Serra",
            "cnpj": "11222333000181",
            "associacao_id": 2,
            "agricultores_id": ["3", 4],
            "contato": {"email": "ocs@example.com", "telefone": null}
        }))
        .unwrap();

        assert_eq!(ocs.id, Some(7));
        assert_eq!(ocs.agricultores_id, vec![3, 4]);
        assert_eq!(ocs.email(), Some("ocs@example.com"));
        assert_eq!(ocs.telefone(), None);
    }

    #[test]
    fn test_user_roles_in_any_shape() {
        let user: User = serde_json::from_value(json!({
            "id": 3,
            "name": "Ana",
            "email": "ana@example.com",
            "roles": [{"id": 2, "nome": "presidente"}, 4, "consumidor"]
        }))
        .unwrap();

        let ids: Vec<u32> = user.roles.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 4, 5]);
        assert_eq!(user.role_names(), "presidente, agricultor, consumidor");
    }

    #[test]
    fn test_banca_lenient_fields() {
        let banca: Banca = serde_json::from_value(json!({
            "id": 1,
            "nome": "Banca da Ana",
            "preco_minimo": "12.50",
            "entrega": 1,
            "feira_id": 3,
            "produtos": null,
            "formasPagamento": [{"id": 1, "nome": "pix"}]
        }))
        .unwrap();

        assert!((banca.preco_minimo - 12.5).abs() < f64::EPSILON);
        assert!(banca.entrega);
        assert!(banca.produtos.is_empty());
        assert_eq!(banca.formas_pagamento.len(), 1);
    }

    #[test]
    fn test_feira_hours_and_null_schedule() {
        let feira: Feira = serde_json::from_value(json!({
            "id": 2,
            "nome": "Feira do Centro",
            "horarios_funcionamento": {"sábado": ["07:00", "13:00"]},
            "bairro_id": 1
        }))
        .unwrap();
        assert_eq!(feira.horarios_funcionamento.summary(), "sábado 07:00-13:00");

        let feira: Feira = serde_json::from_value(json!({
            "id": 2,
            "nome": "Feira do Centro",
            "horarios_funcionamento": null
        }))
        .unwrap();
        assert!(feira.horarios_funcionamento.is_empty());
    }

    #[test]
    fn test_feira_list_with_null_day() {
        let feiras: Vec<Feira> = serde_json::from_value(json!([
            {"id": 1, "nome": "Feira A", "horarios_funcionamento": {"sábado": ["07:00", "13:00"]}},
            {"id": 2, "nome": "Feira B", "horarios_funcionamento": {"domingo": null, "quarta-feira": ["06:00", "11:00"]}}
        ]))
        .unwrap();

        assert_eq!(feiras.len(), 2);
        let hours = &feiras[1].horarios_funcionamento;
        assert_eq!(hours.iter().count(), 1);
        assert_eq!(hours.unparsed().count(), 1);
    }

    #[test]
    fn test_associacao_presidente_alias() {
        let assoc: Associacao = serde_json::from_value(json!({
            "id": 1,
            "nome": "Associação Rural",
            "presidente": [{"id": "9", "name": "Rui", "email": "rui@example.com", "cpf": "52998224725"}],
            "endereco": {"rua": "A", "numero": "1", "cep": "55290000", "bairro_id": 4},
            "contato": {"email": "assoc@example.com", "telefone": "87999990000"}
        }))
        .unwrap();

        assert_eq!(assoc.presidentes[0].id, 9);
        assert_eq!(assoc.bairro_id(), Some(4));
        assert_eq!(assoc.email(), Some("assoc@example.com"));
    }
}
