//! Route access decisions
//!
//! Every admin screen is a [`Route`]. Before a guarded route runs, the
//! current [`SessionState`] is checked by [`authorize`]:
//!
//! | Session | Roles | Result |
//! |---|---|---|
//! | absent or unreadable | - | redirect to `/` |
//! | active | includes agricultor (4) or consumidor (5) | redirect to `/default` |
//! | active | anything else | allow |
//!
//! Public routes (login, registration, password recovery, the default
//! landing page) are always allowed.

use crate::session::SessionState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role granted to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum Role {
    /// System administrator
    Administrador,
    /// Association president
    Presidente,
    /// Association secretary
    Secretario,
    /// Farmer selling at fairs
    Agricultor,
    /// Consumer
    Consumidor,
    /// A role this build does not know about
    Other(u32),
}

impl Role {
    /// Map an API role id
    #[must_use]
    pub fn from_id(id: u32) -> Self {
        match id {
            1 => Role::Administrador,
            2 => Role::Presidente,
            3 => Role::Secretario,
            4 => Role::Agricultor,
            5 => Role::Consumidor,
            other => Role::Other(other),
        }
    }

    /// API role id
    #[must_use]
    pub fn id(self) -> u32 {
        match self {
            Role::Administrador => 1,
            Role::Presidente => 2,
            Role::Secretario => 3,
            Role::Agricultor => 4,
            Role::Consumidor => 5,
            Role::Other(id) => id,
        }
    }

    /// Roles that may not use the admin screens
    #[must_use]
    pub fn is_restricted(self) -> bool {
        matches!(self, Role::Agricultor | Role::Consumidor)
    }
}

impl From<u32> for Role {
    fn from(id: u32) -> Self {
        Role::from_id(id)
    }
}

impl From<Role> for u32 {
    fn from(role: Role) -> Self {
        role.id()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Administrador => f.write_str("administrador"),
            Role::Presidente => f.write_str("presidente"),
            Role::Secretario => f.write_str("secretario"),
            Role::Agricultor => f.write_str("agricultor"),
            Role::Consumidor => f.write_str("consumidor"),
            Role::Other(id) => write!(f, "role#{id}"),
        }
    }
}

/// Record collections with their own screens
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Associacoes,
    Bairros,
    Bancas,
    Cidades,
    Estados,
    Feiras,
    Ocs,
    Reunioes,
    Usuarios,
}

impl Resource {
    /// Path segment of the collection
    #[must_use]
    pub fn segment(self) -> &'static str {
        match self {
            Resource::Associacoes => "associacoes",
            Resource::Bairros => "bairros",
            Resource::Bancas => "bancas",
            Resource::Cidades => "cidades",
            Resource::Estados => "estados",
            Resource::Feiras => "feiras",
            Resource::Ocs => "ocs",
            Resource::Reunioes => "reunioes",
            Resource::Usuarios => "usuarios",
        }
    }
}

/// Screen of the admin front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Login
    Root,
    /// Landing page for users without admin access
    Default,
    /// Self-registration
    Register,
    /// Password recovery
    RecoverPassword,
    /// Main menu
    Menu,
    /// Collection listing
    List(Resource),
    /// Creation form
    Create(Resource),
    /// Edit form for one record
    Edit(Resource, i64),
    /// Detail view of one record
    Detail(Resource, i64),
    /// Stalls of one fair
    FeiraBancas(i64),
    /// One stall inside one fair
    FeiraBanca(i64, i64),
    /// Neighborhoods of one city
    CidadeBairros(i64),
    /// Members of one organization
    OcsParticipantes(i64),
    /// Postal-code lookup helper
    CepLookup,
}

impl Route {
    /// Path of the screen
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Route::Root => "/".to_string(),
            Route::Default => "/default".to_string(),
            Route::Register => "/registrar".to_string(),
            Route::RecoverPassword => "/recuperar-senha".to_string(),
            Route::Menu => "/menu".to_string(),
            Route::List(r) => format!("/{}", r.segment()),
            Route::Create(r) => format!("/{}/cadastrar", r.segment()),
            Route::Edit(r, id) => format!("/{}/editar/{id}", r.segment()),
            Route::Detail(r, id) => format!("/{}/{id}", r.segment()),
            Route::FeiraBancas(id) => format!("/feiras/{id}/bancas"),
            Route::FeiraBanca(feira, banca) => format!("/feiras/{feira}/bancas/{banca}"),
            Route::CidadeBairros(id) => format!("/cidades/bairros/{id}"),
            Route::OcsParticipantes(id) => format!("/ocs/participantes/{id}"),
            Route::CepLookup => "/cep".to_string(),
        }
    }

    /// Routes reachable without a session
    #[must_use]
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            Route::Root | Route::Default | Route::Register | Route::RecoverPassword
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Run the screen
    Allow,
    /// Send the user elsewhere
    Redirect(Route),
}

/// Decide whether the session may open `route`
#[must_use]
pub fn authorize(state: &SessionState, route: &Route) -> Access {
    if route.is_public() {
        return Access::Allow;
    }

    let Some(session) = state.session() else {
        return Access::Redirect(Route::Root);
    };

    if session.roles().into_iter().any(Role::is_restricted) {
        return Access::Redirect(Route::Default);
    }

    Access::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryStore, SessionStore, ROLES_KEY, TOKEN_KEY};

    fn state_with(token: Option<&str>, roles: Option<&str>) -> SessionState {
        let store = MemoryStore::new();
        if let Some(t) = token {
            store.set(TOKEN_KEY, t).unwrap();
        }
        if let Some(r) = roles {
            store.set(ROLES_KEY, r).unwrap();
        }
        SessionState::load(&store).unwrap()
    }

    #[test]
    fn test_no_token_redirects_to_root() {
        let state = state_with(None, Some(r#"[{"id":1}]"#));
        assert_eq!(
            authorize(&state, &Route::List(Resource::Bairros)),
            Access::Redirect(Route::Root)
        );
    }

    #[test]
    fn test_restricted_roles_redirect_to_default() {
        for roles in [r#"[{"id":4}]"#, r#"[{"id":5}]"#, r#"[{"id":1},{"id":5}]"#] {
            let state = state_with(Some("t"), Some(roles));
            let access = authorize(&state, &Route::List(Resource::Feiras));
            assert_eq!(access, Access::Redirect(Route::Default), "roles {roles}");
            if let Access::Redirect(route) = access {
                assert_eq!(route.path(), "/default");
            }
        }
    }

    #[test]
    fn test_root_redirect_path() {
        let access = authorize(&SessionState::Absent, &Route::Menu);
        assert_eq!(access, Access::Redirect(Route::Root));
        if let Access::Redirect(route) = access {
            assert_eq!(route.path(), "/");
        }
    }

    #[test]
    fn test_admin_roles_allowed() {
        for roles in [r#"[{"id":1,"nome":"administrador"}]"#, r#"[{"id":2},{"id":3}]"#, "[]"] {
            let state = state_with(Some("t"), Some(roles));
            assert_eq!(
                authorize(&state, &Route::Edit(Resource::Ocs, 3)),
                Access::Allow,
                "roles {roles}"
            );
        }
    }

    #[test]
    fn test_corrupt_session_redirects_to_root() {
        let state = state_with(Some("t"), Some("not json"));
        assert_eq!(
            authorize(&state, &Route::List(Resource::Usuarios)),
            Access::Redirect(Route::Root)
        );
    }

    #[test]
    fn test_public_routes_always_allowed() {
        let restricted = state_with(Some("t"), Some(r#"[{"id":4}]"#));
        for route in [Route::Root, Route::Default, Route::Register, Route::RecoverPassword] {
            assert_eq!(authorize(&SessionState::Absent, &route), Access::Allow);
            assert_eq!(authorize(&restricted, &route), Access::Allow);
        }
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::List(Resource::Bairros).path(), "/bairros");
        assert_eq!(Route::Create(Resource::Feiras).path(), "/feiras/cadastrar");
        assert_eq!(Route::Edit(Resource::Usuarios, 9).path(), "/usuarios/editar/9");
        assert_eq!(Route::Detail(Resource::Associacoes, 2).path(), "/associacoes/2");
        assert_eq!(Route::FeiraBanca(1, 8).path(), "/feiras/1/bancas/8");
        assert_eq!(Route::CidadeBairros(5).path(), "/cidades/bairros/5");
        assert_eq!(Route::OcsParticipantes(2).path(), "/ocs/participantes/2");
    }

    #[test]
    fn test_role_ids_roundtrip() {
        for id in 1..=7 {
            assert_eq!(Role::from_id(id).id(), id);
        }
        assert!(Role::Agricultor.is_restricted());
        assert!(!Role::Other(9).is_restricted());
        assert_eq!(serde_json::to_string(&Role::Presidente).unwrap(), "2");
    }
}
