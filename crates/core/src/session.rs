//! Authenticated session and its persistence adapter
//!
//! A session is the bearer token handed out at login, the roles of the
//! logged-in user, and the user id. It is persisted through a
//! [`SessionStore`] under three keys (`@token`, `@roles`, `userId`) and
//! cleared on logout.
//!
//! The store is read once when a command starts; later writes by another
//! process are not observed.

use crate::error::{Error, ErrorCode, Result};
use crate::guard::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

/// Store key for the bearer token
pub const TOKEN_KEY: &str = "@token";
/// Store key for the JSON role list
pub const ROLES_KEY: &str = "@roles";
/// Store key for the user id
pub const USER_ID_KEY: &str = "userId";

/// Key/value persistence for session data
pub trait SessionStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove every value
    fn clear(&self) -> Result<()>;
}

/// In-process store, used by tests and one-shot invocations
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> Error {
    Error::new(ErrorCode::Internal, "Session store lock poisoned")
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().map_err(|_| poisoned())?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| poisoned())?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.values.write().map_err(|_| poisoned())?.clear();
        Ok(())
    }
}

/// JSON file store: one object holding every key
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by `path`; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                Error::new(
                    ErrorCode::SessionCorrupt,
                    format!("Session file {} is not valid JSON", self.path.display()),
                )
                .with_source(e)
                .with_suggestion("Run `comercio-admin logout` and log in again")
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(values)?)?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // A corrupt file is replaced rather than blocking a fresh login.
        let mut values = self.read_all().unwrap_or_default();
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Role as the API returns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    /// Role id
    pub id: u32,
    /// Role name
    #[serde(default)]
    pub nome: String,
}

impl RoleRef {
    /// Create a role reference
    pub fn new(id: u32, nome: impl Into<String>) -> Self {
        Self {
            id,
            nome: nome.into(),
        }
    }

    /// Typed role
    #[must_use]
    pub fn role(&self) -> Role {
        Role::from_id(self.id)
    }
}

/// Authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token
    pub token: String,
    /// Roles granted to the user
    pub roles: Vec<RoleRef>,
    /// Id of the logged-in user
    pub user_id: Option<String>,
}

impl Session {
    /// Create a session
    pub fn new(token: impl Into<String>, roles: Vec<RoleRef>, user_id: Option<String>) -> Self {
        Self {
            token: token.into(),
            roles,
            user_id,
        }
    }

    /// Ids of every role, in stored order
    #[must_use]
    pub fn role_ids(&self) -> Vec<u32> {
        self.roles.iter().map(|r| r.id).collect()
    }

    /// Typed roles
    #[must_use]
    pub fn roles(&self) -> Vec<Role> {
        self.roles.iter().map(RoleRef::role).collect()
    }

    /// Whether the user holds `role`
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles().contains(&role)
    }

    /// Persist all three keys
    pub fn save(&self, store: &dyn SessionStore) -> Result<()> {
        store.set(TOKEN_KEY, &self.token)?;
        store.set(ROLES_KEY, &serde_json::to_string(&self.roles)?)?;
        if let Some(ref id) = self.user_id {
            store.set(USER_ID_KEY, id)?;
        }
        debug!(roles = ?self.role_ids(), "Session saved");
        Ok(())
    }
}

/// Forget the session
pub fn logout(store: &dyn SessionStore) -> Result<()> {
    store.clear()
}

/// What the store holds when a command starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No token stored
    Absent,
    /// A usable session
    Active(Session),
    /// A token is stored but the role list cannot be read
    Corrupt {
        /// Why the stored data was rejected
        reason: String,
    },
}

impl SessionState {
    /// Read the session from a store
    ///
    /// A missing role list is read as "no roles". A role list that is not a
    /// JSON array of role objects yields [`SessionState::Corrupt`] instead of
    /// an error so callers can route the user back to login.
    pub fn load(store: &dyn SessionStore) -> Result<Self> {
        let Some(token) = store.get(TOKEN_KEY)?.filter(|t| !t.is_empty()) else {
            return Ok(Self::Absent);
        };

        let roles = match store.get(ROLES_KEY)? {
            None => Vec::new(),
            Some(raw) if raw.trim().is_empty() => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<RoleRef>>(&raw) {
                Ok(roles) => roles,
                Err(e) => {
                    warn!(error = %e, "Stored role list is malformed");
                    return Ok(Self::Corrupt {
                        reason: format!("stored role list is malformed: {e}"),
                    });
                }
            },
        };

        let user_id = store.get(USER_ID_KEY)?;
        Ok(Self::Active(Session::new(token, roles, user_id)))
    }

    /// The session, when active
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Active(s) => Some(s),
            _ => None,
        }
    }

    /// Require an active session
    pub fn require(&self) -> Result<&Session> {
        match self {
            Self::Active(s) => Ok(s),
            Self::Absent => Err(Error::not_authenticated()),
            Self::Corrupt { reason } => Err(Error::new(ErrorCode::SessionCorrupt, reason.clone())
                .with_suggestion("Run `comercio-admin logout` and log in again")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn admin_session() -> Session {
        Session::new(
            "1|abc",
            vec![RoleRef::new(1, "administrador")],
            Some("12".to_string()),
        )
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        admin_session().save(&store).unwrap();

        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("1|abc"));
        assert_eq!(
            store.get(ROLES_KEY).unwrap().as_deref(),
            Some(r#"[{"id":1,"nome":"administrador"}]"#)
        );
        assert_eq!(
            SessionState::load(&store).unwrap(),
            SessionState::Active(admin_session())
        );
    }

    #[test]
    fn test_absent_without_token() {
        let store = MemoryStore::new();
        store.set(ROLES_KEY, "[]").unwrap();
        assert_eq!(SessionState::load(&store).unwrap(), SessionState::Absent);

        store.set(TOKEN_KEY, "").unwrap();
        assert_eq!(SessionState::load(&store).unwrap(), SessionState::Absent);
    }

    #[test]
    fn test_missing_roles_means_no_roles() {
        let store = MemoryStore::new();
        store.set(TOKEN_KEY, "t").unwrap();

        let state = SessionState::load(&store).unwrap();
        assert_eq!(state.session().unwrap().roles, Vec::new());
    }

    #[test]
    fn test_malformed_roles_are_corrupt_not_a_crash() {
        let store = MemoryStore::new();
        store.set(TOKEN_KEY, "t").unwrap();
        store.set(ROLES_KEY, "{not json").unwrap();

        let state = SessionState::load(&store).unwrap();
        assert!(matches!(state, SessionState::Corrupt { .. }));
        assert_eq!(state.require().unwrap_err().code, ErrorCode::SessionCorrupt);
    }

    #[test]
    fn test_roles_as_bare_ids_are_corrupt() {
        let store = MemoryStore::new();
        store.set(TOKEN_KEY, "t").unwrap();
        store.set(ROLES_KEY, "[4, 5]").unwrap();

        assert!(matches!(
            SessionState::load(&store).unwrap(),
            SessionState::Corrupt { .. }
        ));
    }

    #[test]
    fn test_logout_clears_everything() {
        let store = MemoryStore::new();
        admin_session().save(&store).unwrap();
        logout(&store).unwrap();

        assert!(store.get(TOKEN_KEY).unwrap().is_none());
        assert!(store.get(USER_ID_KEY).unwrap().is_none());
        assert_eq!(SessionState::load(&store).unwrap(), SessionState::Absent);
    }

    #[test]
    fn test_file_store_roundtrip_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("session.json"));

        assert_eq!(SessionState::load(&store).unwrap(), SessionState::Absent);

        admin_session().save(&store).unwrap();
        assert!(store.path().exists());

        let reopened = FileStore::new(store.path());
        assert_eq!(
            SessionState::load(&reopened).unwrap().session().unwrap().user_id.as_deref(),
            Some("12")
        );

        logout(&reopened).unwrap();
        assert!(!store.path().exists());
        // clearing twice is fine
        logout(&reopened).unwrap();
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "garbage").unwrap();

        let store = FileStore::new(&path);
        let err = store.get(TOKEN_KEY).unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionCorrupt);

        // a new login overwrites the broken file
        admin_session().save(&store).unwrap();
        assert!(SessionState::load(&store).unwrap().session().is_some());
    }

    #[test]
    fn test_has_role() {
        let session = Session::new(
            "t",
            vec![RoleRef::new(2, "presidente"), RoleRef::new(4, "agricultor")],
            None,
        );
        assert!(session.has_role(Role::Agricultor));
        assert!(!session.has_role(Role::Administrador));
        assert_eq!(session.role_ids(), vec![2, 4]);
    }
}
