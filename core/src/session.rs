//! Authentication session: persisted credentials, role access, and the
//! bearer token installed on the client.
//!
//! # Design
//! The store owns a `SecureStorage` backend and is the only writer of the
//! client's bearer token. It starts in `SessionPhase::Loading` and moves to
//! `Ready` after `restore`, whether or not credentials were found. Login and
//! logout are split like every other call: the host executes
//! `CouncilClient::build_login` / `build_logout` and hands the outcome here.

use std::collections::HashMap;
use std::fmt;

use crate::api::auth::LoginResult;
use crate::client::CouncilClient;
use crate::error::ApiError;
use crate::http::{HttpResponse, TransportError};
use crate::jwt::member_id_from_token;

/// Keys under which the session is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Role,
    AccessToken,
    RefreshToken,
    Email,
    MemberId,
    MemberStatus,
    StudentId,
}

impl StorageKey {
    pub const ALL: [StorageKey; 7] = [
        StorageKey::Role,
        StorageKey::AccessToken,
        StorageKey::RefreshToken,
        StorageKey::Email,
        StorageKey::MemberId,
        StorageKey::MemberStatus,
        StorageKey::StudentId,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::Role => "ROLE",
            StorageKey::AccessToken => "ACCESS_TOKEN",
            StorageKey::RefreshToken => "REFRESH_TOKEN",
            StorageKey::Email => "EMAIL",
            StorageKey::MemberId => "MEMBER_ID",
            StorageKey::MemberStatus => "MEMBER_STATUS",
            StorageKey::StudentId => "STUDENT_ID",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("secure storage unavailable: {0}")]
    Unavailable(String),
    #[error("failed to access {key}: {message}")]
    Access { key: StorageKey, message: String },
}

/// Key/value store for credentials (Keychain, Keystore, ...).
pub trait SecureStorage {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: StorageKey, value: &str) -> Result<(), StorageError>;
    fn delete(&mut self, key: StorageKey) -> Result<(), StorageError>;
}

/// In-process storage for tests and hosts without a secure enclave.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<StorageKey, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SecureStorage for MemoryStorage {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(&key).cloned())
    }

    fn set(&mut self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key, value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: StorageKey) -> Result<(), StorageError> {
        self.entries.remove(&key);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Student,
    Council,
}

impl Role {
    /// Map a server role string. `STUDENT` is a student, `COUNCIL`, `ADMIN`
    /// and `OWNER` are council; an optional `ROLE_` prefix is ignored.
    pub fn from_raw(raw: &str) -> Option<Role> {
        let upper = raw.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        match name {
            "STUDENT" => Some(Role::Student),
            "COUNCIL" | "ADMIN" | "OWNER" => Some(Role::Council),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Council => "council",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleAccess {
    pub is_authenticated: bool,
    pub is_student: bool,
    pub is_council: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Ready,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub role: Option<Role>,
    pub raw_role: Option<String>,
    pub member_id: Option<i64>,
    pub email: Option<String>,
    pub student_id: Option<String>,
    pub member_status: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Session {
    /// Authenticated means an access token is held. Anyone authenticated
    /// without council access is treated as a student.
    pub fn access(&self) -> RoleAccess {
        let is_authenticated = self.access_token.is_some();
        let is_council = is_authenticated && self.role == Some(Role::Council);
        RoleAccess {
            is_authenticated,
            is_student: is_authenticated && !is_council,
            is_council,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct SessionStore<S> {
    storage: S,
    phase: SessionPhase,
    session: Session,
}

impl<S: SecureStorage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            phase: SessionPhase::Loading,
            session: Session::default(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn access(&self) -> RoleAccess {
        self.session.access()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Load persisted credentials and install the token on `client`.
    ///
    /// The phase is `Ready` afterwards even when storage fails; the session
    /// is then anonymous.
    pub fn restore(&mut self, client: &mut CouncilClient) -> Result<RoleAccess, StorageError> {
        let loaded = self.load();
        self.phase = SessionPhase::Ready;
        match loaded {
            Ok(session) => {
                client.set_auth_token(session.access_token.as_deref());
                self.session = session;
                tracing::debug!(authenticated = self.session.access_token.is_some(), "session restored");
                Ok(self.access())
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to restore session");
                self.session = Session::default();
                client.set_auth_token(None);
                Err(err)
            }
        }
    }

    fn load(&self) -> Result<Session, StorageError> {
        let raw_role = self.storage.get(StorageKey::Role)?;
        let access_token = self.storage.get(StorageKey::AccessToken)?.filter(|t| !t.is_empty());
        let member_id = self
            .storage
            .get(StorageKey::MemberId)?
            .and_then(|id| id.trim().parse::<i64>().ok())
            .or_else(|| access_token.as_deref().and_then(member_id_from_token));
        Ok(Session {
            role: raw_role.as_deref().and_then(Role::from_raw),
            raw_role,
            member_id,
            email: self.storage.get(StorageKey::Email)?,
            student_id: self.storage.get(StorageKey::StudentId)?,
            member_status: self.storage.get(StorageKey::MemberStatus)?,
            access_token,
            refresh_token: self.storage.get(StorageKey::RefreshToken)?,
        })
    }

    /// Finish a login with the response to `CouncilClient::build_login`.
    pub fn complete_login(
        &mut self,
        email: &str,
        response: HttpResponse,
        client: &mut CouncilClient,
    ) -> Result<RoleAccess, SessionError> {
        let login = client.parse_login(response)?;
        self.apply_login(email, login, client)?;
        Ok(self.access())
    }

    /// Persist an already-parsed login result and install its token.
    pub fn apply_login(
        &mut self,
        email: &str,
        login: LoginResult,
        client: &mut CouncilClient,
    ) -> Result<(), StorageError> {
        let member_id = login.member_id.or_else(|| member_id_from_token(&login.access_token));
        let session = Session {
            role: Role::from_raw(&login.role),
            raw_role: Some(login.role),
            member_id,
            email: Some(email.trim().to_string()),
            student_id: login.student_id.filter(|s| !s.trim().is_empty()),
            member_status: login.member_status,
            access_token: Some(login.access_token).filter(|t| !t.is_empty()),
            refresh_token: Some(login.refresh_token).filter(|t| !t.is_empty()),
        };
        self.persist(&session)?;
        client.set_auth_token(session.access_token.as_deref());
        self.session = session;
        self.phase = SessionPhase::Ready;
        tracing::debug!(role = ?self.session.role, member_id = ?self.session.member_id, "logged in");
        Ok(())
    }

    fn persist(&mut self, session: &Session) -> Result<(), StorageError> {
        let member_id = session.member_id.map(|id| id.to_string());
        let entries = [
            (StorageKey::Role, session.raw_role.as_deref()),
            (StorageKey::AccessToken, session.access_token.as_deref()),
            (StorageKey::RefreshToken, session.refresh_token.as_deref()),
            (StorageKey::Email, session.email.as_deref()),
            (StorageKey::MemberId, member_id.as_deref()),
            (StorageKey::MemberStatus, session.member_status.as_deref()),
            (StorageKey::StudentId, session.student_id.as_deref()),
        ];
        for (key, value) in entries {
            match value {
                Some(value) => self.storage.set(key, value)?,
                None => self.storage.delete(key)?,
            }
        }
        Ok(())
    }

    /// Clear everything after the logout call, whatever its outcome.
    ///
    /// A failed logout request is only logged. Every key is deleted even if
    /// one deletion fails; the first storage error is returned.
    pub fn logout(
        &mut self,
        outcome: Result<HttpResponse, TransportError>,
        client: &mut CouncilClient,
    ) -> Result<(), StorageError> {
        let result = outcome
            .map_err(ApiError::from)
            .and_then(|response| client.parse_logout(response));
        if let Err(err) = result {
            tracing::warn!(error = %err, "logout request failed");
        }

        client.set_auth_token(None);
        self.session = Session::default();
        self.phase = SessionPhase::Ready;

        let mut first_error = None;
        for key in StorageKey::ALL {
            if let Err(err) = self.storage.delete(key) {
                tracing::warn!(error = %err, %key, "failed to clear session key");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
