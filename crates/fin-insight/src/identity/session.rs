use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;

/// How the current user proved who they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignInMethod {
    Password,
    Federated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserIdentity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub method: SignInMethod,
    pub signed_in_at: DateTime<Utc>,
}

/// Read-only view of who is signed in.
///
/// `authenticated` is true exactly when a user is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    authenticated: bool,
    user: Option<UserIdentity>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user: UserIdentity) -> Self {
        Self {
            authenticated: true,
            user: Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    pub fn email(&self) -> Option<&str> {
        self.user.as_ref().and_then(|user| user.email.as_deref())
    }
}

#[derive(Debug, Default)]
struct AuthState {
    session: Session,
    id_token: Option<SecretString>,
}

/// Shared authentication context for one visitor.
///
/// Only [`IdentityGateway`](super::IdentityGateway) writes to it; everyone
/// else reads snapshots.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    state: Arc<RwLock<AuthState>>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Session {
        self.read(|state| state.session.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read(|state| state.session.is_authenticated())
    }

    pub fn has_token(&self) -> bool {
        self.read(|state| state.id_token.is_some())
    }

    pub(crate) fn establish(&self, user: UserIdentity, id_token: SecretString) -> Session {
        let session = Session::for_user(user);
        let mut guard = self.state.write().unwrap_or_else(|poison| poison.into_inner());
        guard.session = session.clone();
        guard.id_token = Some(id_token);
        session
    }

    pub(crate) fn clear(&self) -> Option<UserIdentity> {
        let mut guard = self.state.write().unwrap_or_else(|poison| poison.into_inner());
        guard.id_token = None;
        std::mem::take(&mut guard.session).user
    }

    fn read<T>(&self, f: impl FnOnce(&AuthState) -> T) -> T {
        let guard = self.state.read().unwrap_or_else(|poison| poison.into_inner());
        f(&guard)
    }
}
