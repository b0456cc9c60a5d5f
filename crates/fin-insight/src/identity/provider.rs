use std::fmt::Debug;

use async_trait::async_trait;
use secrecy::SecretString;

/// Provider error codes, in the `auth/<kebab-case>` form used by the identity service.
pub mod codes {
    pub const USER_NOT_FOUND: &str = "auth/user-not-found";
    pub const WRONG_PASSWORD: &str = "auth/wrong-password";
    pub const INVALID_CREDENTIAL: &str = "auth/invalid-credential";
    pub const INVALID_EMAIL: &str = "auth/invalid-email";
    pub const EMAIL_IN_USE: &str = "auth/email-already-in-use";
    pub const WEAK_PASSWORD: &str = "auth/weak-password";
    pub const TOO_MANY_REQUESTS: &str = "auth/too-many-requests";
    pub const POPUP_CLOSED: &str = "auth/popup-closed-by-user";
    pub const USER_DISABLED: &str = "auth/user-disabled";
    pub const NETWORK_FAILED: &str = "auth/network-request-failed";
    pub const INTERNAL: &str = "auth/internal-error";
}

/// Failure reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {detail}")]
pub struct AuthError {
    pub code: String,
    pub detail: String,
}

impl AuthError {
    pub fn new(code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            detail: detail.into(),
        }
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

#[derive(Debug, Clone)]
pub struct PasswordCredential {
    pub email: String,
    pub password: SecretString,
}

impl PasswordCredential {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Result of a completed third-party sign-in flow.
///
/// `id_token` is `None` when the user dismissed the provider prompt.
#[derive(Debug, Clone)]
pub struct FederatedCredential {
    pub provider_id: String,
    pub id_token: Option<SecretString>,
}

/// What the provider hands back after a successful sign-in.
#[derive(Debug, Clone)]
pub struct ProviderAccount {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub id_token: SecretString,
}

/// Seam around the third-party authentication service.
#[async_trait]
pub trait IdentityProvider: Debug + Send + Sync {
    fn name(&self) -> &str;

    async fn sign_in_with_password(
        &self,
        credential: &PasswordCredential,
    ) -> Result<ProviderAccount, AuthError>;

    async fn sign_up(
        &self,
        credential: &PasswordCredential,
        display_name: Option<&str>,
    ) -> Result<ProviderAccount, AuthError>;

    async fn sign_in_with_idp(
        &self,
        credential: &FederatedCredential,
    ) -> Result<ProviderAccount, AuthError>;

    async fn sign_out(&self, uid: &str) -> Result<(), AuthError>;
}
