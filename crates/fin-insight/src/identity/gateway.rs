use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use super::provider::{
    codes, AuthError, FederatedCredential, IdentityProvider, PasswordCredential, ProviderAccount,
};
use super::session::{AuthContext, Session, SignInMethod, UserIdentity};
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOperation {
    Login,
    Signup,
    Federated,
}

impl fmt::Display for AuthOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuthOperation::Login => "login",
            AuthOperation::Signup => "signup",
            AuthOperation::Federated => "federated sign-in",
        };
        f.write_str(label)
    }
}

/// Maps a provider error to the message shown next to the form.
pub fn describe_auth_error(operation: AuthOperation, error: &AuthError) -> &'static str {
    match (operation, error.code.as_str()) {
        (
            AuthOperation::Login,
            codes::USER_NOT_FOUND | codes::WRONG_PASSWORD | codes::INVALID_CREDENTIAL,
        ) => "Invalid email or password. Please try again.",
        (AuthOperation::Login, codes::TOO_MANY_REQUESTS) => {
            "Too many failed login attempts. Please try again later."
        }
        (AuthOperation::Login, _) => "Failed to login. Please check your credentials.",
        (AuthOperation::Signup, codes::EMAIL_IN_USE) => {
            "This email is already in use. Please try another one."
        }
        (AuthOperation::Signup, codes::WEAK_PASSWORD) => {
            "Password is too weak. Please use a stronger password."
        }
        (AuthOperation::Signup, _) => "Failed to create account. Please try again.",
        (AuthOperation::Federated, codes::POPUP_CLOSED) => {
            "Sign-in popup was closed before completing the sign-in."
        }
        (AuthOperation::Federated, _) => "Failed to sign in with Google. Please try again.",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{operation} failed: {source}")]
    Auth {
        operation: AuthOperation,
        #[source]
        source: AuthError,
    },
}

impl GatewayError {
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Validation(err) => err.to_string(),
            GatewayError::Auth { operation, source } => {
                describe_auth_error(*operation, source).to_string()
            }
        }
    }

    pub fn auth_code(&self) -> Option<&str> {
        match self {
            GatewayError::Auth { source, .. } => Some(source.code.as_str()),
            GatewayError::Validation(_) => None,
        }
    }
}

/// Fields of the account-creation form.
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub display_name: Option<String>,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

/// The only writer of a visitor's [`AuthContext`].
#[derive(Debug, Clone)]
pub struct IdentityGateway {
    provider: Arc<dyn IdentityProvider>,
    context: AuthContext,
}

impl IdentityGateway {
    pub fn new(provider: Arc<dyn IdentityProvider>, context: AuthContext) -> Self {
        Self { provider, context }
    }

    pub fn session(&self) -> Session {
        self.context.session()
    }

    pub fn context(&self) -> &AuthContext {
        &self.context
    }

    pub async fn login(&self, credential: PasswordCredential) -> Result<Session, GatewayError> {
        let account = self
            .provider
            .sign_in_with_password(&credential)
            .await
            .map_err(|source| self.failed(AuthOperation::Login, source))?;
        Ok(self.establish(account, SignInMethod::Password))
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<Session, GatewayError> {
        if request.password.expose_secret() != request.confirm_password.expose_secret() {
            return Err(ValidationError::PasswordMismatch.into());
        }

        let credential = PasswordCredential {
            email: request.email.trim().to_string(),
            password: request.password,
        };
        let display_name = request
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        let account = self
            .provider
            .sign_up(&credential, display_name)
            .await
            .map_err(|source| self.failed(AuthOperation::Signup, source))?;
        Ok(self.establish(account, SignInMethod::Password))
    }

    pub async fn login_with_federated_provider(
        &self,
        credential: FederatedCredential,
    ) -> Result<Session, GatewayError> {
        let dismissed = credential
            .id_token
            .as_ref()
            .map_or(true, |token| token.expose_secret().trim().is_empty());
        if dismissed {
            return Err(self.failed(
                AuthOperation::Federated,
                AuthError::new(codes::POPUP_CLOSED, "provider prompt dismissed"),
            ));
        }

        let account = self
            .provider
            .sign_in_with_idp(&credential)
            .await
            .map_err(|source| self.failed(AuthOperation::Federated, source))?;
        Ok(self.establish(account, SignInMethod::Federated))
    }

    pub async fn logout(&self) {
        let Some(user) = self.context.clear() else {
            return;
        };
        if let Err(error) = self.provider.sign_out(&user.uid).await {
            warn!(uid = %user.uid, %error, "provider sign-out failed; local session cleared");
        }
        info!(uid = %user.uid, "signed out");
    }

    fn establish(&self, account: ProviderAccount, method: SignInMethod) -> Session {
        let ProviderAccount {
            uid,
            email,
            display_name,
            id_token,
        } = account;
        info!(%uid, provider = self.provider.name(), ?method, "signed in");
        self.context.establish(
            UserIdentity {
                uid,
                email,
                display_name,
                method,
                signed_in_at: Utc::now(),
            },
            id_token,
        )
    }

    fn failed(&self, operation: AuthOperation, source: AuthError) -> GatewayError {
        warn!(
            %operation,
            code = %source.code,
            provider = self.provider.name(),
            "authentication rejected"
        );
        GatewayError::Auth { operation, source }
    }
}
