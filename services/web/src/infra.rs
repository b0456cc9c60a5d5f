use async_trait::async_trait;
use fin_insight::identity::{
    codes, AuthError, FederatedCredential, IdentityProvider, PasswordCredential, ProviderAccount,
};
use fin_insight::presentation::SegmentCatalog;
use fin_insight::workflow::WorkspaceRegistry;
use metrics_exporter_prometheus::PrometheusHandle;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub(crate) const MIN_PASSWORD_LEN: usize = 6;
pub(crate) const MAX_FAILED_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) workspaces: Arc<WorkspaceRegistry>,
    pub(crate) catalog: Arc<SegmentCatalog>,
}

struct MemoryAccount {
    uid: String,
    password: SecretString,
    display_name: Option<String>,
    failed_attempts: u32,
}

#[derive(Default)]
struct Directory {
    accounts: HashMap<String, MemoryAccount>,
    federated: HashMap<String, String>,
}

/// Process-local accounts for development and tests.
#[derive(Default, Clone)]
pub(crate) struct MemoryIdentityProvider {
    directory: Arc<Mutex<Directory>>,
}

impl std::fmt::Debug for MemoryIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryIdentityProvider").finish_non_exhaustive()
    }
}

fn session_token() -> SecretString {
    SecretString::from(Uuid::new_v4().simple().to_string())
}

fn normalized_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_ascii_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AuthError::new(codes::INVALID_EMAIL, "malformed email address")),
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn sign_in_with_password(
        &self,
        credential: &PasswordCredential,
    ) -> Result<ProviderAccount, AuthError> {
        let email = normalized_email(&credential.email)?;
        let mut guard = self.directory.lock().expect("identity directory poisoned");
        let account = guard
            .accounts
            .get_mut(&email)
            .ok_or_else(|| AuthError::new(codes::USER_NOT_FOUND, "no account for email"))?;

        if account.failed_attempts >= MAX_FAILED_ATTEMPTS {
            return Err(AuthError::new(
                codes::TOO_MANY_REQUESTS,
                "account locked after repeated failures",
            ));
        }
        if account.password.expose_secret() != credential.password.expose_secret() {
            account.failed_attempts += 1;
            return Err(AuthError::new(codes::WRONG_PASSWORD, "password mismatch"));
        }

        account.failed_attempts = 0;
        Ok(ProviderAccount {
            uid: account.uid.clone(),
            email: Some(email),
            display_name: account.display_name.clone(),
            id_token: session_token(),
        })
    }

    async fn sign_up(
        &self,
        credential: &PasswordCredential,
        display_name: Option<&str>,
    ) -> Result<ProviderAccount, AuthError> {
        let email = normalized_email(&credential.email)?;
        if credential.password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::new(
                codes::WEAK_PASSWORD,
                "password should be at least 6 characters",
            ));
        }

        let mut guard = self.directory.lock().expect("identity directory poisoned");
        if guard.accounts.contains_key(&email) {
            return Err(AuthError::new(codes::EMAIL_IN_USE, "email already registered"));
        }

        let uid = Uuid::new_v4().to_string();
        guard.accounts.insert(
            email.clone(),
            MemoryAccount {
                uid: uid.clone(),
                password: credential.password.clone(),
                display_name: display_name.map(str::to_string),
                failed_attempts: 0,
            },
        );

        Ok(ProviderAccount {
            uid,
            email: Some(email),
            display_name: display_name.map(str::to_string),
            id_token: session_token(),
        })
    }

    async fn sign_in_with_idp(
        &self,
        credential: &FederatedCredential,
    ) -> Result<ProviderAccount, AuthError> {
        let token = credential
            .id_token
            .as_ref()
            .map(|token| token.expose_secret().trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::new(codes::POPUP_CLOSED, "no provider token"))?;

        let mut guard = self.directory.lock().expect("identity directory poisoned");
        let key = format!("{}|{token}", credential.provider_id);
        let uid = guard
            .federated
            .entry(key)
            .or_insert_with(|| Uuid::new_v4().to_string())
            .clone();

        Ok(ProviderAccount {
            uid,
            email: None,
            display_name: None,
            id_token: session_token(),
        })
    }

    async fn sign_out(&self, _uid: &str) -> Result<(), AuthError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let provider = MemoryIdentityProvider::default();
        let created = provider
            .sign_up(
                &PasswordCredential::new("Ada@Example.com", "hunter22"),
                Some("Ada"),
            )
            .await
            .expect("account created");

        let signed_in = provider
            .sign_in_with_password(&PasswordCredential::new("ada@example.com", "hunter22"))
            .await
            .expect("sign in");
        assert_eq!(signed_in.uid, created.uid);
        assert_eq!(signed_in.display_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn sign_up_rejects_weak_and_duplicate() {
        let provider = MemoryIdentityProvider::default();
        let weak = provider
            .sign_up(&PasswordCredential::new("ada@example.com", "12345"), None)
            .await
            .expect_err("too short");
        assert!(weak.is(codes::WEAK_PASSWORD));

        provider
            .sign_up(&PasswordCredential::new("ada@example.com", "123456"), None)
            .await
            .expect("six characters is enough");
        let duplicate = provider
            .sign_up(&PasswordCredential::new("ada@example.com", "abcdef"), None)
            .await
            .expect_err("already registered");
        assert!(duplicate.is(codes::EMAIL_IN_USE));

        let malformed = provider
            .sign_up(&PasswordCredential::new("not-an-email", "abcdef"), None)
            .await
            .expect_err("bad email");
        assert!(malformed.is(codes::INVALID_EMAIL));
    }

    #[tokio::test]
    async fn repeated_failures_lock_the_account() {
        let provider = MemoryIdentityProvider::default();
        provider
            .sign_up(&PasswordCredential::new("ada@example.com", "hunter22"), None)
            .await
            .expect("account created");

        for _ in 0..MAX_FAILED_ATTEMPTS {
            let err = provider
                .sign_in_with_password(&PasswordCredential::new("ada@example.com", "nope"))
                .await
                .expect_err("wrong password");
            assert!(err.is(codes::WRONG_PASSWORD));
        }

        let locked = provider
            .sign_in_with_password(&PasswordCredential::new("ada@example.com", "hunter22"))
            .await
            .expect_err("locked");
        assert!(locked.is(codes::TOO_MANY_REQUESTS));
    }

    #[tokio::test]
    async fn federated_tokens_map_to_stable_accounts() {
        let provider = MemoryIdentityProvider::default();
        let credential = FederatedCredential {
            provider_id: "google.com".to_string(),
            id_token: Some(SecretString::from("jwt-1")),
        };
        let first = provider.sign_in_with_idp(&credential).await.expect("sign in");
        let second = provider.sign_in_with_idp(&credential).await.expect("sign in");
        assert_eq!(first.uid, second.uid);
    }
}
