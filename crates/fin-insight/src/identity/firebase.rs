//! Identity Toolkit REST client.
//!
//! Speaks the `accounts:*` endpoints with an API key and translates REST
//! error messages into the `auth/...` codes the gateway understands.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::provider::{
    codes, AuthError, FederatedCredential, IdentityProvider, PasswordCredential, ProviderAccount,
};
use crate::config::IdentityConfig;

const IDP_REQUEST_URI: &str = "http://localhost";

pub struct FirebaseIdentityProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl std::fmt::Debug for FirebaseIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseIdentityProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl FirebaseIdentityProvider {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Returns `None` when the config carries no API key.
    pub fn from_config(client: Client, config: &IdentityConfig) -> Option<Self> {
        config
            .api_key
            .clone()
            .map(|key| Self::new(client, config.auth_url.clone(), key))
    }

    async fn call<B, R>(&self, endpoint: &str, body: &B) -> Result<R, AuthError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/accounts:{endpoint}", self.base_url);
        debug!(%endpoint, "identity request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(body)
            .send()
            .await
            .map_err(|err| {
                AuthError::new(codes::NETWORK_FAILED, err.without_url().to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(AuthError::new(translate_rest_error(&message), message));
        }

        response
            .json::<R>()
            .await
            .map_err(|err| AuthError::new(codes::INTERNAL, err.without_url().to_string()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileUpdateRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest<'a> {
    post_body: String,
    request_uri: &'a str,
    return_secure_token: bool,
    return_idp_credential: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl From<AccountResponse> for ProviderAccount {
    fn from(value: AccountResponse) -> Self {
        Self {
            uid: value.local_id,
            email: value.email.filter(|email| !email.is_empty()),
            display_name: value.display_name.filter(|name| !name.is_empty()),
            id_token: SecretString::from(value.id_token),
        }
    }
}

/// REST messages look like `WEAK_PASSWORD : Password should be at least 6 characters`.
pub fn translate_rest_error(message: &str) -> &'static str {
    let key = message.split(" : ").next().unwrap_or(message).trim();
    match key {
        "EMAIL_NOT_FOUND" => codes::USER_NOT_FOUND,
        "INVALID_PASSWORD" => codes::WRONG_PASSWORD,
        "INVALID_LOGIN_CREDENTIALS" | "INVALID_IDP_RESPONSE" => codes::INVALID_CREDENTIAL,
        "INVALID_EMAIL" => codes::INVALID_EMAIL,
        "EMAIL_EXISTS" => codes::EMAIL_IN_USE,
        "WEAK_PASSWORD" => codes::WEAK_PASSWORD,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => codes::TOO_MANY_REQUESTS,
        "USER_DISABLED" => codes::USER_DISABLED,
        _ => codes::INTERNAL,
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    fn name(&self) -> &str {
        "firebase"
    }

    async fn sign_in_with_password(
        &self,
        credential: &PasswordCredential,
    ) -> Result<ProviderAccount, AuthError> {
        let body = PasswordRequest {
            email: &credential.email,
            password: credential.password.expose_secret(),
            return_secure_token: true,
        };
        let account: AccountResponse = self.call("signInWithPassword", &body).await?;
        Ok(account.into())
    }

    async fn sign_up(
        &self,
        credential: &PasswordCredential,
        display_name: Option<&str>,
    ) -> Result<ProviderAccount, AuthError> {
        let body = PasswordRequest {
            email: &credential.email,
            password: credential.password.expose_secret(),
            return_secure_token: true,
        };
        let mut account: ProviderAccount = self
            .call::<_, AccountResponse>("signUp", &body)
            .await?
            .into();

        if let Some(name) = display_name {
            let update = ProfileUpdateRequest {
                id_token: account.id_token.expose_secret(),
                display_name: name,
                return_secure_token: true,
            };
            let profile: ProfileResponse = self.call("update", &update).await?;
            account.display_name = profile.display_name.or_else(|| Some(name.to_string()));
            if let Some(token) = profile.id_token {
                account.id_token = SecretString::from(token);
            }
        }

        Ok(account)
    }

    async fn sign_in_with_idp(
        &self,
        credential: &FederatedCredential,
    ) -> Result<ProviderAccount, AuthError> {
        let token = credential
            .id_token
            .as_ref()
            .ok_or_else(|| AuthError::new(codes::POPUP_CLOSED, "no provider token"))?;
        let body = IdpRequest {
            post_body: format!(
                "id_token={}&providerId={}",
                token.expose_secret(),
                credential.provider_id
            ),
            request_uri: IDP_REQUEST_URI,
            return_secure_token: true,
            return_idp_credential: true,
        };
        let account: AccountResponse = self.call("signInWithIdp", &body).await?;
        Ok(account.into())
    }

    async fn sign_out(&self, _uid: &str) -> Result<(), AuthError> {
        // Tokens are bearer credentials; dropping them locally is the sign-out.
        Ok(())
    }
}
