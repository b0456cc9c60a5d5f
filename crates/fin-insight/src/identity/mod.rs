//! Session ownership and the third-party sign-in seam.

pub mod firebase;
pub mod gateway;
pub mod provider;
pub mod session;

pub use firebase::FirebaseIdentityProvider;
pub use gateway::{
    describe_auth_error, AuthOperation, GatewayError, IdentityGateway, SignupRequest,
};
pub use provider::{
    codes, AuthError, FederatedCredential, IdentityProvider, PasswordCredential, ProviderAccount,
};
pub use session::{AuthContext, Session, SignInMethod, UserIdentity};
