pub mod authenticator;
pub mod claims;
pub mod config;
pub mod credentials;
pub mod error;
pub mod extractors;
pub mod guards;
pub mod keys;
pub mod password;
pub mod roles;
pub mod tokens;
pub mod verifier;

pub use authenticator::Authenticator;
pub use claims::Claims;
pub use config::{JwtConfig, DEFAULT_TOKEN_TTL_MINUTES};
pub use credentials::{CredentialRecord, CredentialStore, InMemoryCredentialStore};
pub use error::{AuthError, AuthResult};
pub use extractors::{AuthContext, Authorized};
pub use guards::{
    require_active, require_admin, require_admin_or_requester, AccessPolicy, ActiveOnly,
    AdminOnly, AdminOrRequester, Principal,
};
pub use keys::{
    EnvSecretKeyStore, Environment, KeyPair, KeyStore, SigningKeys, StaticKeyStore,
    UnknownEnvironment,
};
pub use password::{hash_password, verify_password, PasswordVerifier, DEFAULT_BCRYPT_COST};
pub use roles::{Role, ROLE_ADMIN, ROLE_REQUESTER};
pub use tokens::{IssuedToken, TokenIssuer, TokenSubject, TOKEN_TYPE};
pub use verifier::{AuthenticatedUser, JwtVerifier};
