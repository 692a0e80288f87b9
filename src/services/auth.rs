//! Account registration, login and bearer-token validation.
//!
//! Tokens are HS256 JWTs whose `sub` is the user id. When no secret is
//! configured an ephemeral one is generated at startup, so tokens do not
//! survive a restart.

use super::password::{hash_password, verify_password};
use crate::config::{AuthConfig, MIN_JWT_SECRET_LENGTH};
use crate::models::{PublicUser, User};
use crate::storage::DocumentStore;
use crate::{Error, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// JWT claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    pub sub: String,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expiration (Unix seconds).
    pub exp: i64,
}

/// Signs and validates bearer tokens.
#[derive(Clone)]
pub struct JwtAuthenticator {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for JwtAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuthenticator")
            .field("validation", &self.validation)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtAuthenticator {
    /// Creates an authenticator from a shared secret and token lifetime.
    #[must_use]
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation,
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Builds the authenticator from configuration, generating an ephemeral
    /// secret when none is set.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        if let Some(secret) = config.jwt_secret.as_deref() {
            return Self::new(secret, config.token_ttl_hours);
        }

        tracing::warn!(
            "No JWT secret configured; using an ephemeral secret. Tokens will not survive a restart"
        );
        let mut bytes = [0u8; MIN_JWT_SECRET_LENGTH];
        rand::rng().fill(&mut bytes);
        Self::new(&hex::encode(bytes), config.token_ttl_hours)
    }

    /// Issues a token for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue(&self, user_id: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| Error::failed("jwt_encode", e))
    }

    /// Validates a bearer token and returns the claims.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] if the token is invalid or expired.
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let token_data: TokenData<Claims> = decode(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                let reason = match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => "Token expired",
                    _ => "Invalid token",
                };
                tracing::warn!(error = %e, "JWT validation failed");
                metrics::counter!("auth_failures_total", "reason" => "token").increment(1);
                Error::Unauthorized(reason.to_string())
            })?;

        tracing::debug!(sub = %token_data.claims.sub, "JWT validated successfully");
        Ok(token_data.claims)
    }

    /// Extracts and validates a bearer token from an Authorization header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] if the header format is invalid or
    /// token validation fails.
    pub fn validate_header(&self, auth_header: &str) -> Result<Claims> {
        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                metrics::counter!("auth_failures_total", "reason" => "header").increment(1);
                Error::Unauthorized("Invalid Authorization header format".to_string())
            })?;

        self.validate(token)
    }
}

/// `POST /api/auth/register` body.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Login email; unique.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Plain-text password.
    pub password: String,
}

/// `POST /api/auth/login` body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// Token plus the public user projection.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    /// Bearer token.
    pub token: String,
    /// The authenticated user.
    pub user: PublicUser,
}

/// Service for user accounts.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn DocumentStore>,
    jwt: JwtAuthenticator,
    password_iterations: u32,
}

impl AuthService {
    /// Creates a new auth service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, jwt: JwtAuthenticator, password_iterations: u32) -> Self {
        Self {
            store,
            jwt,
            password_iterations,
        }
    }

    /// Registers a new account and signs it in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a malformed email, an empty
    /// password, or an email that is already registered.
    #[instrument(skip(self, request), fields(operation = "register"))]
    pub fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
        let email = request.email.trim().to_string();
        if !is_plausible_email(&email) {
            return Err(Error::InvalidInput("Invalid email address".to_string()));
        }
        if request.password.is_empty() {
            return Err(Error::InvalidInput("Password cannot be empty".to_string()));
        }
        if self.store.find_user_by_email(&email)?.is_some() {
            return Err(Error::InvalidInput("Email already registered".to_string()));
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            name: request.name.trim().to_string(),
            password_hash: hash_password(&request.password, self.password_iterations)?,
            created_at: Utc::now(),
        };
        self.store.insert_user(&user)?;
        tracing::info!(user_id = %user.id, "Registered user");

        Ok(AuthResponse {
            token: self.jwt.issue(&user.id)?,
            user: PublicUser::from(&user),
        })
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] when the email is unknown or the
    /// password does not match.
    #[instrument(skip(self, request), fields(operation = "login"))]
    pub fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        let user = self
            .store
            .find_user_by_email(request.email.trim())?
            .filter(|u| verify_password(&request.password, &u.password_hash))
            .ok_or_else(|| {
                metrics::counter!("auth_failures_total", "reason" => "credentials").increment(1);
                Error::Unauthorized("Invalid credentials".to_string())
            })?;

        Ok(AuthResponse {
            token: self.jwt.issue(&user.id)?,
            user: PublicUser::from(&user),
        })
    }

    /// Returns the public profile of the token's user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the user no longer exists.
    pub fn me(&self, user_id: &str) -> Result<PublicUser> {
        self.store
            .get_user(user_id)?
            .as_ref()
            .map(PublicUser::from)
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    /// Resolves an Authorization header to a user id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] for a missing or invalid token.
    pub fn authenticate(&self, auth_header: &str) -> Result<String> {
        self.jwt.validate_header(auth_header).map(|claims| claims.sub)
    }
}

/// One `@` with a non-empty local part and a dotted domain.
fn is_plausible_email(email: &str) -> bool {
    email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !email.chars().any(char::is_whitespace)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;

    const SECRET: &str = "a-long-test-secret-with-enough-entropy-42";

    fn service() -> AuthService {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        AuthService::new(store, JwtAuthenticator::new(SECRET, 168), 1_000)
    }

    fn register(service: &AuthService, email: &str) -> AuthResponse {
        service
            .register(RegisterRequest {
                email: email.to_string(),
                name: "Ada".to_string(),
                password: "correct horse".to_string(),
            })
            .unwrap()
    }

    #[test]
    fn test_register_then_login() {
        let service = service();
        let registered = register(&service, "ada@example.com");
        assert_eq!(registered.user.email, "ada@example.com");

        let claims = service.jwt.validate(&registered.token).unwrap();
        assert_eq!(service.authenticate(&format!("Bearer {}", registered.token)).unwrap(), claims.sub);
        assert_eq!(claims.sub, registered.user.id);
        assert_eq!(claims.exp - claims.iat, 168 * 3600);

        let logged_in = service
            .login(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "correct horse".to_string(),
            })
            .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let service = service();
        register(&service, "ada@example.com");
        let err = service
            .register(RegisterRequest {
                email: "ada@example.com".to_string(),
                name: "Other".to_string(),
                password: "pw".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref m) if m == "Email already registered"));
    }

    #[test]
    fn test_bad_credentials() {
        let service = service();
        register(&service, "ada@example.com");
        for (email, password) in [("ada@example.com", "wrong"), ("nobody@example.com", "correct horse")] {
            let err = service
                .login(LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                })
                .unwrap_err();
            assert!(matches!(err, Error::Unauthorized(ref m) if m == "Invalid credentials"));
        }
    }

    #[test]
    fn test_me_and_missing_user() {
        let service = service();
        let registered = register(&service, "ada@example.com");
        assert_eq!(service.me(&registered.user.id).unwrap().name, "Ada");
        assert!(matches!(service.me("ghost"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_authenticate_header() {
        let service = service();
        let registered = register(&service, "ada@example.com");
        let user_id = service
            .authenticate(&format!("Bearer {}", registered.token))
            .unwrap();
        assert_eq!(user_id, registered.user.id);

        assert!(matches!(service.authenticate("Basic abc"), Err(Error::Unauthorized(_))));
        assert!(matches!(service.authenticate("Bearer "), Err(Error::Unauthorized(_))));
        assert!(matches!(service.authenticate("Bearer not.a.jwt"), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = JwtAuthenticator::new(SECRET, -2);
        let token = jwt.issue("u1").unwrap();
        assert!(matches!(jwt.validate(&token), Err(Error::Unauthorized(ref m)) if m == "Token expired"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtAuthenticator::new(SECRET, 1).issue("u1").unwrap();
        let other = JwtAuthenticator::new("a-different-secret-that-is-long-enough", 1);
        assert!(other.validate(&token).is_err());
    }

    #[test]
    fn test_ephemeral_secret_still_round_trips() {
        let jwt = JwtAuthenticator::from_config(&AuthConfig::default());
        let token = jwt.issue("u1").unwrap();
        assert_eq!(jwt.validate(&token).unwrap().sub, "u1");
    }

    #[test]
    fn test_email_shape() {
        assert!(is_plausible_email("a@b.co"));
        assert!(!is_plausible_email("no-at-sign"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("a@localhost"));
        assert!(!is_plausible_email("a b@example.com"));
    }
}
