use std::time::{SystemTime, UNIX_EPOCH};

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::password_hash::rand_core::OsRng;
use argon2::Argon2;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TOKEN_LIFETIME_SECONDS: u64 = 30 * 24 * 60 * 60; // 30 days

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user id
    exp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleTokenInfo {
    pub aud: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<String>,
    pub name: Option<String>,
}

pub struct AuthService {
    client: Client,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    google_client_id: Option<String>,
    tokeninfo_url: String,
}

impl AuthService {
    pub fn new(jwt_secret: &str, google_client_id: Option<String>) -> Self {
        Self {
            client: Client::new(),
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            google_client_id,
            tokeninfo_url: GOOGLE_TOKENINFO_URL.to_string(),
        }
    }

    /// Point Google verification at a different endpoint (tests).
    pub fn with_tokeninfo_url(mut self, url: String) -> Self {
        self.tokeninfo_url = url;
        self
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| AuthError::ClockSkew)?
            .as_secs();

        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + TOKEN_LIFETIME_SECONDS,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign token: {:?}", e);
            AuthError::Signing
        })
    }

    /// Verify a bearer token and extract the user id it was issued for.
    pub fn verify_token(&self, token: &str) -> Result<Uuid, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| {
                tracing::warn!("Token verification failed: {:?}", e);
                AuthError::InvalidToken
            })?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidToken)
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                tracing::error!("Password hashing failed: {:?}", e);
                AuthError::Hashing
            })
    }

    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        PasswordHash::new(stored_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// Validate a Google ID token against the tokeninfo endpoint. The token
    /// must be issued for our client id and carry a verified email.
    pub async fn verify_google_token(&self, id_token: &str) -> Result<GoogleTokenInfo, AuthError> {
        let client_id = self
            .google_client_id
            .as_deref()
            .ok_or(AuthError::GoogleNotConfigured)?;

        let response = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Failed to reach Google tokeninfo: {:?}", e);
                AuthError::GoogleTokenInvalid
            })?;

        if !response.status().is_success() {
            tracing::warn!("Google tokeninfo returned status: {}", response.status());
            return Err(AuthError::GoogleTokenInvalid);
        }

        let token_info: GoogleTokenInfo = response.json().await.map_err(|e| {
            tracing::warn!("Failed to parse Google tokeninfo response: {:?}", e);
            AuthError::GoogleTokenInvalid
        })?;

        if token_info.aud.as_deref() != Some(client_id) {
            return Err(AuthError::GoogleAudienceMismatch);
        }

        if token_info.email.is_none() || token_info.email_verified.as_deref() != Some("true") {
            return Err(AuthError::GoogleEmailUnverified);
        }

        Ok(token_info)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Failed to sign token")]
    Signing,
    #[error("System clock before unix epoch")]
    ClockSkew,
    #[error("Password hashing failed")]
    Hashing,
    #[error("Google auth is not configured")]
    GoogleNotConfigured,
    #[error("Invalid Google token")]
    GoogleTokenInvalid,
    #[error("Google token audience mismatch")]
    GoogleAudienceMismatch,
    #[error("Google email is not verified")]
    GoogleEmailUnverified,
}
