use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::SinkError;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_MINUTES: i64 = 60;

/// Claims of the self-signed assertion exchanged for an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(client_email: &str, scope: &str, token_uri: &str) -> Self {
        let now = Utc::now();
        Self {
            iss: client_email.to_string(),
            scope: scope.to_string(),
            aud: token_uri.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(ASSERTION_LIFETIME_MINUTES)).timestamp(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Service-account identity used to obtain bearer tokens for the sheet.
pub struct ServiceAccount {
    client_email: String,
    token_uri: String,
    key: EncodingKey,
}

impl ServiceAccount {
    pub fn new(client_email: &str, private_key_pem: &str, token_uri: &str) -> Result<Self, SinkError> {
        let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| SinkError::Auth(format!("Invalid service account private key: {e}")))?;

        Ok(Self {
            client_email: client_email.to_string(),
            token_uri: token_uri.to_string(),
            key,
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Sign an RS256 assertion for `scope`.
    pub fn assertion(&self, scope: &str) -> Result<String, SinkError> {
        let claims = Claims::new(&self.client_email, scope, &self.token_uri);
        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| SinkError::Auth(format!("JWT encode failed: {e}")))
    }

    /// Exchange a fresh assertion for an access token.
    pub async fn access_token(&self, client: &reqwest::Client, scope: &str) -> Result<String, SinkError> {
        let assertion = self.assertion(scope)?;

        let resp = client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| SinkError::Auth(format!("Token request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SinkError::Auth(format!(
                "Token endpoint returned {}: {}",
                status.as_u16(),
                truncate(&body, 512)
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| SinkError::Auth(format!("Invalid token response: {e}")))?;

        Ok(token.access_token)
    }
}

pub(crate) fn truncate(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
