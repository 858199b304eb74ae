use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;

use super::claims::Claims;
use super::errors::JwtError;

/// Algorithms a token header may declare. HMAC family only.
///
/// `jsonwebtoken` rejects any token whose `alg` is not in this list, and any
/// list whose members disagree with the key family, so an RSA/EC/`none` header
/// can never be checked against the shared secret.
pub const ACCEPTED_ALGORITHMS: [Algorithm; 3] =
    [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// JWT token handler for issuing and verifying access tokens.
///
/// Signs with HS256 (HMAC with SHA-256). Secret and validity window are fixed
/// at construction and safe to share across threads.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validity: Duration,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (should be stored securely)
    /// * `validity` - Lifetime of issued tokens
    ///
    /// # Returns
    /// JwtHandler instance configured with HS256 algorithm
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8], validity: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            validity,
        }
    }

    /// Issue a signed access token for an account.
    ///
    /// # Arguments
    /// * `account_id` - Subject of the token
    ///
    /// # Returns
    /// JWT token string valid until now + validity
    ///
    /// # Errors
    /// * `EncodingFailed` - Expiration out of range or signing failed; no
    ///   token is returned
    pub fn issue(&self, account_id: u64) -> Result<String, JwtError> {
        let claims = Claims::for_account(account_id, Utc::now(), self.validity)
            .ok_or_else(|| JwtError::EncodingFailed("expiration out of range".to_string()))?;
        self.encode(&claims)
    }

    /// Verify an access token and return the account it was issued for.
    ///
    /// # Arguments
    /// * `token` - Raw token string as presented by the caller
    ///
    /// # Returns
    /// Account identifier from the `user_id` claim
    ///
    /// # Errors
    /// * `MissingToken` - Token is empty
    /// * `InvalidToken` - Malformed, foreign algorithm, bad signature, expired,
    ///   or claims of the wrong shape
    pub fn verify(&self, token: &str) -> Result<u64, JwtError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(JwtError::MissingToken);
        }

        let claims: Claims = self.decode(token)?;

        if claims.is_expired(Utc::now().timestamp()) {
            return Err(JwtError::InvalidToken("token has expired".to_string()));
        }

        if !claims.authorized {
            return Err(JwtError::InvalidToken("token is not authorized".to_string()));
        }

        Ok(claims.user_id)
    }

    /// Encode claims into a JWT token.
    ///
    /// # Arguments
    /// * `claims` - Claims to encode (must implement Serialize)
    ///
    /// # Returns
    /// JWT token string
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a JWT token.
    ///
    /// Requires an `exp` claim and checks it with zero leeway.
    ///
    /// # Errors
    /// * `InvalidToken` - Signature, algorithm, expiry or payload shape rejected
    pub fn decode<T: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<T, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        decode::<T>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }
}
