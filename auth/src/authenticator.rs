use chrono::Duration;

use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::password::HashCost;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and JWT generation.
///
/// Holds only immutable state (signing secret, token validity, hash cost) and
/// can be shared behind an `Arc` without synchronization.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
    /// Hash no password is expected to match, built with the configured cost.
    placeholder_hash: String,
}

const PLACEHOLDER_PASSWORD: &str = "placeholder-password-for-unknown-accounts";

/// Result of successful authentication.
pub struct AuthenticationResult {
    /// JWT access token
    pub access_token: String,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for JWT signing
    /// * `cost` - Password hashing cost
    /// * `token_validity` - Lifetime of issued tokens
    ///
    /// # Errors
    /// * `InvalidCost` - Hashing parameters rejected by Argon2
    /// * `HashingFailed` - Placeholder hash could not be computed
    pub fn new(
        jwt_secret: &[u8],
        cost: HashCost,
        token_validity: Duration,
    ) -> Result<Self, PasswordError> {
        let password_hasher = PasswordHasher::new(cost)?;
        let placeholder_hash = password_hasher.hash(PLACEHOLDER_PASSWORD)?;

        Ok(Self {
            password_hasher,
            jwt_handler: JwtHandler::new(jwt_secret, token_validity),
            placeholder_hash,
        })
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify credentials and generate an access token for the account.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `account_id` - Subject of the issued token
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match (or hash is unreadable)
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        account_id: u64,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let access_token = self.jwt_handler.issue(account_id)?;

        Ok(AuthenticationResult { access_token })
    }

    /// Reject a login for which no account exists.
    ///
    /// Runs one full verification against the placeholder hash first, so the
    /// call takes as long as a wrong password for an existing account.
    pub fn reject_unknown_account(&self, password: &str) -> AuthenticationError {
        let _ = self.password_hasher.verify(password, &self.placeholder_hash);
        AuthenticationError::InvalidCredentials
    }

    /// Generate a token without password verification.
    pub fn generate_token(&self, account_id: u64) -> Result<String, JwtError> {
        self.jwt_handler.issue(account_id)
    }

    /// Validate a token and return the account it was issued for.
    ///
    /// # Errors
    /// * `MissingToken` - Token is empty
    /// * `InvalidToken` - Token failed any validation step
    pub fn validate_token(&self, token: &str) -> Result<u64, JwtError> {
        self.jwt_handler.verify(token)
    }
}
