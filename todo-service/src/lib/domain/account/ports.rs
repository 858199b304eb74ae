use async_trait::async_trait;

use crate::account::errors::AccountError;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::LoginCommand;
use crate::domain::account::models::NewAccount;
use crate::domain::account::models::RegisterCommand;

/// Port for account domain service operations.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Register a new account.
    ///
    /// # Arguments
    /// * `command` - Validated email and plaintext password
    ///
    /// # Returns
    /// Created account entity
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `Password` - Hashing failed
    /// * `DatabaseError` - Store operation failed
    async fn register(&self, command: RegisterCommand) -> Result<Account, AccountError>;

    /// Check an email/password pair and issue an access token.
    ///
    /// # Arguments
    /// * `command` - Email and plaintext password
    ///
    /// # Returns
    /// Signed access token
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password (indistinguishable)
    /// * `Token` - Token signing failed
    /// * `DatabaseError` - Store operation failed
    async fn login(&self, command: LoginCommand) -> Result<String, AccountError>;

    /// Retrieve account by identifier.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `DatabaseError` - Store operation failed
    async fn get_account(&self, id: &AccountId) -> Result<Account, AccountError>;
}

/// Persistence operations for the account aggregate.
///
/// Implementations enforce email uniqueness on `create` and are expected to
/// handle their own retries; callers never retry.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Persist a new account, assigning its id and creation time.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Store operation failed
    async fn create(&self, account: NewAccount) -> Result<Account, AccountError>;

    /// Retrieve account by exact email.
    ///
    /// # Returns
    /// Optional account entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Store operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError>;

    /// Retrieve account by identifier.
    ///
    /// # Returns
    /// Optional account entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Store operation failed
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError>;
}
