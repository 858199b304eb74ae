use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;

use crate::account::errors::AccountError;
use crate::account::ports::AccountRepository;
use crate::account::ports::AccountServicePort;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::LoginCommand;
use crate::domain::account::models::NewAccount;
use crate::domain::account::models::RegisterCommand;

/// Domain service implementation for account operations.
///
/// Orchestrates the password hasher, the token issuer and the account store.
pub struct AccountService<AR>
where
    AR: AccountRepository,
{
    repository: Arc<AR>,
    authenticator: Arc<Authenticator>,
}

impl<AR> AccountService<AR>
where
    AR: AccountRepository,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Account persistence implementation
    /// * `authenticator` - Hashing and token configuration fixed at startup
    pub fn new(repository: Arc<AR>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            authenticator,
        }
    }
}

#[async_trait]
impl<AR> AccountServicePort for AccountService<AR>
where
    AR: AccountRepository,
{
    async fn register(&self, command: RegisterCommand) -> Result<Account, AccountError> {
        let password_hash = self
            .authenticator
            .hash_password(&command.password)
            .map_err(|e| AccountError::Password(e.to_string()))?;

        let account = NewAccount {
            email: command.email,
            password_hash,
        };

        match self.repository.create(account).await {
            Ok(created) => {
                tracing::info!(account_id = %created.id, "Account registered");
                Ok(created)
            }
            Err(e @ AccountError::EmailAlreadyExists(_)) => {
                tracing::warn!("Registration rejected: email already exists");
                Err(e)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create account");
                Err(e)
            }
        }
    }

    async fn login(&self, command: LoginCommand) -> Result<String, AccountError> {
        let Some(account) = self
            .repository
            .find_by_email(command.email.as_str())
            .await?
        else {
            self.authenticator.reject_unknown_account(&command.password);
            tracing::warn!("Login rejected: invalid credentials");
            return Err(AccountError::InvalidCredentials);
        };

        let result = self
            .authenticator
            .authenticate(&command.password, &account.password_hash, account.id.0)
            .map_err(|e| match e {
                AuthenticationError::InvalidCredentials => {
                    tracing::warn!("Login rejected: invalid credentials");
                    AccountError::InvalidCredentials
                }
                AuthenticationError::PasswordError(err) => AccountError::Password(err.to_string()),
                AuthenticationError::JwtError(err) => {
                    tracing::error!(account_id = %account.id, error = %err, "Token signing failed");
                    AccountError::Token(err.to_string())
                }
            })?;

        tracing::info!(account_id = %account.id, "Login succeeded");

        Ok(result.access_token)
    }

    async fn get_account(&self, id: &AccountId) -> Result<Account, AccountError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(AccountError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use auth::HashCost;
    use chrono::Duration;
    use chrono::Utc;
    use mockall::mock;

    use super::*;
    use crate::domain::account::models::EmailAddress;

    mock! {
        pub TestAccountRepository {}

        #[async_trait]
        impl AccountRepository for TestAccountRepository {
            async fn create(&self, account: NewAccount) -> Result<Account, AccountError>;
            async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError>;
            async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError>;
        }
    }

    fn authenticator() -> Arc<Authenticator> {
        Arc::new(
            Authenticator::new(
                b"test-secret-key-for-jwt-signing-at-least-32-bytes",
                HashCost::new(1024, 1, 1),
                Duration::hours(72),
            )
            .unwrap(),
        )
    }

    fn email(raw: &str) -> EmailAddress {
        EmailAddress::new(raw.to_string()).unwrap()
    }

    fn stored_account(authenticator: &Authenticator, id: u64, password: &str) -> Account {
        Account {
            id: AccountId(id),
            email: email("a@x.com"),
            password_hash: authenticator.hash_password(password).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut repository = MockTestAccountRepository::new();

        repository
            .expect_create()
            .withf(|account| {
                account.email.as_str() == "a@x.com"
                    && account.password_hash.starts_with("$argon2id")
                    && !account.password_hash.contains("secret1")
            })
            .times(1)
            .returning(|account| {
                Ok(Account {
                    id: AccountId(1),
                    email: account.email,
                    password_hash: account.password_hash,
                    created_at: Utc::now(),
                })
            });

        let service = AccountService::new(Arc::new(repository), authenticator());

        let account = service
            .register(RegisterCommand::new(email("a@x.com"), "secret1".to_string()))
            .await
            .unwrap();

        assert_eq!(account.id, AccountId(1));
        assert_eq!(account.email.as_str(), "a@x.com");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut repository = MockTestAccountRepository::new();

        repository.expect_create().times(1).returning(|account| {
            Err(AccountError::EmailAlreadyExists(
                account.email.as_str().to_string(),
            ))
        });

        let service = AccountService::new(Arc::new(repository), authenticator());

        let result = service
            .register(RegisterCommand::new(email("a@x.com"), "secret1".to_string()))
            .await;

        assert!(matches!(
            result.unwrap_err(),
            AccountError::EmailAlreadyExists(_)
        ));
    }

    #[tokio::test]
    async fn test_register_store_failure() {
        let mut repository = MockTestAccountRepository::new();

        repository
            .expect_create()
            .times(1)
            .returning(|_| Err(AccountError::DatabaseError("connection reset".to_string())));

        let service = AccountService::new(Arc::new(repository), authenticator());

        let result = service
            .register(RegisterCommand::new(email("a@x.com"), "secret1".to_string()))
            .await;

        assert!(matches!(result.unwrap_err(), AccountError::DatabaseError(_)));
    }

    #[tokio::test]
    async fn test_login_success() {
        let authenticator = authenticator();
        let mut repository = MockTestAccountRepository::new();

        let account = stored_account(&authenticator, 7, "secret1");
        repository
            .expect_find_by_email()
            .withf(|email| email == "a@x.com")
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));

        let service = AccountService::new(Arc::new(repository), Arc::clone(&authenticator));

        let token = service
            .login(LoginCommand::new(email("a@x.com"), "secret1".to_string()))
            .await
            .unwrap();

        assert_eq!(authenticator.validate_token(&token).unwrap(), 7);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let authenticator = authenticator();
        let mut repository = MockTestAccountRepository::new();

        let account = stored_account(&authenticator, 7, "secret1");
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));

        let service = AccountService::new(Arc::new(repository), authenticator);

        let result = service
            .login(LoginCommand::new(email("a@x.com"), "wrong".to_string()))
            .await;

        assert!(matches!(
            result.unwrap_err(),
            AccountError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let mut repository = MockTestAccountRepository::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));

        let service = AccountService::new(Arc::new(repository), authenticator());

        let result = service
            .login(LoginCommand::new(email("nobody@x.com"), "secret1".to_string()))
            .await;

        assert!(matches!(
            result.unwrap_err(),
            AccountError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let authenticator = authenticator();
        let mut repository = MockTestAccountRepository::new();

        let account = stored_account(&authenticator, 7, "secret1");
        repository
            .expect_find_by_email()
            .returning(move |email| {
                if email == "a@x.com" {
                    Ok(Some(account.clone()))
                } else {
                    Ok(None)
                }
            });

        let service = AccountService::new(Arc::new(repository), authenticator);

        let wrong_password = service
            .login(LoginCommand::new(email("a@x.com"), "wrong".to_string()))
            .await
            .unwrap_err();
        let unknown_email = service
            .login(LoginCommand::new(email("b@x.com"), "secret1".to_string()))
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_login_store_failure() {
        let mut repository = MockTestAccountRepository::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Err(AccountError::DatabaseError("timeout".to_string())));

        let service = AccountService::new(Arc::new(repository), authenticator());

        let result = service
            .login(LoginCommand::new(email("a@x.com"), "secret1".to_string()))
            .await;

        assert!(matches!(result.unwrap_err(), AccountError::DatabaseError(_)));
    }

    #[tokio::test]
    async fn test_get_account_not_found() {
        let mut repository = MockTestAccountRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = AccountService::new(Arc::new(repository), authenticator());

        let result = service.get_account(&AccountId(99)).await;
        assert!(matches!(result.unwrap_err(), AccountError::NotFound(_)));
    }
}
