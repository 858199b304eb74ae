use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::account::errors::AccountError;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::NewAccount;
use crate::domain::account::ports::AccountRepository;

/// Process-local account store.
///
/// Used when no database is configured and by the API tests. The uniqueness
/// check and the insert happen under one write lock.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    accounts: HashMap<AccountId, Account>,
    ids_by_email: HashMap<String, AccountId>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub async fn len(&self) -> usize {
        self.state.read().await.accounts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, account: NewAccount) -> Result<Account, AccountError> {
        let mut state = self.state.write().await;

        if state.ids_by_email.contains_key(account.email.as_str()) {
            return Err(AccountError::EmailAlreadyExists(
                account.email.as_str().to_string(),
            ));
        }

        state.next_id += 1;
        let created = Account {
            id: AccountId(state.next_id),
            email: account.email,
            password_hash: account.password_hash,
            created_at: Utc::now(),
        };

        state
            .ids_by_email
            .insert(created.email.as_str().to_string(), created.id);
        state.accounts.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let state = self.state.read().await;

        Ok(state
            .ids_by_email
            .get(email)
            .and_then(|id| state.accounts.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError> {
        Ok(self.state.read().await.accounts.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::account::models::EmailAddress;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: EmailAddress::new(email.to_string()).unwrap(),
            password_hash: "$argon2id$test_hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repository = InMemoryAccountRepository::new();

        let first = repository.create(new_account("a@x.com")).await.unwrap();
        let second = repository.create(new_account("b@x.com")).await.unwrap();

        assert_eq!(first.id, AccountId(1));
        assert_eq!(second.id, AccountId(2));
    }

    #[tokio::test]
    async fn test_create_duplicate_email() {
        let repository = InMemoryAccountRepository::new();

        repository.create(new_account("a@x.com")).await.unwrap();
        let result = repository.create(new_account("a@x.com")).await;

        assert!(matches!(result, Err(AccountError::EmailAlreadyExists(_))));
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn test_email_is_case_sensitive() {
        let repository = InMemoryAccountRepository::new();

        repository.create(new_account("a@x.com")).await.unwrap();
        repository.create(new_account("A@x.com")).await.unwrap();

        assert_eq!(repository.len().await, 2);
        assert!(repository.find_by_email("A@X.COM").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_email_and_id() {
        let repository = InMemoryAccountRepository::new();
        let created = repository.create(new_account("a@x.com")).await.unwrap();

        let by_email = repository.find_by_email("a@x.com").await.unwrap().unwrap();
        let by_id = repository.find_by_id(&created.id).await.unwrap().unwrap();

        assert_eq!(by_email.id, created.id);
        assert_eq!(by_id.email, created.email);
        assert!(repository.find_by_id(&AccountId(42)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_registration() {
        let repository = Arc::new(InMemoryAccountRepository::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repository = Arc::clone(&repository);
                tokio::spawn(async move { repository.create(new_account("a@x.com")).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(repository.len().await, 1);
    }
}
