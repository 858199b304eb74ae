//! Authentication utilities library
//!
//! Provides the authentication core of the todo service:
//! - Password hashing (Argon2id, fixed cost)
//! - Access token issuing and verification (HS256 JWT, HMAC family only)
//! - Authentication coordination
//!
//! The service adapts these implementations behind its own ports.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::{HashCost, PasswordHasher};
//!
//! let hasher = PasswordHasher::new(HashCost::new(1024, 1, 1)).unwrap();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("other_password", &hash));
//! ```
//!
//! ## JWT Tokens
//! ```
//! use auth::JwtHandler;
//! use chrono::Duration;
//!
//! let handler = JwtHandler::new(b"secret_key_at_least_32_bytes_long!", Duration::hours(72));
//! let token = handler.issue(42).unwrap();
//! assert_eq!(handler.verify(&token).unwrap(), 42);
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, HashCost};
//! use chrono::Duration;
//!
//! let auth = Authenticator::new(
//!     b"secret_key_at_least_32_bytes_long!",
//!     HashCost::new(1024, 1, 1),
//!     Duration::hours(72),
//! )
//! .unwrap();
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and generate token
//! let result = auth.authenticate("password123", &hash, 1).unwrap();
//!
//! // Validate token
//! let account_id = auth.validate_token(&result.access_token).unwrap();
//! assert_eq!(account_id, 1);
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use password::HashCost;
pub use password::PasswordError;
pub use password::PasswordHasher;
