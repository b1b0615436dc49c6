//! Storage seams for the session layer.
//!
//! The session manager only ever talks to these traits. `postgres` backs them
//! with `sqlx`; `memory` keeps everything in process and is what the test
//! suites run against.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::auth::AuthError;
use crate::models::{NewUser, RefreshTokenRecord, User};

pub use memory::{MemoryTokenRepository, MemoryUserRepository};
pub use postgres::{PgTokenRepository, PgUserRepository};

/// Persistent refresh tokens. Deleting a record is the only way to revoke it.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn insert(
        &self,
        user_id: i32,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AuthError>;

    /// Succeeds whether or not the token was present.
    async fn delete_by_token(&self, token: &str) -> Result<(), AuthError>;

    async fn delete_by_user(&self, user_id: i32) -> Result<(), AuthError>;

    /// Removes every record expiring strictly before `now`, returning how many went.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError>;
}

/// Where accounts and their password digests live.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError>;

    /// Fails with `AuthError::UsernameTaken` if the username is already in use.
    async fn create(&self, user: NewUser) -> Result<User, AuthError>;

    async fn count(&self) -> Result<i64, AuthError>;
}
