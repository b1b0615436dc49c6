use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{TokenRepository, UserRepository};
use crate::auth::{AuthError, Clock, SystemClock};
use crate::models::{NewUser, RefreshTokenRecord, User};

#[derive(Default)]
struct TokenTable {
    next_id: i32,
    rows: HashMap<String, RefreshTokenRecord>,
}

/// In-process refresh token store.
///
/// `set_unavailable(true)` makes every call fail with `StoreFailure`, which is
/// how the suites exercise an outage of the backing store.
pub struct MemoryTokenRepository {
    table: RwLock<TokenTable>,
    unavailable: AtomicBool,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryTokenRepository {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl MemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps `created_at` from `clock` instead of wall-clock time.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            table: RwLock::new(TokenTable::default()),
            unavailable: AtomicBool::new(false),
            clock,
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_available(&self) -> Result<(), AuthError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthError::StoreFailure("token store unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenRepository for MemoryTokenRepository {
    async fn insert(
        &self,
        user_id: i32,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.check_available()?;
        let mut table = self.table.write().await;
        if table.rows.contains_key(token) {
            return Err(AuthError::StoreFailure(
                "duplicate refresh token".into(),
            ));
        }

        table.next_id += 1;
        let record = RefreshTokenRecord {
            id: table.next_id,
            user_id,
            token: token.to_string(),
            expires_at,
            created_at: self.clock.now(),
        };
        table.rows.insert(record.token.clone(), record);
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AuthError> {
        self.check_available()?;
        Ok(self.table.read().await.rows.get(token).cloned())
    }

    async fn delete_by_token(&self, token: &str) -> Result<(), AuthError> {
        self.check_available()?;
        self.table.write().await.rows.remove(token);
        Ok(())
    }

    async fn delete_by_user(&self, user_id: i32) -> Result<(), AuthError> {
        self.check_available()?;
        self.table
            .write()
            .await
            .rows
            .retain(|_, record| record.user_id != user_id);
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        self.check_available()?;
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|_, record| record.expires_at >= now);
        Ok((before - table.rows.len()) as u64)
    }
}

/// In-process account store.
pub struct MemoryUserRepository {
    users: RwLock<Vec<User>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: RwLock::new(Vec::new()),
            clock,
        }
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == user.username) {
            return Err(AuthError::UsernameTaken);
        }

        let now = self.clock.now();
        let created = User {
            id: users.len() as i32 + 1,
            username: user.username,
            name: user.name,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn count(&self) -> Result<i64, AuthError> {
        Ok(self.users.read().await.len() as i64)
    }
}
