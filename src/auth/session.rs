//! Issuing, checking, refreshing and revoking sessions.
//!
//! A session is a pair of tokens. The access token is self-contained: it is
//! verified by signature and expiry alone and cannot be revoked before it
//! lapses. The refresh token is additionally backed by a row in the token
//! store; deleting that row revokes it for good.
//!
//! Refresh tokens are not rotated. A refresh mints a new access token and
//! leaves the refresh token untouched, so the same refresh token can be used
//! repeatedly (and concurrently) until it expires or is revoked.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::clock::Clock;
use crate::auth::error::AuthError;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::{Claims, TokenCodec};
use crate::models::{Identity, NewUser, User};
use crate::repository::{TokenRepository, UserRepository};

/// Default access token lifetime.
pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 15;
/// Default refresh token lifetime.
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

const DECOY_PASSWORD: &str = "taskline-decoy-password";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Lifetimes and hashing cost the manager runs with.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub password_cost: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(DEFAULT_ACCESS_TTL_MINUTES),
            refresh_ttl: Duration::days(DEFAULT_REFRESH_TTL_DAYS),
            password_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Orchestrates the token codec, the token store and the user store.
///
/// Holds no mutable state of its own, so one instance is shared by every worker.
pub struct SessionManager {
    codec: TokenCodec,
    tokens: Arc<dyn TokenRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    settings: SessionSettings,
    /// Verified against on unknown usernames so both login failures cost one bcrypt check.
    decoy_hash: Option<String>,
}

impl SessionManager {
    pub fn new(
        codec: TokenCodec,
        tokens: Arc<dyn TokenRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
        settings: SessionSettings,
    ) -> Self {
        let decoy_hash = match hash_password(DECOY_PASSWORD, settings.password_cost) {
            Ok(hash) => Some(hash),
            Err(e) => {
                log::warn!("could not prepare decoy password hash: {}", e);
                None
            }
        };

        Self {
            codec,
            tokens,
            users,
            clock,
            settings,
            decoy_hash,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Creates an account and signs it in.
    pub async fn register(
        &self,
        username: &str,
        name: &str,
        password: &str,
    ) -> Result<(User, TokenPair), AuthError> {
        if self.users.find_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = hash_password(password, self.settings.password_cost)?;
        let user = self
            .users
            .create(NewUser {
                username: username.to_string(),
                name: name.to_string(),
                password_hash,
            })
            .await?;
        log::info!("registered user {} ({})", user.id, user.username);

        let pair = self.issue(&user).await?;
        Ok((user, pair))
    }

    /// Checks a username/password pair and signs the user in.
    ///
    /// An unknown username and a wrong password fail identically.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, TokenPair), AuthError> {
        let user = match self.users.find_by_username(username).await? {
            Some(user) => user,
            None => {
                if let Some(decoy) = &self.decoy_hash {
                    let _ = verify_password(password, decoy);
                }
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.issue(&user).await?;
        Ok((user, pair))
    }

    /// Mints an access/refresh pair for `user` and records the refresh token.
    ///
    /// Nothing is returned unless the refresh token was stored.
    pub async fn issue(&self, user: &User) -> Result<TokenPair, AuthError> {
        let now = self.clock.now();
        let access_token = self.mint_access_token(user, now)?;

        let refresh_expires_at = now + self.settings.refresh_ttl;
        let refresh_token = self.codec.encode(&Claims {
            sub: user.id,
            username: None,
            name: None,
            iat: now.timestamp(),
            exp: refresh_expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        })?;

        self.tokens
            .insert(user.id, &refresh_token, refresh_expires_at)
            .await
            .map_err(|e| {
                log::error!("could not store refresh token for user {}: {}", user.id, e);
                e
            })?;

        log::info!("issued session for user {}", user.id);
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Resolves an access token to the identity it was issued for.
    ///
    /// Signature and expiry only; the token store is not consulted.
    pub fn authenticate(&self, access_token: &str) -> Result<Identity, AuthError> {
        let claims = self.codec.decode(access_token, self.clock.now())?;
        match (claims.username, claims.name) {
            (Some(username), Some(name)) => Ok(Identity {
                user_id: claims.sub,
                username,
                name,
            }),
            // Refresh tokens carry no profile and are not accepted here.
            _ => Err(AuthError::InvalidToken),
        }
    }

    /// Exchanges a live refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let now = self.clock.now();
        let claims = self.codec.decode(refresh_token, now)?;

        let record = match self.tokens.find_by_token(refresh_token).await? {
            Some(record) => record,
            None => {
                log::debug!("refresh with unknown or revoked token for user {}", claims.sub);
                return Err(AuthError::InvalidToken);
            }
        };

        if record.is_expired(now) {
            // The sweeper removes the row later if this delete fails.
            if let Err(e) = self.tokens.delete_by_token(refresh_token).await {
                log::warn!(
                    "could not delete expired refresh token for user {}: {}",
                    record.user_id,
                    e
                );
            }
            return Err(AuthError::ExpiredToken);
        }

        let user = self
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        let access_token = self.mint_access_token(&user, now)?;
        log::debug!("refreshed access token for user {}", user.id);
        Ok(access_token)
    }

    /// Revokes a refresh token. Unknown tokens are not an error.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.tokens.delete_by_token(refresh_token).await
    }

    /// Revokes every refresh token `user_id` holds.
    pub async fn revoke_all(&self, user_id: i32) -> Result<(), AuthError> {
        self.tokens.delete_by_user(user_id).await?;
        log::info!("revoked all sessions for user {}", user_id);
        Ok(())
    }

    /// Deletes every refresh token that expired before now.
    pub async fn sweep_expired(&self) -> Result<u64, AuthError> {
        self.tokens.delete_expired(self.clock.now()).await
    }

    /// Looks up the account behind an identity, with the total user count when available.
    pub async fn profile(&self, user_id: i32) -> Result<(User, Option<i64>), AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        let count = match self.users.count().await {
            Ok(count) => Some(count),
            Err(e) => {
                log::warn!("could not count users: {}", e);
                None
            }
        };

        Ok((user, count))
    }

    fn mint_access_token(&self, user: &User, now: DateTime<Utc>) -> Result<String, AuthError> {
        self.codec.encode(&Claims {
            sub: user.id,
            username: Some(user.username.clone()),
            name: Some(user.name.clone()),
            iat: now.timestamp(),
            exp: (now + self.settings.access_ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        })
    }
}
