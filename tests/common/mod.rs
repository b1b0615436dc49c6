#![allow(dead_code)]

use std::sync::Arc;

use actix_web::web;
use chrono::{DateTime, TimeZone, Utc};
use taskline::auth::{ManualClock, SessionManager, SessionSettings, TokenCodec};
use taskline::repository::{MemoryTokenRepository, MemoryUserRepository};

pub const SECRET: &str = "integration-test-secret";

/// Lowest bcrypt cost; keeps registration fast.
pub const TEST_COST: u32 = 4;

/// A session manager wired to in-memory stores and a clock the test controls.
pub struct Harness {
    pub sessions: web::Data<SessionManager>,
    pub tokens: Arc<MemoryTokenRepository>,
    pub users: Arc<MemoryUserRepository>,
    pub clock: Arc<ManualClock>,
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn settings() -> SessionSettings {
    SessionSettings {
        password_cost: TEST_COST,
        ..SessionSettings::default()
    }
}

pub fn harness() -> Harness {
    harness_with(settings())
}

pub fn harness_with(settings: SessionSettings) -> Harness {
    let clock = Arc::new(ManualClock::new(start_time()));
    let tokens = Arc::new(MemoryTokenRepository::with_clock(clock.clone()));
    let users = Arc::new(MemoryUserRepository::with_clock(clock.clone()));

    let sessions = SessionManager::new(
        TokenCodec::new(SECRET).expect("test secret is not empty"),
        tokens.clone(),
        users.clone(),
        clock.clone(),
        settings,
    );

    Harness {
        sessions: web::Data::new(sessions),
        tokens,
        users,
        clock,
    }
}
