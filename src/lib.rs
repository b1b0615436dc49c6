#![doc = "The `taskline` library crate."]
#![doc = ""]
#![doc = "Task and milestone tracking behind username/password login. Sessions are"]
#![doc = "pairs of short-lived access tokens and revocable refresh tokens, managed by"]
#![doc = "[`auth::SessionManager`] over the storage traits in [`repository`]."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;

pub use crate::auth::{AuthError, SessionManager};
pub use crate::error::AppError;
