use crate::{
    auth::{
        AuthResponse, AuthenticatedUser, LoginRequest, RefreshRequest, RefreshResponse,
        RegisterRequest, SessionManager,
    },
    error::AppError,
};
use actix_web::{post, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Register a new user
///
/// Creates a new account and returns a fresh token pair.
#[post("/register")]
pub async fn register(
    sessions: web::Data<SessionManager>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let (user, pair) = sessions
        .register(
            &register_data.username,
            &register_data.name,
            &register_data.password,
        )
        .await?;

    Ok(HttpResponse::Created().json(AuthResponse::new(&user, pair)))
}

/// Login user
///
/// Checks the username and password and returns a fresh token pair.
#[post("/login")]
pub async fn login(
    sessions: web::Data<SessionManager>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let (user, pair) = sessions
        .login(&login_data.username, &login_data.password)
        .await?;

    Ok(HttpResponse::Ok().json(AuthResponse::new(&user, pair)))
}

/// Refresh access token
///
/// Exchanges a refresh token for a new access token. The refresh token itself
/// stays valid.
#[post("/refresh")]
pub async fn refresh(
    sessions: web::Data<SessionManager>,
    refresh_data: web::Json<RefreshRequest>,
) -> Result<impl Responder, AppError> {
    refresh_data.validate()?;

    let access_token = sessions.refresh(&refresh_data.refresh_token).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse { access_token }))
}

/// Logout
///
/// Revokes the given refresh token. Unknown tokens are accepted silently.
#[post("/logout")]
pub async fn logout(
    sessions: web::Data<SessionManager>,
    refresh_data: web::Json<RefreshRequest>,
) -> Result<impl Responder, AppError> {
    refresh_data.validate()?;

    sessions.revoke(&refresh_data.refresh_token).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Logged out" })))
}

/// Logout everywhere
///
/// Revokes every refresh token of the authenticated user.
#[post("/logout-all")]
pub async fn logout_all(
    sessions: web::Data<SessionManager>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    sessions.revoke_all(user.0.user_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Logged out of all sessions" })))
}
