use crate::{
    auth::{AuthError, AuthenticatedUser, SessionManager},
    error::AppError,
};
use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_users: Option<i64>,
}

/// Current user
///
/// Returns the profile behind the access token, plus the total number of
/// registered users when it can be counted.
#[get("/me")]
pub async fn me(
    sessions: web::Data<SessionManager>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let (account, organization_users) = match sessions.profile(user.0.user_id).await {
        Ok(profile) => profile,
        Err(AuthError::IdentityNotFound) => {
            return Err(AppError::NotFound("User not found".into()))
        }
        Err(e) => return Err(e.into()),
    };

    Ok(HttpResponse::Ok().json(CurrentUser {
        id: account.id,
        username: account.username,
        name: account.name,
        organization_users,
    }))
}
