pub mod auth;
pub mod health;
pub mod milestones;
pub mod tasks;
pub mod user;

use actix_web::web;

/// Authentication routes. They only need a `SessionManager` in app data.
pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::register)
            .service(auth::refresh)
            .service(auth::logout)
            .service(auth::logout_all),
    )
    .service(web::scope("/user").service(user::me));
}

/// Task and milestone routes, backed by a `PgPool` in app data.
pub fn records_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tasks")
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    )
    .service(
        web::scope("/milestones")
            .service(milestones::get_milestones)
            .service(milestones::create_milestone)
            .service(milestones::get_milestone)
            .service(milestones::update_milestone)
            .service(milestones::delete_milestone),
    );
}

/// Everything mounted under `/api`.
pub fn config(cfg: &mut web::ServiceConfig) {
    auth_config(cfg);
    records_config(cfg);
}
