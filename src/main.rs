use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;

use taskline::auth::{spawn_token_sweeper, AuthMiddleware, SessionManager, SystemClock, TokenCodec};
use taskline::config::Config;
use taskline::repository::{PgTokenRepository, PgUserRepository};
use taskline::routes::{self, health};

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    log::error!("{}: {}", context, e);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| startup_error("invalid configuration", e))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|e| startup_error("failed to connect to database", e))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| startup_error("failed to run migrations", e))?;

    let codec = TokenCodec::new(&config.jwt_secret).map_err(|e| startup_error("invalid JWT_SECRET", e))?;
    let sessions = web::Data::new(SessionManager::new(
        codec,
        Arc::new(PgTokenRepository::new(pool.clone())),
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(SystemClock),
        config.session_settings(),
    ));

    let sweep_every = config
        .token_sweep_interval
        .to_std()
        .map_err(|e| startup_error("invalid TOKEN_SWEEP_INTERVAL", e))?;
    spawn_token_sweeper(sessions.clone().into_inner(), sweep_every);

    log::info!("Starting Taskline server at {}", config.server_url());

    let cors_origin = config.cors_origin.clone();
    let pool_data = web::Data::new(pool);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::ORIGIN,
                header::CONTENT_TYPE,
                header::CONTENT_LENGTH,
                header::ACCEPT_ENCODING,
                header::AUTHORIZATION,
            ])
            .allowed_header("X-CSRF-Token")
            .expose_headers(vec![header::CONTENT_LENGTH])
            .supports_credentials()
            .max_age(12 * 60 * 60);

        App::new()
            .app_data(pool_data.clone())
            .app_data(sessions.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
