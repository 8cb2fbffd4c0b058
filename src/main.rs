mod config;
mod db;
mod handlers;
mod models;
mod services;
mod state;

use actix_cors::Cors;
use actix_web::middleware::NormalizePath;
use actix_web::{web, App, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    let port = config.port;

    let pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to initialize SQLite pool");
    let app_state = web::Data::new(AppState::new(pool, config));

    info!(port, "starting chat user backend");

    HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::trim())
            .wrap(Cors::permissive())
            .app_data(app_state.clone())
            .route("/health", web::get().to(handlers::health_check))
            .route("/signup", web::post().to(handlers::users::signup))
            .route("/login", web::post().to(handlers::users::login))
            .route("/details", web::get().to(handlers::users::details))
            .route("/allUsers", web::get().to(handlers::users::all_users))
            .route("/picture", web::post().to(handlers::users::picture))
            .route("/update", web::post().to(handlers::users::update))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
