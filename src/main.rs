use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod handlers;

use handlers::{devig, health};

const DEFAULT_MAX_ROWS: usize = 100_000;

/// Application state shared across handlers
pub struct AppState {
    /// Largest batch accepted by a single request
    pub max_rows: usize,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("{}:{}", host, port);

    let max_rows = std::env::var("MAX_ROWS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_ROWS);

    let app_state = Arc::new(AppState { max_rows });

    info!(
        "Starting Fairline API server at http://{} (max {} rows)",
        addr, max_rows
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().limit(16 * 1024 * 1024))
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(health::health_check))
            .route("/devig", web::post().to(devig::devig))
            .route("/evaluate", web::post().to(devig::evaluate_matches))
    })
    .bind(&addr)?
    .run()
    .await
}
