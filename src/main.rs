use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use motbook::config::AppConfig;
use motbook::db;
use motbook::handlers;
use motbook::services::notify::mailer::HttpMailer;
use motbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let notifier = HttpMailer::new(
        config.mail_api_url.clone(),
        config.mail_api_key.clone(),
        config.mail_from.clone(),
        config.admin_email.clone(),
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        notifier: Box::new(notifier),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/slots", get(handlers::slots::get_slots))
        .route(
            "/api/slots/disabled-dates",
            get(handlers::slots::get_disabled_dates),
        )
        .route("/api/bookings/check", post(handlers::bookings::check_booking))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route(
            "/api/payments/capture",
            post(handlers::payments::capture_payment),
        )
        .route(
            "/api/payments/:order_id/cancel",
            post(handlers::payments::cancel_payment),
        )
        .route(
            "/api/admin/bookings",
            get(handlers::admin::list_bookings).post(handlers::admin::create_booking),
        )
        .route(
            "/api/admin/bookings/:id",
            get(handlers::admin::get_booking)
                .put(handlers::admin::update_booking)
                .delete(handlers::admin::delete_booking),
        )
        .route("/api/admin/slots/block", post(handlers::admin::block_slots))
        .route(
            "/api/admin/slots/unblock",
            post(handlers::admin::unblock_slots),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
