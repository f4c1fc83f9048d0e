//! HTTP monitoring report server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{error, info, warn};

use http_monitoring_lib::config::Config;
use http_monitoring_lib::services::{ReportReader, storage};
use http_monitoring_lib::{api, logging, middleware};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    // Docker HEALTHCHECK: succeed if the configuration loads
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(if Config::from_env().is_ok() { 0 } else { 1 });
    }

    if let Err(e) = logging::init() {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, HMON_STORAGE must be set to 'local' or 's3'");
            error!("  - In production, S3 credentials must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  HTTP Monitoring Report Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let store = match storage::from_settings(&config.storage).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize {} storage: {}", config.storage.backend_name(), e);
            std::process::exit(1);
        }
    };
    // An unreachable store is not fatal; /ready reports it until it recovers
    if let Err(e) = store.check().await {
        warn!("Report store is not ready yet: {}", e);
    }

    info!(
        "Serving reports from {}:{} (account match: {:?})",
        store.backend(),
        config.reports.reports_root,
        config.reports.account_match
    );

    let reader = web::Data::new(ReportReader::new(Arc::clone(&store), config.reports.clone()));
    let cors_origins = config.cors_origins.clone();
    let bind_address = config.bind_address();
    let worker_count = config.worker_count();

    info!(
        "Starting server at http://{} ({} workers)",
        bind_address, worker_count
    );

    HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            // CORS must wrap before other middleware
            .wrap(cors)
            .wrap(middleware::RequestLogger)
            .app_data(reader.clone())
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_health_routes)
                    .configure(api::configure_report_routes)
                    .configure(api::configure_openapi_routes),
            )
    })
    .workers(worker_count)
    .bind(&bind_address)?
    .run()
    .await
}
