use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use blindl_quiz::config::{LoggingSettings, Settings};
use blindl_quiz::routes::{self, quiz::AppState};
use blindl_quiz::services::PostgresSubmissionStore;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "compact" => subscriber.compact().init(),
        _ => subscriber.init(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_tracing(&settings.logging);
    info!("Starting Blindl quiz service...");

    let db_max_conn = settings.database.max_connections.unwrap_or(10);
    let submissions = match PostgresSubmissionStore::from_settings(
        &settings.database.url,
        Some(db_max_conn),
        settings.database.min_connections,
        settings.database.acquire_timeout_secs,
        settings.database.idle_timeout_secs,
    )
    .await
    {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to connect to PostgreSQL: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    info!("PostgreSQL submission store initialized (max: {} connections)", db_max_conn);

    let app_state = AppState::new(submissions);

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .app_data(web::PathConfig::default().error_handler(routes::handle_path_error))
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
