pub mod analytics;
pub mod api;
pub mod domain;
pub mod routes;
pub mod shared;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use axum::body::Body;
    use axum::http::Request;
    use axum::middleware::{self, Next};
    use axum::response::Response;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    // Создаем директорию для логов
    let log_dir = std::path::Path::new("target").join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file_path = log_dir.join("backend.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .init();

    // Простой middleware для логирования запросов
    async fn request_logger(req: Request<Body>, next: Next) -> Response {
        use chrono::Utc;

        let start = std::time::Instant::now();
        let method = req.method().clone();
        let uri = req.uri().clone();

        let response = next.run(req).await;

        let duration = start.elapsed();
        let status = response.status();
        // Голубой для 200, коричневый для остальных
        let color_code = if status.as_u16() == 200 { "36" } else { "33" };
        println!(
            "\x1b[{}m{}\x1b[0m | {:>5}ms | {} {:>6} {}",
            color_code,
            Utc::now().format("%H:%M:%S"),
            duration.as_millis(),
            status.as_u16(),
            method,
            uri.path()
        );

        response
    }

    let config = shared::config::load_config()?;
    if config.google.sheet_id.is_empty() {
        tracing::warn!("google.sheet_id is empty — set GOOGLE_SHEET_ID or config.toml");
    }

    let key = shared::sheets::ServiceAccountKey::load(&config.google)?;
    let source: Arc<dyn shared::data::source::TableSource> =
        Arc::new(shared::sheets::GoogleSheetsClient::new(
            config.google.sheet_id.clone(),
            key,
        ));
    let cache = Arc::new(shared::data::cache::DataCache::new(source.clone()));
    let state = api::AppState { cache, source };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure_routes(state)
        .layer(middleware::from_fn(request_logger))
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("WUUF Analytics API listening on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
