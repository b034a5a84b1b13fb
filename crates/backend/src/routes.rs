use axum::{routing::get, Router};

use crate::api::{handlers, AppState};

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState) -> Router {
    Router::new()
        // ========================================
        // SERVICE ROUTES
        // ========================================
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .route("/test-connection", get(handlers::health::test_connection))
        // ========================================
        // SALES ANALYTICS
        // ========================================
        .route("/sales/overview", get(handlers::sales::overview))
        .route("/sales/daily", get(handlers::sales::daily))
        .route("/sales/monthly-trends", get(handlers::sales::monthly_trends))
        .route("/sales/by-collection", get(handlers::sales::by_collection))
        .route("/sales/by-breed", get(handlers::sales::by_breed))
        .route("/sales/by-size", get(handlers::sales::by_size))
        .route(
            "/sales/size-distribution",
            get(handlers::sales::size_distribution),
        )
        .route(
            "/sales/color-preferences",
            get(handlers::sales::color_preferences),
        )
        .route("/sales/filter-options", get(handlers::sales::filter_options))
        // ========================================
        // CUSTOMER ANALYTICS
        // ========================================
        .route(
            "/sales/customers/lifetime-value",
            get(handlers::sales::lifetime_value),
        )
        .route("/sales/customers/top", get(handlers::sales::top_customers))
        .route(
            "/sales/customers/repeat-rate",
            get(handlers::sales::repeat_rate),
        )
        .route(
            "/sales/customers/acquisition",
            get(handlers::sales::acquisition),
        )
        .with_state(state)
}
