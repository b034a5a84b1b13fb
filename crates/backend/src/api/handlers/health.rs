use axum::{extract::State, Json};
use chrono::Utc;

use crate::api::AppState;
use crate::shared::data::loader::ORDERS_SHEET;

/// GET / — сводка по API и список эндпоинтов
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "online",
        "message": "WUUF Analytics API is running",
        "endpoints": {
            "health": "/health",
            "sales_overview": "/sales/overview",
            "daily_sales": "/sales/daily",
            "monthly_trends": "/sales/monthly-trends",
            "sales_by_collection": "/sales/by-collection",
            "sales_by_breed": "/sales/by-breed",
            "sales_by_size": "/sales/by-size",
            "size_distribution": "/sales/size-distribution",
            "color_preferences": "/sales/color-preferences",
            "customer_lifetime_value": "/sales/customers/lifetime-value",
            "top_customers": "/sales/customers/top",
            "customer_repeat_rate": "/sales/customers/repeat-rate",
            "customer_acquisition": "/sales/customers/acquisition",
            "filter_options": "/sales/filter-options",
            "test_connection": "/test-connection"
        }
    }))
}

/// GET /health — состояние процесса и кэша (без загрузки данных)
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let cache_info = state.cache.info(Utc::now()).await;
    Json(serde_json::json!({
        "status": "healthy",
        "cache": cache_info,
    }))
}

/// GET /test-connection — живая проверка доступа к Google Sheets, мимо кэша.
/// Один запрос листа Orders покрывает ключ, токен и права на таблицу.
pub async fn test_connection(State(state): State<AppState>) -> Json<serde_json::Value> {
    match state.source.fetch_table(ORDERS_SHEET).await {
        Ok(table) => Json(serde_json::json!({
            "success": true,
            "worksheet": ORDERS_SHEET,
            "rows": table.rows.len(),
            "error": null,
        })),
        Err(e) => {
            tracing::warn!("Connection check failed: {}", e);
            Json(serde_json::json!({
                "success": false,
                "worksheet": ORDERS_SHEET,
                "error": e.to_string(),
            }))
        }
    }
}
