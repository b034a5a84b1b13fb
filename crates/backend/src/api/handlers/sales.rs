use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use contracts::sales::dto::{
    AcquisitionChannelRow, ApiEnvelope, BreedSalesRow, CollectionSalesRow, ColorPreferenceRow,
    CustomerLifetimeValue, DailySalesRow, FilterOptions, MonthlyTrendRow, RepeatRateStats,
    SalesFilterParams, SalesOverview, SizeDistributionRow, SizeSalesRow, TopCustomerRow,
};
use contracts::shared::cache::CacheInfo;
use serde::Deserialize;

use crate::analytics::{customers, filters, sales};
use crate::api::AppState;
use crate::domain::transaction::Transaction;

const DEFAULT_TOP_LIMIT: i64 = 10;
const MAX_TOP_LIMIT: i64 = 100;

/// Таблица транзакций из кэша; при недоступном источнике без запасных
/// данных отвечаем 500
async fn load_table(
    state: &AppState,
) -> Result<(Arc<Vec<Transaction>>, CacheInfo), StatusCode> {
    match state.cache.get_or_refresh(Utc::now()).await {
        Ok(hit) => Ok((hit.transactions, hit.info)),
        Err(e) => {
            tracing::error!("Failed to load transaction data: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn envelope<T>(data: T, filters_applied: SalesFilterParams, cache_info: CacheInfo) -> ApiEnvelope<T> {
    ApiEnvelope {
        data,
        filters_applied,
        cache_info,
    }
}

/// GET /sales/overview
pub async fn overview(
    State(state): State<AppState>,
    Query(params): Query<SalesFilterParams>,
) -> Result<Json<ApiEnvelope<SalesOverview>>, StatusCode> {
    let (rows, cache_info) = load_table(&state).await?;
    let filtered = filters::apply_filters(&rows, &params);
    let data = sales::sales_overview(&filtered);
    tracing::info!(
        "Sales overview: {} rows after filters, revenue {}",
        filtered.len(),
        data.total_revenue
    );
    Ok(Json(envelope(data, params, cache_info)))
}

/// GET /sales/daily
pub async fn daily(
    State(state): State<AppState>,
    Query(params): Query<SalesFilterParams>,
) -> Result<Json<ApiEnvelope<Vec<DailySalesRow>>>, StatusCode> {
    let (rows, cache_info) = load_table(&state).await?;
    let filtered = filters::apply_filters(&rows, &params);
    let data = sales::daily_sales(&filtered);
    Ok(Json(envelope(data, params, cache_info)))
}

/// GET /sales/monthly-trends
pub async fn monthly_trends(
    State(state): State<AppState>,
    Query(params): Query<SalesFilterParams>,
) -> Result<Json<ApiEnvelope<Vec<MonthlyTrendRow>>>, StatusCode> {
    let (rows, cache_info) = load_table(&state).await?;
    let filtered = filters::apply_filters(&rows, &params);
    let data = sales::monthly_trends(&filtered);
    Ok(Json(envelope(data, params, cache_info)))
}

/// GET /sales/by-collection
pub async fn by_collection(
    State(state): State<AppState>,
    Query(params): Query<SalesFilterParams>,
) -> Result<Json<ApiEnvelope<Vec<CollectionSalesRow>>>, StatusCode> {
    let (rows, cache_info) = load_table(&state).await?;
    let filtered = filters::apply_filters(&rows, &params);
    let data = sales::sales_by_collection(&filtered);
    Ok(Json(envelope(data, params, cache_info)))
}

/// GET /sales/by-breed
pub async fn by_breed(
    State(state): State<AppState>,
    Query(params): Query<SalesFilterParams>,
) -> Result<Json<ApiEnvelope<Vec<BreedSalesRow>>>, StatusCode> {
    let (rows, cache_info) = load_table(&state).await?;
    let filtered = filters::apply_filters(&rows, &params);
    let data = sales::sales_by_breed(&filtered);
    Ok(Json(envelope(data, params, cache_info)))
}

/// GET /sales/by-size
pub async fn by_size(
    State(state): State<AppState>,
    Query(params): Query<SalesFilterParams>,
) -> Result<Json<ApiEnvelope<Vec<SizeSalesRow>>>, StatusCode> {
    let (rows, cache_info) = load_table(&state).await?;
    let filtered = filters::apply_filters(&rows, &params);
    let data = sales::sales_by_size(&filtered);
    Ok(Json(envelope(data, params, cache_info)))
}

/// GET /sales/size-distribution
pub async fn size_distribution(
    State(state): State<AppState>,
    Query(params): Query<SalesFilterParams>,
) -> Result<Json<ApiEnvelope<Vec<SizeDistributionRow>>>, StatusCode> {
    let (rows, cache_info) = load_table(&state).await?;
    let filtered = filters::apply_filters(&rows, &params);
    let data = sales::size_distribution(&filtered);
    Ok(Json(envelope(data, params, cache_info)))
}

/// GET /sales/color-preferences
pub async fn color_preferences(
    State(state): State<AppState>,
    Query(params): Query<SalesFilterParams>,
) -> Result<Json<ApiEnvelope<Vec<ColorPreferenceRow>>>, StatusCode> {
    let (rows, cache_info) = load_table(&state).await?;
    let filtered = filters::apply_filters(&rows, &params);
    let data = sales::color_preferences_by_breed(&filtered);
    Ok(Json(envelope(data, params, cache_info)))
}

/// GET /sales/customers/lifetime-value
pub async fn lifetime_value(
    State(state): State<AppState>,
    Query(params): Query<SalesFilterParams>,
) -> Result<Json<ApiEnvelope<Vec<CustomerLifetimeValue>>>, StatusCode> {
    let (rows, cache_info) = load_table(&state).await?;
    let filtered = filters::apply_filters(&rows, &params);
    let data = customers::customer_lifetime_value(&filtered, Utc::now().date_naive());
    tracing::info!("CLV: {} customers", data.len());
    Ok(Json(envelope(data, params, cache_info)))
}

#[derive(Deserialize)]
pub struct TopCustomersParams {
    pub limit: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub size: Option<String>,
    pub collection: Option<String>,
    pub breed: Option<String>,
    pub channel: Option<String>,
}

/// Валидация лимита: минимум 1, максимум 100, по умолчанию 10
fn clamp_top_limit(requested: Option<i64>) -> i64 {
    match requested {
        Some(lim) if lim < 1 => {
            tracing::warn!("Top customers: invalid limit {} (too small), using 1", lim);
            1
        }
        Some(lim) if lim > MAX_TOP_LIMIT => {
            tracing::warn!(
                "Top customers: invalid limit {} (too large), using max {}",
                lim,
                MAX_TOP_LIMIT
            );
            MAX_TOP_LIMIT
        }
        Some(lim) => lim,
        None => DEFAULT_TOP_LIMIT,
    }
}

/// GET /sales/customers/top?limit=10
pub async fn top_customers(
    State(state): State<AppState>,
    Query(params): Query<TopCustomersParams>,
) -> Result<Json<ApiEnvelope<Vec<TopCustomerRow>>>, StatusCode> {
    let limit = clamp_top_limit(params.limit);

    let filters_applied = SalesFilterParams {
        start_date: params.start_date,
        end_date: params.end_date,
        size: params.size,
        collection: params.collection,
        breed: params.breed,
        channel: params.channel,
    };

    let (rows, cache_info) = load_table(&state).await?;
    let filtered = filters::apply_filters(&rows, &filters_applied);
    let data = customers::top_customers(&filtered, limit as usize);
    Ok(Json(envelope(data, filters_applied, cache_info)))
}

/// GET /sales/customers/repeat-rate
pub async fn repeat_rate(
    State(state): State<AppState>,
    Query(params): Query<SalesFilterParams>,
) -> Result<Json<ApiEnvelope<RepeatRateStats>>, StatusCode> {
    let (rows, cache_info) = load_table(&state).await?;
    let filtered = filters::apply_filters(&rows, &params);
    let data = customers::customer_repeat_rate(&filtered);
    Ok(Json(envelope(data, params, cache_info)))
}

/// GET /sales/customers/acquisition
pub async fn acquisition(
    State(state): State<AppState>,
    Query(params): Query<SalesFilterParams>,
) -> Result<Json<ApiEnvelope<Vec<AcquisitionChannelRow>>>, StatusCode> {
    let (rows, cache_info) = load_table(&state).await?;
    let filtered = filters::apply_filters(&rows, &params);
    let data = customers::customer_acquisition(&filtered);
    Ok(Json(envelope(data, params, cache_info)))
}

/// GET /sales/filter-options — значения для фронтовых дропдаунов,
/// считаются по всей таблице, без фильтров
pub async fn filter_options(
    State(state): State<AppState>,
) -> Result<Json<ApiEnvelope<FilterOptions>>, StatusCode> {
    let (rows, cache_info) = load_table(&state).await?;
    let data = filters::filter_options(&rows);
    Ok(Json(envelope(data, SalesFilterParams::default(), cache_info)))
}
