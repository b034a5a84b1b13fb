use serde::{Deserialize, Serialize};

/// Filter query parameters shared by every /sales endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesFilterParams {
    /// Start date in format "YYYY-MM-DD" (inclusive)
    pub start_date: Option<String>,
    /// End date in format "YYYY-MM-DD" (inclusive, whole day)
    pub end_date: Option<String>,
    /// Exact shirt size, e.g. "M"
    pub size: Option<String>,
    /// Exact collection code, e.g. "WUUF-005"
    pub collection: Option<String>,
    /// Exact dog breed, e.g. "Dachshund"
    pub breed: Option<String>,
    /// Exact sales channel, e.g. "Instagram"
    pub channel: Option<String>,
}

impl SalesFilterParams {
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.size.is_none()
            && self.collection.is_none()
            && self.breed.is_none()
            && self.channel.is_none()
    }
}

/// Response envelope: metric payload + the filters that produced it + cache state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
    pub filters_applied: SalesFilterParams,
    pub cache_info: crate::shared::cache::CacheInfo,
}

/// Overall sales summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesOverview {
    pub total_revenue: f64,
    pub total_cost: f64,
    pub total_profit: f64,
    /// Count of distinct order ids
    pub total_orders: u64,
    pub total_quantity: i64,
    /// total_revenue / total_orders, 0 when there are no orders
    pub average_order_value: f64,
}

impl SalesOverview {
    pub fn zero() -> Self {
        Self {
            total_revenue: 0.0,
            total_cost: 0.0,
            total_profit: 0.0,
            total_orders: 0,
            total_quantity: 0,
            average_order_value: 0.0,
        }
    }
}

/// Per-day sales metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySalesRow {
    /// Date in format "YYYY-MM-DD"
    pub date: String,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub quantity: i64,
    pub orders: u64,
}

/// Per-collection sales metrics, ordered by revenue descending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSalesRow {
    pub collection: String,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub quantity: i64,
    pub orders: u64,
}

/// Per-breed sales metrics, ordered by revenue descending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreedSalesRow {
    pub breed: String,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub quantity: i64,
    pub orders: u64,
}

/// Per-size sales metrics, in canonical size order (XS..4XL)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeSalesRow {
    pub size: String,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub quantity: i64,
    pub orders: u64,
}

/// Size share of total quantity, in canonical size order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeDistributionRow {
    pub size: String,
    pub quantity: i64,
    /// Share of total quantity, percent
    pub percentage: f64,
}

/// Shirt color preference within a breed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorPreferenceRow {
    pub breed: String,
    pub color: String,
    pub quantity: i64,
    pub revenue: f64,
    /// Share of the breed's quantity, percent (not global share)
    pub percentage: f64,
}

/// Month-over-month sales trend row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyTrendRow {
    /// Period in format "YYYY-MM"
    pub month: String,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub quantity: i64,
    pub orders: u64,
    /// Distinct customers in the period
    pub customers: u64,
    /// Revenue growth vs previous period, percent; None for the first period
    pub revenue_growth: Option<f64>,
    /// Orders growth vs previous period, percent; None for the first period
    pub orders_growth: Option<f64>,
}

/// Per-customer lifetime metrics, ordered by revenue descending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerLifetimeValue {
    pub customer: String,
    pub total_revenue: f64,
    pub total_profit: f64,
    pub total_orders: u64,
    pub total_quantity: i64,
    pub avg_order_value: f64,
    /// Date of the first order, "YYYY-MM-DD"; None when no order carries a date
    pub first_order_date: Option<String>,
    /// Date of the most recent order, "YYYY-MM-DD"
    pub last_order_date: Option<String>,
    /// Days between first and last order; 0 for a single order
    pub lifetime_days: i64,
    /// Days since the last order; None when no order carries a date
    pub recency_days: Option<i64>,
    /// Most recently seen non-empty Instagram handle
    pub instagram: Option<String>,
    /// Most recently seen non-empty cleaned phone number
    pub phone: Option<String>,
}

/// Top-N customer row with 1-based rank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopCustomerRow {
    pub rank: u32,
    pub customer: String,
    pub total_revenue: f64,
    pub total_profit: f64,
    pub total_orders: u64,
    pub total_quantity: i64,
}

/// Repeat purchase statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepeatRateStats {
    pub total_customers: u64,
    /// Customers with 2+ distinct orders
    pub repeat_customers: u64,
    pub new_customers: u64,
    /// repeat_customers / total_customers, percent
    pub repeat_rate: f64,
    pub average_orders_per_customer: f64,
}

/// New customers attributed to the channel of their first order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionChannelRow {
    pub channel: String,
    pub new_customers: u64,
    /// Share of all customers, percent
    pub percentage: f64,
}

/// Distinct filter values currently present in the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOptions {
    pub sizes: Vec<String>,
    pub collections: Vec<String>,
    pub breeds: Vec<String>,
    pub channels: Vec<String>,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    /// Earliest order date, "YYYY-MM-DD"
    pub min_date: Option<String>,
    /// Latest order date, "YYYY-MM-DD"
    pub max_date: Option<String>,
}
