use std::collections::{BTreeMap, HashMap, HashSet};

use contracts::sales::dto::{
    BreedSalesRow, CollectionSalesRow, ColorPreferenceRow, DailySalesRow, MonthlyTrendRow,
    SalesOverview, SizeDistributionRow, SizeSalesRow,
};

use crate::domain::transaction::{size_rank, Transaction};
use crate::shared::format::round2;

/// Накопитель стандартного набора метрик по группе строк
#[derive(Default)]
struct MetricAcc {
    revenue: f64,
    cost: f64,
    profit: f64,
    quantity: i64,
    orders: HashSet<String>,
}

impl MetricAcc {
    fn add(&mut self, t: &Transaction) {
        self.revenue += t.line_subtotal;
        self.cost += t.cogs;
        self.profit += t.line_profit;
        self.quantity += t.qty;
        self.orders.insert(t.order_id.clone());
    }

    fn orders_count(&self) -> u64 {
        self.orders.len() as u64
    }
}

/// Overall summary: totals + average order value (0-safe divide)
pub fn sales_overview(rows: &[Transaction]) -> SalesOverview {
    if rows.is_empty() {
        return SalesOverview::zero();
    }

    let mut acc = MetricAcc::default();
    for t in rows {
        acc.add(t);
    }

    let total_orders = acc.orders_count();
    let average_order_value = if total_orders > 0 {
        acc.revenue / total_orders as f64
    } else {
        0.0
    };

    SalesOverview {
        total_revenue: round2(acc.revenue),
        total_cost: round2(acc.cost),
        total_profit: round2(acc.profit),
        total_orders,
        total_quantity: acc.quantity,
        average_order_value: round2(average_order_value),
    }
}

/// Per-day metrics, date ascending. Rows without a parsed date stay out.
pub fn daily_sales(rows: &[Transaction]) -> Vec<DailySalesRow> {
    let mut groups: BTreeMap<chrono::NaiveDate, MetricAcc> = BTreeMap::new();
    for t in rows {
        if let Some(date) = t.order_date {
            groups.entry(date).or_default().add(t);
        }
    }

    groups
        .into_iter()
        .map(|(date, acc)| DailySalesRow {
            date: date.to_string(),
            revenue: round2(acc.revenue),
            cost: round2(acc.cost),
            profit: round2(acc.profit),
            quantity: acc.quantity,
            orders: acc.orders_count(),
        })
        .collect()
}

/// Month-over-month trends with growth vs the previous result row.
/// The first period has no base, so its growth fields stay None; a
/// zero-valued base also yields None (infinite growth is meaningless).
pub fn monthly_trends(rows: &[Transaction]) -> Vec<MonthlyTrendRow> {
    let mut groups: BTreeMap<String, (MetricAcc, HashSet<String>)> = BTreeMap::new();
    for t in rows {
        if let Some(date) = t.order_date {
            let entry = groups.entry(date.format("%Y-%m").to_string()).or_default();
            entry.0.add(t);
            if let Some(customer) = &t.customer_name {
                entry.1.insert(customer.clone());
            }
        }
    }

    let mut result = Vec::with_capacity(groups.len());
    let mut prev: Option<(f64, u64)> = None;
    for (month, (acc, customers)) in groups {
        let orders = acc.orders_count();
        let (revenue_growth, orders_growth) = match prev {
            Some((prev_revenue, prev_orders)) => (
                growth_pct(acc.revenue, prev_revenue),
                growth_pct(orders as f64, prev_orders as f64),
            ),
            None => (None, None),
        };
        prev = Some((acc.revenue, orders));

        result.push(MonthlyTrendRow {
            month,
            revenue: round2(acc.revenue),
            cost: round2(acc.cost),
            profit: round2(acc.profit),
            quantity: acc.quantity,
            orders,
            customers: customers.len() as u64,
            revenue_growth,
            orders_growth,
        });
    }
    result
}

fn growth_pct(current: f64, base: f64) -> Option<f64> {
    if base > 0.0 {
        Some(round2((current - base) / base * 100.0))
    } else {
        None
    }
}

/// Per-collection metrics, revenue descending
pub fn sales_by_collection(rows: &[Transaction]) -> Vec<CollectionSalesRow> {
    let mut groups: HashMap<String, MetricAcc> = HashMap::new();
    for t in rows {
        groups.entry(t.collection.clone()).or_default().add(t);
    }

    let mut result: Vec<CollectionSalesRow> = groups
        .into_iter()
        .map(|(collection, acc)| CollectionSalesRow {
            collection,
            revenue: round2(acc.revenue),
            cost: round2(acc.cost),
            profit: round2(acc.profit),
            quantity: acc.quantity,
            orders: acc.orders_count(),
        })
        .collect();
    sort_by_revenue_desc(&mut result, |r| (r.revenue, r.collection.clone()));
    result
}

/// Per-breed metrics, revenue descending. Rows with no joined breed stay out.
pub fn sales_by_breed(rows: &[Transaction]) -> Vec<BreedSalesRow> {
    let mut groups: HashMap<String, MetricAcc> = HashMap::new();
    for t in rows {
        if let Some(breed) = &t.dog_breed {
            groups.entry(breed.clone()).or_default().add(t);
        }
    }

    let mut result: Vec<BreedSalesRow> = groups
        .into_iter()
        .map(|(breed, acc)| BreedSalesRow {
            breed,
            revenue: round2(acc.revenue),
            cost: round2(acc.cost),
            profit: round2(acc.profit),
            quantity: acc.quantity,
            orders: acc.orders_count(),
        })
        .collect();
    sort_by_revenue_desc(&mut result, |r| (r.revenue, r.breed.clone()));
    result
}

/// Per-size metrics in canonical size order (XS..4XL, unknowns last)
pub fn sales_by_size(rows: &[Transaction]) -> Vec<SizeSalesRow> {
    let mut groups: HashMap<String, MetricAcc> = HashMap::new();
    for t in rows {
        if !t.size.is_empty() {
            groups.entry(t.size.clone()).or_default().add(t);
        }
    }

    let mut result: Vec<SizeSalesRow> = groups
        .into_iter()
        .map(|(size, acc)| SizeSalesRow {
            size,
            revenue: round2(acc.revenue),
            cost: round2(acc.cost),
            profit: round2(acc.profit),
            quantity: acc.quantity,
            orders: acc.orders_count(),
        })
        .collect();
    result.sort_by(|a, b| {
        (size_rank(&a.size), &a.size).cmp(&(size_rank(&b.size), &b.size))
    });
    result
}

/// Size share of total quantity, canonical size order
pub fn size_distribution(rows: &[Transaction]) -> Vec<SizeDistributionRow> {
    let mut quantities: HashMap<String, i64> = HashMap::new();
    for t in rows {
        if !t.size.is_empty() {
            *quantities.entry(t.size.clone()).or_default() += t.qty;
        }
    }

    let total: i64 = quantities.values().sum();
    let mut result: Vec<SizeDistributionRow> = quantities
        .into_iter()
        .map(|(size, quantity)| SizeDistributionRow {
            size,
            quantity,
            percentage: if total > 0 {
                round2(quantity as f64 / total as f64 * 100.0)
            } else {
                0.0
            },
        })
        .collect();
    result.sort_by(|a, b| {
        (size_rank(&a.size), &a.size).cmp(&(size_rank(&b.size), &b.size))
    });
    result
}

/// Shirt color preferences per breed; percentage is the color's share of the
/// breed's quantity, not of the whole table. Ordered breed asc, quantity desc.
pub fn color_preferences_by_breed(rows: &[Transaction]) -> Vec<ColorPreferenceRow> {
    let mut groups: HashMap<(String, String), (i64, f64)> = HashMap::new();
    for t in rows {
        let Some(breed) = &t.dog_breed else { continue };
        if t.shirt_color.is_empty() {
            continue;
        }
        let entry = groups
            .entry((breed.clone(), t.shirt_color.clone()))
            .or_default();
        entry.0 += t.qty;
        entry.1 += t.line_subtotal;
    }

    let mut breed_totals: HashMap<String, i64> = HashMap::new();
    for ((breed, _), (quantity, _)) in &groups {
        *breed_totals.entry(breed.clone()).or_default() += quantity;
    }

    let mut result: Vec<ColorPreferenceRow> = groups
        .into_iter()
        .map(|((breed, color), (quantity, revenue))| {
            let breed_total = breed_totals.get(&breed).copied().unwrap_or(0);
            ColorPreferenceRow {
                percentage: if breed_total > 0 {
                    round2(quantity as f64 / breed_total as f64 * 100.0)
                } else {
                    0.0
                },
                breed,
                color,
                quantity,
                revenue: round2(revenue),
            }
        })
        .collect();
    result.sort_by(|a, b| {
        a.breed
            .cmp(&b.breed)
            .then(b.quantity.cmp(&a.quantity))
            .then(a.color.cmp(&b.color))
    });
    result
}

/// Revenue descending with a deterministic name tie-break
fn sort_by_revenue_desc<T, K: FnMut(&T) -> (f64, String)>(rows: &mut [T], mut key: K) {
    rows.sort_by(|a, b| {
        let (rev_a, name_a) = key(a);
        let (rev_b, name_b) = key(b);
        rev_b
            .partial_cmp(&rev_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(name_a.cmp(&name_b))
    });
}
