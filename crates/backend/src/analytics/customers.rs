use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use contracts::sales::dto::{
    AcquisitionChannelRow, CustomerLifetimeValue, RepeatRateStats, TopCustomerRow,
};

use crate::domain::transaction::Transaction;
use crate::shared::format::round2;

/// Последнее непустое контактное значение покупателя.
/// Побеждает более поздняя дата заказа; строки без даты считаются самыми
/// ранними; при равенстве побеждает более поздняя строка листа.
#[derive(Default)]
struct ContactSlot {
    date: Option<NaiveDate>,
    seq: usize,
    value: Option<String>,
}

impl ContactSlot {
    fn observe(&mut self, date: Option<NaiveDate>, seq: usize, value: Option<&str>) {
        let Some(value) = value else { return };
        if self.value.is_none() || (date, seq) >= (self.date, self.seq) {
            self.date = date;
            self.seq = seq;
            self.value = Some(value.to_string());
        }
    }
}

#[derive(Default)]
struct CustomerAcc {
    revenue: f64,
    profit: f64,
    quantity: i64,
    orders: HashSet<String>,
    first_order: Option<NaiveDate>,
    last_order: Option<NaiveDate>,
    instagram: ContactSlot,
    phone: ContactSlot,
}

fn group_by_customer(rows: &[Transaction]) -> HashMap<String, CustomerAcc> {
    let mut groups: HashMap<String, CustomerAcc> = HashMap::new();
    for (seq, t) in rows.iter().enumerate() {
        let Some(customer) = &t.customer_name else { continue };
        let acc = groups.entry(customer.clone()).or_default();

        acc.revenue += t.line_subtotal;
        acc.profit += t.line_profit;
        acc.quantity += t.qty;
        acc.orders.insert(t.order_id.clone());
        if let Some(date) = t.order_date {
            acc.first_order = Some(acc.first_order.map_or(date, |d| d.min(date)));
            acc.last_order = Some(acc.last_order.map_or(date, |d| d.max(date)));
        }
        acc.instagram.observe(t.order_date, seq, t.instagram.as_deref());
        acc.phone.observe(t.order_date, seq, t.phone.as_deref());
    }
    groups
}

/// Per-customer lifetime metrics, revenue descending.
/// `today` is the processing date used for recency.
pub fn customer_lifetime_value(
    rows: &[Transaction],
    today: NaiveDate,
) -> Vec<CustomerLifetimeValue> {
    let mut result: Vec<CustomerLifetimeValue> = group_by_customer(rows)
        .into_iter()
        .map(|(customer, acc)| {
            let total_orders = acc.orders.len() as u64;
            let avg_order_value = if total_orders > 0 {
                acc.revenue / total_orders as f64
            } else {
                0.0
            };
            let lifetime_days = match (acc.first_order, acc.last_order) {
                (Some(first), Some(last)) => (last - first).num_days(),
                _ => 0,
            };

            CustomerLifetimeValue {
                customer,
                total_revenue: round2(acc.revenue),
                total_profit: round2(acc.profit),
                total_orders,
                total_quantity: acc.quantity,
                avg_order_value: round2(avg_order_value),
                first_order_date: acc.first_order.map(|d| d.to_string()),
                last_order_date: acc.last_order.map(|d| d.to_string()),
                lifetime_days,
                recency_days: acc.last_order.map(|last| (today - last).num_days()),
                instagram: acc.instagram.value,
                phone: acc.phone.value,
            }
        })
        .collect();

    result.sort_by(|a, b| {
        b.total_revenue
            .partial_cmp(&a.total_revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.customer.cmp(&b.customer))
    });
    result
}

/// Top customers by revenue with a 1-based rank.
/// The caller clamps `limit` to its allowed range.
pub fn top_customers(rows: &[Transaction], limit: usize) -> Vec<TopCustomerRow> {
    let mut ranked: Vec<(String, CustomerAcc)> = group_by_customer(rows).into_iter().collect();
    ranked.sort_by(|(name_a, a), (name_b, b)| {
        b.revenue
            .partial_cmp(&a.revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(name_a.cmp(name_b))
    });

    ranked
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, (customer, acc))| TopCustomerRow {
            rank: idx as u32 + 1,
            customer,
            total_revenue: round2(acc.revenue),
            total_profit: round2(acc.profit),
            total_orders: acc.orders.len() as u64,
            total_quantity: acc.quantity,
        })
        .collect()
}

/// Repeat purchase statistics over distinct customers
pub fn customer_repeat_rate(rows: &[Transaction]) -> RepeatRateStats {
    let groups = group_by_customer(rows);

    let total_customers = groups.len() as u64;
    let repeat_customers = groups.values().filter(|acc| acc.orders.len() >= 2).count() as u64;
    let total_orders: u64 = groups.values().map(|acc| acc.orders.len() as u64).sum();

    let repeat_rate = if total_customers > 0 {
        round2(repeat_customers as f64 / total_customers as f64 * 100.0)
    } else {
        0.0
    };
    let average_orders_per_customer = if total_customers > 0 {
        round2(total_orders as f64 / total_customers as f64)
    } else {
        0.0
    };

    RepeatRateStats {
        total_customers,
        repeat_customers,
        new_customers: total_customers - repeat_customers,
        repeat_rate,
        average_orders_per_customer,
    }
}

/// New customers per acquisition channel: the channel of the customer's
/// earliest order by date (sheet order breaks ties; undated orders count as
/// latest, so any dated order wins). Ordered by customer count descending.
pub fn customer_acquisition(rows: &[Transaction]) -> Vec<AcquisitionChannelRow> {
    // (first order key, channel of that order) per customer
    let mut first_orders: HashMap<String, ((NaiveDate, usize), Option<String>)> = HashMap::new();
    for (seq, t) in rows.iter().enumerate() {
        let Some(customer) = &t.customer_name else { continue };
        let key = (t.order_date.unwrap_or(NaiveDate::MAX), seq);
        match first_orders.get_mut(customer) {
            Some((best, channel)) => {
                if key < *best {
                    *best = key;
                    *channel = t.channel.clone();
                }
            }
            None => {
                first_orders.insert(customer.clone(), (key, t.channel.clone()));
            }
        }
    }

    let mut counts: HashMap<String, u64> = HashMap::new();
    for (_, (_, channel)) in first_orders {
        // customers whose first order has no joined channel are unattributable
        if let Some(channel) = channel {
            *counts.entry(channel).or_default() += 1;
        }
    }

    let total: u64 = counts.values().sum();
    let mut result: Vec<AcquisitionChannelRow> = counts
        .into_iter()
        .map(|(channel, new_customers)| AcquisitionChannelRow {
            channel,
            new_customers,
            percentage: if total > 0 {
                round2(new_customers as f64 / total as f64 * 100.0)
            } else {
                0.0
            },
        })
        .collect();
    result.sort_by(|a, b| {
        b.new_customers
            .cmp(&a.new_customers)
            .then(a.channel.cmp(&b.channel))
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(
        order_id: &str,
        date: Option<&str>,
        customer: &str,
        channel: &str,
        subtotal: f64,
        profit: f64,
    ) -> Transaction {
        Transaction {
            order_date: date.map(|d| d.parse().unwrap()),
            order_id: order_id.to_string(),
            channel: Some(channel.to_string()),
            customer_name: Some(customer.to_string()),
            instagram: None,
            phone: None,
            sku: "WUUF-005-BK-M".to_string(),
            collection: "WUUF-005".to_string(),
            product_name: None,
            dog_breed: None,
            shirt_color: "Black".to_string(),
            size: "M".to_string(),
            qty: 1,
            unit_price: subtotal,
            line_subtotal: subtotal,
            cogs: subtotal - profit,
            line_profit: profit,
        }
    }

    #[test]
    fn test_clv_single_order_recency_and_lifetime() {
        let today: NaiveDate = "2025-11-27".parse().unwrap();
        // only order was 20 days before "today"
        let rows = vec![tx("O1", Some("2025-11-07"), "A", "Instagram", 1380.0, 690.0)];

        let clv = customer_lifetime_value(&rows, today);
        assert_eq!(clv.len(), 1);
        assert_eq!(clv[0].lifetime_days, 0);
        assert_eq!(clv[0].recency_days, Some(20));
        assert_eq!(clv[0].avg_order_value, 1380.0);
        assert_eq!(clv[0].first_order_date.as_deref(), Some("2025-11-07"));
    }

    #[test]
    fn test_clv_lifetime_spans_orders() {
        let today: NaiveDate = "2025-12-01".parse().unwrap();
        let rows = vec![
            tx("O1", Some("2025-10-01"), "A", "Instagram", 500.0, 250.0),
            tx("O2", Some("2025-11-15"), "A", "Shopee", 700.0, 350.0),
        ];

        let clv = customer_lifetime_value(&rows, today);
        assert_eq!(clv[0].total_orders, 2);
        assert_eq!(clv[0].lifetime_days, 45);
        assert_eq!(clv[0].recency_days, Some(16));
        assert_eq!(clv[0].avg_order_value, 600.0);
    }

    #[test]
    fn test_clv_contact_fields_latest_non_empty() {
        let today: NaiveDate = "2025-12-01".parse().unwrap();
        let mut early = tx("O1", Some("2025-10-01"), "A", "Instagram", 500.0, 250.0);
        early.instagram = Some("@old_handle".to_string());
        early.phone = Some("0910000001".to_string());
        let mut late = tx("O2", Some("2025-11-15"), "A", "Shopee", 700.0, 350.0);
        late.instagram = Some("@new_handle".to_string());
        // phone left blank on the later order: the earlier value must survive

        let clv = customer_lifetime_value(&vec![late, early], today);
        assert_eq!(clv[0].instagram.as_deref(), Some("@new_handle"));
        assert_eq!(clv[0].phone.as_deref(), Some("0910000001"));
    }

    #[test]
    fn test_clv_ordered_by_revenue_desc() {
        let today: NaiveDate = "2025-12-01".parse().unwrap();
        let rows = vec![
            tx("O1", Some("2025-11-01"), "Small", "Instagram", 100.0, 50.0),
            tx("O2", Some("2025-11-01"), "Big", "Instagram", 900.0, 450.0),
        ];
        let clv = customer_lifetime_value(&rows, today);
        assert_eq!(clv[0].customer, "Big");
        assert_eq!(clv[1].customer, "Small");
    }

    #[test]
    fn test_top_customers_rank_and_truncation() {
        let rows = vec![
            tx("O1", Some("2025-11-01"), "A", "Instagram", 300.0, 150.0),
            tx("O2", Some("2025-11-01"), "B", "Instagram", 900.0, 450.0),
            tx("O3", Some("2025-11-01"), "C", "Instagram", 600.0, 300.0),
        ];
        let top = top_customers(&rows, 2);
        assert_eq!(top.len(), 2);
        assert_eq!((top[0].rank, top[0].customer.as_str()), (1, "B"));
        assert_eq!((top[1].rank, top[1].customer.as_str()), (2, "C"));
    }

    #[test]
    fn test_repeat_rate() {
        let rows = vec![
            tx("O1", Some("2025-11-01"), "A", "Instagram", 100.0, 50.0),
            tx("O2", Some("2025-11-05"), "A", "Instagram", 100.0, 50.0),
            tx("O3", Some("2025-11-01"), "B", "Shopee", 100.0, 50.0),
            tx("O4", Some("2025-11-01"), "C", "Shopee", 100.0, 50.0),
            tx("O5", Some("2025-11-09"), "C", "Shopee", 100.0, 50.0),
            tx("O6", Some("2025-11-12"), "C", "Shopee", 100.0, 50.0),
        ];
        let stats = customer_repeat_rate(&rows);
        assert_eq!(stats.total_customers, 3);
        assert_eq!(stats.repeat_customers, 2);
        assert_eq!(stats.new_customers, 1);
        assert_eq!(stats.repeat_rate, 66.67);
        assert_eq!(stats.average_orders_per_customer, 2.0);
    }

    #[test]
    fn test_repeat_rate_empty() {
        let stats = customer_repeat_rate(&[]);
        assert_eq!(stats.total_customers, 0);
        assert_eq!(stats.repeat_rate, 0.0);
        assert_eq!(stats.average_orders_per_customer, 0.0);
    }

    #[test]
    fn test_acquisition_uses_earliest_order_by_date() {
        // sheet order puts the Shopee order first, but the Instagram one is older
        let rows = vec![
            tx("O2", Some("2025-11-10"), "A", "Shopee", 100.0, 50.0),
            tx("O1", Some("2025-10-01"), "A", "Instagram", 100.0, 50.0),
            tx("O3", Some("2025-11-01"), "B", "Shopee", 100.0, 50.0),
        ];
        let acquisition = customer_acquisition(&rows);
        assert_eq!(acquisition.len(), 2);

        let by_channel: HashMap<&str, u64> = acquisition
            .iter()
            .map(|r| (r.channel.as_str(), r.new_customers))
            .collect();
        assert_eq!(by_channel["Instagram"], 1);
        assert_eq!(by_channel["Shopee"], 1);
        assert_eq!(acquisition[0].percentage, 50.0);
    }
}
