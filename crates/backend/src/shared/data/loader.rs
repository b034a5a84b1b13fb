use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use super::source::{cell, LoadError, SheetTable, TableSource};
use crate::domain::transaction::{
    clean_phone, extract_collection, RawOrder, RawOrderItem, RawProduct, Transaction,
};

pub const ORDERS_SHEET: &str = "Orders";
pub const ORDER_ITEMS_SHEET: &str = "Order_Items";
pub const PRODUCTS_SHEET: &str = "Products";

/// Загрузчик: три листа -> очистка -> join -> плоская таблица транзакций
pub struct TransactionLoader {
    source: Arc<dyn TableSource>,
}

impl TransactionLoader {
    pub fn new(source: Arc<dyn TableSource>) -> Self {
        Self { source }
    }

    /// Fetch the three worksheets, clean them and join into transactions.
    ///
    /// Fails with `SourceUnavailable` when the source cannot be reached or a
    /// worksheet is missing, with `Schema` when a required column is absent.
    pub async fn load(&self) -> Result<Vec<Transaction>, LoadError> {
        let orders_table = self.source.fetch_table(ORDERS_SHEET).await?;
        let items_table = self.source.fetch_table(ORDER_ITEMS_SHEET).await?;
        let products_table = self.source.fetch_table(PRODUCTS_SHEET).await?;

        let orders = parse_orders(&orders_table)?;
        let items = parse_order_items(&items_table)?;
        let products = parse_products(&products_table)?;

        let transactions = join_transactions(&orders, &items, &products);
        tracing::info!(
            "Loaded {} transactions ({} orders, {} items, {} products)",
            transactions.len(),
            orders.len(),
            items.len(),
            products.len()
        );
        Ok(transactions)
    }
}

/// Orders, indexed by Order_ID. Rows with an empty Order_ID are dropped.
pub fn parse_orders(table: &SheetTable) -> Result<HashMap<String, RawOrder>, LoadError> {
    let id_col = table.require_column(ORDERS_SHEET, "Order_ID")?;
    let date_col = table.require_column(ORDERS_SHEET, "Order_Date")?;
    let channel_col = table.require_column(ORDERS_SHEET, "Channel")?;
    let name_col = table.require_column(ORDERS_SHEET, "Customer_Name")?;
    let instagram_col = table.require_column(ORDERS_SHEET, "Instagram")?;
    let phone_col = table.require_column(ORDERS_SHEET, "Phone")?;

    let mut orders = HashMap::new();
    for row in &table.rows {
        let order_id = cell(row, id_col);
        if order_id.is_empty() {
            // пустая строка-шаблон
            continue;
        }

        let instagram = cell(row, instagram_col).to_string();
        let phone = clean_phone(cell(row, phone_col));

        orders.insert(
            order_id.to_string(),
            RawOrder {
                order_id: order_id.to_string(),
                order_date: parse_order_date(order_id, cell(row, date_col)),
                channel: cell(row, channel_col).to_string(),
                customer_name: cell(row, name_col).to_string(),
                instagram: (!instagram.is_empty()).then_some(instagram),
                phone: (!phone.is_empty()).then_some(phone),
            },
        );
    }
    Ok(orders)
}

/// Order_Items in sheet order. Rows with an empty SKU are dropped.
pub fn parse_order_items(table: &SheetTable) -> Result<Vec<RawOrderItem>, LoadError> {
    let order_col = table.require_column(ORDER_ITEMS_SHEET, "Order_ID")?;
    let sku_col = table.require_column(ORDER_ITEMS_SHEET, "SKU")?;
    let color_col = table.require_column(ORDER_ITEMS_SHEET, "Shirt_Color")?;
    let size_col = table.require_column(ORDER_ITEMS_SHEET, "Size")?;
    let qty_col = table.require_column(ORDER_ITEMS_SHEET, "Qty")?;
    let price_col = table.require_column(ORDER_ITEMS_SHEET, "Unit_Price_THB")?;
    let subtotal_col = table.require_column(ORDER_ITEMS_SHEET, "Line_Subtotal")?;
    let cogs_col = table.require_column(ORDER_ITEMS_SHEET, "COGS_THB")?;
    let profit_col = table.require_column(ORDER_ITEMS_SHEET, "Line_Profit")?;

    let mut items = Vec::new();
    for row in &table.rows {
        let sku = cell(row, sku_col);
        if sku.is_empty() {
            continue;
        }

        items.push(RawOrderItem {
            order_id: cell(row, order_col).to_string(),
            sku: sku.to_string(),
            shirt_color: cell(row, color_col).to_string(),
            size: cell(row, size_col).to_string(),
            qty: parse_int(cell(row, qty_col)),
            unit_price: parse_number(cell(row, price_col)),
            line_subtotal: parse_number(cell(row, subtotal_col)),
            cogs: parse_number(cell(row, cogs_col)),
            line_profit: parse_number(cell(row, profit_col)),
        });
    }
    Ok(items)
}

/// Products, indexed by SKU. Rows with an empty SKU are dropped.
pub fn parse_products(table: &SheetTable) -> Result<HashMap<String, RawProduct>, LoadError> {
    let sku_col = table.require_column(PRODUCTS_SHEET, "SKU")?;
    let name_col = table.require_column(PRODUCTS_SHEET, "Product_Name")?;
    let breed_col = table.require_column(PRODUCTS_SHEET, "Dog_Breed")?;

    let mut products = HashMap::new();
    for row in &table.rows {
        let sku = cell(row, sku_col);
        if sku.is_empty() {
            continue;
        }

        products.insert(
            sku.to_string(),
            RawProduct {
                sku: sku.to_string(),
                product_name: cell(row, name_col).to_string(),
                dog_breed: cell(row, breed_col).to_string(),
            },
        );
    }
    Ok(products)
}

/// Order_Items LEFT JOIN Orders LEFT JOIN Products. Preserves the item row
/// count: a line item with no matching order or product keeps None on the
/// missing side instead of being dropped.
pub fn join_transactions(
    orders: &HashMap<String, RawOrder>,
    items: &[RawOrderItem],
    products: &HashMap<String, RawProduct>,
) -> Vec<Transaction> {
    items
        .iter()
        .map(|item| {
            let order = orders.get(&item.order_id);
            let product = products.get(&item.sku);

            Transaction {
                order_date: order.and_then(|o| o.order_date),
                order_id: item.order_id.clone(),
                channel: order.map(|o| o.channel.clone()).filter(|s| !s.is_empty()),
                customer_name: order
                    .map(|o| o.customer_name.clone())
                    .filter(|s| !s.is_empty()),
                instagram: order.and_then(|o| o.instagram.clone()),
                phone: order.and_then(|o| o.phone.clone()),
                sku: item.sku.clone(),
                collection: extract_collection(&item.sku),
                product_name: product
                    .map(|p| p.product_name.clone())
                    .filter(|s| !s.is_empty()),
                dog_breed: product
                    .map(|p| p.dog_breed.clone())
                    .filter(|s| !s.is_empty()),
                shirt_color: item.shirt_color.clone(),
                size: item.size.clone(),
                qty: item.qty,
                unit_price: item.unit_price,
                line_subtotal: item.line_subtotal,
                cogs: item.cogs,
                line_profit: item.line_profit,
            }
        })
        .collect()
}

/// YYYY-MM-DD; unparsable values are kept as None (the row itself survives,
/// it just drops out of date filters and date-keyed groupings)
fn parse_order_date(order_id: &str, value: &str) -> Option<NaiveDate> {
    if value.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            tracing::warn!("Order {}: unparsable Order_Date '{}'", order_id, value);
            None
        }
    }
}

fn parse_number(value: &str) -> f64 {
    value.parse::<f64>().unwrap_or(0.0)
}

fn parse_int(value: &str) -> i64 {
    value
        .parse::<i64>()
        .unwrap_or_else(|_| value.parse::<f64>().map(|v| v as i64).unwrap_or(0))
}
