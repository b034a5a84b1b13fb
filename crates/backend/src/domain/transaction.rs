use chrono::NaiveDate;

// ============================================================================
// Raw worksheet rows (after key-field cleanup)
// ============================================================================

/// Строка листа Orders. Телефон уже нормализован через clean_phone.
#[derive(Debug, Clone)]
pub struct RawOrder {
    pub order_id: String,
    /// None when the sheet value did not parse as YYYY-MM-DD
    pub order_date: Option<NaiveDate>,
    pub channel: String,
    pub customer_name: String,
    pub instagram: Option<String>,
    pub phone: Option<String>,
}

/// Строка листа Order_Items
#[derive(Debug, Clone)]
pub struct RawOrderItem {
    pub order_id: String,
    pub sku: String,
    pub shirt_color: String,
    pub size: String,
    pub qty: i64,
    pub unit_price: f64,
    pub line_subtotal: f64,
    pub cogs: f64,
    pub line_profit: f64,
}

/// Строка листа Products
#[derive(Debug, Clone)]
pub struct RawProduct {
    pub sku: String,
    pub product_name: String,
    pub dog_breed: String,
}

// ============================================================================
// Joined transaction (one row per order line item)
// ============================================================================

/// Order_Items LEFT JOIN Orders (Order_ID) LEFT JOIN Products (SKU).
/// Order-side and product-side fields are None when the lookup failed;
/// the line item itself is never dropped for a failed lookup.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub order_date: Option<NaiveDate>,
    pub order_id: String,
    pub channel: Option<String>,
    pub customer_name: Option<String>,
    pub instagram: Option<String>,
    pub phone: Option<String>,
    pub sku: String,
    pub collection: String,
    pub product_name: Option<String>,
    pub dog_breed: Option<String>,
    pub shirt_color: String,
    pub size: String,
    pub qty: i64,
    pub unit_price: f64,
    pub line_subtotal: f64,
    pub cogs: f64,
    pub line_profit: f64,
}

// ============================================================================
// Derivation helpers
// ============================================================================

/// Extract the collection code from a SKU.
///
/// "WUUF-005-BK-M" -> "WUUF-005" (fixed prefix pattern: "WUUF-" + 3 digits).
/// Anything else falls back to the first two hyphen-delimited segments,
/// or the whole SKU when there is no second segment.
pub fn extract_collection(sku: &str) -> String {
    let sku = sku.trim();
    if sku.is_empty() {
        return String::new();
    }

    if sku.len() >= 8
        && sku.starts_with("WUUF-")
        && sku.as_bytes()[5..8].iter().all(|b| b.is_ascii_digit())
    {
        return sku[..8].to_string();
    }

    let mut parts = sku.splitn(3, '-');
    match (parts.next(), parts.next()) {
        (Some(first), Some(second)) => format!("{}-{}", first, second),
        _ => sku.to_string(),
    }
}

/// Normalize a raw phone string from the sheet.
///
/// Dashes and whitespace are stripped; a bare 9-digit number gets its
/// leading zero back ("910034999" -> "0910034999"). The result stays a
/// string so the leading zero survives.
pub fn clean_phone(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect();

    if stripped.len() == 9 && stripped.chars().all(|c| c.is_ascii_digit()) {
        format!("0{}", stripped)
    } else {
        stripped
    }
}

/// Canonical shirt size order: XS, S, M, L, XL, 2XL, 3XL, 4XL.
/// Unknown sizes sort after the known set (rank 999, then alphabetically).
pub fn size_rank(size: &str) -> u32 {
    match size {
        "XS" => 1,
        "S" => 2,
        "M" => 3,
        "L" => 4,
        "XL" => 5,
        "2XL" => 6,
        "3XL" => 7,
        "4XL" => 8,
        _ => 999,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_collection_pattern() {
        assert_eq!(extract_collection("WUUF-005-BK-M"), "WUUF-005");
        assert_eq!(extract_collection("WUUF-001-WH-M"), "WUUF-001");
        assert_eq!(extract_collection("WUUF-123"), "WUUF-123");
    }

    #[test]
    fn test_extract_collection_fallback_two_segments() {
        assert_eq!(extract_collection("XYZ-NOPAT"), "XYZ-NOPAT");
        assert_eq!(extract_collection("XYZ-NOPAT-BK-M"), "XYZ-NOPAT");
        // non-digit third block does not match the fixed pattern
        assert_eq!(extract_collection("WUUF-ABC-BK"), "WUUF-ABC");
    }

    #[test]
    fn test_extract_collection_degenerate() {
        assert_eq!(extract_collection("PLAIN"), "PLAIN");
        assert_eq!(extract_collection(""), "");
        assert_eq!(extract_collection("  WUUF-005-BK  "), "WUUF-005");
    }

    #[test]
    fn test_clean_phone() {
        assert_eq!(clean_phone("091-003-4999"), "0910034999");
        assert_eq!(clean_phone("910034999"), "0910034999");
        assert_eq!(clean_phone("0910034999"), "0910034999");
        assert_eq!(clean_phone("091 003 4999"), "0910034999");
        assert_eq!(clean_phone(""), "");
    }

    #[test]
    fn test_size_rank_order() {
        let mut sizes = vec!["3XL", "M", "XS", "XL", "L", "S", "4XL", "2XL"];
        sizes.sort_by_key(|s| size_rank(s));
        assert_eq!(sizes, vec!["XS", "S", "M", "L", "XL", "2XL", "3XL", "4XL"]);
        assert_eq!(size_rank("FREE"), 999);
    }
}
