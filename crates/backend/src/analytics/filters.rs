use std::collections::BTreeSet;

use chrono::NaiveDate;
use contracts::sales::dto::{DateRange, FilterOptions, SalesFilterParams};

use crate::domain::transaction::Transaction;

/// Apply the optional filter criteria, ANDed together.
///
/// Total function: an unparsable date bound is ignored with a warning, an
/// empty-string criterion counts as absent, a null row value never matches a
/// present criterion, and nothing here errors.
pub fn apply_filters(rows: &[Transaction], filters: &SalesFilterParams) -> Vec<Transaction> {
    if filters.is_empty() {
        return rows.to_vec();
    }

    let start = parse_bound(criterion(&filters.start_date), "start_date");
    let end = parse_bound(criterion(&filters.end_date), "end_date");

    rows.iter()
        .filter(|t| row_matches(t, start, end, filters))
        .cloned()
        .collect()
}

/// `?size=` приходит как Some(""), это не критерий
fn criterion(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn row_matches(
    t: &Transaction,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    filters: &SalesFilterParams,
) -> bool {
    if let Some(start) = start {
        match t.order_date {
            Some(date) if date >= start => {}
            _ => return false,
        }
    }
    // dates are day-granular, so "inclusive through end of day" is date <= end
    if let Some(end) = end {
        match t.order_date {
            Some(date) if date <= end => {}
            _ => return false,
        }
    }
    if let Some(size) = criterion(&filters.size) {
        if t.size != size {
            return false;
        }
    }
    if let Some(collection) = criterion(&filters.collection) {
        if t.collection != collection {
            return false;
        }
    }
    if let Some(breed) = criterion(&filters.breed) {
        if t.dog_breed.as_deref() != Some(breed) {
            return false;
        }
    }
    if let Some(channel) = criterion(&filters.channel) {
        if t.channel.as_deref() != Some(channel) {
            return false;
        }
    }
    true
}

fn parse_bound(value: Option<&str>, name: &str) -> Option<NaiveDate> {
    let value = value?;
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            tracing::warn!("Ignoring invalid {} '{}'", name, value);
            None
        }
    }
}

/// Distinct values present in the table, for frontend dropdowns
pub fn filter_options(rows: &[Transaction]) -> FilterOptions {
    let mut sizes = BTreeSet::new();
    let mut collections = BTreeSet::new();
    let mut breeds = BTreeSet::new();
    let mut channels = BTreeSet::new();
    let mut min_date: Option<NaiveDate> = None;
    let mut max_date: Option<NaiveDate> = None;

    for t in rows {
        if !t.size.is_empty() {
            sizes.insert(t.size.clone());
        }
        if !t.collection.is_empty() {
            collections.insert(t.collection.clone());
        }
        if let Some(breed) = &t.dog_breed {
            breeds.insert(breed.clone());
        }
        if let Some(channel) = &t.channel {
            channels.insert(channel.clone());
        }
        if let Some(date) = t.order_date {
            min_date = Some(min_date.map_or(date, |d| d.min(date)));
            max_date = Some(max_date.map_or(date, |d| d.max(date)));
        }
    }

    FilterOptions {
        sizes: sizes.into_iter().collect(),
        collections: collections.into_iter().collect(),
        breeds: breeds.into_iter().collect(),
        channels: channels.into_iter().collect(),
        date_range: DateRange {
            min_date: min_date.map(|d| d.to_string()),
            max_date: max_date.map(|d| d.to_string()),
        },
    }
}
