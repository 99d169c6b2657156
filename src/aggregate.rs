use crate::format::month_key;
use crate::models::{Category, Transaction, TransactionType};
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

pub const RECENT_LIMIT: usize = 10;
pub const FORECAST_WINDOW: usize = 3;
pub const FORECAST_MIN_MONTHS: usize = 2;
pub const FORECAST_HORIZON_MONTHS: u32 = 2;
pub const FALLBACK_CATEGORY: &str = "other";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
    pub count: usize,
}

impl Totals {
    pub fn add(&mut self, tx: &Transaction) {
        match tx.kind {
            TransactionType::Income => self.income += tx.amount,
            TransactionType::Expense => self.expense += tx.amount,
        }
        self.count += 1;
    }

    pub fn net(&self) -> f64 {
        self.income - self.expense
    }
}

pub fn totals<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Totals {
    let mut totals = Totals::default();
    for tx in transactions {
        totals.add(tx);
    }
    totals
}

/// Sums transactions into buckets keyed by `key`. Transactions mapped to
/// `None` are skipped.
pub fn sum_by<'a, K, F>(transactions: impl IntoIterator<Item = &'a Transaction>, key: F) -> BTreeMap<K, Totals>
where
    K: Ord,
    F: Fn(&Transaction) -> Option<K>,
{
    let mut buckets: BTreeMap<K, Totals> = BTreeMap::new();
    for tx in transactions {
        if let Some(bucket) = key(tx) {
            buckets.entry(bucket).or_default().add(tx);
        }
    }
    buckets
}

/// Monthly totals keyed by `YYYY-MM`, iterating in ascending chronological order.
pub fn group_by_month<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> BTreeMap<String, Totals> {
    sum_by(transactions, |tx| Some(month_key(tx.date)))
}

pub fn category_key(tx: &Transaction) -> String {
    if tx.major_category.trim().is_empty() {
        FALLBACK_CATEGORY.to_string()
    } else {
        tx.major_category.clone()
    }
}

pub fn group_by_category<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> BTreeMap<String, Totals> {
    sum_by(transactions, |tx| Some(category_key(tx)))
}

pub fn in_month(transactions: &[Transaction], year: i32, month: u32) -> Vec<&Transaction> {
    transactions
        .iter()
        .filter(|tx| tx.date.year() == year && tx.date.month() == month)
        .collect()
}

/// Date descending; ties keep their incoming order (the store already orders
/// same-day records by creation time).
pub fn sorted_by_date_desc<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Vec<&'a Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.into_iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
}

pub fn recent(transactions: &[Transaction], limit: usize) -> Vec<&Transaction> {
    let mut sorted = sorted_by_date_desc(transactions);
    sorted.truncate(limit);
    sorted
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Forecast {
    Insufficient,
    Projection {
        average_net: f64,
        horizon_total: f64,
        months_used: usize,
    },
}

/// Averages the net of the latest populated months and projects it forward.
pub fn forecast(monthly: &BTreeMap<String, Totals>) -> Forecast {
    let nets: Vec<f64> = monthly
        .values()
        .rev()
        .take(FORECAST_WINDOW)
        .map(Totals::net)
        .collect();

    if nets.len() < FORECAST_MIN_MONTHS {
        return Forecast::Insufficient;
    }

    let average_net = nets.iter().sum::<f64>() / nets.len() as f64;
    Forecast::Projection {
        average_net,
        horizon_total: average_net * f64::from(FORECAST_HORIZON_MONTHS),
        months_used: nets.len(),
    }
}

pub fn find_category<'a>(categories: &'a [Category], key: &str) -> Option<&'a Category> {
    categories.iter().find(|category| category.value == key)
}

/// Catalog label for `key`, or the raw key when the catalog lacks it.
pub fn category_label(categories: &[Category], key: &str) -> String {
    match find_category(categories, key) {
        Some(category) => category.label.clone(),
        None if key.is_empty() => "Uncategorized".to_string(),
        None => key.to_string(),
    }
}

/// Like [`category_label`] but with the catalog emoji prefixed.
pub fn category_display_label(categories: &[Category], key: &str) -> String {
    match find_category(categories, key) {
        Some(category) => category.display_label(),
        None => category_label(categories, key),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn aggregate_month_net_is_income_minus_expense() {
        let transactions = vec![
            income("a", "2026-02-03", 100.0),
            expense("b", "2026-02-10", 40.0, "food"),
            expense("c", "2026-03-01", 5.0, "food"),
        ];
        let monthly = group_by_month(&transactions);
        let feb = monthly.get("2026-02").expect("missing month");
        assert_eq!(feb.income, 100.0);
        assert_eq!(feb.expense, 40.0);
        assert_eq!(feb.net(), 60.0);
        assert_eq!(feb.count, 2);
        let keys: Vec<&String> = monthly.keys().collect();
        assert_eq!(keys, ["2026-02", "2026-03"]);
    }

    #[test]
    fn aggregate_forecast_needs_two_months() {
        let one_month = group_by_month(&[income("a", "2026-02-03", 100.0)]);
        assert_eq!(forecast(&one_month), Forecast::Insufficient);
        assert_eq!(forecast(&BTreeMap::new()), Forecast::Insufficient);
    }

    #[test]
    fn aggregate_forecast_averages_latest_months() {
        let transactions = vec![income("a", "2026-03-03", 100.0), income("b", "2026-02-03", 200.0)];
        let monthly = group_by_month(&transactions);
        assert_eq!(
            forecast(&monthly),
            Forecast::Projection {
                average_net: 150.0,
                horizon_total: 300.0,
                months_used: 2,
            }
        );
    }

    #[test]
    fn aggregate_forecast_uses_at_most_three_months() {
        let transactions = vec![
            income("a", "2025-12-01", 1000.0),
            income("b", "2026-01-01", 30.0),
            income("c", "2026-02-01", 60.0),
            income("d", "2026-03-01", 90.0),
        ];
        match forecast(&group_by_month(&transactions)) {
            Forecast::Projection {
                average_net,
                months_used,
                ..
            } => {
                assert_eq!(months_used, 3);
                assert_eq!(average_net, 60.0);
            }
            Forecast::Insufficient => panic!("expected a projection"),
        }
    }

    #[test]
    fn aggregate_recent_is_capped_and_descending() {
        let transactions: Vec<Transaction> = (1..=12)
            .map(|day| income(&format!("t{day}"), &format!("2026-01-{day:02}"), 1.0))
            .collect();
        let latest = recent(&transactions, RECENT_LIMIT);
        assert_eq!(latest.len(), 10);
        assert_eq!(latest[0].id, "t12");
        assert_eq!(latest[9].id, "t3");
    }

    #[test]
    fn aggregate_category_label_falls_back_to_key() {
        let categories = categories();
        assert_eq!(category_label(&categories, "food"), "Food");
        assert_eq!(category_display_label(&categories, "food"), "🍎 Food");
        assert_eq!(category_label(&categories, "travel"), "travel");
        assert_eq!(category_label(&[], "travel"), "travel");
    }

    #[test]
    fn aggregate_missing_category_groups_as_other() {
        let transactions = vec![expense("a", "2026-01-01", 10.0, ""), expense("b", "2026-01-02", 5.0, "food")];
        let grouped = group_by_category(&transactions);
        assert_eq!(grouped.get("other").map(|t| t.expense), Some(10.0));
        assert_eq!(grouped.get("food").map(|t| t.expense), Some(5.0));
    }
}
