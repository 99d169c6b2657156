//! Tab controllers and the view-model pieces they share.

pub mod analytics;
pub mod operations;
pub mod savings;

pub use analytics::AnalyticsTab;
pub use operations::OperationsTab;
pub use savings::SavingsTab;

use crate::aggregate::{category_display_label, category_key};
use crate::format::{format_amount, format_month_year, parse_month_key};
use crate::models::{Category, Transaction, TransactionType};
use serde::Serialize;

/// A rendered region of a tab: either a fixed empty-state message or data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum Section<T> {
    Empty(String),
    Ready(T),
}

impl<T> Section<T> {
    pub fn empty(message: impl Into<String>) -> Self {
        Self::Empty(message.into())
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Empty(_) => None,
        }
    }
}

/// Whether the browser charting library is wired into the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartSupport {
    #[default]
    Available,
    Unavailable,
}

pub const CHART_UNAVAILABLE: &str = "Visualization module is unavailable.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub kind: &'static str,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub keys: Vec<String>,
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl ChartSpec {
    /// Chart section honoring chart support and the no-data case.
    pub fn section(support: ChartSupport, spec: Option<ChartSpec>, no_data: &str) -> Section<ChartSpec> {
        match (support, spec) {
            (ChartSupport::Unavailable, _) => Section::empty(CHART_UNAVAILABLE),
            (ChartSupport::Available, None) => Section::empty(no_data),
            (ChartSupport::Available, Some(spec)) => Section::Ready(spec),
        }
    }
}

/// Label for a `YYYY-MM` key; unparsable keys are shown as-is.
pub fn month_label(key: &str) -> String {
    match parse_month_key(key) {
        Some((year, month)) => format_month_year(year, month),
        None => key.to_string(),
    }
}

/// One transaction line as displayed in lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub date: String,
    pub kind: TransactionType,
    pub amount: f64,
    pub display_amount: String,
    pub category: String,
    pub sub_category: Option<String>,
    pub note: Option<String>,
    pub is_recurring: bool,
}

impl TransactionRow {
    pub fn new(tx: &Transaction, categories: &[Category]) -> Self {
        Self {
            id: tx.id.clone(),
            date: tx.date.format("%d.%m.%Y").to_string(),
            kind: tx.kind,
            amount: tx.amount,
            display_amount: format!("{}{}", tx.kind.sign(), format_amount(tx.amount)),
            category: category_display_label(categories, &category_key(tx)),
            sub_category: tx.sub_category.clone(),
            note: tx.note.clone(),
            is_recurring: tx.is_recurring,
        }
    }

    pub fn category_line(&self) -> String {
        match &self.sub_category {
            Some(sub) if !sub.is_empty() => format!("{} / {sub}", self.category),
            _ => self.category.clone(),
        }
    }
}

pub fn rows<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    categories: &[Category],
) -> Vec<TransactionRow> {
    transactions
        .into_iter()
        .map(|tx| TransactionRow::new(tx, categories))
        .collect()
}

/// Progress toward a goal: bar width is clamped, the label is not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    pub value: f64,
    pub target: f64,
    pub percent: i64,
    pub bar_percent: u8,
}

impl Progress {
    pub fn new(value: f64, target: f64) -> Self {
        let ratio = if target > 0.0 { value / target } else { 0.0 };
        let percent = (ratio * 100.0).round();
        let percent = if percent.is_finite() { percent as i64 } else { 0 };
        Self {
            value,
            target,
            percent,
            bar_percent: percent.clamp(0, 100) as u8,
        }
    }

    /// Percentage as shown next to the bar; never negative.
    pub fn display_percent(&self) -> i64 {
        self.percent.max(0)
    }
}
