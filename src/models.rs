use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn sign(self) -> &'static str {
        match self {
            Self::Income => "+",
            Self::Expense => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceInterval {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

/// A stored income or expense record. Read-only once the store has accepted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub major_category: String,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_interval: Option<RecurrenceInterval>,
    pub created_at: DateTime<Utc>,
}

/// Write payload accepted by the store. The store assigns `id` and `createdAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub major_category: String,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub is_recurring: Option<bool>,
    #[serde(default)]
    pub recurrence_interval: Option<RecurrenceInterval>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubCategory {
    #[serde(default)]
    pub value: Option<String>,
    pub label: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

impl SubCategory {
    pub fn key(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.label)
    }

    pub fn display_label(&self) -> String {
        with_emoji(self.emoji.as_deref(), &self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub sub_categories: Vec<SubCategory>,
}

impl Category {
    pub fn display_label(&self) -> String {
        with_emoji(self.emoji.as_deref(), &self.label)
    }
}

/// Shape of `data/categories.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCatalog {
    #[serde(default)]
    pub major_categories: Vec<Category>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compounding {
    #[default]
    Monthly,
    Annual,
}

impl Compounding {
    pub fn label(self) -> &'static str {
        match self {
            Self::Monthly => "Monthly capitalization",
            Self::Annual => "Annual capitalization",
        }
    }
}

/// A savings deposit tracked only on this device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsRecord {
    pub id: String,
    pub name: String,
    pub maturity_date: NaiveDate,
    pub current_balance: f64,
    pub rate: f64,
    #[serde(default)]
    pub compounding: Compounding,
}

/// Raw fields of the "add transaction" form, exactly as typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionForm {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub major_category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub custom_sub_category: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub is_recurring: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavingsForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub maturity_date: String,
    #[serde(default)]
    pub current_balance: String,
    #[serde(default)]
    pub rate: String,
    #[serde(default)]
    pub compounding: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlannerForm {
    #[serde(default)]
    pub contribution: String,
    #[serde(default)]
    pub years: String,
    #[serde(default)]
    pub rate: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TabQuery {
    pub tab: Option<String>,
    pub month: Option<String>,
    pub savings_month: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: Option<String>,
    pub active_tab: Option<String>,
    pub loaded_tabs: Vec<String>,
    pub transaction_count: usize,
    pub category_count: usize,
}

fn with_emoji(emoji: Option<&str>, label: &str) -> String {
    match emoji {
        Some(emoji) if !emoji.is_empty() => format!("{emoji} {label}"),
        _ => label.to_string(),
    }
}
