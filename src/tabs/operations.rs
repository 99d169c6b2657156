//! Operations tab: the month filter, monthly summary and lists, the
//! add-transaction form and manual refresh.

use super::{Section, TransactionRow, rows};
use crate::aggregate::{in_month, sorted_by_date_desc, totals};
use crate::format::{
    NumberInputOptions, current_date_value, current_month_value, format_amount, format_month_year,
    format_numeric_display, normalize_date, parse_month_key, parse_numeric_input, sanitize_numeric_input,
};
use crate::gateway::{StoreError, TransactionStore, friendly_message};
use crate::models::{Category, NewTransaction, RecurrenceInterval, Transaction, TransactionForm, TransactionType};
use crate::shell::TabController;
use crate::ui;
use serde::Serialize;
use std::any::Any;
use std::sync::Arc;
use tracing::{error, info};

pub const CHOOSE_MONTH: &str = "Choose a month to show operations.";
pub const CHOOSE_MONTH_RECURRING: &str = "Choose a month to show recurring payments.";
pub const INVALID_MONTH: &str = "Could not determine the month.";
pub const NO_MONTH_DATA: &str = "No data for the selected month yet.";
pub const NO_RECURRING_THIS_MONTH: &str = "No recurring payments this month.";
pub const INVALID_FORM: &str = "Please fill in the date and an amount greater than 0.";
pub const SAVING: &str = "Saving...";
pub const SAVED: &str = "Done! Transaction added.";
pub const REFRESHING: &str = "Refreshing...";
pub const REFRESHED: &str = "Data refreshed.";
pub const DEFAULT_CATEGORY: &str = "other";

pub const SUB_NONE: &str = "__none";
pub const SUB_CUSTOM: &str = "__custom";

pub fn no_recurring_for(month_label: &str) -> String {
    format!("No recurring payments found for {month_label}.")
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("{0}")]
    Invalid(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub month_label: String,
    pub income: f64,
    pub expense: f64,
    pub net: f64,
    pub operations: usize,
    pub recurring: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationsView {
    pub month: Option<String>,
    pub summary: Option<MonthlySummary>,
    pub transactions: Section<Vec<TransactionRow>>,
    pub recurring: Section<Vec<TransactionRow>>,
    pub form_status: Option<String>,
    pub refresh_status: Option<String>,
}

pub struct OperationsTab {
    store: Arc<dyn TransactionStore>,
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
    month: Option<String>,
    draft: TransactionForm,
    form_status: Option<String>,
    refresh_status: Option<String>,
    view: OperationsView,
}

impl OperationsTab {
    pub fn new(categories: &[Category], store: Arc<dyn TransactionStore>) -> Self {
        let month = Some(current_month_value());
        let mut tab = Self {
            store,
            categories: categories.to_vec(),
            transactions: Vec::new(),
            view: build_view(&[], categories, month.as_deref()),
            month,
            draft: TransactionForm::default(),
            form_status: None,
            refresh_status: None,
        };
        tab.rebuild();
        tab
    }

    pub fn view(&self) -> &OperationsView {
        &self.view
    }

    pub fn month_filter(&self) -> Option<&str> {
        self.month.as_deref()
    }

    /// An empty value clears the filter.
    pub fn set_month_filter(&mut self, month: Option<&str>) {
        self.month = month.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string);
        self.rebuild();
    }

    /// Validates the raw form and builds the store payload.
    pub fn prepare(&self, form: &TransactionForm) -> Result<NewTransaction, SubmitError> {
        let date = normalize_date(&form.date);
        let amount = parse_numeric_input(&form.amount, NumberInputOptions::AMOUNT).filter(|amount| *amount > 0.0);
        let (Some(date), Some(amount)) = (date, amount) else {
            return Err(SubmitError::Invalid(INVALID_FORM));
        };

        let kind = match form.kind.trim() {
            "income" => TransactionType::Income,
            _ => TransactionType::Expense,
        };
        let major_category = match form.major_category.trim() {
            "" => DEFAULT_CATEGORY.to_string(),
            value => value.to_string(),
        };
        let sub_category = self.resolve_sub_category(&major_category, form);
        let is_recurring = checkbox_checked(form.is_recurring.as_deref());

        Ok(NewTransaction {
            date,
            amount,
            kind,
            major_category,
            sub_category,
            note: non_empty(&form.note),
            is_recurring: Some(is_recurring),
            recurrence_interval: is_recurring.then_some(RecurrenceInterval::Monthly),
        })
    }

    /// Validates and writes one transaction. Invalid input never reaches the
    /// store. On success the draft is reset; the new record arrives through
    /// the live subscription.
    pub async fn submit(&mut self, form: TransactionForm) -> Result<(), SubmitError> {
        let payload = match self.prepare(&form) {
            Ok(payload) => payload,
            Err(err) => {
                self.draft = form;
                self.set_form_status(Some(err.to_string()));
                return Err(err);
            }
        };

        self.set_form_status(Some(SAVING.to_string()));
        match self.store.create(payload).await {
            Ok(()) => {
                info!("transaction added");
                self.draft = TransactionForm::default();
                self.set_form_status(Some(SAVED.to_string()));
                Ok(())
            }
            Err(err) => {
                error!("failed to add transaction: {err}");
                self.draft = form;
                self.set_form_status(Some(friendly_message(Some(&err))));
                Err(err.into())
            }
        }
    }

    /// One-shot reload. The caller hands the result to the shell so every
    /// tab sees it.
    pub async fn refresh(&mut self) -> Result<Vec<Transaction>, StoreError> {
        self.set_refresh_status(Some(REFRESHING.to_string()));
        match self.store.fetch_once().await {
            Ok(transactions) => {
                self.set_refresh_status(Some(REFRESHED.to_string()));
                Ok(transactions)
            }
            Err(err) => {
                error!("manual refresh failed: {err}");
                self.set_refresh_status(Some(friendly_message(Some(&err))));
                Err(err)
            }
        }
    }

    fn resolve_sub_category(&self, major_category: &str, form: &TransactionForm) -> Option<String> {
        match form.sub_category.trim() {
            "" | SUB_NONE => None,
            SUB_CUSTOM => non_empty(&form.custom_sub_category),
            key => {
                let in_major = self
                    .categories
                    .iter()
                    .filter(|category| category.value == major_category);
                let anywhere = self.categories.iter();
                in_major
                    .chain(anywhere)
                    .flat_map(|category| category.sub_categories.iter())
                    .find(|sub| sub.key() == key)
                    .map(|sub| sub.display_label())
                    .or_else(|| Some(key.to_string()))
            }
        }
    }

    fn set_form_status(&mut self, status: Option<String>) {
        self.form_status = status;
        self.rebuild();
    }

    fn set_refresh_status(&mut self, status: Option<String>) {
        self.refresh_status = status;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let mut view = build_view(&self.transactions, &self.categories, self.month.as_deref());
        view.form_status = self.form_status.clone();
        view.refresh_status = self.refresh_status.clone();
        self.view = view;
    }

    fn selected_category(&self) -> Option<&str> {
        let drafted = self.draft.major_category.trim();
        if !drafted.is_empty() {
            return Some(drafted);
        }
        self.categories.first().map(|category| category.value.as_str())
    }

    fn type_options(&self) -> String {
        let income = self.draft.kind.trim() == "income";
        ui::option("expense", "Expense", !income) + &ui::option("income", "Income", income)
    }

    fn category_options(&self) -> String {
        let selected = self.selected_category();
        self.categories
            .iter()
            .map(|category| {
                ui::option(
                    &category.value,
                    &category.display_label(),
                    selected == Some(category.value.as_str()),
                )
            })
            .collect()
    }

    fn sub_category_options(&self) -> String {
        let drafted = self.draft.sub_category.trim();
        let mut options = String::from(r#"<option value="" disabled>Choose a sub-category</option>"#);
        options.push_str(&ui::option(SUB_NONE, "No sub-category", drafted.is_empty() || drafted == SUB_NONE));
        for category in self.categories.iter().filter(|category| !category.sub_categories.is_empty()) {
            let items: String = category
                .sub_categories
                .iter()
                .map(|sub| ui::option(sub.key(), &sub.display_label(), drafted == sub.key()))
                .collect();
            options.push_str(&format!(
                r#"<optgroup label="{}">{items}</optgroup>"#,
                ui::escape_html(&category.display_label())
            ));
        }
        options.push_str(&ui::option(SUB_CUSTOM, "Other sub-category", drafted == SUB_CUSTOM));
        options
    }
}

impl TabController for OperationsTab {
    fn update_transactions(&mut self, transactions: &[Transaction]) {
        self.transactions = transactions.to_vec();
        if self.refresh_status.as_deref() == Some(REFRESHING) {
            self.refresh_status = None;
        }
        self.rebuild();
    }

    fn update_categories(&mut self, categories: &[Category]) {
        self.categories = categories.to_vec();
        self.rebuild();
    }

    fn render(&self, fragment: &str) -> String {
        let view = &self.view;
        let summary = match &view.summary {
            Some(summary) => render_summary(summary),
            None => String::new(),
        };
        let date = match self.draft.date.trim() {
            "" => current_date_value(),
            value => value.to_string(),
        };
        let amount = format_numeric_display(&sanitize_numeric_input(&self.draft.amount, NumberInputOptions::AMOUNT));
        let custom_hidden = if self.draft.sub_category.trim() == SUB_CUSTOM { "" } else { "hidden" };
        let recurring_checked = if checkbox_checked(self.draft.is_recurring.as_deref()) {
            "checked"
        } else {
            ""
        };

        ui::fill_slots(
            fragment,
            &[
                ("month-filter", ui::escape_html(view.month.as_deref().unwrap_or_default())),
                ("refresh-status", status_text(view.refresh_status.as_deref())),
                ("monthly-summary", summary),
                (
                    "monthly-transactions",
                    ui::section(&view.transactions, |rows| ui::transaction_list(rows, true)),
                ),
                (
                    "recurring-transactions",
                    ui::section(&view.recurring, |rows| ui::transaction_list(rows, false)),
                ),
                ("form-status", status_text(view.form_status.as_deref())),
                ("date-value", ui::escape_html(&date)),
                ("amount-value", ui::escape_html(&amount)),
                ("type-options", self.type_options()),
                ("category-options", self.category_options()),
                ("sub-category-options", self.sub_category_options()),
                ("custom-sub-category-hidden", custom_hidden.to_string()),
                ("custom-sub-category-value", ui::escape_html(self.draft.custom_sub_category.trim())),
                ("note-value", ui::escape_html(self.draft.note.trim())),
                ("recurring-checked", recurring_checked.to_string()),
            ],
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Month view for `month` (`YYYY-MM`). Statuses are left empty.
pub fn build_view(transactions: &[Transaction], categories: &[Category], month: Option<&str>) -> OperationsView {
    let blank = |message: &str, recurring: &str| OperationsView {
        month: month.map(str::to_string),
        summary: None,
        transactions: Section::empty(message),
        recurring: Section::empty(recurring),
        form_status: None,
        refresh_status: None,
    };

    let Some(month_value) = month else {
        return blank(CHOOSE_MONTH, CHOOSE_MONTH_RECURRING);
    };
    let Some((year, month_number)) = parse_month_key(month_value) else {
        return blank(INVALID_MONTH, INVALID_MONTH);
    };

    let month_label = format_month_year(year, month_number);
    let filtered = sorted_by_date_desc(in_month(transactions, year, month_number));
    if filtered.is_empty() {
        return blank(NO_MONTH_DATA, no_recurring_for(&month_label).as_str());
    }

    let month_totals = totals(filtered.iter().copied());
    let recurring: Vec<&Transaction> = filtered.iter().copied().filter(|tx| tx.is_recurring).collect();

    let summary = MonthlySummary {
        month_label,
        income: month_totals.income,
        expense: month_totals.expense,
        net: month_totals.net(),
        operations: month_totals.count,
        recurring: recurring.len(),
    };

    let recurring = if recurring.is_empty() {
        Section::empty(NO_RECURRING_THIS_MONTH)
    } else {
        Section::Ready(rows(recurring, categories))
    };

    OperationsView {
        month: month.map(str::to_string),
        summary: Some(summary),
        transactions: Section::Ready(rows(filtered, categories)),
        recurring,
        form_status: None,
        refresh_status: None,
    }
}

fn render_summary(summary: &MonthlySummary) -> String {
    [
        ui::summary_card("Month", &summary.month_label),
        ui::summary_card("Income", &format_amount(summary.income)),
        ui::summary_card("Expenses", &format_amount(summary.expense)),
        ui::summary_card("Balance", &format_amount(summary.net)),
        ui::summary_card("Operations", &summary.operations.to_string()),
        ui::summary_card("Recurring", &summary.recurring.to_string()),
    ]
    .concat()
}

fn status_text(status: Option<&str>) -> String {
    ui::escape_html(status.unwrap_or_default())
}

fn checkbox_checked(value: Option<&str>) -> bool {
    match value {
        Some(value) => !matches!(value.trim(), "" | "false" | "off" | "0"),
        None => false,
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
