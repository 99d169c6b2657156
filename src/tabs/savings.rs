//! Savings tab: locally stored deposits, goal progress, the payout chart and
//! the contribution planner.

use super::{ChartSeries, ChartSpec, ChartSupport, Progress, Section, month_label};
use crate::aggregate::{in_month, totals};
use crate::format::{
    NumberInputOptions, current_month_value, format_currency, format_month_year, format_numeric_display, month_key,
    months_between, normalize_date, parse_month_key, parse_numeric_input, sanitize_numeric_input, today,
};
use crate::models::{
    Category, Compounding, PlannerForm, SavingsForm, SavingsRecord, Transaction, TransactionType,
};
use crate::shell::TabController;
use crate::storage::{KeyValueStore, load_json_list, persist_json};
use crate::ui;
use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

pub const MONTHLY_GOAL: f64 = 150_000.0;
pub const NEST_TARGET: f64 = 25_000_000.0;
pub const STORAGE_KEY: &str = "wealth_manager_savings_records";
pub const DEFAULT_NAME: &str = "Savings";
pub const PAYOUT_TAIL_MONTHS: u32 = 12;

pub const INVALID_RECORD: &str = "Check the date, amount and rate.";
pub const INVALID_PLAN: &str = "Please enter positive values for the contribution and term.";
pub const RECORD_ADDED: &str = "Savings added.";
pub const RECORD_UPDATED: &str = "Savings updated.";
pub const EDITING: &str = "Editing savings record.";
pub const EDIT_CANCELED: &str = "Editing canceled.";
pub const NO_RECORDS: &str = "No savings records yet.";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SavingsError {
    #[error("{0}")]
    Invalid(&'static str),
    #[error("savings record {0} not found")]
    UnknownRecord(String),
}

/// Expected balance at maturity as seen from `today`. Rates are annual
/// percentages; negative rates count as zero.
pub fn expected_balance(record: &SavingsRecord, today: NaiveDate) -> f64 {
    let principal = if record.current_balance.is_finite() {
        record.current_balance
    } else {
        0.0
    };
    if principal == 0.0 {
        return 0.0;
    }

    let rate = if record.rate.is_finite() { record.rate.max(0.0) / 100.0 } else { 0.0 };
    let months = months_between(today, record.maturity_date).max(0);
    if months == 0 || rate == 0.0 {
        return principal;
    }

    match record.compounding {
        Compounding::Monthly => principal * (1.0 + rate / 12.0).powi(months),
        Compounding::Annual => principal * (1.0 + rate).powf(f64::from(months) / 12.0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Plan {
    pub years: u32,
    pub total: f64,
    pub contributions: f64,
    pub interest: f64,
}

/// Yearly capitalization: every year adds twelve contributions, then the
/// whole balance earns `rate` (a fraction, not a percentage).
pub fn calculate_plan(monthly_contribution: f64, years: u32, rate: f64) -> Plan {
    let annual = monthly_contribution * 12.0;
    let contributions = annual * f64::from(years);
    let total = if rate == 0.0 {
        contributions
    } else {
        let growth = 1.0 + rate;
        annual * growth * (growth.powf(f64::from(years)) - 1.0) / rate
    };
    Plan {
        years,
        total,
        contributions,
        interest: (total - contributions).max(0.0),
    }
}

/// Validates planner input. A missing rate counts as zero.
pub fn plan_from_form(form: &PlannerForm) -> Result<Plan, SavingsError> {
    let contribution = parse_numeric_input(&form.contribution, NumberInputOptions::AMOUNT).filter(|value| *value > 0.0);
    let years = parse_numeric_input(&form.years, NumberInputOptions::WHOLE).filter(|value| *value > 0.0);
    let (Some(contribution), Some(years)) = (contribution, years) else {
        return Err(SavingsError::Invalid(INVALID_PLAN));
    };
    let years = u32::try_from(years as u64).map_err(|_| SavingsError::Invalid(INVALID_PLAN))?;
    let rate = parse_numeric_input(&form.rate, NumberInputOptions::AMOUNT).unwrap_or(0.0).max(0.0) / 100.0;
    Ok(calculate_plan(contribution, years, rate))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum PlannerOutcome {
    Idle,
    Invalid(String),
    Ready(Plan),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordRow {
    pub id: String,
    pub name: String,
    pub maturity_date: NaiveDate,
    pub maturity_label: String,
    pub current_balance: f64,
    pub rate: f64,
    pub compounding: Compounding,
    pub compounding_label: &'static str,
    pub expected_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthOption {
    pub key: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsView {
    pub records: Section<Vec<RecordRow>>,
    pub editing: Option<String>,
    pub form_status: Option<String>,
    pub months: Vec<MonthOption>,
    pub selected_month: String,
    pub monthly_income: f64,
    pub monthly_goal: Progress,
    pub nest_total: f64,
    pub nest: Progress,
    pub payout_chart: Section<ChartSpec>,
    pub planner: PlannerOutcome,
}

/// Months that have income, newest first; the current month when none do.
pub fn income_months(transactions: &[Transaction], current: &str) -> Vec<String> {
    let keys: BTreeSet<String> = transactions
        .iter()
        .filter(|tx| tx.kind == TransactionType::Income)
        .map(|tx| month_key(tx.date))
        .collect();
    if keys.is_empty() {
        return vec![current.to_string()];
    }
    keys.into_iter().rev().collect()
}

/// Keeps `previous` when it is still offered, otherwise the first option.
pub fn pick_month(options: &[String], previous: Option<&str>) -> String {
    match previous {
        Some(previous) if options.iter().any(|key| key == previous) => previous.to_string(),
        _ => options.first().cloned().unwrap_or_else(current_month_value),
    }
}

pub struct SavingsTab {
    local: Arc<dyn KeyValueStore>,
    charts: ChartSupport,
    records: Vec<SavingsRecord>,
    transactions: Vec<Transaction>,
    months: Vec<String>,
    selected_month: String,
    editing: Option<String>,
    draft: SavingsForm,
    form_status: Option<String>,
    planner_draft: PlannerForm,
    planner: PlannerOutcome,
}

impl SavingsTab {
    pub fn new(local: Arc<dyn KeyValueStore>, charts: ChartSupport) -> Self {
        let records: Vec<SavingsRecord> = load_json_list(local.as_ref(), STORAGE_KEY);
        info!("loaded {} savings records", records.len());
        let months = income_months(&[], &current_month_value());
        let selected_month = pick_month(&months, None);
        Self {
            local,
            charts,
            records,
            transactions: Vec::new(),
            months,
            selected_month,
            editing: None,
            draft: SavingsForm::default(),
            form_status: None,
            planner_draft: PlannerForm::default(),
            planner: PlannerOutcome::Idle,
        }
    }

    pub fn records(&self) -> &[SavingsRecord] {
        &self.records
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn selected_month(&self) -> &str {
        &self.selected_month
    }

    /// Ignored unless `month` is one of the offered months.
    pub fn select_month(&mut self, month: &str) {
        if self.months.iter().any(|key| key == month) {
            self.selected_month = month.to_string();
        }
    }

    /// Adds a record, or commits the edit in progress. An edited record that
    /// has disappeared meanwhile is added back under its id.
    pub fn submit(&mut self, form: SavingsForm) -> Result<SavingsRecord, SavingsError> {
        let (maturity_date, current_balance, rate) = match validate(&form) {
            Ok(values) => values,
            Err(err) => {
                self.draft = form;
                self.form_status = Some(err.to_string());
                return Err(err);
            }
        };

        let name = match form.name.trim() {
            "" => DEFAULT_NAME.to_string(),
            name => name.to_string(),
        };
        let compounding = match form.compounding.trim() {
            "annual" => Compounding::Annual,
            _ => Compounding::Monthly,
        };

        let editing = self.editing.take();
        let id = editing.clone().unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let record = SavingsRecord {
            id,
            name,
            maturity_date,
            current_balance,
            rate,
            compounding,
        };

        let position = editing
            .as_deref()
            .and_then(|id| self.records.iter().position(|record| record.id == id));
        let status = match position {
            Some(index) => {
                self.records[index] = record.clone();
                RECORD_UPDATED
            }
            None => {
                self.records.push(record.clone());
                RECORD_ADDED
            }
        };

        self.persist();
        self.draft = SavingsForm::default();
        self.form_status = Some(status.to_string());
        Ok(record)
    }

    pub fn begin_edit(&mut self, id: &str) -> Result<(), SavingsError> {
        let record = self
            .records
            .iter()
            .find(|record| record.id == id)
            .ok_or_else(|| SavingsError::UnknownRecord(id.to_string()))?;

        self.draft = SavingsForm {
            name: record.name.clone(),
            maturity_date: record.maturity_date.format("%Y-%m-%d").to_string(),
            current_balance: record.current_balance.to_string(),
            rate: record.rate.to_string(),
            compounding: match record.compounding {
                Compounding::Monthly => "monthly".to_string(),
                Compounding::Annual => "annual".to_string(),
            },
        };
        self.editing = Some(record.id.clone());
        self.form_status = Some(EDITING.to_string());
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.reset_form();
        self.form_status = Some(EDIT_CANCELED.to_string());
    }

    /// Removes the record; deleting the one being edited resets the form.
    pub fn delete(&mut self, id: &str) -> Result<(), SavingsError> {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        if self.records.len() == before {
            return Err(SavingsError::UnknownRecord(id.to_string()));
        }

        self.persist();
        if self.editing.as_deref() == Some(id) {
            self.reset_form();
        }
        Ok(())
    }

    pub fn plan(&mut self, form: PlannerForm) -> Result<Plan, SavingsError> {
        let outcome = plan_from_form(&form);
        self.planner = match &outcome {
            Ok(plan) => PlannerOutcome::Ready(*plan),
            Err(err) => PlannerOutcome::Invalid(err.to_string()),
        };
        self.planner_draft = form;
        outcome
    }

    pub fn view(&self) -> SavingsView {
        self.view_at(today())
    }

    pub fn view_at(&self, today: NaiveDate) -> SavingsView {
        let mut sorted: Vec<&SavingsRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| a.maturity_date.cmp(&b.maturity_date));
        let rows: Vec<RecordRow> = sorted
            .into_iter()
            .map(|record| RecordRow {
                id: record.id.clone(),
                name: record.name.clone(),
                maturity_date: record.maturity_date,
                maturity_label: record.maturity_date.format("%d.%m.%Y").to_string(),
                current_balance: record.current_balance,
                rate: record.rate,
                compounding: record.compounding,
                compounding_label: record.compounding.label(),
                expected_balance: expected_balance(record, today),
            })
            .collect();

        let nest_total: f64 = rows.iter().map(|row| row.expected_balance).sum();
        let monthly_income = match parse_month_key(&self.selected_month) {
            Some((year, month)) => {
                let month_txs = in_month(&self.transactions, year, month);
                totals(month_txs).income
            }
            None => 0.0,
        };

        let records = if rows.is_empty() {
            Section::empty(NO_RECORDS)
        } else {
            Section::Ready(rows)
        };

        SavingsView {
            records,
            editing: self.editing.clone(),
            form_status: self.form_status.clone(),
            months: self
                .months
                .iter()
                .map(|key| MonthOption {
                    key: key.clone(),
                    label: month_label(key),
                    selected: *key == self.selected_month,
                })
                .collect(),
            selected_month: self.selected_month.clone(),
            monthly_income,
            monthly_goal: Progress::new(monthly_income, MONTHLY_GOAL),
            nest_total,
            nest: Progress::new(nest_total, NEST_TARGET),
            payout_chart: ChartSpec::section(self.charts, Some(payout_chart(&self.records, today)), NO_RECORDS),
            planner: self.planner.clone(),
        }
    }

    fn reset_form(&mut self) {
        self.editing = None;
        self.draft = SavingsForm::default();
    }

    fn persist(&self) {
        if let Err(err) = persist_json(self.local.as_ref(), STORAGE_KEY, &self.records) {
            error!("failed to persist savings records: {err}");
        }
    }
}

fn validate(form: &SavingsForm) -> Result<(NaiveDate, f64, f64), SavingsError> {
    let maturity = normalize_date(&form.maturity_date);
    let balance = parse_numeric_input(&form.current_balance, NumberInputOptions::AMOUNT).filter(|value| *value > 0.0);
    let rate = parse_numeric_input(&form.rate, NumberInputOptions::AMOUNT);
    match (maturity, balance, rate) {
        (Some(maturity), Some(balance), Some(rate)) => Ok((maturity, balance, rate)),
        _ => Err(SavingsError::Invalid(INVALID_RECORD)),
    }
}

/// Expected payouts per maturity month against the monthly contribution
/// goal, from the current month through a year past the last maturity.
pub fn payout_chart(records: &[SavingsRecord], today: NaiveDate) -> ChartSpec {
    let start = first_of_month(today);
    let anchor = records
        .iter()
        .map(|record| first_of_month(record.maturity_date))
        .max()
        .unwrap_or(start);
    let end = anchor.checked_add_months(Months::new(PAYOUT_TAIL_MONTHS)).unwrap_or(anchor);

    let mut payouts: BTreeMap<String, f64> = BTreeMap::new();
    for record in records {
        *payouts.entry(month_key(record.maturity_date)).or_default() += expected_balance(record, today);
    }

    let mut keys = Vec::new();
    let mut labels = Vec::new();
    let mut expected = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        let key = month_key(cursor);
        labels.push(format_month_year(cursor.year(), cursor.month()));
        expected.push(payouts.get(&key).copied().unwrap_or(0.0));
        keys.push(key);
        match cursor.checked_add_months(Months::new(1)) {
            Some(next) => cursor = next,
            None => break,
        }
    }

    let planned = vec![MONTHLY_GOAL; keys.len()];
    ChartSpec {
        keys,
        labels,
        series: vec![
            ChartSeries {
                name: "Planned contributions".to_string(),
                kind: "line",
                values: planned,
            },
            ChartSeries {
                name: "Expected payouts".to_string(),
                kind: "bar",
                values: expected,
            },
        ],
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

impl TabController for SavingsTab {
    fn update_transactions(&mut self, transactions: &[Transaction]) {
        self.transactions = transactions.to_vec();
        self.months = income_months(&self.transactions, &current_month_value());
        self.selected_month = pick_month(&self.months, Some(&self.selected_month));
    }

    fn update_categories(&mut self, _categories: &[Category]) {}

    fn render(&self, fragment: &str) -> String {
        let view = self.view();
        let month_options: String = view
            .months
            .iter()
            .map(|option| ui::option(&option.key, &option.label, option.selected))
            .collect();
        let income_summary = format!(
            "{}: {} of the {} goal ({}%).",
            month_label(&view.selected_month),
            format_currency(view.monthly_income),
            format_currency(MONTHLY_GOAL),
            view.monthly_goal.percent
        );
        let nest_label = format!(
            "Total tracked savings: {} of the {} goal",
            format_currency(view.nest_total),
            format_currency(NEST_TARGET)
        );
        let editing = view.editing.is_some();
        let annual = self.draft.compounding == "annual";
        let compounding_options = ui::option("monthly", Compounding::Monthly.label(), !annual)
            + &ui::option("annual", Compounding::Annual.label(), annual);

        ui::fill_slots(
            fragment,
            &[
                ("savings-month-options", month_options),
                ("monthly-goal-progress", ui::progress_bar(&view.monthly_goal)),
                ("monthly-income-summary", ui::escape_html(&income_summary)),
                ("nest-progress", ui::progress_bar(&view.nest)),
                ("nest-progress-label", ui::escape_html(&nest_label)),
                ("savings-list", ui::section(&view.records, |rows| render_records(rows))),
                ("savings-payout-chart", ui::chart(&view.payout_chart)),
                ("savings-form-status", ui::escape_html(view.form_status.as_deref().unwrap_or_default())),
                (
                    "savings-submit-label",
                    if editing { "Save changes" } else { "Add savings" }.to_string(),
                ),
                ("savings-cancel-hidden", if editing { "" } else { "hidden" }.to_string()),
                ("savings-name-value", ui::escape_html(&self.draft.name)),
                ("savings-maturity-value", ui::escape_html(&self.draft.maturity_date)),
                ("savings-balance-value", amount_value(&self.draft.current_balance)),
                ("savings-rate-value", amount_value(&self.draft.rate)),
                ("savings-compounding-options", compounding_options),
                ("planner-result", render_planner(&view.planner)),
                ("planner-contribution-value", amount_value(&self.planner_draft.contribution)),
                (
                    "planner-years-value",
                    ui::escape_html(&format_numeric_display(&sanitize_numeric_input(
                        &self.planner_draft.years,
                        NumberInputOptions::WHOLE,
                    ))),
                ),
                ("planner-rate-value", amount_value(&self.planner_draft.rate)),
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

fn amount_value(raw: &str) -> String {
    ui::escape_html(&format_numeric_display(&sanitize_numeric_input(raw, NumberInputOptions::AMOUNT)))
}

fn render_records(rows: &[RecordRow]) -> String {
    rows.iter()
        .map(|row| {
            let id = ui::escape_html(&row.id);
            format!(
                r#"<div class="savings-card">
  <div class="info-line"><strong>{name}</strong>
    <span>
      <form method="post" action="/savings/records/{id}/edit" class="inline"><button type="submit" title="Edit">✎</button></form>
      <form method="post" action="/savings/records/{id}/delete" class="inline"><button type="submit" title="Delete">✕</button></form>
    </span>
  </div>
  <div><span class="muted">Maturity:</span> {maturity}</div>
  <div><span class="muted">Current balance:</span> {balance}</div>
  <div><span class="muted">Rate:</span> {rate:.2}%</div>
  <div><span class="muted">Interest:</span> {compounding}</div>
  <div>Expected balance: <strong>{expected}</strong></div>
</div>"#,
                name = ui::escape_html(&row.name),
                maturity = row.maturity_label,
                balance = ui::currency(row.current_balance),
                rate = row.rate,
                compounding = row.compounding_label,
                expected = ui::currency(row.expected_balance),
            )
        })
        .collect()
}

fn render_planner(outcome: &PlannerOutcome) -> String {
    match outcome {
        PlannerOutcome::Idle => String::new(),
        PlannerOutcome::Invalid(message) => ui::escape_html(message),
        PlannerOutcome::Ready(plan) => {
            let unit = if plan.years == 1 { "year" } else { "years" };
            format!(
                r#"<p>In {} {unit} with annual capitalization the total will be <strong>{}</strong>.</p><p class="muted">Total contributions: {}. Interest earned: {}.</p>"#,
                plan.years,
                ui::currency(plan.total),
                ui::currency(plan.contributions),
                ui::currency(plan.interest)
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::{expense, income};
    use crate::storage::MemoryKeyValueStore;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    fn record(balance: f64, rate: f64, maturity: &str, compounding: Compounding) -> SavingsRecord {
        SavingsRecord {
            id: "r1".to_string(),
            name: "Deposit".to_string(),
            maturity_date: date(maturity),
            current_balance: balance,
            rate,
            compounding,
        }
    }

    fn form(maturity: &str, balance: &str, rate: &str) -> SavingsForm {
        SavingsForm {
            maturity_date: maturity.to_string(),
            current_balance: balance.to_string(),
            rate: rate.to_string(),
            ..SavingsForm::default()
        }
    }

    fn tab() -> (Arc<MemoryKeyValueStore>, SavingsTab) {
        let local = Arc::new(MemoryKeyValueStore::default());
        let tab = SavingsTab::new(local.clone(), ChartSupport::Available);
        (local, tab)
    }

    #[test]
    fn monthly_compounding_over_a_year() {
        let value = expected_balance(&record(1000.0, 12.0, "2027-03-15", Compounding::Monthly), date("2026-03-01"));
        assert!((value - 1126.83).abs() < 0.01, "{value}");
    }

    #[test]
    fn annual_compounding_over_a_year() {
        let value = expected_balance(&record(1000.0, 12.0, "2027-03-15", Compounding::Annual), date("2026-03-01"));
        assert!((value - 1120.0).abs() < 1e-9, "{value}");
    }

    #[test]
    fn past_maturity_and_zero_rate_return_principal() {
        let today = date("2026-06-01");
        assert_eq!(expected_balance(&record(500.0, 10.0, "2025-01-01", Compounding::Monthly), today), 500.0);
        assert_eq!(expected_balance(&record(500.0, 0.0, "2030-01-01", Compounding::Monthly), today), 500.0);
        assert_eq!(expected_balance(&record(500.0, -5.0, "2030-01-01", Compounding::Annual), today), 500.0);
        assert_eq!(expected_balance(&record(0.0, 10.0, "2030-01-01", Compounding::Annual), today), 0.0);
    }

    #[test]
    fn planner_compounds_yearly() {
        let plan = calculate_plan(1000.0, 2, 0.10);
        // Year one: 12 000 * 1.1 = 13 200; year two: 25 200 * 1.1 = 27 720.
        assert!((plan.total - 27_720.0).abs() < 1e-6);
        assert_eq!(plan.contributions, 24_000.0);
        assert!((plan.interest - 3_720.0).abs() < 1e-6);

        let flat = calculate_plan(1000.0, 3, 0.0);
        assert_eq!(flat.total, 36_000.0);
        assert_eq!(flat.interest, 0.0);
    }

    #[test]
    fn planner_validates_input() {
        let invalid = PlannerForm {
            contribution: "0".to_string(),
            years: "5".to_string(),
            rate: String::new(),
        };
        assert_eq!(plan_from_form(&invalid), Err(SavingsError::Invalid(INVALID_PLAN)));

        let no_rate = PlannerForm {
            contribution: "1 000".to_string(),
            years: "1".to_string(),
            rate: String::new(),
        };
        assert_eq!(plan_from_form(&no_rate).unwrap().total, 12_000.0);
    }

    #[test]
    fn plan_result_is_kept_for_rendering() {
        let (_, mut tab) = tab();
        let err = tab.plan(PlannerForm::default()).unwrap_err();
        assert_eq!(err, SavingsError::Invalid(INVALID_PLAN));
        assert!(tab.render("{{planner-result}}").contains(INVALID_PLAN));

        tab.plan(PlannerForm {
            contribution: "1000".to_string(),
            years: "2".to_string(),
            rate: "10".to_string(),
        })
        .unwrap();
        assert!(tab.render("{{planner-result}}").contains("27 720 ₽"));
    }

    #[test]
    fn invalid_records_are_rejected_before_storage() {
        let (local, mut tab) = tab();
        for form in [form("", "100", "5"), form("2027-01-01", "0", "5"), form("2027-01-01", "100", "")] {
            assert_eq!(tab.submit(form), Err(SavingsError::Invalid(INVALID_RECORD)));
        }
        assert!(tab.records().is_empty());
        assert_eq!(local.load(STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn added_records_persist_and_reload() {
        let (local, mut tab) = tab();
        let added = tab.submit(form("2027-01-01", "10 000,50", "7.5")).unwrap();
        assert_eq!(added.name, DEFAULT_NAME);
        assert_eq!(added.current_balance, 10_000.5);
        assert_eq!(added.compounding, Compounding::Monthly);
        assert_eq!(tab.view().form_status.as_deref(), Some(RECORD_ADDED));

        let reloaded = SavingsTab::new(local, ChartSupport::Available);
        assert_eq!(reloaded.records(), [added]);
    }

    #[test]
    fn editing_replaces_in_place() {
        let (_, mut tab) = tab();
        let original = tab.submit(form("2027-01-01", "100", "5")).unwrap();
        tab.begin_edit(&original.id).unwrap();
        assert_eq!(tab.editing(), Some(original.id.as_str()));

        let mut changed = form("2028-01-01", "200", "6");
        changed.name = "Bonds".to_string();
        changed.compounding = "annual".to_string();
        let updated = tab.submit(changed).unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(tab.records().len(), 1);
        assert_eq!(tab.records()[0].name, "Bonds");
        assert_eq!(tab.records()[0].compounding, Compounding::Annual);
        assert_eq!(tab.editing(), None);
        assert_eq!(tab.view().form_status.as_deref(), Some(RECORD_UPDATED));
    }

    #[test]
    fn edit_of_deleted_record_is_added_back() {
        let (_, mut tab) = tab();
        let original = tab.submit(form("2027-01-01", "100", "5")).unwrap();
        tab.begin_edit(&original.id).unwrap();
        tab.records.clear();

        let restored = tab.submit(form("2027-02-01", "150", "5")).unwrap();
        assert_eq!(restored.id, original.id);
        assert_eq!(tab.records().len(), 1);
        assert_eq!(tab.view().form_status.as_deref(), Some(RECORD_ADDED));
    }

    #[test]
    fn deleting_the_edited_record_resets_the_form() {
        let (_, mut tab) = tab();
        let record = tab.submit(form("2027-01-01", "100", "5")).unwrap();
        tab.begin_edit(&record.id).unwrap();
        tab.delete(&record.id).unwrap();
        assert_eq!(tab.editing(), None);
        assert!(tab.records().is_empty());
        assert_eq!(tab.delete(&record.id), Err(SavingsError::UnknownRecord(record.id.clone())));
    }

    #[test]
    fn cancel_edit_clears_editing_state() {
        let (_, mut tab) = tab();
        let record = tab.submit(form("2027-01-01", "100", "5")).unwrap();
        tab.begin_edit(&record.id).unwrap();
        tab.cancel_edit();
        assert_eq!(tab.editing(), None);
        assert_eq!(tab.view().form_status.as_deref(), Some(EDIT_CANCELED));
        assert!(tab.render("{{savings-submit-label}}").contains("Add savings"));
    }

    #[test]
    fn corrupt_storage_starts_empty() {
        let local = Arc::new(MemoryKeyValueStore::default());
        local.save(STORAGE_KEY, "{not json").unwrap();
        let tab = SavingsTab::new(local, ChartSupport::Available);
        assert!(tab.records().is_empty());
        assert_eq!(tab.view().records, Section::empty(NO_RECORDS));
    }

    #[test]
    fn month_options_follow_income_and_keep_selection() {
        let (_, mut tab) = tab();
        assert_eq!(tab.selected_month(), current_month_value());

        tab.update_transactions(&[
            income("a", "2026-01-10", 100.0),
            income("b", "2026-03-10", 200.0),
            expense("c", "2026-05-10", 50.0, "food"),
        ]);
        let keys: Vec<String> = tab.view().months.into_iter().map(|option| option.key).collect();
        assert_eq!(keys, ["2026-03", "2026-01"]);
        assert_eq!(tab.selected_month(), "2026-03");

        tab.select_month("2026-01");
        tab.update_transactions(&[income("a", "2026-01-10", 100.0), income("d", "2026-04-01", 1.0)]);
        assert_eq!(tab.selected_month(), "2026-01");
        assert_eq!(tab.view().monthly_income, 100.0);

        tab.select_month("1999-01");
        assert_eq!(tab.selected_month(), "2026-01");
    }

    #[test]
    fn monthly_goal_progress_is_bounded() {
        let (_, mut tab) = tab();
        tab.update_transactions(&[income("a", "2026-01-10", 300_000.0)]);
        let view = tab.view();
        assert_eq!(view.monthly_goal.percent, 200);
        assert_eq!(view.monthly_goal.bar_percent, 100);
    }

    #[test]
    fn payout_chart_spans_a_year_past_last_maturity() {
        let today = date("2026-03-20");
        let records = vec![
            record(1000.0, 0.0, "2026-05-02", Compounding::Monthly),
            record(500.0, 0.0, "2026-05-28", Compounding::Annual),
        ];
        let chart = payout_chart(&records, today);
        assert_eq!(chart.keys.first().map(String::as_str), Some("2026-03"));
        assert_eq!(chart.keys.last().map(String::as_str), Some("2027-05"));
        assert_eq!(chart.keys.len(), 15);
        assert_eq!(chart.series[0].values, vec![MONTHLY_GOAL; 15]);
        assert_eq!(chart.series[1].values[2], 1500.0);

        let empty = payout_chart(&[], today);
        assert_eq!(empty.keys.last().map(String::as_str), Some("2027-03"));
        assert_eq!(empty.keys.len(), 13);
    }

    #[test]
    fn payout_chart_honors_chart_support() {
        let tab = SavingsTab::new(Arc::new(MemoryKeyValueStore::default()), ChartSupport::Unavailable);
        assert_eq!(tab.view().payout_chart, Section::empty(crate::tabs::CHART_UNAVAILABLE));
    }
}
