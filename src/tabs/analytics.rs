use super::{ChartSeries, ChartSpec, ChartSupport, Section, TransactionRow, month_label, rows};
use crate::aggregate::{
    FORECAST_HORIZON_MONTHS, Forecast, RECENT_LIMIT, category_key, category_label, forecast, group_by_month, recent,
    sum_by,
};
use crate::format::format_amount;
use crate::models::{Category, Transaction, TransactionType};
use crate::shell::TabController;
use crate::ui;
use serde::Serialize;
use std::any::Any;

pub const NO_DATA: &str = "No data yet.";
pub const NO_EXPENSES: &str = "No expenses yet.";
pub const NOT_ENOUGH_DATA: &str = "Not enough data for a forecast.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthRow {
    pub month: String,
    pub label: String,
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub category: String,
    pub label: String,
    pub total: f64,
    pub monthly_average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastView {
    pub average_net: f64,
    pub horizon_months: u32,
    pub horizon_total: f64,
    pub months_used: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsView {
    pub monthly_overview: Section<Vec<MonthRow>>,
    pub category_breakdown: Section<Vec<CategoryRow>>,
    pub forecast: Section<ForecastView>,
    pub recent_transactions: Section<Vec<TransactionRow>>,
    pub trend_chart: Section<ChartSpec>,
}

/// Monthly overview, expense breakdown, forecast and recent activity.
pub struct AnalyticsTab {
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
    charts: ChartSupport,
    view: AnalyticsView,
}

impl AnalyticsTab {
    pub fn new(categories: &[Category], charts: ChartSupport) -> Self {
        Self {
            categories: categories.to_vec(),
            transactions: Vec::new(),
            charts,
            view: build_view(&[], categories, charts),
        }
    }

    pub fn view(&self) -> &AnalyticsView {
        &self.view
    }

    fn rebuild(&mut self) {
        self.view = build_view(&self.transactions, &self.categories, self.charts);
    }
}

impl TabController for AnalyticsTab {
    fn update_transactions(&mut self, transactions: &[Transaction]) {
        self.transactions = transactions.to_vec();
        self.rebuild();
    }

    fn update_categories(&mut self, categories: &[Category]) {
        self.categories = categories.to_vec();
        self.rebuild();
    }

    fn render(&self, fragment: &str) -> String {
        let view = &self.view;
        ui::fill_slots(
            fragment,
            &[
                (
                    "monthly-overview",
                    ui::section(&view.monthly_overview, |months| render_months(months)),
                ),
                (
                    "category-breakdown",
                    ui::section(&view.category_breakdown, |categories| render_categories(categories)),
                ),
                ("forecast", ui::section(&view.forecast, render_forecast)),
                (
                    "recent-transactions",
                    ui::section(&view.recent_transactions, |rows| ui::transaction_list(rows, false)),
                ),
                ("trend-chart", ui::chart(&view.trend_chart)),
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

pub fn build_view(transactions: &[Transaction], categories: &[Category], charts: ChartSupport) -> AnalyticsView {
    let monthly = group_by_month(transactions);

    let months: Vec<MonthRow> = monthly
        .iter()
        .map(|(month, totals)| MonthRow {
            month: month.clone(),
            label: month_label(month),
            income: totals.income,
            expense: totals.expense,
            net: totals.net(),
        })
        .collect();

    let monthly_overview = if months.is_empty() {
        Section::empty(NO_DATA)
    } else {
        Section::Ready(months.clone())
    };

    let trend = (!months.is_empty()).then(|| ChartSpec {
        keys: months.iter().map(|row| row.month.clone()).collect(),
        labels: months.iter().map(|row| row.label.clone()).collect(),
        series: vec![
            ChartSeries {
                name: "Income".to_string(),
                kind: "bar",
                values: months.iter().map(|row| row.income).collect(),
            },
            ChartSeries {
                name: "Expense".to_string(),
                kind: "bar",
                values: months.iter().map(|row| row.expense).collect(),
            },
            ChartSeries {
                name: "Net".to_string(),
                kind: "line",
                values: months.iter().map(|row| row.net).collect(),
            },
        ],
    });

    let forecast = match forecast(&monthly) {
        Forecast::Insufficient => Section::empty(NOT_ENOUGH_DATA),
        Forecast::Projection {
            average_net,
            horizon_total,
            months_used,
        } => Section::Ready(ForecastView {
            average_net,
            horizon_months: FORECAST_HORIZON_MONTHS,
            horizon_total,
            months_used,
        }),
    };

    let latest = recent(transactions, RECENT_LIMIT);
    let recent_transactions = if latest.is_empty() {
        Section::empty(NO_DATA)
    } else {
        Section::Ready(rows(latest, categories))
    };

    AnalyticsView {
        monthly_overview,
        category_breakdown: category_breakdown(transactions, categories),
        forecast,
        recent_transactions,
        trend_chart: ChartSpec::section(charts, trend, NO_DATA),
    }
}

fn category_breakdown(transactions: &[Transaction], categories: &[Category]) -> Section<Vec<CategoryRow>> {
    let expenses: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| tx.kind == TransactionType::Expense)
        .collect();
    if expenses.is_empty() {
        return Section::empty(NO_EXPENSES);
    }

    let months_count = group_by_month(expenses.iter().copied()).len().max(1) as f64;
    let by_category = sum_by(expenses.iter().copied(), |tx| Some(category_key(tx)));

    let mut rows: Vec<CategoryRow> = by_category
        .into_iter()
        .map(|(key, totals)| CategoryRow {
            label: category_label(categories, &key),
            total: totals.expense,
            monthly_average: totals.expense / months_count,
            category: key,
        })
        .collect();
    rows.sort_by(|a, b| b.total.total_cmp(&a.total));
    Section::Ready(rows)
}

fn render_months(months: &[MonthRow]) -> String {
    let items: String = months
        .iter()
        .map(|row| {
            format!(
                "<li><strong>{}</strong>: income {}, expense {}, net {}</li>",
                ui::escape_html(&row.label),
                format_amount(row.income),
                format_amount(row.expense),
                format_amount(row.net)
            )
        })
        .collect();
    format!("<ul>{items}</ul>")
}

fn render_categories(categories: &[CategoryRow]) -> String {
    let items: String = categories
        .iter()
        .map(|row| {
            format!(
                "<li>{}: total {}, on average {} per month</li>",
                ui::escape_html(&row.label),
                format_amount(row.total),
                format_amount(row.monthly_average)
            )
        })
        .collect();
    format!("<ul>{items}</ul>")
}

fn render_forecast(forecast: &ForecastView) -> String {
    format!(
        r#"<p>Expected average monthly net: <strong>{}</strong></p><p>{}-month forecast: <strong>{}</strong></p><p class="muted">Based on the last {} months with data.</p>"#,
        format_amount(forecast.average_net),
        forecast.horizon_months,
        format_amount(forecast.horizon_total),
        forecast.months_used
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::{categories, expense, income};
    use crate::tabs::CHART_UNAVAILABLE;

    fn sample() -> Vec<Transaction> {
        vec![
            income("a", "2026-02-01", 100.0),
            expense("b", "2026-02-10", 40.0, "food"),
            expense("c", "2026-01-15", 30.0, "travel"),
            income("d", "2026-01-03", 10.0),
        ]
    }

    #[test]
    fn empty_lists_show_fixed_messages() {
        let tab = AnalyticsTab::new(&[], ChartSupport::Available);
        let view = tab.view();
        assert_eq!(view.monthly_overview, Section::empty(NO_DATA));
        assert_eq!(view.category_breakdown, Section::empty(NO_EXPENSES));
        assert_eq!(view.forecast, Section::empty(NOT_ENOUGH_DATA));
        assert_eq!(view.recent_transactions, Section::empty(NO_DATA));
        assert_eq!(view.trend_chart, Section::empty(NO_DATA));
    }

    #[test]
    fn monthly_overview_is_ascending_with_net() {
        let mut tab = AnalyticsTab::new(&categories(), ChartSupport::Available);
        tab.update_transactions(&sample());

        let months = tab.view().monthly_overview.ready().unwrap();
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, "2026-01");
        assert_eq!(months[1].month, "2026-02");
        assert_eq!(months[1].net, 60.0);
        assert_eq!(months[1].label, "February 2026");
    }

    #[test]
    fn updates_are_idempotent() {
        let mut tab = AnalyticsTab::new(&categories(), ChartSupport::Available);
        tab.update_transactions(&sample());
        let first = tab.view().clone();
        let first_html = tab.render("{{monthly-overview}}{{forecast}}");
        tab.update_transactions(&sample());
        assert_eq!(tab.view(), &first);
        assert_eq!(tab.render("{{monthly-overview}}{{forecast}}"), first_html);
    }

    #[test]
    fn forecast_with_two_months_projects_double_average() {
        let mut tab = AnalyticsTab::new(&[], ChartSupport::Available);
        tab.update_transactions(&[income("a", "2026-03-01", 100.0), income("b", "2026-02-01", 200.0)]);
        let forecast = tab.view().forecast.ready().unwrap();
        assert_eq!(forecast.average_net, 150.0);
        assert_eq!(forecast.horizon_total, 300.0);
    }

    #[test]
    fn forecast_with_one_month_is_insufficient() {
        let mut tab = AnalyticsTab::new(&[], ChartSupport::Available);
        tab.update_transactions(&[income("a", "2026-03-01", 100.0), income("b", "2026-03-02", 200.0)]);
        assert_eq!(tab.view().forecast, Section::empty(NOT_ENOUGH_DATA));
    }

    #[test]
    fn category_breakdown_averages_over_expense_months() {
        let mut tab = AnalyticsTab::new(&categories(), ChartSupport::Available);
        tab.update_transactions(&sample());

        let rows = tab.view().category_breakdown.ready().unwrap();
        assert_eq!(rows[0].label, "Food");
        assert_eq!(rows[0].total, 40.0);
        assert_eq!(rows[0].monthly_average, 20.0);
        assert_eq!(rows[1].label, "travel");
    }

    #[test]
    fn category_updates_relabel_existing_data() {
        let mut tab = AnalyticsTab::new(&[], ChartSupport::Available);
        tab.update_transactions(&sample());
        assert_eq!(tab.view().category_breakdown.ready().unwrap()[0].label, "food");

        tab.update_categories(&categories());
        assert_eq!(tab.view().category_breakdown.ready().unwrap()[0].label, "Food");
    }

    #[test]
    fn missing_chart_library_falls_back_to_text() {
        let mut tab = AnalyticsTab::new(&[], ChartSupport::Unavailable);
        tab.update_transactions(&sample());
        assert_eq!(tab.view().trend_chart, Section::empty(CHART_UNAVAILABLE));
        assert!(tab.render("{{trend-chart}}").contains(CHART_UNAVAILABLE));
    }

    #[test]
    fn fragment_without_slots_renders_nothing_extra() {
        let mut tab = AnalyticsTab::new(&[], ChartSupport::Available);
        tab.update_transactions(&sample());
        assert_eq!(tab.render("<h2>Analytics</h2>"), "<h2>Analytics</h2>");
    }
}
