use crate::errors::AppError;
use crate::gateway::TransactionStore;
use crate::models::{
    Category, NewTransaction, PlannerForm, SavingsForm, SavingsRecord, StatusResponse, TabQuery, Transaction,
    TransactionForm,
};
use crate::shell::{Shell, TabController, TabId, UnknownTab};
use crate::state::AppState;
use crate::tabs::analytics::AnalyticsView;
use crate::tabs::operations::OperationsView;
use crate::tabs::savings::{Plan, SavingsView};
use crate::tabs::{AnalyticsTab, OperationsTab, SavingsTab};
use crate::ui::render_shell;
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use tracing::warn;

pub async fn index(State(state): State<AppState>, Query(query): Query<TabQuery>) -> Result<Html<String>, AppError> {
    let mut shell = state.shell.lock().await;

    // A tab that cannot be built leaves its filter unapplied; the banner
    // reports it and the page still renders.
    if let Some(month) = query.month.as_deref() {
        if let Ok(tab) = tab_mut::<OperationsTab>(&mut shell, TabId::Operations).await {
            tab.set_month_filter(Some(month));
        }
    }
    if let Some(month) = query.savings_month.as_deref() {
        if let Ok(tab) = tab_mut::<SavingsTab>(&mut shell, TabId::Savings).await {
            tab.select_month(month);
        }
    }

    match query.tab.as_deref() {
        Some(raw) => {
            let id = parse_tab(raw)?;
            // Failures land on the banner and keep the current tab.
            let _ = shell.show_tab(id).await;
        }
        None if shell.active_tab().is_none() => {
            let _ = shell.show_tab(TabId::DEFAULT).await;
        }
        None => {}
    }

    Ok(Html(render_shell(&shell)))
}

pub async fn tab_fragment(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Html<String>, AppError> {
    let id = parse_tab(&raw)?;
    let mut shell = state.shell.lock().await;
    shell.ensure_tab(id).await?;
    let html = shell
        .render_tab(id)
        .ok_or_else(|| AppError::internal(format!("tab {id} has no view")))?;
    Ok(Html(html))
}

pub async fn add_transaction_form(
    State(state): State<AppState>,
    Form(form): Form<TransactionForm>,
) -> Result<Redirect, AppError> {
    let mut shell = state.shell.lock().await;
    let Ok(tab) = tab_mut::<OperationsTab>(&mut shell, TabId::Operations).await else {
        return Ok(back_to(TabId::Operations));
    };
    if let Err(err) = tab.submit(form).await {
        warn!("transaction form rejected: {err}");
    }
    Ok(back_to(TabId::Operations))
}

pub async fn refresh_form(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let mut shell = state.shell.lock().await;
    // Failures land in the refresh status or on the banner.
    let _ = refresh(&mut shell).await;
    Ok(back_to(TabId::Operations))
}

pub async fn savings_submit_form(
    State(state): State<AppState>,
    Form(form): Form<SavingsForm>,
) -> Result<Redirect, AppError> {
    let mut shell = state.shell.lock().await;
    let Ok(tab) = tab_mut::<SavingsTab>(&mut shell, TabId::Savings).await else {
        return Ok(back_to(TabId::Savings));
    };
    if let Err(err) = tab.submit(form) {
        warn!("savings form rejected: {err}");
    }
    Ok(back_to(TabId::Savings))
}

pub async fn savings_edit_form(State(state): State<AppState>, Path(id): Path<String>) -> Result<Redirect, AppError> {
    let mut shell = state.shell.lock().await;
    if let Ok(tab) = tab_mut::<SavingsTab>(&mut shell, TabId::Savings).await {
        tab.begin_edit(&id)?;
    }
    Ok(back_to(TabId::Savings))
}

pub async fn savings_delete_form(State(state): State<AppState>, Path(id): Path<String>) -> Result<Redirect, AppError> {
    let mut shell = state.shell.lock().await;
    if let Ok(tab) = tab_mut::<SavingsTab>(&mut shell, TabId::Savings).await {
        tab.delete(&id)?;
    }
    Ok(back_to(TabId::Savings))
}

pub async fn savings_cancel_edit_form(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let mut shell = state.shell.lock().await;
    if let Ok(tab) = tab_mut::<SavingsTab>(&mut shell, TabId::Savings).await {
        tab.cancel_edit();
    }
    Ok(back_to(TabId::Savings))
}

pub async fn planner_form(State(state): State<AppState>, Form(form): Form<PlannerForm>) -> Result<Redirect, AppError> {
    let mut shell = state.shell.lock().await;
    // Invalid input is shown in the planner result.
    if let Ok(tab) = tab_mut::<SavingsTab>(&mut shell, TabId::Savings).await {
        let _ = tab.plan(form);
    }
    Ok(back_to(TabId::Savings))
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let shell = state.shell.lock().await;
    Json(StatusResponse {
        status: shell.status().map(str::to_string),
        active_tab: shell.active_tab().map(|id| id.as_str().to_string()),
        loaded_tabs: shell
            .loaded_tabs()
            .into_iter()
            .map(|id| id.as_str().to_string())
            .collect(),
        transaction_count: shell.transactions().len(),
        category_count: shell.categories().len(),
    })
}

pub async fn get_categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    let shell = state.shell.lock().await;
    Json(shell.categories().to_vec())
}

pub async fn list_transactions(State(state): State<AppState>) -> Result<Json<Vec<Transaction>>, AppError> {
    Ok(Json(state.store.fetch_once().await?))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Json(payload): Json<NewTransaction>,
) -> Result<StatusCode, AppError> {
    state.store.create(payload).await?;
    Ok(StatusCode::CREATED)
}

pub async fn refresh_transactions(State(state): State<AppState>) -> Result<Json<Vec<Transaction>>, AppError> {
    let mut shell = state.shell.lock().await;
    Ok(Json(refresh(&mut shell).await?))
}

pub async fn get_operations(
    State(state): State<AppState>,
    Query(query): Query<TabQuery>,
) -> Result<Json<OperationsView>, AppError> {
    let mut shell = state.shell.lock().await;
    let tab = tab_mut::<OperationsTab>(&mut shell, TabId::Operations).await?;
    if let Some(month) = query.month.as_deref() {
        tab.set_month_filter(Some(month));
    }
    Ok(Json(tab.view().clone()))
}

pub async fn get_analytics(State(state): State<AppState>) -> Result<Json<AnalyticsView>, AppError> {
    let mut shell = state.shell.lock().await;
    let tab = tab_mut::<AnalyticsTab>(&mut shell, TabId::Analytics).await?;
    Ok(Json(tab.view().clone()))
}

pub async fn get_savings(State(state): State<AppState>) -> Result<Json<SavingsView>, AppError> {
    let mut shell = state.shell.lock().await;
    let tab = tab_mut::<SavingsTab>(&mut shell, TabId::Savings).await?;
    Ok(Json(tab.view()))
}

pub async fn create_savings(
    State(state): State<AppState>,
    Json(form): Json<SavingsForm>,
) -> Result<(StatusCode, Json<SavingsRecord>), AppError> {
    let mut shell = state.shell.lock().await;
    let record = tab_mut::<SavingsTab>(&mut shell, TabId::Savings).await?.submit(form)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn delete_savings(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, AppError> {
    let mut shell = state.shell.lock().await;
    tab_mut::<SavingsTab>(&mut shell, TabId::Savings).await?.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn plan_savings(
    State(state): State<AppState>,
    Json(form): Json<PlannerForm>,
) -> Result<Json<Plan>, AppError> {
    let mut shell = state.shell.lock().await;
    let plan = tab_mut::<SavingsTab>(&mut shell, TabId::Savings).await?.plan(form)?;
    Ok(Json(plan))
}

/// Manual reload through the operations tab, broadcast to every tab.
async fn refresh(shell: &mut Shell) -> Result<Vec<Transaction>, AppError> {
    let tab = tab_mut::<OperationsTab>(shell, TabId::Operations).await?;
    let transactions = tab.refresh().await?;
    shell.set_transactions(transactions.clone());
    Ok(transactions)
}

/// Builds the tab if needed and returns its controller.
async fn tab_mut<T: TabController>(shell: &mut Shell, id: TabId) -> Result<&mut T, AppError> {
    shell.ensure_tab(id).await?;
    shell
        .controller_mut::<T>(id)
        .ok_or_else(|| AppError::internal(format!("tab {id} has an unexpected controller")))
}

fn parse_tab(raw: &str) -> Result<TabId, AppError> {
    raw.trim_end_matches(".html")
        .parse()
        .map_err(|err: UnknownTab| AppError::not_found(err.to_string()))
}

fn back_to(id: TabId) -> Redirect {
    Redirect::to(&format!("/?tab={id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::DirAssetSource;
    use crate::gateway::JsonFileStore;
    use crate::shell::{Services, TAB_FAILED, TabRegistry};
    use crate::storage::MemoryKeyValueStore;
    use crate::tabs::ChartSupport;
    use axum::response::IntoResponse;
    use std::sync::Arc;

    /// State whose assets lack the operations fragment.
    fn state_without_operations(dir: &tempfile::TempDir) -> AppState {
        std::fs::create_dir_all(dir.path().join("tabs")).unwrap();
        std::fs::write(dir.path().join("tabs/analytics.html"), "<div>{{monthly-overview}}</div>").unwrap();

        let store: Arc<dyn TransactionStore> = Arc::new(JsonFileStore::in_memory());
        let services = Services {
            store: store.clone(),
            local: Arc::new(MemoryKeyValueStore::default()),
            charts: ChartSupport::Unavailable,
        };
        let shell = Shell::new(TabRegistry::default(), Arc::new(DirAssetSource::new(dir.path())), services);
        AppState::new(shell, store)
    }

    #[tokio::test]
    async fn page_renders_with_banner_when_month_tab_cannot_be_built() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_without_operations(&dir);
        let query = TabQuery {
            tab: Some("analytics".to_string()),
            month: Some("2026-01".to_string()),
            savings_month: None,
        };

        let Ok(Html(page)) = index(State(state.clone()), Query(query)).await else {
            panic!("shell page was not rendered");
        };

        assert!(page.contains(TAB_FAILED));
        assert!(page.contains(r#"data-view="analytics""#));
        assert!(!page.contains(r#"data-view="operations""#));

        let shell = state.shell.lock().await;
        assert_eq!(shell.status(), Some(TAB_FAILED));
        assert_eq!(shell.active_tab(), Some(TabId::Analytics));
    }

    #[tokio::test]
    async fn form_post_redirects_when_tab_cannot_be_built() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_without_operations(&dir);
        let form = TransactionForm {
            date: "2026-01-05".to_string(),
            amount: "10".to_string(),
            ..TransactionForm::default()
        };

        let Ok(redirect) = add_transaction_form(State(state.clone()), Form(form)).await else {
            panic!("form post did not redirect");
        };
        let response = redirect.into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/?tab=operations");
        assert!(state.store.fetch_once().await.unwrap().is_empty());
        assert_eq!(state.shell.lock().await.status(), Some(TAB_FAILED));
    }

    #[tokio::test]
    async fn fragment_request_reports_friendly_failure() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_without_operations(&dir);

        let Err(err) = tab_fragment(State(state.clone()), Path("operations".to_string())).await else {
            panic!("missing fragment was served");
        };

        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.message, TAB_FAILED);
        assert_eq!(state.shell.lock().await.status(), Some(TAB_FAILED));
    }
}
