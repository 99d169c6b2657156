//! Application shell: owns the category and transaction snapshots, builds tab
//! controllers on first use and fans every data update out to the ones that
//! exist.

use crate::assets::{AssetError, AssetSource, load_categories};
use crate::gateway::{SnapshotEvent, Subscription, TransactionStore, friendly_message};
use crate::models::{Category, Transaction};
use crate::storage::KeyValueStore;
use crate::tabs::{AnalyticsTab, ChartSupport, OperationsTab, SavingsTab};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

pub const CATEGORIES_FAILED: &str = "Could not load categories. Check data/categories.json";
pub const TAB_FAILED: &str = "Could not open the tab. Check the server log.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TabId {
    Operations,
    Analytics,
    Savings,
}

impl TabId {
    pub const ALL: [TabId; 3] = [TabId::Operations, TabId::Analytics, TabId::Savings];
    pub const DEFAULT: TabId = TabId::Operations;

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Operations => "operations",
            Self::Analytics => "analytics",
            Self::Savings => "savings",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Operations => "Operations",
            Self::Analytics => "Analytics",
            Self::Savings => "Savings",
        }
    }

    pub fn template_url(self) -> String {
        format!("tabs/{}.html", self.as_str())
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tab {0:?}")]
pub struct UnknownTab(pub String);

impl FromStr for TabId {
    type Err = UnknownTab;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TabId::ALL
            .into_iter()
            .find(|tab| tab.as_str() == value)
            .ok_or_else(|| UnknownTab(value.to_string()))
    }
}

/// What every tab exposes to the shell.
pub trait TabController: Any + Send + Sync {
    /// Replaces the transaction snapshot and re-derives the view.
    fn update_transactions(&mut self, transactions: &[Transaction]);

    /// Replaces the category list and re-derives the parts that use it.
    fn update_categories(&mut self, categories: &[Category]);

    /// Fills the tab fragment's `{{slot}}` markers.
    fn render(&self, fragment: &str) -> String;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Collaborators handed to controllers when they are constructed.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn TransactionStore>,
    pub local: Arc<dyn KeyValueStore>,
    pub charts: ChartSupport,
}

pub struct TabContext {
    pub categories: Vec<Category>,
    pub services: Services,
}

pub type TabFactory = Arc<dyn Fn(&TabContext) -> Box<dyn TabController> + Send + Sync>;

#[derive(Clone)]
pub struct TabRegistry {
    factories: BTreeMap<TabId, TabFactory>,
}

impl TabRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    pub fn with(mut self, id: TabId, factory: TabFactory) -> Self {
        self.factories.insert(id, factory);
        self
    }

    fn get(&self, id: TabId) -> Option<&TabFactory> {
        self.factories.get(&id)
    }
}

impl Default for TabRegistry {
    fn default() -> Self {
        Self::empty()
            .with(TabId::Operations, Arc::new(operations_tab))
            .with(TabId::Analytics, Arc::new(analytics_tab))
            .with(TabId::Savings, Arc::new(savings_tab))
    }
}

fn operations_tab(ctx: &TabContext) -> Box<dyn TabController> {
    Box::new(OperationsTab::new(&ctx.categories, ctx.services.store.clone()))
}

fn analytics_tab(ctx: &TabContext) -> Box<dyn TabController> {
    Box::new(AnalyticsTab::new(&ctx.categories, ctx.services.charts))
}

fn savings_tab(ctx: &TabContext) -> Box<dyn TabController> {
    Box::new(SavingsTab::new(ctx.services.local.clone(), ctx.services.charts))
}

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("tab {0} is not registered")]
    Unregistered(TabId),
    #[error("failed to load template for tab {tab}: {source}")]
    Template {
        tab: TabId,
        #[source]
        source: AssetError,
    },
    #[error("template for tab {0} is empty")]
    EmptyTemplate(TabId),
}

struct TabInstance {
    fragment: String,
    controller: Box<dyn TabController>,
}

/// A constructed tab as the page shows it.
pub struct TabView {
    pub id: TabId,
    pub active: bool,
    pub html: String,
}

pub struct Shell {
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
    tabs: BTreeMap<TabId, TabInstance>,
    active: Option<TabId>,
    status: Option<String>,
    registry: TabRegistry,
    assets: Arc<dyn AssetSource>,
    services: Services,
}

impl Shell {
    pub fn new(registry: TabRegistry, assets: Arc<dyn AssetSource>, services: Services) -> Self {
        Self {
            categories: Vec::new(),
            transactions: Vec::new(),
            tabs: BTreeMap::new(),
            active: None,
            status: None,
            registry,
            assets,
            services,
        }
    }

    /// Loads categories, then shows the default tab.
    pub async fn boot(&mut self) {
        self.load_categories().await;
        // A failure is already on the banner.
        let _ = self.show_tab(TabId::DEFAULT).await;
    }

    pub async fn load_categories(&mut self) {
        match load_categories(self.assets.as_ref()).await {
            Ok(categories) => {
                info!("loaded {} categories", categories.len());
                self.set_categories(categories);
            }
            Err(err) => {
                error!("failed to load categories: {err}");
                self.set_categories(Vec::new());
                self.set_status(Some(CATEGORIES_FAILED.to_string()));
            }
        }
    }

    /// Builds the tab if needed and makes it the visible one. On failure the
    /// previously active tab stays active.
    pub async fn show_tab(&mut self, id: TabId) -> Result<(), ShellError> {
        self.ensure_tab(id).await?;
        self.active = Some(id);
        Ok(())
    }

    /// Builds the tab on first use without changing which tab is visible.
    /// A failed build is logged and shown on the banner.
    pub async fn ensure_tab(&mut self, id: TabId) -> Result<(), ShellError> {
        if self.tabs.contains_key(&id) {
            return Ok(());
        }
        if let Err(err) = self.construct_tab(id).await {
            error!("failed to open tab {id}: {err}");
            self.set_status(Some(TAB_FAILED.to_string()));
            return Err(err);
        }
        Ok(())
    }

    async fn construct_tab(&mut self, id: TabId) -> Result<(), ShellError> {
        let factory = self.registry.get(id).cloned().ok_or(ShellError::Unregistered(id))?;
        let fragment = self
            .assets
            .fetch(&id.template_url())
            .await
            .map_err(|source| ShellError::Template { tab: id, source })?;
        if fragment.trim().is_empty() {
            return Err(ShellError::EmptyTemplate(id));
        }

        let mut controller = factory(&TabContext {
            categories: self.categories.clone(),
            services: self.services.clone(),
        });
        controller.update_categories(&self.categories);
        controller.update_transactions(&self.transactions);

        info!("constructed tab {id}");
        self.tabs.insert(id, TabInstance { fragment, controller });
        Ok(())
    }

    pub fn set_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
        for instance in self.tabs.values_mut() {
            instance.controller.update_transactions(&self.transactions);
        }
    }

    pub fn set_categories(&mut self, categories: Vec<Category>) {
        self.categories = categories;
        for instance in self.tabs.values_mut() {
            instance.controller.update_categories(&self.categories);
        }
    }

    /// Applies one live-query delivery.
    pub fn apply_snapshot(&mut self, event: SnapshotEvent) {
        match event {
            Ok(transactions) => {
                self.set_transactions(transactions);
                self.set_status(None);
            }
            Err(err) => {
                error!("transaction subscription failed: {err}");
                self.set_status(Some(friendly_message(Some(&err))));
            }
        }
    }

    pub fn set_status(&mut self, message: Option<String>) {
        self.status = message.filter(|message| !message.is_empty());
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn active_tab(&self) -> Option<TabId> {
        self.active
    }

    pub fn is_loaded(&self, id: TabId) -> bool {
        self.tabs.contains_key(&id)
    }

    pub fn loaded_tabs(&self) -> Vec<TabId> {
        self.tabs.keys().copied().collect()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn controller<T: TabController>(&self, id: TabId) -> Option<&T> {
        self.tabs.get(&id)?.controller.as_any().downcast_ref::<T>()
    }

    pub fn controller_mut<T: TabController>(&mut self, id: TabId) -> Option<&mut T> {
        self.tabs.get_mut(&id)?.controller.as_any_mut().downcast_mut::<T>()
    }

    pub fn render_tab(&self, id: TabId) -> Option<String> {
        let instance = self.tabs.get(&id)?;
        Some(instance.controller.render(&instance.fragment))
    }

    /// Every constructed tab in navigation order, with exactly the active one
    /// flagged.
    pub fn views(&self) -> Vec<TabView> {
        self.tabs
            .iter()
            .map(|(id, instance)| TabView {
                id: *id,
                active: self.active == Some(*id),
                html: instance.controller.render(&instance.fragment),
            })
            .collect()
    }
}

/// Boots the shell and opens the live transaction subscription.
pub async fn start(shell: &Mutex<Shell>, store: &dyn TransactionStore) -> Subscription {
    shell.lock().await.boot().await;
    store.subscribe().await
}

/// Applies subscription events one at a time, in arrival order.
pub async fn run_subscription(shell: Arc<Mutex<Shell>>, mut subscription: Subscription) {
    while let Some(event) = subscription.next().await {
        shell.lock().await.apply_snapshot(event);
    }
    warn!("transaction subscription closed");
}
