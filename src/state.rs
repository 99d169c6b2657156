use crate::assets::DirAssetSource;
use crate::config::Config;
use crate::gateway::{JsonFileStore, TransactionStore};
use crate::shell::{Services, Shell, TabRegistry};
use crate::storage::FileKeyValueStore;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub shell: Arc<Mutex<Shell>>,
    pub store: Arc<dyn TransactionStore>,
}

impl AppState {
    pub fn new(shell: Shell, store: Arc<dyn TransactionStore>) -> Self {
        Self {
            shell: Arc::new(Mutex::new(shell)),
            store,
        }
    }

    /// Wires the file-backed store, local storage and assets named by `config`.
    pub async fn from_config(config: &Config) -> Self {
        let store: Arc<dyn TransactionStore> = Arc::new(JsonFileStore::open(config.data_path.clone()).await);
        let services = Services {
            store: store.clone(),
            local: Arc::new(FileKeyValueStore::new(&config.savings_dir)),
            charts: config.charts,
        };
        let assets = Arc::new(DirAssetSource::new(&config.assets_dir));
        Self::new(Shell::new(TabRegistry::default(), assets, services), store)
    }
}
