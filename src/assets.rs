//! Static assets addressed by relative URL: tab fragments and the category
//! catalog.

use crate::models::{Category, CategoryCatalog};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

pub const CATEGORIES_URL: &str = "data/categories.json";

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset {url} not found")]
    NotFound { url: String },
    #[error("failed to read asset {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("asset {url} is malformed: {reason}")]
    Malformed { url: String, reason: String },
}

#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, AssetError>;
}

/// Serves assets from a directory on disk.
pub struct DirAssetSource {
    root: PathBuf,
}

impl DirAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, AssetError> {
        let relative = Path::new(url);
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if url.is_empty() || !plain {
            return Err(AssetError::Malformed {
                url: url.to_string(),
                reason: "asset URLs must be plain relative paths".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AssetSource for DirAssetSource {
    async fn fetch(&self, url: &str) -> Result<String, AssetError> {
        let path = self.resolve(url)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(AssetError::NotFound { url: url.to_string() });
            }
            Err(source) => {
                return Err(AssetError::Io {
                    url: url.to_string(),
                    source,
                });
            }
        };
        String::from_utf8(bytes).map_err(|err| AssetError::Malformed {
            url: url.to_string(),
            reason: err.to_string(),
        })
    }
}

pub async fn load_categories(source: &dyn AssetSource) -> Result<Vec<Category>, AssetError> {
    let raw = source.fetch(CATEGORIES_URL).await?;
    let catalog: CategoryCatalog = serde_json::from_str(&raw).map_err(|err| AssetError::Malformed {
        url: CATEGORIES_URL.to_string(),
        reason: err.to_string(),
    })?;
    Ok(catalog.major_categories)
}
