//! Data gateway over the transaction store.
//!
//! [`TransactionStore`] is the boundary the rest of the application talks to:
//! a live ordered subscription, a one-shot fetch and record creation.
//! [`JsonFileStore`] keeps the collection in memory, mirrors it to a JSON
//! file and pushes every change to live subscribers.

use crate::models::{NewTransaction, RecurrenceInterval, Transaction};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{Mutex, mpsc};
use tracing::{error, info, warn};
use uuid::Uuid;

pub const GENERIC_STORE_MESSAGE: &str = "Could not complete the operation. Check the data store settings.";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => "permission-denied",
            Self::Unavailable(_) => "unavailable",
            Self::FailedPrecondition(_) => "failed-precondition",
            Self::InvalidArgument(_) => "invalid-argument",
            Self::Other(_) => "unknown",
        }
    }

    fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            _ => Self::Unavailable(err.to_string()),
        }
    }
}

/// Fixed user-facing text for a store failure.
pub fn friendly_message(error: Option<&StoreError>) -> String {
    let message = match error {
        Some(StoreError::PermissionDenied(_)) => "No access: check the data store permissions.",
        Some(StoreError::Unavailable(_)) => "The data store is temporarily unavailable. Try again later.",
        Some(StoreError::FailedPrecondition(_)) => {
            "The data store is not ready for this query. Check the data file and try again."
        }
        Some(StoreError::InvalidArgument(_)) => "The record was rejected: check the date and amount.",
        Some(StoreError::Other(_)) | None => GENERIC_STORE_MESSAGE,
    };
    message.to_string()
}

/// One delivery of a live query: the full ordered result set, or the failure.
pub type SnapshotEvent = Result<Vec<Transaction>, StoreError>;

/// Live query handle. Dropping it releases the subscription.
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::UnboundedReceiver<SnapshotEvent>,
}

impl Subscription {
    pub fn new(events: mpsc::UnboundedReceiver<SnapshotEvent>) -> Self {
        Self { events }
    }

    /// Next snapshot, or `None` once the store side has gone away.
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        self.events.recv().await
    }

    pub fn unsubscribe(mut self) {
        self.events.close();
    }
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Opens a live query ordered by date then creation time, newest first.
    /// The current result set is delivered immediately.
    async fn subscribe(&self) -> Subscription;

    async fn fetch_once(&self) -> Result<Vec<Transaction>, StoreError>;

    async fn create(&self, transaction: NewTransaction) -> Result<(), StoreError>;
}

/// Newest first: date descending, then creation time descending.
pub fn sort_for_query(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.created_at.cmp(&a.created_at)));
}

/// Applies the write defaults and checks the amount invariant.
pub fn prepare_record(transaction: NewTransaction) -> Result<Transaction, StoreError> {
    if !transaction.amount.is_finite() || transaction.amount <= 0.0 {
        return Err(StoreError::InvalidArgument(format!(
            "amount must be greater than 0, got {}",
            transaction.amount
        )));
    }

    let is_recurring = transaction.is_recurring.unwrap_or(false);
    let recurrence_interval = if is_recurring {
        Some(transaction.recurrence_interval.unwrap_or(RecurrenceInterval::Monthly))
    } else {
        None
    };

    Ok(Transaction {
        id: Uuid::new_v4().simple().to_string(),
        date: transaction.date,
        amount: transaction.amount,
        kind: transaction.kind,
        major_category: transaction.major_category,
        sub_category: transaction.sub_category.filter(|value| !value.trim().is_empty()),
        note: transaction.note.filter(|value| !value.trim().is_empty()),
        is_recurring,
        recurrence_interval,
        created_at: Utc::now(),
    })
}

#[derive(Default)]
struct StoreInner {
    records: Vec<Transaction>,
    subscribers: Vec<mpsc::UnboundedSender<SnapshotEvent>>,
}

impl StoreInner {
    fn publish(&mut self, event: &SnapshotEvent) {
        self.subscribers.retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

pub struct JsonFileStore {
    path: Option<PathBuf>,
    fault: Option<StoreError>,
    inner: Mutex<StoreInner>,
}

impl JsonFileStore {
    /// Loads the collection from `path`. A missing file starts empty; an
    /// unreadable or unparsable file puts the store into a failed state that
    /// every operation reports, and the file is left untouched.
    pub async fn open(path: PathBuf) -> Self {
        let (records, fault) = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<Transaction>>(&bytes) {
                Ok(records) => (records, None),
                Err(err) => {
                    error!("failed to parse transactions file {}: {err}", path.display());
                    (Vec::new(), Some(StoreError::FailedPrecondition(err.to_string())))
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => (Vec::new(), None),
            Err(err) => {
                error!("failed to read transactions file {}: {err}", path.display());
                (Vec::new(), Some(StoreError::from_io(&err)))
            }
        };

        info!("transaction store opened with {} records", records.len());
        Self::with_records(Some(path), records, fault)
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::with_records(None, Vec::new(), None)
    }

    fn with_records(path: Option<PathBuf>, mut records: Vec<Transaction>, fault: Option<StoreError>) -> Self {
        sort_for_query(&mut records);
        Self {
            path,
            fault,
            inner: Mutex::new(StoreInner {
                records,
                subscribers: Vec::new(),
            }),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes a sibling temp file and renames it over the collection, so the
    /// file on disk is always either the old or the new snapshot.
    async fn persist(&self, records: &[Transaction]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let payload = serde_json::to_vec_pretty(records).map_err(|err| StoreError::Other(err.to_string()))?;
        let staging = staging_path(path);
        let written = match fs::write(&staging, payload).await {
            Ok(()) => fs::rename(&staging, path).await,
            Err(err) => Err(err),
        };
        written.map_err(|err| {
            error!("failed to write transactions file {}: {err}", path.display());
            StoreError::from_io(&err)
        })
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[async_trait]
impl TransactionStore for JsonFileStore {
    async fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().await;
        let initial = match &self.fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(inner.records.clone()),
        };
        if sender.send(initial).is_ok() {
            inner.subscribers.push(sender);
        }
        Subscription::new(receiver)
    }

    async fn fetch_once(&self) -> Result<Vec<Transaction>, StoreError> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        Ok(self.inner.lock().await.records.clone())
    }

    async fn create(&self, transaction: NewTransaction) -> Result<(), StoreError> {
        if let Some(fault) = &self.fault {
            warn!("rejecting write, store is in a failed state: {fault}");
            return Err(fault.clone());
        }

        let record = prepare_record(transaction)?;
        let mut inner = self.inner.lock().await;
        let mut next = inner.records.clone();
        next.push(record);
        sort_for_query(&mut next);

        self.persist(&next).await?;
        inner.records = next;
        let event = Ok(inner.records.clone());
        inner.publish(&event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use chrono::NaiveDate;

    fn new_tx(date: &str, amount: f64) -> NewTransaction {
        NewTransaction {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            amount,
            kind: TransactionType::Expense,
            major_category: "food".to_string(),
            sub_category: None,
            note: Some("  ".to_string()),
            is_recurring: None,
            recurrence_interval: None,
        }
    }

    #[test]
    fn friendly_messages_cover_known_codes() {
        assert_eq!(
            friendly_message(Some(&StoreError::PermissionDenied("x".into()))),
            "No access: check the data store permissions."
        );
        assert_eq!(
            friendly_message(Some(&StoreError::Unavailable("x".into()))),
            "The data store is temporarily unavailable. Try again later."
        );
        assert_eq!(
            friendly_message(Some(&StoreError::FailedPrecondition("x".into()))),
            "The data store is not ready for this query. Check the data file and try again."
        );
        assert_eq!(
            friendly_message(Some(&StoreError::InvalidArgument("x".into()))),
            "The record was rejected: check the date and amount."
        );
        assert_eq!(friendly_message(Some(&StoreError::Other("boom".into()))), GENERIC_STORE_MESSAGE);
        assert_eq!(friendly_message(None), GENERIC_STORE_MESSAGE);
    }

    #[test]
    fn prepare_record_applies_recurrence_defaults() {
        let plain = prepare_record(new_tx("2026-01-01", 10.0)).unwrap();
        assert!(!plain.is_recurring);
        assert_eq!(plain.recurrence_interval, None);
        assert_eq!(plain.note, None);

        let mut recurring = new_tx("2026-01-01", 10.0);
        recurring.is_recurring = Some(true);
        let recurring = prepare_record(recurring).unwrap();
        assert_eq!(recurring.recurrence_interval, Some(RecurrenceInterval::Monthly));

        let mut stray_interval = new_tx("2026-01-01", 10.0);
        stray_interval.recurrence_interval = Some(RecurrenceInterval::Yearly);
        assert_eq!(prepare_record(stray_interval).unwrap().recurrence_interval, None);
    }

    #[test]
    fn prepare_record_rejects_non_positive_amounts() {
        let err = prepare_record(new_tx("2026-01-01", 0.0)).unwrap_err();
        assert_eq!(err.code(), "invalid-argument");
        assert!(prepare_record(new_tx("2026-01-01", f64::NAN)).is_err());
    }

    #[tokio::test]
    async fn store_orders_by_date_then_creation_desc() {
        let store = JsonFileStore::in_memory();
        store.create(new_tx("2026-01-05", 1.0)).await.unwrap();
        store.create(new_tx("2026-02-01", 2.0)).await.unwrap();
        store.create(new_tx("2026-01-05", 3.0)).await.unwrap();

        let records = store.fetch_once().await.unwrap();
        let amounts: Vec<f64> = records.iter().map(|tx| tx.amount).collect();
        assert_eq!(amounts, [2.0, 3.0, 1.0]);
    }

    #[tokio::test]
    async fn subscription_receives_initial_and_updated_snapshots() {
        let store = JsonFileStore::in_memory();
        let mut subscription = store.subscribe().await;
        assert_eq!(subscription.next().await, Some(Ok(Vec::new())));

        store.create(new_tx("2026-01-05", 7.5)).await.unwrap();
        let snapshot = subscription.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].amount, 7.5);
    }

    #[tokio::test]
    async fn dropped_subscription_is_pruned() {
        let store = JsonFileStore::in_memory();
        let subscription = store.subscribe().await;
        subscription.unsubscribe();
        store.create(new_tx("2026-01-05", 1.0)).await.unwrap();
        assert!(store.inner.lock().await.subscribers.is_empty());
    }

    #[tokio::test]
    async fn file_store_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions.json");

        let store = JsonFileStore::open(path.clone()).await;
        store.create(new_tx("2026-03-01", 12.0)).await.unwrap();

        let reopened = JsonFileStore::open(path).await;
        let records = reopened.fetch_once().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, 12.0);
    }

    #[tokio::test]
    async fn persist_replaces_file_without_leaving_staging_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions.json");
        let staging = dir.path().join("transactions.json.tmp");
        std::fs::write(&staging, b"{ torn").unwrap();

        let store = JsonFileStore::open(path.clone()).await;
        store.create(new_tx("2026-03-01", 5.0)).await.unwrap();
        store.create(new_tx("2026-03-02", 6.0)).await.unwrap();

        assert!(!staging.exists());
        let on_disk: Vec<Transaction> = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 2);
        assert_eq!(JsonFileStore::open(path).await.fetch_once().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn corrupt_file_reports_failed_precondition() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = JsonFileStore::open(path.clone()).await;
        let err = store.fetch_once().await.unwrap_err();
        assert_eq!(err.code(), "failed-precondition");

        let mut subscription = store.subscribe().await;
        assert!(matches!(subscription.next().await, Some(Err(StoreError::FailedPrecondition(_)))));

        assert!(store.create(new_tx("2026-03-01", 1.0)).await.is_err());
        assert_eq!(std::fs::read(&path).unwrap(), b"{ not json");
    }
}
