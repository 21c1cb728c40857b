use crate::errors::StoreError;
use crate::models::{CarDoc, CarId, CarPatch, DeleteOutcome, InsertOutcome, SubCategory, UpdateOutcome};
use async_trait::async_trait;

pub mod memory;
pub mod mongo;

pub use memory::MemoryCarStore;
pub use mongo::MongoCarStore;

/// Query shapes the API issues against the `cars` collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarFilter {
    SubCategory(SubCategory),
    SellerEmail(String),
    /// Case-insensitive substring of `name`; matched literally.
    NameContains(String),
}

impl CarFilter {
    /// Regex source used for `NameContains`. The needle is escaped so that
    /// client input never acts as a pattern.
    pub fn name_pattern(needle: &str) -> String {
        regex::escape(needle)
    }
}

#[async_trait]
pub trait CarStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Creates the ascending `name` index. Re-running is a no-op.
    async fn ensure_name_index(&self) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    /// One slice of the collection sorted by ascending price.
    async fn list_by_price(&self, skip: u64, limit: u64) -> Result<Vec<CarDoc>, StoreError>;

    async fn find(&self, filter: &CarFilter) -> Result<Vec<CarDoc>, StoreError>;

    async fn find_by_id(&self, id: CarId) -> Result<Option<CarDoc>, StoreError>;

    /// Stores `car` verbatim under a freshly generated id.
    async fn insert(&self, car: CarDoc) -> Result<InsertOutcome, StoreError>;

    /// `$set`s the patch on `id`, creating the document if it does not exist.
    async fn upsert(&self, id: CarId, patch: &CarPatch) -> Result<UpdateOutcome, StoreError>;

    async fn delete(&self, id: CarId) -> Result<DeleteOutcome, StoreError>;

    /// Releases the underlying connection. Called once on shutdown.
    async fn close(&self) {}
}

/// Stands in when no store client could be built at startup, so the server
/// still listens and store-backed routes fail per request.
pub struct OfflineCarStore {
    reason: String,
}

impl OfflineCarStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn err(&self) -> StoreError {
        StoreError::Unavailable(self.reason.clone())
    }
}

#[async_trait]
impl CarStore for OfflineCarStore {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn ensure_name_index(&self) -> Result<(), StoreError> {
        Err(self.err())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(self.err())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Err(self.err())
    }

    async fn list_by_price(&self, _skip: u64, _limit: u64) -> Result<Vec<CarDoc>, StoreError> {
        Err(self.err())
    }

    async fn find(&self, _filter: &CarFilter) -> Result<Vec<CarDoc>, StoreError> {
        Err(self.err())
    }

    async fn find_by_id(&self, _id: CarId) -> Result<Option<CarDoc>, StoreError> {
        Err(self.err())
    }

    async fn insert(&self, _car: CarDoc) -> Result<InsertOutcome, StoreError> {
        Err(self.err())
    }

    async fn upsert(&self, _id: CarId, _patch: &CarPatch) -> Result<UpdateOutcome, StoreError> {
        Err(self.err())
    }

    async fn delete(&self, _id: CarId) -> Result<DeleteOutcome, StoreError> {
        Err(self.err())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_pattern_escapes_metacharacters() {
        assert_eq!(CarFilter::name_pattern("red"), "red");
        assert_eq!(CarFilter::name_pattern("a.b*"), r"a\.b\*");
        assert_eq!(CarFilter::name_pattern("(x)"), r"\(x\)");
    }

    #[tokio::test]
    async fn offline_store_reports_unavailable() {
        let store = OfflineCarStore::new("connection refused");
        assert!(matches!(store.count().await, Err(StoreError::Unavailable(_))));
        assert!(matches!(
            store.delete(CarId::generate()).await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
