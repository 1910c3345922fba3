//! RecordSink / DocumentStore traits - Worker output interface
//!
//! `RecordSink` is everything the pipeline needs: persist one document, get an id back.
//! `DocumentStore` is the read/update/delete side used outside the pipeline.

use serde::{Deserialize, Serialize};

use crate::{ContractError, FinancialData, FinancialPatch};

/// Persist-one-record interface
///
/// Workers share one sink and call it concurrently, so methods take `&self`.
#[trait_variant::make(RecordSink: Send)]
pub trait LocalRecordSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Persist one document
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn create(&self, data: &FinancialData) -> Result<String, ContractError>;

    /// Flush buffered writes (if any)
    ///
    /// Called once after every worker has drained.
    async fn flush(&self) -> Result<(), ContractError>;
}

/// Stored document with its assigned id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,

    #[serde(flatten)]
    pub data: FinancialData,
}

/// Page request for `DocumentStore::list`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: i64,

    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

pub const MIN_PAGE_SIZE: i64 = 2;
pub const MAX_PAGE_SIZE: i64 = 100;

fn default_page_size() -> i64 {
    MIN_PAGE_SIZE
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: default_page_size(),
        }
    }
}

impl Pagination {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }

    /// Clamp into the accepted range: page >= 0, page_size in [2, 100]
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(0),
            page_size: self.page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE),
        }
    }

    /// Number of documents to skip (after normalization)
    pub fn skip(&self) -> usize {
        let p = self.normalized();
        usize::try_from(p.page.saturating_mul(p.page_size)).unwrap_or(usize::MAX)
    }

    /// Maximum number of documents to return (after normalization)
    pub fn limit(&self) -> usize {
        self.normalized().page_size as usize
    }
}

/// Document store contract
#[trait_variant::make(DocumentStore: Send)]
pub trait LocalDocumentStore {
    /// Fetch one document
    ///
    /// # Errors
    /// `NotFound` when absent, `InvalidId` when the id is malformed
    async fn find_by_id(&self, id: &str) -> Result<StoredDocument, ContractError>;

    /// Apply a partial update
    async fn update(&self, id: &str, patch: &FinancialPatch) -> Result<(), ContractError>;

    /// Remove one document
    async fn delete(&self, id: &str) -> Result<(), ContractError>;

    /// One page of documents in insertion order
    async fn list(&self, page: Pagination) -> Result<Vec<StoredDocument>, ContractError>;

    /// Total number of stored documents
    async fn count(&self) -> Result<usize, ContractError>;
}
