//! MemorySink - in-process document store

use std::collections::HashMap;
use std::sync::Arc;

use contracts::{
    ContractError, DocumentStore, FinancialData, FinancialPatch, Pagination, RecordSink,
    StoredDocument,
};
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Documents {
    by_id: HashMap<Uuid, FinancialData>,
    /// Insertion order, used by `list`
    order: Vec<Uuid>,
}

/// Sink that keeps every document in memory
///
/// Cloning shares the same storage, so a test can keep one handle while the pool owns
/// another.
#[derive(Debug, Clone)]
pub struct MemorySink {
    name: String,
    documents: Arc<RwLock<Documents>>,
}

impl MemorySink {
    /// Create an empty MemorySink
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: Arc::new(RwLock::new(Documents::default())),
        }
    }

    /// Every stored document in insertion order
    pub async fn snapshot(&self) -> Vec<StoredDocument> {
        let docs = self.documents.read().await;
        docs.order
            .iter()
            .filter_map(|id| {
                docs.by_id.get(id).map(|data| StoredDocument {
                    id: id.to_string(),
                    data: data.clone(),
                })
            })
            .collect()
    }

    fn parse_id(id: &str) -> Result<Uuid, ContractError> {
        Uuid::parse_str(id).map_err(|_| ContractError::invalid_id(id))
    }
}

impl RecordSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "memory_sink_create", skip(self, data), fields(sink = %self.name))]
    async fn create(&self, data: &FinancialData) -> Result<String, ContractError> {
        let id = Uuid::new_v4();
        let mut docs = self.documents.write().await;
        docs.by_id.insert(id, data.clone());
        docs.order.push(id);
        Ok(id.to_string())
    }

    async fn flush(&self) -> Result<(), ContractError> {
        Ok(())
    }
}

impl DocumentStore for MemorySink {
    async fn find_by_id(&self, id: &str) -> Result<StoredDocument, ContractError> {
        let key = Self::parse_id(id)?;
        let docs = self.documents.read().await;
        docs.by_id
            .get(&key)
            .map(|data| StoredDocument {
                id: key.to_string(),
                data: data.clone(),
            })
            .ok_or_else(|| ContractError::not_found(id))
    }

    #[instrument(name = "memory_sink_update", skip(self, patch), fields(sink = %self.name))]
    async fn update(&self, id: &str, patch: &FinancialPatch) -> Result<(), ContractError> {
        let key = Self::parse_id(id)?;
        let mut docs = self.documents.write().await;
        let data = docs
            .by_id
            .get_mut(&key)
            .ok_or_else(|| ContractError::not_found(id))?;
        patch.apply_to(data);
        debug!(id, "Document updated");
        Ok(())
    }

    #[instrument(name = "memory_sink_delete", skip(self), fields(sink = %self.name))]
    async fn delete(&self, id: &str) -> Result<(), ContractError> {
        let key = Self::parse_id(id)?;
        let mut docs = self.documents.write().await;
        if docs.by_id.remove(&key).is_none() {
            return Err(ContractError::not_found(id));
        }
        docs.order.retain(|k| *k != key);
        Ok(())
    }

    async fn list(&self, page: Pagination) -> Result<Vec<StoredDocument>, ContractError> {
        let docs = self.documents.read().await;
        Ok(docs
            .order
            .iter()
            .skip(page.skip())
            .take(page.limit())
            .filter_map(|id| {
                docs.by_id.get(id).map(|data| StoredDocument {
                    id: id.to_string(),
                    data: data.clone(),
                })
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, ContractError> {
        Ok(self.documents.read().await.by_id.len())
    }
}
