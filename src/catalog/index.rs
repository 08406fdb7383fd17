//! The search index seam and its in-process implementation.

use crate::model::{Item, ItemId, SaleWindow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum IndexError {
    #[error("Search index unavailable: {0}")]
    Unavailable(String),

    /// The document could not be built from the primary stores.
    #[error("Failed to read source data: {0}")]
    Source(String),
}

impl IndexError {
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// What the index stores per item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDocument {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub sale_price: Decimal,
    pub active: bool,
    pub window: SaleWindow,
    /// Stock at the time the document was last written. Not authoritative.
    pub remaining: u32,
    pub created_at: DateTime<Utc>,
}

impl ItemDocument {
    pub fn from_item(item: &Item, remaining: Option<u32>) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            description: item.description.clone(),
            price: item.price,
            sale_price: item.sale_price,
            active: item.active,
            window: item.window,
            remaining: remaining.unwrap_or(item.stock),
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    /// `None` matches everything.
    pub keyword: Option<String>,
    pub active_only: bool,
}

impl SearchQuery {
    /// Active items matching `keyword`. A blank keyword lists all active items.
    pub fn active(keyword: &str) -> Self {
        let keyword = keyword.trim();
        Self {
            keyword: (!keyword.is_empty()).then(|| keyword.to_lowercase()),
            active_only: true,
        }
    }

    /// Case-insensitive substring match on title or description.
    pub fn matches(&self, title: &str, description: &str, active: bool) -> bool {
        if self.active_only && !active {
            return false;
        }
        match &self.keyword {
            None => true,
            Some(keyword) => {
                let keyword = keyword.to_lowercase();
                title.to_lowercase().contains(&keyword)
                    || description.to_lowercase().contains(&keyword)
            }
        }
    }
}

/// Full-text search over item documents. Results are newest first.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ItemDocument>, IndexError>;

    /// Inserts or replaces the document for `doc.id`.
    async fn upsert(&self, doc: ItemDocument) -> Result<(), IndexError>;
}

#[derive(Debug, Default)]
pub struct MemoryIndex {
    docs: RwLock<HashMap<ItemId, ItemDocument>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: ItemId) -> Option<ItemDocument> {
        self.docs.read().await.get(&id).cloned()
    }

    pub async fn document_count(&self) -> usize {
        self.docs.read().await.len()
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ItemDocument>, IndexError> {
        let docs = self.docs.read().await;
        let mut hits: Vec<ItemDocument> = docs
            .values()
            .filter(|doc| query.matches(&doc.title, &doc.description, doc.active))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(hits)
    }

    async fn upsert(&self, doc: ItemDocument) -> Result<(), IndexError> {
        self.docs.write().await.insert(doc.id, doc);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn doc(id: u32, title: &str, active: bool, age_minutes: i64) -> ItemDocument {
        let now = Utc::now();
        ItemDocument {
            id: ItemId(id),
            title: title.to_string(),
            description: format!("{title} on sale"),
            price: dec!(100),
            sale_price: dec!(50),
            active,
            window: SaleWindow::new(now, now + Duration::hours(1)),
            remaining: 10,
            created_at: now - Duration::minutes(age_minutes),
        }
    }

    #[tokio::test]
    async fn test_keyword_match_is_case_insensitive_and_active_only() {
        let index = MemoryIndex::new();
        index.upsert(doc(1, "Red Phone", true, 30)).await.unwrap();
        index.upsert(doc(2, "Blue phone", true, 10)).await.unwrap();
        index.upsert(doc(3, "Phone case", false, 5)).await.unwrap();
        index.upsert(doc(4, "Laptop", true, 1)).await.unwrap();

        let hits = index.search(&SearchQuery::active("PHONE")).await.unwrap();
        let ids: Vec<ItemId> = hits.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![ItemId(2), ItemId(1)], "newest first, inactive excluded");
    }

    #[tokio::test]
    async fn test_blank_keyword_lists_all_active() {
        let index = MemoryIndex::new();
        index.upsert(doc(1, "Red Phone", true, 30)).await.unwrap();
        index.upsert(doc(2, "Laptop", true, 10)).await.unwrap();
        index.upsert(doc(3, "Hidden", false, 1)).await.unwrap();

        assert_eq!(SearchQuery::active("   ").keyword, None);
        let hits = index.search(&SearchQuery::active("  ")).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let index = MemoryIndex::new();
        index.upsert(doc(1, "Old", true, 1)).await.unwrap();
        index.upsert(doc(1, "New", true, 1)).await.unwrap();

        assert_eq!(index.document_count().await, 1);
        assert_eq!(index.get(ItemId(1)).await.unwrap().title, "New");
    }
}
