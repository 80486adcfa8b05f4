//! Read access to photo ownership data.
//!
//! The gate only ever reads from the store. Each lookup is an independent
//! read; two lookups in the same request may observe different snapshots.

use async_trait::async_trait;
use std::collections::HashMap;

/// A stored photo and the account that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub id: String,
    pub owner: String,
}

impl Photo {
    pub fn new(id: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
        }
    }
}

/// Resolves photo ids to their stored record.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Returns `None` when the id is unknown. A miss is not an error.
    async fn find(&self, id: &str) -> Option<Photo>;
}

/// Immutable in-memory photo store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPhotoStore {
    photos: HashMap<String, Photo>,
}

impl InMemoryPhotoStore {
    pub fn new(photos: impl IntoIterator<Item = Photo>) -> Self {
        Self {
            photos: photos.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    /// Two photos owned by account `test` and one owned by `other`.
    pub fn seeded() -> Self {
        Self::new([
            Photo::new("1", "test"),
            Photo::new("2", "test"),
            Photo::new("3", "other"),
        ])
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }
}

#[async_trait]
impl PhotoStore for InMemoryPhotoStore {
    async fn find(&self, id: &str) -> Option<Photo> {
        self.photos.get(id).cloned()
    }
}
