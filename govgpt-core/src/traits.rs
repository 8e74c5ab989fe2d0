//! Core trait definitions

use crate::error::GovGptResult;
use crate::types::FileRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Lookup of uploaded files by identifier
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn get_file_by_id(&self, id: &str) -> GovGptResult<Option<FileRecord>>;
}

/// Knowledge collections backing collection-scoped questions
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Every document text stored under any of `collection_names`
    async fn get_collection_documents(
        &self,
        collection_names: &[String],
    ) -> GovGptResult<Vec<String>>;
}

/// Per-user request quota
pub trait RateLimiter: Send + Sync {
    /// Returns `false` when `user_id` has used up its quota at `now`.
    /// An allowed request is recorded against the quota.
    fn check_and_record(&self, user_id: &str, now: DateTime<Utc>) -> bool;

    /// Requests allowed per window and the window length in seconds
    fn limits(&self) -> (usize, u64);
}
