//! Read-only access to store observations.
//!
//! The report pipeline pages through the store fleet with [`ObservationRepository::fetch_store_ids`]
//! and then loads supporting data for exactly one page at a time with
//! [`ObservationRepository::fetch_store_details`].

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{BusinessHourRule, Poll, StoreDetails, StoreId};

/// Repository trait for store observation data.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait ObservationRepository: Send + Sync {
    // ==================== Health & Connection ====================

    /// Check if the database connection is healthy.
    ///
    /// # Returns
    /// - `Ok(true)` if connection is healthy
    /// - `Ok(false)` if connection is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if an error occurred during the check
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Fleet Paging ====================

    /// Count distinct stores known to any observation table.
    async fn count_stores(&self) -> RepositoryResult<u64>;

    /// Fetch one page of distinct store ids in ascending order.
    ///
    /// # Arguments
    /// * `offset` - Number of ids to skip
    /// * `limit` - Maximum number of ids to return
    async fn fetch_store_ids(&self, offset: u64, limit: u64) -> RepositoryResult<Vec<StoreId>>;

    /// Bulk-fetch timezones, business hours and polls for exactly `store_ids`.
    ///
    /// Rows for stores outside `store_ids` are never returned.
    async fn fetch_store_details(&self, store_ids: &[StoreId]) -> RepositoryResult<StoreDetails>;

    // ==================== Single Store Lookups ====================

    /// Timezone name assigned to a store, if any.
    async fn fetch_timezone(&self, store_id: StoreId) -> RepositoryResult<Option<String>>;

    /// All business-hour rules of a store.
    async fn fetch_business_hours(&self, store_id: StoreId)
        -> RepositoryResult<Vec<BusinessHourRule>>;

    /// All polls of a store, in no particular order.
    async fn fetch_polls(&self, store_id: StoreId) -> RepositoryResult<Vec<Poll>>;
}
