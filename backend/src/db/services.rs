//! Thin repository helpers shared by the report services and the HTTP layer.

use super::repository::{FullRepository, ObservationRepository, RepositoryResult};
use crate::models::{BusinessHourRule, Poll, StoreId};

/// Check whether the backing store is reachable.
pub async fn health_check<R: ObservationRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

/// Everything stored for a single location.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub store_id: StoreId,
    pub timezone: Option<String>,
    pub business_hours: Vec<BusinessHourRule>,
    pub polls: Vec<Poll>,
}

impl StoreSnapshot {
    /// True when no table mentions the location.
    pub fn is_unknown(&self) -> bool {
        self.timezone.is_none() && self.business_hours.is_empty() && self.polls.is_empty()
    }
}

/// Fetch one location's timezone, rules and polls concurrently.
pub async fn fetch_store_snapshot<R: FullRepository + ?Sized>(
    repo: &R,
    store_id: StoreId,
) -> RepositoryResult<StoreSnapshot> {
    let (timezone, business_hours, polls) = tokio::try_join!(
        repo.fetch_timezone(store_id),
        repo.fetch_business_hours(store_id),
        repo.fetch_polls(store_id),
    )?;

    Ok(StoreSnapshot {
        store_id,
        timezone,
        business_hours,
        polls,
    })
}
