//! Storage layer for observations and report jobs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers / report pipeline                        │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository/)                        │
//! │  ObservationRepository + ReportRepository               │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────┐
//!     │                              │
//! ┌───▼──────────────┐   ┌───────────▼──────────┐
//! │ LocalRepository  │   │ PostgresRepository   │
//! │ (in-memory)      │   │ (Diesel + r2d2)      │
//! └──────────────────┘   └──────────────────────┘
//! ```
//!
//! Repositories are constructed once at startup through [`RepositoryFactory`]
//! and passed around as `Arc<dyn FullRepository>`.

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;

#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::PostgresConfig;
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}

pub use factory::{RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    ErrorContext, FullRepository, ObservationRepository, ReportRepository, RepositoryError,
    RepositoryResult,
};
pub use services::{fetch_store_snapshot, health_check, StoreSnapshot};
