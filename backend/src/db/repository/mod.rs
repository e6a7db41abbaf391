//! Repository trait definitions for database operations.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`observation`]: Read access to polls, business hours and timezones
//! - [`report`]: Report job records
//!
//! # Convenience Trait Bound
//!
//! Code that needs both capabilities uses the [`FullRepository`] bound:
//!
//! ```ignore
//! async fn run<R: FullRepository + ?Sized>(repo: &R, id: ReportId) -> RepositoryResult<()> {
//!     let total = repo.count_stores().await?;
//!     repo.complete_report(id, format!("{total}")).await
//! }
//! ```

pub mod error;
pub mod observation;
pub mod report;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use observation::ObservationRepository;
pub use report::ReportRepository;

/// Composite trait bound for a complete repository implementation.
pub trait FullRepository: ObservationRepository + ReportRepository {}

// Blanket implementation: any type implementing both traits is a FullRepository
impl<T> FullRepository for T where T: ObservationRepository + ReportRepository {}
