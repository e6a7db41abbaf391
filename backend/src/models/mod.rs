//! Domain models shared by the estimator, the report pipeline and the storage layer.

pub mod macros;
pub mod observation;
pub mod report;

pub use observation::*;
pub use report::*;
