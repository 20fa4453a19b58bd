//! Job Lifecycle Controller and its external collaborators (spec.md §4.9).

pub mod controller;
pub mod oracle;

pub use controller::JobController;
pub use oracle::PageSpeedOracle;
