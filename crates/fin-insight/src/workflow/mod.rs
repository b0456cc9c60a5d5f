//! Per-visitor form controllers and the registry that holds them.

pub mod controller;
pub mod kind;
pub mod result;
pub mod workspace;

pub use controller::{FormController, FormSnapshot, SubmissionError};
pub use kind::{FormKind, LoanCheck, SegmentAnalysis};
pub use result::ResultState;
pub use workspace::{
    RegistryError, Workspace, WorkspaceRegistry, DEFAULT_CAPACITY, DEFAULT_IDLE_MINUTES,
    DEFAULT_PRUNE_INTERVAL_SECS,
};
