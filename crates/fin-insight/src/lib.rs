pub mod config;
pub mod error;
pub mod forms;
pub mod guard;
pub mod identity;
pub mod inference;
pub mod presentation;
pub mod telemetry;
pub mod workflow;
