//! Calls to the hosted loan and segmentation models.

pub mod client;
pub mod models;

use async_trait::async_trait;

use crate::forms::{LoanPayload, SegmentPayload};

pub use client::InferenceClient;
pub use models::{LoanDecision, LoanPrediction, SegmentAssignment};

pub const NETWORK_FAILURE_MESSAGE: &str =
    "Unable to connect to the server. Please check your internet connection or try again later.";

/// Why a submission produced no usable answer. `Display` is the text shown
/// next to the form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InferenceError {
    #[error("Unable to connect to the server. Please check your internet connection or try again later.")]
    Network { detail: String },
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("{message}")]
    Application { message: String },
}

#[async_trait]
pub trait InferenceService: Send + Sync {
    async fn predict_loan(&self, payload: &LoanPayload) -> Result<LoanPrediction, InferenceError>;

    async fn segment_profile(
        &self,
        payload: &SegmentPayload,
    ) -> Result<SegmentAssignment, InferenceError>;
}
