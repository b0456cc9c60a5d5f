use std::fmt::Debug;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ValidationError;
use crate::forms::{loan_form, segment_form, FormState, LoanPayload, SegmentPayload};
use crate::inference::{InferenceError, InferenceService, LoanPrediction, SegmentAssignment};

/// Binds a form schema to its adapter and its remote endpoint.
#[async_trait]
pub trait FormKind: Send + Sync + 'static {
    type Payload: Serialize + Debug + Clone + Send + Sync + 'static;
    type Response: Serialize + Debug + Clone + Send + Sync + 'static;

    const NAME: &'static str;

    fn blank_form() -> FormState;

    fn adapt(form: &FormState) -> Result<Self::Payload, ValidationError>;

    async fn dispatch(
        service: &dyn InferenceService,
        payload: &Self::Payload,
    ) -> Result<Self::Response, InferenceError>;
}

#[derive(Debug, Clone, Copy)]
pub struct LoanCheck;

#[async_trait]
impl FormKind for LoanCheck {
    type Payload = LoanPayload;
    type Response = LoanPrediction;

    const NAME: &'static str = "loan";

    fn blank_form() -> FormState {
        loan_form()
    }

    fn adapt(form: &FormState) -> Result<LoanPayload, ValidationError> {
        LoanPayload::from_form(form)
    }

    async fn dispatch(
        service: &dyn InferenceService,
        payload: &LoanPayload,
    ) -> Result<LoanPrediction, InferenceError> {
        service.predict_loan(payload).await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SegmentAnalysis;

#[async_trait]
impl FormKind for SegmentAnalysis {
    type Payload = SegmentPayload;
    type Response = SegmentAssignment;

    const NAME: &'static str = "segment";

    fn blank_form() -> FormState {
        segment_form()
    }

    fn adapt(form: &FormState) -> Result<SegmentPayload, ValidationError> {
        Ok(SegmentPayload::from_form(form))
    }

    async fn dispatch(
        service: &dyn InferenceService,
        payload: &SegmentPayload,
    ) -> Result<SegmentAssignment, InferenceError> {
        service.segment_profile(payload).await
    }
}
