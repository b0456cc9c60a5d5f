use serde::{Deserialize, Serialize};

use super::numeric::decimal_or;
use super::state::{FieldKind, FieldSpec, FormState};

pub const SEGMENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("income_annum", "Annual Income", FieldKind::Digits),
    FieldSpec::new("loan_amount", "Loan Amount", FieldKind::Digits),
    FieldSpec::new(
        "residential_assets_value",
        "Residential Assets Value",
        FieldKind::Digits,
    ),
    FieldSpec::new(
        "commercial_assets_value",
        "Commercial Assets Value",
        FieldKind::Digits,
    ),
    FieldSpec::new("luxury_assets_value", "Luxury Assets Value", FieldKind::Digits),
    FieldSpec::new("bank_asset_value", "Bank Asset Value", FieldKind::Digits),
];

pub fn segment_form() -> FormState {
    FormState::new(SEGMENT_FIELDS)
}

/// Body of `POST /segment`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentPayload {
    pub income_annum: f64,
    pub loan_amount: f64,
    pub residential_assets_value: f64,
    pub commercial_assets_value: f64,
    pub luxury_assets_value: f64,
    pub bank_asset_value: f64,
}

impl SegmentPayload {
    pub fn from_form(form: &FormState) -> Self {
        Self {
            income_annum: decimal_or(form.get("income_annum"), 0.0),
            loan_amount: decimal_or(form.get("loan_amount"), 0.0),
            residential_assets_value: decimal_or(form.get("residential_assets_value"), 0.0),
            commercial_assets_value: decimal_or(form.get("commercial_assets_value"), 0.0),
            luxury_assets_value: decimal_or(form.get("luxury_assets_value"), 0.0),
            bank_asset_value: decimal_or(form.get("bank_asset_value"), 0.0),
        }
    }
}
