use serde::{Deserialize, Serialize};

use super::numeric::{decimal_or, integer_or};
use super::state::{FieldKind, FieldSpec, FormState};
use crate::error::ValidationError;

/// Lowest score the bureau issues; empty or zero input is raised to it.
pub const CIBIL_FLOOR: i64 = 300;

pub const EDUCATION_OPTIONS: &[&str] = &["Graduate", "Not Graduate"];
pub const SELF_EMPLOYED_OPTIONS: &[&str] = &["Yes", "No"];

pub const LOAN_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("no_of_dependents", "Number of Dependents", FieldKind::Integer),
    FieldSpec::new("education", "Education", FieldKind::Choice(EDUCATION_OPTIONS)),
    FieldSpec::new(
        "self_employed",
        "Self Employed",
        FieldKind::Choice(SELF_EMPLOYED_OPTIONS),
    ),
    FieldSpec::new("income_annum", "Annual Income", FieldKind::Decimal),
    FieldSpec::new("loan_amount", "Loan Amount", FieldKind::Decimal),
    FieldSpec::new("loan_term", "Loan Term (months)", FieldKind::Integer),
    FieldSpec::new("cibil_score", "CIBIL Score", FieldKind::Integer),
    FieldSpec::new(
        "residential_assets_value",
        "Residential Assets Value",
        FieldKind::Decimal,
    ),
    FieldSpec::new(
        "commercial_assets_value",
        "Commercial Assets Value",
        FieldKind::Decimal,
    ),
    FieldSpec::new("luxury_assets_value", "Luxury Assets Value", FieldKind::Decimal),
    FieldSpec::new("bank_asset_value", "Bank Asset Value", FieldKind::Decimal),
];

pub fn loan_form() -> FormState {
    FormState::new(LOAN_FIELDS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Education {
    #[serde(rename = "Graduate")]
    Graduate,
    #[serde(rename = "Not Graduate")]
    NotGraduate,
}

impl Education {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Graduate" => Some(Self::Graduate),
            "Not Graduate" => Some(Self::NotGraduate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelfEmployment {
    Yes,
    No,
}

impl SelfEmployment {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Yes" => Some(Self::Yes),
            "No" => Some(Self::No),
            _ => None,
        }
    }
}

/// Body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPayload {
    pub no_of_dependents: i64,
    pub education: Education,
    pub self_employed: SelfEmployment,
    pub income_annum: f64,
    pub loan_amount: f64,
    pub loan_term: i64,
    pub cibil_score: i64,
    pub residential_assets_value: f64,
    pub commercial_assets_value: f64,
    pub luxury_assets_value: f64,
    pub bank_asset_value: f64,
}

impl LoanPayload {
    pub fn from_form(form: &FormState) -> Result<Self, ValidationError> {
        let education = Education::from_label(form.get("education")).ok_or(
            ValidationError::MissingChoice {
                field: "education",
                label: "Education",
            },
        )?;
        let self_employed = SelfEmployment::from_label(form.get("self_employed")).ok_or(
            ValidationError::MissingChoice {
                field: "self_employed",
                label: "Self Employed",
            },
        )?;

        Ok(Self {
            no_of_dependents: integer_or(form.get("no_of_dependents"), 0),
            education,
            self_employed,
            income_annum: decimal_or(form.get("income_annum"), 0.0),
            loan_amount: decimal_or(form.get("loan_amount"), 0.0),
            loan_term: integer_or(form.get("loan_term"), 0),
            cibil_score: integer_or(form.get("cibil_score"), CIBIL_FLOOR),
            residential_assets_value: decimal_or(form.get("residential_assets_value"), 0.0),
            commercial_assets_value: decimal_or(form.get("commercial_assets_value"), 0.0),
            luxury_assets_value: decimal_or(form.get("luxury_assets_value"), 0.0),
            bank_asset_value: decimal_or(form.get("bank_asset_value"), 0.0),
        })
    }
}
