use serde::Serialize;

use crate::inference::{LoanDecision, LoanPrediction};

pub const APPROVAL_MESSAGE: &str = "Congratulations! Based on the information provided, you are likely to be approved for this loan. Our system has analyzed your financial profile and determined that you meet the eligibility criteria.";
pub const REJECTION_MESSAGE: &str = "Based on the information provided, your loan application may not be approved at this time. You might consider:";
pub const REJECTION_SUGGESTIONS: [&str; 4] = [
    "Applying for a smaller loan amount",
    "Improving your CIBIL score",
    "Reducing existing debt obligations",
    "Adding a co-applicant with strong financials",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanOutcomeView {
    pub prediction: LoanDecision,
    pub approved: bool,
    pub approval_probability: String,
    pub rejection_probability: String,
    pub message: &'static str,
    pub suggestions: Vec<&'static str>,
}

/// `0.82` renders as `82.0%`.
pub fn format_probability(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

impl From<&LoanPrediction> for LoanOutcomeView {
    fn from(prediction: &LoanPrediction) -> Self {
        let approved = prediction.prediction.is_approved();
        Self {
            prediction: prediction.prediction,
            approved,
            approval_probability: format_probability(prediction.probability_approved),
            rejection_probability: format_probability(prediction.probability_rejected),
            message: if approved {
                APPROVAL_MESSAGE
            } else {
                REJECTION_MESSAGE
            },
            suggestions: if approved {
                Vec::new()
            } else {
                REJECTION_SUGGESTIONS.to_vec()
            },
        }
    }
}
