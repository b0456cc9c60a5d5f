use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanDecision {
    Approved,
    Rejected,
}

impl LoanDecision {
    pub fn is_approved(self) -> bool {
        matches!(self, LoanDecision::Approved)
    }
}

/// Successful answer from `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPrediction {
    pub status: String,
    pub prediction: LoanDecision,
    pub probability_approved: f64,
    pub probability_rejected: f64,
}

/// Answer from `POST /segment`.
///
/// Either model may fail on its own; its label is then `null` and the
/// matching `*_prediction_error` explains why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentAssignment {
    #[serde(default)]
    pub kmeans_segment_pred: Option<i64>,
    #[serde(default)]
    pub kmeans_segment_name: Option<String>,
    #[serde(default)]
    pub dbscan_segment_pred: Option<i64>,
    #[serde(default)]
    pub dbscan_segment_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kmeans_prediction_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbscan_prediction_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_data: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn segment_tolerates_partial_failures() {
        let assignment: SegmentAssignment = serde_json::from_value(json!({
            "kmeans_segment_pred": 1,
            "kmeans_segment_name": "Low Value",
            "dbscan_segment_pred": null,
            "dbscan_segment_name": null,
            "dbscan_prediction_error": "model unavailable"
        }))
        .expect("parses");

        assert_eq!(assignment.kmeans_segment_pred, Some(1));
        assert_eq!(assignment.dbscan_segment_name, None);
        assert_eq!(
            assignment.dbscan_prediction_error.as_deref(),
            Some("model unavailable")
        );
    }

    #[test]
    fn loan_prediction_reads_backend_shape() {
        let prediction: LoanPrediction = serde_json::from_value(json!({
            "status": "success",
            "prediction": "Rejected",
            "probability_approved": 0.31,
            "probability_rejected": 0.69
        }))
        .expect("parses");
        assert!(!prediction.prediction.is_approved());
    }
}
