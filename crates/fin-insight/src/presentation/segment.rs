use serde::Serialize;

use super::catalog::SegmentCatalog;
use super::charts::{
    asset_distribution, profile_point, segment_color, segment_comparison, BarSeries, PieSlice,
    ProfilePoint,
};
use crate::forms::SegmentPayload;
use crate::inference::SegmentAssignment;

const UNLABELLED: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentCard {
    pub model: &'static str,
    pub index: Option<i64>,
    pub name: String,
    pub color: &'static str,
    pub description: String,
    pub known: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything the segmentation result panel draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentResultView {
    pub kmeans: SegmentCard,
    pub dbscan: SegmentCard,
    pub profile: ProfilePoint,
    pub assets: Vec<PieSlice>,
    pub comparison: Vec<BarSeries>,
    pub insight: String,
}

impl SegmentResultView {
    pub fn build(
        payload: &SegmentPayload,
        assignment: &SegmentAssignment,
        catalog: &SegmentCatalog,
    ) -> Self {
        let kmeans = card(
            "kmeans",
            assignment.kmeans_segment_pred,
            assignment.kmeans_segment_name.as_deref(),
            assignment.kmeans_prediction_error.as_deref(),
            catalog,
        );
        let dbscan = card(
            "dbscan",
            assignment.dbscan_segment_pred,
            assignment.dbscan_segment_name.as_deref(),
            assignment.dbscan_prediction_error.as_deref(),
            catalog,
        );

        Self {
            profile: profile_point(payload, assignment.kmeans_segment_pred, &kmeans.name),
            assets: asset_distribution(payload),
            comparison: segment_comparison(payload, &kmeans.name, catalog),
            insight: catalog.insight(&kmeans.name).to_string(),
            kmeans,
            dbscan,
        }
    }
}

fn card(
    model: &'static str,
    index: Option<i64>,
    name: Option<&str>,
    error: Option<&str>,
    catalog: &SegmentCatalog,
) -> SegmentCard {
    let name = name.filter(|name| !name.is_empty()).unwrap_or(UNLABELLED);
    SegmentCard {
        model,
        index,
        name: name.to_string(),
        color: segment_color(index),
        description: catalog.describe(name).to_string(),
        known: catalog.is_known(name),
        error: error.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> SegmentPayload {
        SegmentPayload {
            income_annum: 7_000_000.0,
            loan_amount: 20_000_000.0,
            residential_assets_value: 2_000_000.0,
            commercial_assets_value: 2_000_000.0,
            luxury_assets_value: 2_000_000.0,
            bank_asset_value: 2_000_000.0,
        }
    }

    #[test]
    fn builds_cards_and_charts() {
        let assignment = SegmentAssignment {
            kmeans_segment_pred: Some(6),
            kmeans_segment_name: Some("Low Value".to_string()),
            dbscan_segment_pred: Some(-1),
            dbscan_segment_name: Some("Noise/Outlier".to_string()),
            kmeans_prediction_error: None,
            dbscan_prediction_error: None,
            input_data: None,
        };
        let view = SegmentResultView::build(&payload(), &assignment, &SegmentCatalog::standard());

        assert_eq!(view.kmeans.color, "#10B981");
        assert_eq!(view.dbscan.color, "#3B82F6");
        assert!(view.dbscan.description.starts_with("Rare cases"));
        assert_eq!(view.profile.label, "Your Profile (Low Value)");
        assert!(view.assets.iter().all(|slice| slice.percent == 25.0));
        assert_eq!(view.comparison[1].name, "Low Value Average");
        assert!(view.insight.starts_with("Despite the name"));
    }

    #[test]
    fn missing_labels_fall_back() {
        let assignment = SegmentAssignment {
            kmeans_segment_pred: None,
            kmeans_segment_name: None,
            dbscan_segment_pred: Some(3),
            dbscan_segment_name: Some("Dense Core 2".to_string()),
            kmeans_prediction_error: Some("scaler missing".to_string()),
            dbscan_prediction_error: None,
            input_data: None,
        };
        let view = SegmentResultView::build(&payload(), &assignment, &SegmentCatalog::standard());

        assert_eq!(view.kmeans.name, "N/A");
        assert_eq!(view.kmeans.error.as_deref(), Some("scaler missing"));
        assert_eq!(view.profile.label, "Your Profile (N/A)");
        assert!(!view.dbscan.known);
        assert_eq!(
            view.dbscan.description,
            "No description available for this segment."
        );
        assert_eq!(view.comparison[1].values[0], 3_500_000.0);
    }
}
