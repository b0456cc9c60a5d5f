use serde::Serialize;

use super::catalog::SegmentCatalog;
use crate::forms::SegmentPayload;

pub const SEGMENT_PALETTE: [&str; 5] = ["#3B82F6", "#10B981", "#8B5CF6", "#F59E0B", "#EF4444"];
pub const ASSET_LABELS: [&str; 4] = ["Residential", "Commercial", "Luxury", "Bank"];
pub const ASSET_COLORS: [&str; 4] = ["#60A5FA", "#34D399", "#A78BFA", "#FBBF24"];
pub const COMPARISON_CATEGORIES: [&str; 3] = ["Income", "Loan Amount", "Bank Assets"];

/// Colour for a cluster index. Noise (`-1`) and missing labels use the first colour.
pub fn segment_color(index: Option<i64>) -> &'static str {
    match index {
        Some(index) if index >= 0 => {
            SEGMENT_PALETTE[(index as usize) % SEGMENT_PALETTE.len()]
        }
        _ => SEGMENT_PALETTE[0],
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfilePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub color: &'static str,
    pub label: String,
}

/// Where the visitor sits in income / loan / bank-asset space.
pub fn profile_point(
    payload: &SegmentPayload,
    segment_index: Option<i64>,
    segment_name: &str,
) -> ProfilePoint {
    ProfilePoint {
        x: payload.income_annum,
        y: payload.loan_amount,
        z: payload.bank_asset_value,
        color: segment_color(segment_index),
        label: format!("Your Profile ({segment_name})"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: &'static str,
    pub value: f64,
    pub color: &'static str,
    pub percent: f64,
}

/// Share of each asset class. A zero total yields zero percentages.
pub fn asset_distribution(payload: &SegmentPayload) -> Vec<PieSlice> {
    let values = [
        payload.residential_assets_value,
        payload.commercial_assets_value,
        payload.luxury_assets_value,
        payload.bank_asset_value,
    ];
    let total: f64 = values.iter().sum();

    values
        .iter()
        .zip(ASSET_LABELS)
        .zip(ASSET_COLORS)
        .map(|((&value, label), color)| PieSlice {
            label,
            value,
            color,
            percent: if total > 0.0 {
                value / total * 100.0
            } else {
                0.0
            },
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub name: String,
    pub categories: [&'static str; 3],
    pub values: [f64; 3],
}

/// The visitor's figures next to their segment's benchmark.
pub fn segment_comparison(
    payload: &SegmentPayload,
    segment_name: &str,
    catalog: &SegmentCatalog,
) -> Vec<BarSeries> {
    let mut series = vec![BarSeries {
        name: "Your Profile".to_string(),
        categories: COMPARISON_CATEGORIES,
        values: [
            payload.income_annum,
            payload.loan_amount,
            payload.bank_asset_value,
        ],
    }];

    if let Some(typical) = catalog.typical_values(segment_name) {
        series.push(BarSeries {
            name: format!("{segment_name} Average"),
            categories: COMPARISON_CATEGORIES,
            values: [
                typical.income_annum,
                typical.loan_amount,
                typical.bank_asset_value,
            ],
        });
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> SegmentPayload {
        SegmentPayload {
            income_annum: 5_000_000.0,
            loan_amount: 12_000_000.0,
            residential_assets_value: 3_000_000.0,
            commercial_assets_value: 1_000_000.0,
            luxury_assets_value: 0.0,
            bank_asset_value: 4_000_000.0,
        }
    }

    #[test]
    fn palette_wraps_and_handles_noise() {
        assert_eq!(segment_color(Some(0)), "#3B82F6");
        assert_eq!(segment_color(Some(4)), "#EF4444");
        assert_eq!(segment_color(Some(7)), "#8B5CF6");
        assert_eq!(segment_color(Some(-1)), "#3B82F6");
        assert_eq!(segment_color(None), "#3B82F6");
    }

    #[test]
    fn pie_percentages_sum_to_hundred() {
        let slices = asset_distribution(&payload());
        let labels: Vec<_> = slices.iter().map(|slice| slice.label).collect();
        assert_eq!(labels, ASSET_LABELS);
        assert_eq!(slices[0].percent, 37.5);
        assert_eq!(slices[2].percent, 0.0);
        let sum: f64 = slices.iter().map(|slice| slice.percent).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn empty_assets_do_not_produce_nan() {
        let empty = SegmentPayload {
            income_annum: 0.0,
            loan_amount: 0.0,
            residential_assets_value: 0.0,
            commercial_assets_value: 0.0,
            luxury_assets_value: 0.0,
            bank_asset_value: 0.0,
        };
        assert!(asset_distribution(&empty)
            .iter()
            .all(|slice| slice.percent == 0.0));
    }

    #[test]
    fn profile_point_uses_income_loan_bank_axes() {
        let point = profile_point(&payload(), Some(2), "Dense Core 1");
        assert_eq!((point.x, point.y, point.z), (5_000_000.0, 12_000_000.0, 4_000_000.0));
        assert_eq!(point.color, "#8B5CF6");
        assert_eq!(point.label, "Your Profile (Dense Core 1)");
    }

    #[test]
    fn comparison_pairs_profile_with_benchmark() {
        let series = segment_comparison(&payload(), "Noise/Outlier", &SegmentCatalog::standard());
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].name, "Noise/Outlier Average");
        assert_eq!(series[1].values, [500_000.0, 1_000_000.0, 300_000.0]);
    }
}
