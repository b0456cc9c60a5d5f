use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const FALLBACK_DESCRIPTION: &str = "No description available for this segment.";
pub const FALLBACK_INSIGHT: &str = "Based on your financial profile, you belong to a segment with specific financial characteristics. Your particular combination of income, loan requirements, and assets puts you in a position where customized financial products may be applicable.";
pub const DEFAULT_SEGMENT: &str = "Mid Income/Loan";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read segment catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("segment catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("default segment `{segment}` has no typical values")]
    MissingDefault { segment: String },
}

/// Benchmark figures for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypicalValues {
    pub income_annum: f64,
    pub loan_amount: f64,
    pub bank_asset_value: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentProfile {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub insight: Option<String>,
    #[serde(default)]
    pub typical: Option<TypicalValues>,
}

/// Descriptions and benchmarks keyed by the backend's segment labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentCatalog {
    pub default_segment: String,
    #[serde(default = "fallback_description")]
    pub fallback_description: String,
    #[serde(default = "fallback_insight")]
    pub fallback_insight: String,
    pub segments: BTreeMap<String, SegmentProfile>,
}

fn fallback_description() -> String {
    FALLBACK_DESCRIPTION.to_string()
}

fn fallback_insight() -> String {
    FALLBACK_INSIGHT.to_string()
}

impl Default for SegmentCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl SegmentCatalog {
    /// The labels the hosted models are known to emit.
    pub fn standard() -> Self {
        let entries = [
            (
                "Mid Income/Loan",
                "Clients with moderate income levels seeking smaller loans. This segment typically has modest asset values and represents a balanced risk profile.",
                Some("You're in the Mid Income/Loan segment, characterized by moderate income levels and loan requirements. This group typically has balanced financial health with diversified assets. Financial institutions often offer specialized products for this segment with competitive interest rates and flexible terms."),
                (3_500_000.0, 10_000_000.0, 3_000_000.0),
            ),
            (
                "Low Value",
                "Despite the name, this segment represents high-value clients with substantial income and large loan requirements. They possess significant assets across multiple categories.",
                Some("Despite the name, the Low Value segment represents high-value clients seeking substantial loans with significant income. Your asset portfolio shows strong financial standing. You may qualify for premium financial products, including preferential rates, higher credit limits, and personalized banking services."),
                (7_500_000.0, 25_000_000.0, 7_000_000.0),
            ),
            (
                "Dense Core 1",
                "The majority of clients fall into this core segment, representing moderate to high financial stability with well-distributed assets.",
                None,
                (5_500_000.0, 15_000_000.0, 4_500_000.0),
            ),
            (
                "Noise/Outlier",
                "Rare cases that fall outside typical patterns, often representing unique financial circumstances that require special attention.",
                None,
                (500_000.0, 1_000_000.0, 300_000.0),
            ),
        ];

        let segments = entries
            .into_iter()
            .map(|(name, description, insight, (income, loan, bank))| {
                (
                    name.to_string(),
                    SegmentProfile {
                        description: Some(description.to_string()),
                        insight: insight.map(str::to_string),
                        typical: Some(TypicalValues {
                            income_annum: income,
                            loan_amount: loan,
                            bank_asset_value: bank,
                        }),
                    },
                )
            })
            .collect();

        Self {
            default_segment: DEFAULT_SEGMENT.to_string(),
            fallback_description: fallback_description(),
            fallback_insight: fallback_insight(),
            segments,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let has_default = self
            .segments
            .get(&self.default_segment)
            .and_then(|profile| profile.typical)
            .is_some();
        if has_default {
            Ok(())
        } else {
            Err(CatalogError::MissingDefault {
                segment: self.default_segment.clone(),
            })
        }
    }

    pub fn is_known(&self, segment: &str) -> bool {
        self.segments.contains_key(segment)
    }

    pub fn describe(&self, segment: &str) -> &str {
        match self
            .segments
            .get(segment)
            .and_then(|profile| profile.description.as_deref())
        {
            Some(description) => description,
            None => {
                warn!(%segment, "segment has no catalog description");
                &self.fallback_description
            }
        }
    }

    pub fn insight(&self, segment: &str) -> &str {
        self.segments
            .get(segment)
            .and_then(|profile| profile.insight.as_deref())
            .unwrap_or(&self.fallback_insight)
    }

    /// Benchmarks for `segment`, or for the default segment when it has none.
    pub fn typical_values(&self, segment: &str) -> Option<TypicalValues> {
        self.segments
            .get(segment)
            .and_then(|profile| profile.typical)
            .or_else(|| {
                self.segments
                    .get(&self.default_segment)
                    .and_then(|profile| profile.typical)
            })
    }
}
