//! Experiment Results - per-arm metrics plus the significance verdict

use serde::{Deserialize, Serialize};

use super::ArmCounts;
use crate::stats::{self, ConfidenceInterval};
use crate::Result;

/// Metrics for a single arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantResults {
    /// Distinct users assigned to the arm.
    pub visitors: u64,
    /// Distinct users who converted in the arm.
    pub conversions: u64,
    /// `conversions / visitors`, or 0 with no visitors.
    pub conversion_rate: f64,
    /// 95% Wald interval around `conversion_rate`.
    pub confidence_interval: ConfidenceInterval,
}

impl VariantResults {
    fn new(visitors: u64, conversions: u64) -> Self {
        let conversion_rate = stats::conversion_rate(conversions, visitors);
        Self {
            visitors,
            conversions,
            conversion_rate,
            confidence_interval: stats::confidence_interval(conversion_rate, visitors),
        }
    }
}

/// Computed, cacheable results for one experiment.
///
/// Fields serialize in camelCase (`pValue`, `conversionRate`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentResults {
    /// Experiment the results describe.
    pub experiment_id: String,
    /// Control arm metrics.
    pub control: VariantResults,
    /// Variant arm metrics.
    pub variant: VariantResults,
    /// Whether the z-test rejects equal rates at alpha 0.05.
    pub statistical_significance: bool,
    /// Always [`stats::CONFIDENCE_LEVEL`].
    pub confidence_level: f64,
    /// Two-sided p-value (1.0 when no test was run).
    pub p_value: f64,
    /// Visitors needed per arm to detect the observed effect.
    pub sample_size_recommendation: u64,
}

impl ExperimentResults {
    /// Encode for the results cache.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Serialization`] if a field cannot be represented as JSON.
    pub fn to_cache_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a results cache entry.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Serialization`] for a truncated or foreign payload.
    pub fn from_cache_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Run the significance engine over aggregated counts.
    #[must_use]
    pub fn from_counts(experiment_id: impl Into<String>, counts: ArmCounts) -> Self {
        let control = VariantResults::new(counts.control_visitors, counts.control_conversions);
        let variant = VariantResults::new(counts.variant_visitors, counts.variant_conversions);

        let test = stats::significance(
            control.conversions,
            control.visitors,
            variant.conversions,
            variant.visitors,
        );

        Self {
            experiment_id: experiment_id.into(),
            statistical_significance: test.is_significant,
            confidence_level: stats::CONFIDENCE_LEVEL,
            p_value: test.p_value,
            sample_size_recommendation: stats::sample_size_recommendation(
                control.conversion_rate,
                variant.conversion_rate,
            ),
            control,
            variant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_experiment() {
        let results = ExperimentResults::from_counts("exp-1", ArmCounts::default());
        assert_eq!(results.control.conversion_rate, 0.0);
        assert_eq!(results.control.confidence_interval, ConfidenceInterval::EMPTY);
        assert!(!results.statistical_significance);
        assert_eq!(results.p_value, 1.0);
        assert_eq!(results.sample_size_recommendation, stats::NO_EFFECT_SAMPLE_SIZE);
        assert_eq!(results.confidence_level, 0.95);
    }

    #[test]
    fn test_significant_difference() {
        let counts = ArmCounts {
            control_visitors: 40,
            variant_visitors: 40,
            control_conversions: 4,
            variant_conversions: 12,
        };
        let results = ExperimentResults::from_counts("exp-1", counts);

        assert!((results.control.conversion_rate - 0.1).abs() < 1e-12);
        assert!((results.variant.conversion_rate - 0.3).abs() < 1e-12);
        assert!(results.p_value < 0.05);
        assert!(results.statistical_significance);
        assert_eq!(results.sample_size_recommendation, 63);
    }

    #[test]
    fn test_results_round_trip_through_json() {
        let counts = ArmCounts {
            control_visitors: 100,
            variant_visitors: 90,
            control_conversions: 10,
            variant_conversions: 20,
        };
        let results = ExperimentResults::from_counts("exp-1", counts);
        let bytes = results.to_cache_bytes().unwrap();
        let back = ExperimentResults::from_cache_bytes(&bytes).unwrap();
        assert_eq!(back, results);
    }

    #[test]
    fn test_results_wire_field_names() {
        let results = ExperimentResults::from_counts("exp-1", ArmCounts::default());
        let value = serde_json::to_value(&results).unwrap();

        for field in [
            "experimentId",
            "statisticalSignificance",
            "confidenceLevel",
            "pValue",
            "sampleSizeRecommendation",
        ] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
        assert_eq!(value["control"]["conversionRate"], 0.0);
        assert_eq!(value["variant"]["confidenceInterval"]["upper"], 0.0);
        assert!(value.get("p_value").is_none());
    }

    #[test]
    fn test_truncated_cache_entry_is_serialization_error() {
        let err = ExperimentResults::from_cache_bytes(br#"{"experimentId":"exp-1","#).unwrap_err();
        assert!(matches!(err, crate::Error::Serialization(_)));
    }
}
