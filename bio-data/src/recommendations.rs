//! Static supplement timing advice, keyed by supplement name.

use crate::models::SupplementRecommendation;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static RECOMMENDATIONS: Lazy<HashMap<&'static str, SupplementRecommendation>> = Lazy::new(|| {
    HashMap::from([
        (
            "Vitamin D",
            SupplementRecommendation {
                timing: "Morning with food",
                interaction_warning: Some("May interact with certain medications."),
            },
        ),
        (
            "Magnesium Glycinate",
            SupplementRecommendation {
                timing: "Evening, 30-60 mins before bed",
                interaction_warning: None,
            },
        ),
        (
            "Creatine Monohydrate",
            SupplementRecommendation {
                timing: "Anytime, daily",
                interaction_warning: None,
            },
        ),
    ])
});

/// Recommendation for an exact supplement name.
pub fn lookup(name: &str) -> Option<&'static SupplementRecommendation> {
    RECOMMENDATIONS.get(name)
}

/// Every supplement with a recommendation.
pub fn known_supplements() -> impl Iterator<Item = &'static str> {
    RECOMMENDATIONS.keys().copied()
}
