//! Campus-wide summary and capacity recommendations.

use serde::Serialize;

use crate::query::LocationView;

/// Severity of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationLevel {
    /// Campus as a whole is overloaded.
    Critical,
    /// Every location is crowded.
    Warning,
    /// Spare capacity is available somewhere.
    Info,
}

/// One actionable suggestion for operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    /// Severity.
    #[serde(rename = "type")]
    pub level: RecommendationLevel,
    /// Short heading.
    pub title: String,
    /// Full text.
    pub message: String,
}

/// Totals and recommendations across every location.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CampusSummary {
    /// Number of locations.
    pub locations: usize,
    /// Sum of capacities.
    pub total_capacity: u32,
    /// Sum of current counts.
    pub total_count: u32,
    /// Sum of available capacity.
    pub total_available: u32,
    /// `100 * total_count / total_capacity`.
    pub utilization_percentage: f64,
    /// Mean of per-location load percentages.
    pub average_load_percentage: f64,
    /// The location with the lowest load (first on ties).
    pub least_loaded: Option<LocationView>,
    /// Locations at or above the crowded threshold, most loaded first.
    pub crowded: Vec<LocationView>,
    /// Suggestions derived from the figures above.
    pub recommendations: Vec<Recommendation>,
}

/// Share of total capacity the least-loaded location must have free
/// before it is recommended.
const SPARE_CAPACITY_SHARE: f64 = 0.3;

/// Summarize `views`, treating a load of `crowded_percent` or more as crowded.
pub fn summarize(views: &[LocationView], crowded_percent: u32) -> CampusSummary {
    if views.is_empty() {
        return CampusSummary::default();
    }

    let total_capacity = views
        .iter()
        .fold(0_u32, |sum, view| sum.saturating_add(view.capacity));
    let total_count = views
        .iter()
        .fold(0_u32, |sum, view| sum.saturating_add(view.current_count));
    let total_available = views
        .iter()
        .fold(0_u32, |sum, view| sum.saturating_add(view.available_capacity));

    let utilization_percentage = if total_capacity == 0 {
        0.0
    } else {
        f64::from(total_count) * 100.0 / f64::from(total_capacity)
    };
    let count = f64::from(u32::try_from(views.len()).unwrap_or(u32::MAX));
    let average_load_percentage =
        views.iter().map(|view| view.load_percentage).sum::<f64>() / count;

    let least_loaded = views
        .iter()
        .min_by(|a, b| a.load_percentage.total_cmp(&b.load_percentage))
        .cloned();

    let threshold = f64::from(crowded_percent);
    let mut crowded: Vec<LocationView> = views
        .iter()
        .filter(|view| view.load_percentage >= threshold)
        .cloned()
        .collect();
    crowded.sort_by(|a, b| b.load_percentage.total_cmp(&a.load_percentage));

    let mut recommendations = Vec::new();
    if average_load_percentage > threshold {
        recommendations.push(Recommendation {
            level: RecommendationLevel::Critical,
            title: String::from("Campus at High Capacity"),
            message: format!(
                "Average load is {average_load_percentage:.1}%. Consider redirecting visitors to off-peak locations."
            ),
        });
    }
    if crowded.len() == views.len() {
        recommendations.push(Recommendation {
            level: RecommendationLevel::Warning,
            title: String::from("All Locations Crowded"),
            message: format!(
                "All monitored locations are above {crowded_percent}% capacity. Implement crowd control measures."
            ),
        });
    }
    let spare = least_loaded.as_ref().filter(|least| {
        f64::from(least.available_capacity) > f64::from(total_capacity) * SPARE_CAPACITY_SHARE
    });
    if let Some(least) = spare {
        recommendations.push(Recommendation {
            level: RecommendationLevel::Info,
            title: String::from("Capacity Available"),
            message: format!(
                "{} has significant availability. Recommend visitors there.",
                least.name
            ),
        });
    }

    CampusSummary {
        locations: views.len(),
        total_capacity,
        total_count,
        total_available,
        utilization_percentage,
        average_load_percentage,
        least_loaded,
        crowded,
        recommendations,
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use crowdwatch_decision::DecisionEngine;
    use crowdwatch_types::{LocationId, LocationStatus};

    use super::*;

    fn view(id: i64, name: &str, capacity: u32, current_count: u32) -> LocationView {
        let engine = DecisionEngine::campus();
        LocationView {
            id: LocationId::new(id),
            name: name.to_owned(),
            capacity,
            current_count,
            status: engine.status(current_count, capacity),
            entry_closed: current_count > capacity,
            load_percentage: engine.load_percentage(current_count, capacity),
            available_capacity: capacity.saturating_sub(current_count),
        }
    }

    fn levels(summary: &CampusSummary) -> Vec<RecommendationLevel> {
        summary.recommendations.iter().map(|r| r.level).collect()
    }

    #[test]
    fn empty_campus_has_no_recommendations() {
        let summary = summarize(&[], 80);
        assert_eq!(summary, CampusSummary::default());
    }

    #[test]
    fn quiet_campus_recommends_the_least_loaded_location() {
        let views = vec![
            view(1, "Cafeteria", 30, 10),
            view(2, "Admin Block", 50, 5),
            view(3, "Academic Block", 150, 15),
            view(4, "Basketball Court", 20, 2),
        ];
        let summary = summarize(&views, 80);

        assert_eq!(summary.total_capacity, 250);
        assert_eq!(summary.total_count, 32);
        assert_eq!(summary.total_available, 218);
        assert!((summary.utilization_percentage - 12.8).abs() < 1e-9);
        // Admin Block, Academic Block, and Basketball Court all sit at 10%;
        // the first one wins.
        assert_eq!(summary.least_loaded.as_ref().map(|v| v.name.as_str()), Some("Admin Block"));
        assert!(summary.crowded.is_empty());
        // Admin Block has 45 free, not more than 30% of 250.
        assert!(levels(&summary).is_empty());
    }

    #[test]
    fn large_free_location_triggers_info() {
        let views = vec![view(1, "Cafeteria", 30, 25), view(2, "Academic Block", 150, 3)];
        let summary = summarize(&views, 80);
        assert_eq!(levels(&summary), vec![RecommendationLevel::Info]);
        assert!(summary.recommendations[0].message.starts_with("Academic Block"));
        assert_eq!(summary.crowded.len(), 1);
        assert_eq!(summary.crowded[0].status, LocationStatus::Warning);
    }

    #[test]
    fn saturated_campus_is_critical_and_warning() {
        let views = vec![
            view(1, "Cafeteria", 30, 31),
            view(2, "Admin Block", 50, 45),
            view(3, "Basketball Court", 20, 17),
        ];
        let summary = summarize(&views, 80);

        assert_eq!(
            levels(&summary),
            vec![RecommendationLevel::Critical, RecommendationLevel::Warning]
        );
        let order: Vec<&str> = summary.crowded.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(order, vec!["Cafeteria", "Admin Block", "Basketball Court"]);
        assert_eq!(summary.total_available, 8);
    }
}
