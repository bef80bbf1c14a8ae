//! Course markers and their classification.
//!
//! Markers arrive as loosely named point features ("KM 12", "Water", "Ravito
//! liquide"...). [`MarkCategory::classify`] maps a name onto the closed set of
//! categories the playback understands; anything else is
//! [`Classification::Unclassified`] and dropped by [`classify_marks`]. Unknown
//! names are expected as new marker types appear, so dropping them is not an error.

use log::debug;

use crate::GpsPoint;

/// A raw named point feature, as read from the course data.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkFeature {
    pub coordinate: GpsPoint,
    pub name: String,
}

impl MarkFeature {
    pub fn new(coordinate: GpsPoint, name: impl Into<String>) -> Self {
        Self { coordinate, name: name.into() }
    }
}

/// Closed set of marker categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MarkCategory {
    Kilometer,
    Water,
    Fuel,
    Gel,
    Start,
    Finish,
}

/// Result of classifying a marker name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Category(MarkCategory),
    Unclassified,
}

impl MarkCategory {
    /// Classify a marker by name. Matching is case-insensitive.
    ///
    /// ```rust
    /// use route_playback::{Classification, MarkCategory};
    ///
    /// assert_eq!(MarkCategory::classify("KM 21"), Classification::Category(MarkCategory::Kilometer));
    /// assert_eq!(MarkCategory::classify("Water point"), Classification::Category(MarkCategory::Water));
    /// assert_eq!(MarkCategory::classify("Photographer"), Classification::Unclassified);
    /// ```
    pub fn classify(name: &str) -> Classification {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Classification::Unclassified;
        }

        let category = if name.starts_with("start") || name.starts_with("depart") || name.starts_with("départ") {
            MarkCategory::Start
        } else if name.starts_with("finish") || name.starts_with("arriv") {
            MarkCategory::Finish
        } else if is_kilometer_name(&name) {
            MarkCategory::Kilometer
        } else if name.contains("water") || name.contains("d'eau") || name.contains("liquid") {
            MarkCategory::Water
        } else if name.contains("gel") {
            MarkCategory::Gel
        } else if name.contains("fuel") || name.contains("food") || name.contains("ravit") || name.contains("aid") {
            MarkCategory::Fuel
        } else {
            return Classification::Unclassified;
        };
        Classification::Category(category)
    }
}

/// "km 5", "KM5", "5 km", "5k", "10K": a number with a kilometer prefix or suffix.
fn is_kilometer_name(name: &str) -> bool {
    let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = if let Some(rest) = compact.strip_prefix("km") {
        rest
    } else if let Some(rest) = compact.strip_suffix("km") {
        rest
    } else if let Some(rest) = compact.strip_suffix('k') {
        rest
    } else {
        return false;
    };
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
}

/// A classified marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub coordinate: GpsPoint,
    pub name: String,
    pub category: MarkCategory,
}

/// Classify raw features, dropping unrecognized ones. Input order is preserved.
pub fn classify_marks(features: &[MarkFeature]) -> Vec<Mark> {
    features
        .iter()
        .filter_map(|f| match MarkCategory::classify(&f.name) {
            Classification::Category(category) => Some(Mark {
                coordinate: f.coordinate,
                name: f.name.trim().to_string(),
                category,
            }),
            Classification::Unclassified => {
                debug!("[Marks] Dropping unrecognized marker '{}'", f.name);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str) -> Option<MarkCategory> {
        match MarkCategory::classify(name) {
            Classification::Category(c) => Some(c),
            Classification::Unclassified => None,
        }
    }

    #[test]
    fn test_kilometer_names() {
        for name in ["KM 5", "km5", "Km 12.5", "5 km", "10K", "21k"] {
            assert_eq!(category(name), Some(MarkCategory::Kilometer), "{}", name);
        }
        assert_eq!(category("km"), None);
        assert_eq!(category("k"), None);
    }

    #[test]
    fn test_station_names() {
        assert_eq!(category("Water"), Some(MarkCategory::Water));
        assert_eq!(category("Point d'eau"), Some(MarkCategory::Water));
        assert_eq!(category("GEL"), Some(MarkCategory::Gel));
        assert_eq!(category("Fuel station"), Some(MarkCategory::Fuel));
        assert_eq!(category("Ravitaillement"), Some(MarkCategory::Fuel));
        assert_eq!(category("Aid station 2"), Some(MarkCategory::Fuel));
    }

    #[test]
    fn test_start_and_finish() {
        assert_eq!(category("Start"), Some(MarkCategory::Start));
        assert_eq!(category("  start line "), Some(MarkCategory::Start));
        assert_eq!(category("Départ"), Some(MarkCategory::Start));
        assert_eq!(category("Finish"), Some(MarkCategory::Finish));
        assert_eq!(category("Arrivée"), Some(MarkCategory::Finish));
    }

    #[test]
    fn test_unknown_names_are_unclassified() {
        assert_eq!(MarkCategory::classify(""), Classification::Unclassified);
        assert_eq!(MarkCategory::classify("Photographer"), Classification::Unclassified);
        assert_eq!(MarkCategory::classify("Viewpoint"), Classification::Unclassified);
    }

    #[test]
    fn test_classify_marks_drops_unknown_and_keeps_order() {
        let features = vec![
            MarkFeature::new(GpsPoint::new(0.0, 0.0), "Start"),
            MarkFeature::new(GpsPoint::new(0.0, 0.01), "Selfie spot"),
            MarkFeature::new(GpsPoint::new(0.0, 0.02), " KM 2 "),
            MarkFeature::new(GpsPoint::new(0.0, 0.03), "Finish"),
        ];
        let marks = classify_marks(&features);
        assert_eq!(marks.len(), 3);
        assert_eq!(marks[0].category, MarkCategory::Start);
        assert_eq!(marks[1].name, "KM 2");
        assert_eq!(marks[1].category, MarkCategory::Kilometer);
        assert_eq!(marks[2].category, MarkCategory::Finish);
    }
}
