//! level.rs: coarse risk buckets and their fixed display attributes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Risk level derived from a score via the fixed thresholds 40 and 70.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Normal,
    Moderate,
    High,
}

pub const MODERATE_THRESHOLD: u8 = 40;
pub const HIGH_THRESHOLD: u8 = 70;

/// Display colours for one level. Class names are the utility classes the
/// web pages used; `chart` is the hex colour of the gauge and chart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub text: &'static str,
    pub background: &'static str,
    pub border: &'static str,
    pub chart: &'static str,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        if score >= HIGH_THRESHOLD {
            RiskLevel::High
        } else if score >= MODERATE_THRESHOLD {
            RiskLevel::Moderate
        } else {
            RiskLevel::Normal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Normal => "normal",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            RiskLevel::High => Palette {
                text: "text-red-500",
                background: "bg-red-100",
                border: "border-red-200",
                chart: "#ef4444",
            },
            RiskLevel::Moderate => Palette {
                text: "text-yellow-500",
                background: "bg-yellow-100",
                border: "border-yellow-200",
                chart: "#eab308",
            },
            RiskLevel::Normal => Palette {
                text: "text-teal-600",
                background: "bg-teal-100",
                border: "border-teal-200",
                chart: "#0d9488",
            },
        }
    }

    pub fn status_description(self) -> &'static str {
        match self {
            RiskLevel::High => "Continuous monitoring and attention are required.",
            RiskLevel::Moderate => "Regular health management is required.",
            RiskLevel::Normal => "You are maintaining a good condition.",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_inclusive_lower_bounds() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Normal);
        assert_eq!(RiskLevel::from_score(39), RiskLevel::Normal);
        assert_eq!(RiskLevel::from_score(40), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(69), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(70), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::High);
    }

    #[test]
    fn each_level_has_distinct_display() {
        let levels = [RiskLevel::Normal, RiskLevel::Moderate, RiskLevel::High];
        for (i, a) in levels.iter().enumerate() {
            for b in &levels[i + 1..] {
                assert_ne!(a.palette().chart, b.palette().chart);
                assert_ne!(a.status_description(), b.status_description());
            }
        }
        assert_eq!(RiskLevel::High.palette().chart, "#ef4444");
    }

    #[test]
    fn serializes_as_snake_case_label() {
        let v = serde_json::to_value(RiskLevel::Moderate).unwrap();
        assert_eq!(v, serde_json::json!("moderate"));
        assert_eq!(RiskLevel::High.to_string(), "high");
    }
}
