use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Four-level bands derived from continuous fields
// ---------------------------------------------------------------------------

/// Band of `severity_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityCategory {
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityCategory {
    pub const ALL: [SeverityCategory; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// `≤3` Low, `≤6` Medium, `≤8` High, otherwise Critical.
    pub fn from_level(level: i64) -> Self {
        if level <= 3 {
            Self::Low
        } else if level <= 6 {
            Self::Medium
        } else if level <= 8 {
            Self::High
        } else {
            Self::Critical
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Low => "Low (1-3)",
            Self::Medium => "Medium (4-6)",
            Self::High => "High (7-8)",
            Self::Critical => "Critical (9-10)",
        }
    }
}

/// Band of `estimated_economic_loss_usd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EconomicImpactCategory {
    Minor,
    Moderate,
    Severe,
    Catastrophic,
}

impl EconomicImpactCategory {
    pub const ALL: [EconomicImpactCategory; 4] =
        [Self::Minor, Self::Moderate, Self::Severe, Self::Catastrophic];

    pub fn from_loss(loss_usd: f64) -> Self {
        if loss_usd < 1_000_000.0 {
            Self::Minor
        } else if loss_usd < 10_000_000.0 {
            Self::Moderate
        } else if loss_usd < 100_000_000.0 {
            Self::Severe
        } else {
            Self::Catastrophic
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Minor => "Minor",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
            Self::Catastrophic => "Catastrophic",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Minor => "Minor (<$1M)",
            Self::Moderate => "Moderate ($1M-$10M)",
            Self::Severe => "Severe ($10M-$100M)",
            Self::Catastrophic => "Catastrophic (>$100M)",
        }
    }
}

/// Band of `response_time_hours`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResponseCategory {
    Immediate,
    Fast,
    Moderate,
    Slow,
}

impl ResponseCategory {
    pub const ALL: [ResponseCategory; 4] = [Self::Immediate, Self::Fast, Self::Moderate, Self::Slow];

    pub fn from_hours(hours: f64) -> Self {
        if hours < 6.0 {
            Self::Immediate
        } else if hours < 24.0 {
            Self::Fast
        } else if hours < 72.0 {
            Self::Moderate
        } else {
            Self::Slow
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Immediate => "Immediate",
            Self::Fast => "Fast",
            Self::Moderate => "Moderate",
            Self::Slow => "Slow",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Immediate => "Immediate (<6h)",
            Self::Fast => "Fast (6-24h)",
            Self::Moderate => "Moderate (24-72h)",
            Self::Slow => "Slow (>72h)",
        }
    }
}

/// Band of `affected_population`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PopulationImpactCategory {
    Small,
    Medium,
    Large,
    #[serde(rename = "Very Large")]
    VeryLarge,
}

impl PopulationImpactCategory {
    pub const ALL: [PopulationImpactCategory; 4] =
        [Self::Small, Self::Medium, Self::Large, Self::VeryLarge];

    pub fn from_population(population: i64) -> Self {
        if population < 1_000 {
            Self::Small
        } else if population < 10_000 {
            Self::Medium
        } else if population < 100_000 {
            Self::Large
        } else {
            Self::VeryLarge
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
            Self::VeryLarge => "Very Large",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Small => "Small (<1K)",
            Self::Medium => "Medium (1K-10K)",
            Self::Large => "Large (10K-100K)",
            Self::VeryLarge => "Very Large (>100K)",
        }
    }
}

macro_rules! impl_category_text {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }

            impl std::str::FromStr for $ty {
                type Err = UnknownCategory;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    let s = s.trim();
                    Self::ALL
                        .into_iter()
                        .find(|c| c.label().eq_ignore_ascii_case(s) || c.description() == s)
                        .ok_or_else(|| UnknownCategory(s.to_string()))
                }
            }
        )*
    };
}

impl_category_text!(
    SeverityCategory,
    EconomicImpactCategory,
    ResponseCategory,
    PopulationImpactCategory,
);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category label '{0}'")]
pub struct UnknownCategory(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_boundaries() {
        assert_eq!(SeverityCategory::from_level(1), SeverityCategory::Low);
        assert_eq!(SeverityCategory::from_level(3), SeverityCategory::Low);
        assert_eq!(SeverityCategory::from_level(4), SeverityCategory::Medium);
        assert_eq!(SeverityCategory::from_level(6), SeverityCategory::Medium);
        assert_eq!(SeverityCategory::from_level(7), SeverityCategory::High);
        assert_eq!(SeverityCategory::from_level(8), SeverityCategory::High);
        assert_eq!(SeverityCategory::from_level(9), SeverityCategory::Critical);
        assert_eq!(SeverityCategory::from_level(10), SeverityCategory::Critical);
    }

    #[test]
    fn economic_loss_boundaries() {
        assert_eq!(EconomicImpactCategory::from_loss(0.0), EconomicImpactCategory::Minor);
        assert_eq!(EconomicImpactCategory::from_loss(999_999.0), EconomicImpactCategory::Minor);
        assert_eq!(EconomicImpactCategory::from_loss(1_000_000.0), EconomicImpactCategory::Moderate);
        assert_eq!(EconomicImpactCategory::from_loss(9_999_999.99), EconomicImpactCategory::Moderate);
        assert_eq!(EconomicImpactCategory::from_loss(10_000_000.0), EconomicImpactCategory::Severe);
        assert_eq!(EconomicImpactCategory::from_loss(100_000_000.0), EconomicImpactCategory::Catastrophic);
    }

    #[test]
    fn response_boundaries() {
        assert_eq!(ResponseCategory::from_hours(5.9), ResponseCategory::Immediate);
        assert_eq!(ResponseCategory::from_hours(6.0), ResponseCategory::Fast);
        assert_eq!(ResponseCategory::from_hours(23.99), ResponseCategory::Fast);
        assert_eq!(ResponseCategory::from_hours(24.0), ResponseCategory::Moderate);
        assert_eq!(ResponseCategory::from_hours(72.0), ResponseCategory::Slow);
    }

    #[test]
    fn population_boundaries() {
        assert_eq!(PopulationImpactCategory::from_population(999), PopulationImpactCategory::Small);
        assert_eq!(PopulationImpactCategory::from_population(1000), PopulationImpactCategory::Medium);
        assert_eq!(PopulationImpactCategory::from_population(99_999), PopulationImpactCategory::Large);
        assert_eq!(PopulationImpactCategory::from_population(100_000), PopulationImpactCategory::VeryLarge);
    }

    #[test]
    fn labels_parse_back() {
        assert_eq!("Very Large".parse(), Ok(PopulationImpactCategory::VeryLarge));
        assert_eq!("Minor (<$1M)".parse(), Ok(EconomicImpactCategory::Minor));
        assert_eq!("critical".parse(), Ok(SeverityCategory::Critical));
        assert!("Huge".parse::<ResponseCategory>().is_err());
    }
}
