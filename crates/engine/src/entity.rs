use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The logical record types a report can be built from.
///
/// Declaration order is significant: merged reports concatenate rows in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    BeneficiaryList,
    FarmLocation,
    SeedlingRecord,
    CropSurveyStatus,
    ActivityLog,
}

impl EntityKind {
    /// All entity kinds in declaration order.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::BeneficiaryList,
        EntityKind::FarmLocation,
        EntityKind::SeedlingRecord,
        EntityKind::CropSurveyStatus,
        EntityKind::ActivityLog,
    ];

    /// Position in declaration order (registry index).
    pub fn index(self) -> usize {
        match self {
            Self::BeneficiaryList => 0,
            Self::FarmLocation => 1,
            Self::SeedlingRecord => 2,
            Self::CropSurveyStatus => 3,
            Self::ActivityLog => 4,
        }
    }

    /// Endpoint path segment, data file stem and CLI value.
    pub fn slug(self) -> &'static str {
        match self {
            Self::BeneficiaryList => "beneficiaries",
            Self::FarmLocation => "farm-plots",
            Self::SeedlingRecord => "seedlings",
            Self::CropSurveyStatus => "crop-surveys",
            Self::ActivityLog => "activity-logs",
        }
    }

    /// Human-readable name, also the default report name.
    pub fn label(self) -> &'static str {
        match self {
            Self::BeneficiaryList => "Beneficiary List",
            Self::FarmLocation => "Farm Location",
            Self::SeedlingRecord => "Seedling Records",
            Self::CropSurveyStatus => "Crop Survey Status",
            Self::ActivityLog => "Activity Log",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error for an unrecognised entity name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity kind: {0:?} (expected one of: beneficiaries, farm-plots, seedlings, crop-surveys, activity-logs)")]
pub struct UnknownEntityKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    /// Accepts the slug, the kebab-case variant name, or the label (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase().replace([' ', '_'], "-");
        EntityKind::ALL
            .into_iter()
            .find(|kind| {
                kind.slug() == needle
                    || kind.label().to_lowercase().replace(' ', "-") == needle
                    || variant_name(*kind) == needle
            })
            .ok_or_else(|| UnknownEntityKind(s.to_string()))
    }
}

fn variant_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::BeneficiaryList => "beneficiary-list",
        EntityKind::FarmLocation => "farm-location",
        EntityKind::SeedlingRecord => "seedling-record",
        EntityKind::CropSurveyStatus => "crop-survey-status",
        EntityKind::ActivityLog => "activity-log",
    }
}
