//! Wizard step sequence — tracks which question block the user is on.

use serde::{Deserialize, Serialize};

/// The steps of the collection flow.
///
/// Progresses linearly: Modalities → Volumetry → UnitCount → Infrastructure →
/// Commercial → Sla → Final. Back navigation walks the same chain in reverse
/// and stops at Modalities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Modalities,
    Volumetry,
    UnitCount,
    Infrastructure,
    Commercial,
    Sla,
    Final,
}

impl Step {
    /// The next step in the linear progression, if any.
    pub fn next(&self) -> Option<Step> {
        use Step::*;
        match self {
            Modalities => Some(Volumetry),
            Volumetry => Some(UnitCount),
            UnitCount => Some(Infrastructure),
            Infrastructure => Some(Commercial),
            Commercial => Some(Sla),
            Sla => Some(Final),
            Final => None,
        }
    }

    /// The predecessor used for back navigation, if any.
    ///
    /// Exact mirror of [`Step::next`], so the two maps cannot disagree or
    /// form a cycle.
    pub fn prev(&self) -> Option<Step> {
        use Step::*;
        match self {
            Modalities => None,
            Volumetry => Some(Modalities),
            UnitCount => Some(Volumetry),
            Infrastructure => Some(UnitCount),
            Commercial => Some(Infrastructure),
            Sla => Some(Commercial),
            Final => Some(Sla),
        }
    }

    /// Whether this step is terminal (collection is done).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Final)
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::Modalities
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Modalities => "modalities",
            Self::Volumetry => "volumetry",
            Self::UnitCount => "unit_count",
            Self::Infrastructure => "infrastructure",
            Self::Commercial => "commercial",
            Self::Sla => "sla",
            Self::Final => "final",
        };
        write!(f, "{s}")
    }
}
