use serde::{Deserialize, Serialize};

/// Poses offered to the user. Only the ones with a calibrated correction model are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PoseKind {
    FrontDoubleBiceps,
    BackDoubleBiceps,
    SideChest,
}

impl Default for PoseKind {
    fn default() -> Self {
        PoseKind::FrontDoubleBiceps
    }
}

impl PoseKind {
    pub fn all() -> &'static [PoseKind] {
        &[
            PoseKind::FrontDoubleBiceps,
            PoseKind::BackDoubleBiceps,
            PoseKind::SideChest,
        ]
    }

    pub fn title(&self) -> &'static str {
        match self {
            PoseKind::FrontDoubleBiceps => "Front Double Biceps",
            PoseKind::BackDoubleBiceps => "Back Double Biceps",
            PoseKind::SideChest => "Side Chest",
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, PoseKind::FrontDoubleBiceps)
    }

    pub fn available() -> impl Iterator<Item = PoseKind> {
        Self::all().iter().copied().filter(PoseKind::is_available)
    }
}
