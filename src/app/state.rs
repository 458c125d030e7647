use bevy::prelude::*;

/// Table lifecycle per level.
/// Build -> Play -> Result
#[derive(States, Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum TablePhase {
    /// Placement: buildings may be purchased and positioned.
    #[default]
    Build,
    /// Balls in motion; shots resolve against the rest detector.
    Play,
    /// Target met or shot budget exhausted.
    Result,
}
