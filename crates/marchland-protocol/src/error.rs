use serde::{Deserialize, Serialize};

/// Why a command was rejected.
///
/// Rejections are recoverable and user-facing: a rejected command leaves game
/// state completely untouched and the reason is surfaced to the acting
/// client. `NotYourTurn` is the one exception the server swallows silently.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "type")]
pub enum ActionError {
    #[error("placement rejected: {reason}")]
    PlacementRejected { reason: String },

    #[error("expansion capacity for this hub is exhausted")]
    CapacityReached,

    #[error("no valid target for this action")]
    NoTarget,

    #[error("colony level may not exceed capital level")]
    LevelCap,

    #[error("peaceful growth is blocked while at war")]
    WartimeRestriction,

    #[error("diplomacy rejected: {reason}")]
    DiplomacyRejected { reason: String },

    #[error("not this player's turn")]
    NotYourTurn,

    #[error("action not valid in the current phase")]
    WrongPhase,

    #[error("a pending decision must be resolved first")]
    DecisionPending,

    #[error("no pending decision to resolve")]
    NoPendingDecision,

    #[error("a capital upgrade is already in flight")]
    UpgradeInProgress,

    #[error("unknown player")]
    UnknownPlayer,
}
