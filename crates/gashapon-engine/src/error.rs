//! Error types for engine operations
//!
//! Two families share the enum: storage failures bubbled up from the
//! entity store, and validation rejections. A rejection is always a no-op;
//! the operation checks everything before its commit, so a returned error
//! means nothing was persisted.

use gashapon_core::CharId;
use thiserror::Error;

/// Engine error type
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] gashapon_db::Error),

    #[error(transparent)]
    Content(#[from] gashapon_core::Error),

    #[error("No content definition with ID '{0}'")]
    UnknownContent(String),

    #[error("The roster is empty")]
    EmptyRoster,

    #[error("Character '{0}' is not in the collection")]
    NotCollected(CharId),

    #[error("Not enough coins: need {needed}, have {have}")]
    InsufficientCoins { needed: u64, have: u64 },

    #[error("Not enough medals: need {needed}, have {have}")]
    InsufficientMedals { needed: u64, have: u64 },

    #[error("Not enough duplicates: need {needed}, have {have}")]
    InsufficientDuplicates { needed: u32, have: u32 },

    #[error("No expedition slot {0}")]
    NoSuchSlot(u32),

    #[error("Expedition slot {0} is busy")]
    SlotBusy(u32),

    #[error("Expedition slot {0} is empty")]
    SlotEmpty(u32),

    #[error("Expedition has {remaining_ms} ms to go")]
    ExpeditionNotComplete { remaining_ms: i64 },

    #[error("Character '{0}' is away on an expedition")]
    CharacterOnExpedition(CharId),

    #[error("Character '{0}' is currently equipped")]
    CharacterSelected(CharId),

    #[error("'{0}' was already claimed this cycle")]
    AlreadyClaimed(String),

    #[error("Quest '{quest}' needs {need}, progress is {have}")]
    GoalNotReached { quest: String, have: u32, need: u32 },

    #[error("Attendance was already claimed today")]
    AlreadyClaimedToday,

    #[error("Weekly purchase limit of {limit} reached for '{item}'")]
    WeeklyLimitReached { item: String, limit: u32 },

    #[error("No dice left to roll")]
    NoDice,

    #[error("Character '{0}' has no hp left")]
    Exhausted(CharId),

    #[error("Skin '{skin}' does not fit character '{character}'")]
    SkinMismatch { skin: String, character: CharId },

    #[error("Skin '{0}' is not owned")]
    SkinNotOwned(String),
}

impl Error {
    /// True for the storage family; everything else is a validation
    /// rejection the caller can present to the player.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Store(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
