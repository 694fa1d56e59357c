//! Assist level telemetry.

/// Assist frames come in two mutually exclusive shapes, told apart by
/// frame length only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistReading {
    /// Available and selected assist levels (10-byte frame).
    Levels {
        /// Lowest selectable level.
        min: u8,
        /// Highest selectable level.
        max: u8,
        /// Currently selected level.
        current: u8,
    },
    /// Result of an assist synchronisation (9-byte frame).
    Sync {
        /// Two-character result code, `"OK"` on success.
        sync_result: String,
        /// Whether the sync succeeded.
        success: bool,
    },
}

impl AssistReading {
    /// Returns the current assist level for the `Levels` shape.
    #[must_use]
    pub const fn current_level(&self) -> Option<u8> {
        match self {
            Self::Levels { current, .. } => Some(*current),
            Self::Sync { .. } => None,
        }
    }
}
