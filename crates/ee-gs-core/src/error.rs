//! Error type for backend operations, generic over transport errors.

use crate::packet::PacketFull;

#[derive(Debug, thiserror::Error)]
pub enum GsError<E: core::fmt::Debug> {
    /// Transfer channel fault reported by the platform transport.
    #[error("transfer transport fault: {0:?}")]
    Transport(E),

    /// A command write would exceed the fixed packet capacity. The frame's
    /// command volume must shrink or the packets must be created larger.
    #[error("command packet overflow: {needed} words needed, {remaining} remaining")]
    PacketOverflow { needed: usize, remaining: usize },

    /// Device memory exhausted while placing a surface or staging area.
    #[error("out of GS local memory")]
    OutOfVram,

    /// A resource handle referred to a deleted or never-created slot.
    #[error("stale resource handle")]
    StaleHandle,

    /// Entry point accepted for API compatibility but not supported.
    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

impl<E: core::fmt::Debug> From<E> for GsError<E> {
    fn from(e: E) -> Self {
        GsError::Transport(e)
    }
}

impl<E: core::fmt::Debug> GsError<E> {
    pub(crate) fn overflow(full: PacketFull) -> Self {
        GsError::PacketOverflow {
            needed: full.needed,
            remaining: full.remaining,
        }
    }
}
