//! Errors used throughout the codec.
//!
//! `CodecError` is the single error type returned by the encoder, the decoder,
//! the artifact parser and the rules-provider adapter. Variants carry enough
//! context (game index, ply, offending token) to point a user at the exact
//! spot in an artifact that could not be processed.
//!
//! Usage guidelines:
//! - `MalformedArtifact` is structural and always aborts a decode.
//! - `UnmatchedMoveToken` is raised or tolerated depending on the decoder's
//!   `UnmatchedTokenPolicy`.
//! - `IllegalMove` means the rules provider refused a move it enumerated
//!   itself; treat it as an internal bug, not bad input.

use thiserror::Error;

pub type CodecResult<T> = Result<T, CodecError>;

/// Unified error type for encoding, decoding and artifact parsing.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A position with payload bits still pending offers no usable codeword
    /// width (fewer than two legal moves).
    ///
    /// Payload: zero-based game index, ply within that game, legal move count.
    #[error("no encodable capacity at game {game}, ply {ply} ({legal_moves} legal moves)")]
    NoEncodableCapacity {
        game: usize,
        ply: usize,
        legal_moves: usize,
    },

    /// A movetext token does not name a selectable legal move at the position
    /// reached by replaying the record.
    #[error("move token '{token}' is not a legal move at game {game}, ply {ply}")]
    UnmatchedMoveToken {
        game: usize,
        ply: usize,
        token: String,
    },

    /// The artifact text could not be split into records or tokenized.
    #[error("malformed artifact: {0}")]
    MalformedArtifact(String),

    /// The rules provider rejected a move taken from its own legal move list.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// A download was logged for a conversion id that was never issued.
    #[error("unknown conversion id {0}")]
    UnknownConversion(u64),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
