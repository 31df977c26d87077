//! Per-position codebook, derived on demand from the legal move count.
//!
//! A position with `n` legal moves carries `floor(log2 n)` bits, capped at
//! `MAX_CODEWORD_WIDTH`. Only ranks below `2^width` are addressable; the rest
//! of the move list is never played by the encoder.

use std::fmt;

/// Widest codeword a single move carries. The decoder clamps the final
/// token to the bits left in the current byte, which only matches the
/// encoder's clamp while no codeword is wider than a byte.
pub const MAX_CODEWORD_WIDTH: u32 = 8;

/// Bits a position with `legal_moves` moves can carry.
#[inline]
pub fn codeword_width(legal_moves: usize) -> u32 {
    if legal_moves == 0 {
        0
    } else {
        legal_moves.ilog2().min(MAX_CODEWORD_WIDTH)
    }
}

/// Number of ranks that receive a codeword at this width.
#[inline]
pub fn addressable_moves(width: u32) -> usize {
    1usize << width
}

/// Fixed-width binary string standing for one legal move's rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codeword {
    pub rank: usize,
    pub width: u32,
}

impl Codeword {
    /// Codeword for `rank` at `width`, or `None` if the rank is not
    /// addressable.
    pub fn for_rank(rank: usize, width: u32) -> Option<Self> {
        if rank < addressable_moves(width) {
            Some(Self { rank, width })
        } else {
            None
        }
    }
}

impl fmt::Display for Codeword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width == 0 {
            return Ok(());
        }
        write!(f, "{:0width$b}", self.rank, width = self.width as usize)
    }
}
