//! Seam between the codec and a chess rules implementation.
//!
//! The codec never inspects a board directly. Everything it needs (ordered
//! legal moves, move application, terminal detection, movetext rendering and
//! token lookup during replay) goes through `RulesProvider`, so encoder and
//! decoder are guaranteed to see the same move ordering for the same state.

use crate::errors::CodecResult;

/// Human-readable identity of one legal move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveLabel {
    pub origin: String,
    pub destination: String,
    pub promotion: Option<char>,
    /// Standard algebraic notation without check or mate suffix.
    pub notation: String,
}

impl MoveLabel {
    /// Origin, destination and promotion concatenated (for example `e7e8q`).
    pub fn coordinate(&self) -> String {
        let mut out = String::with_capacity(5);
        out.push_str(&self.origin);
        out.push_str(&self.destination);
        if let Some(promotion) = self.promotion {
            out.push(promotion);
        }
        out
    }

    /// True when `token` names this move in SAN or coordinate form.
    pub fn matches_token(&self, token: &str) -> bool {
        let token = trim_annotation_suffix(token);
        token == self.notation || token == self.coordinate()
    }
}

/// Game rules the codec plays by.
///
/// A position may offer any number of legal moves, but at most the first 256
/// are ever addressable (see `codec::codeword::MAX_CODEWORD_WIDTH`).
pub trait RulesProvider {
    type State: Clone;
    type Move: Clone;

    fn initial_state(&self) -> Self::State;

    /// Legal moves in a deterministic, provider-defined order.
    fn legal_moves(&self, state: &Self::State) -> Vec<Self::Move>;

    /// Pure transition: the input state is left untouched.
    fn apply(&self, state: &Self::State, mv: &Self::Move) -> CodecResult<Self::State>;

    fn label(&self, state: &Self::State, mv: &Self::Move) -> MoveLabel;

    /// Numbered movetext for `history` played from the initial state, without
    /// a result token.
    fn render_movetext(&self, history: &[Self::Move]) -> CodecResult<String>;

    /// Result token (`1-0`, `0-1`, `1/2-1/2`) when the game is decided on the
    /// board, `None` otherwise.
    fn outcome(&self, state: &Self::State) -> Option<&'static str>;

    fn is_terminal_or_forced(&self, state: &Self::State) -> bool {
        self.legal_moves(state).len() <= 1
    }

    /// Rank of the move in `moves` that `token` names, if any.
    fn find_rank(&self, state: &Self::State, moves: &[Self::Move], token: &str) -> Option<usize> {
        moves
            .iter()
            .position(|mv| self.label(state, mv).matches_token(token))
    }
}

/// Strips check, mate and annotation glyphs (`+`, `#`, `!`, `?`).
pub fn trim_annotation_suffix(token: &str) -> &str {
    token.trim_end_matches(|c: char| matches!(c, '+' | '#' | '!' | '?'))
}
