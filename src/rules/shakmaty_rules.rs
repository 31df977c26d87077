//! Standard chess rules backed by `shakmaty`.
//!
//! Move order is shakmaty's legal move generation order, which depends only
//! on the position. That is what makes a rank computed while encoding
//! reproducible while decoding.

use shakmaty::san::{San, SanPlus};
use shakmaty::{CastlingMode, Chess, Move, Position};

use crate::errors::{CodecError, CodecResult};
use crate::rules::rules_provider::{MoveLabel, RulesProvider};

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardChess;

impl RulesProvider for StandardChess {
    type State = Chess;
    type Move = Move;

    fn initial_state(&self) -> Chess {
        Chess::default()
    }

    fn legal_moves(&self, state: &Chess) -> Vec<Move> {
        state.legal_moves().into_iter().collect()
    }

    fn apply(&self, state: &Chess, mv: &Move) -> CodecResult<Chess> {
        if !state.is_legal(mv) {
            return Err(CodecError::IllegalMove(mv.to_string()));
        }
        let mut next = state.clone();
        next.play_unchecked(mv);
        Ok(next)
    }

    fn label(&self, state: &Chess, mv: &Move) -> MoveLabel {
        let uci = mv.to_uci(CastlingMode::Standard).to_string();
        MoveLabel {
            origin: uci.get(0..2).unwrap_or_default().to_owned(),
            destination: uci.get(2..4).unwrap_or_default().to_owned(),
            promotion: mv.promotion().map(|role| role.char()),
            notation: San::from_move(state, mv).to_string(),
        }
    }

    fn render_movetext(&self, history: &[Move]) -> CodecResult<String> {
        let mut state = self.initial_state();
        let mut parts = Vec::<String>::with_capacity(history.len() + history.len() / 2);

        for (ply, mv) in history.iter().enumerate() {
            if !state.is_legal(mv) {
                return Err(CodecError::IllegalMove(format!("{mv} at ply {ply}")));
            }
            let san = SanPlus::from_move_and_play_unchecked(&mut state, mv);
            if ply % 2 == 0 {
                parts.push(format!("{}. {}", (ply / 2) + 1, san));
            } else {
                parts.push(san.to_string());
            }
        }

        Ok(parts.join(" "))
    }

    fn outcome(&self, state: &Chess) -> Option<&'static str> {
        if state.is_checkmate() {
            // The side to move is the one that got mated.
            return Some(if state.turn().is_white() { "0-1" } else { "1-0" });
        }
        if state.is_stalemate() {
            return Some("1/2-1/2");
        }
        None
    }

    fn find_rank(&self, state: &Chess, moves: &[Move], token: &str) -> Option<usize> {
        let by_san = token
            .parse::<SanPlus>()
            .ok()
            .and_then(|san_plus| san_plus.san.to_move(state).ok())
            .and_then(|found| moves.iter().position(|mv| *mv == found));

        by_san.or_else(|| {
            moves
                .iter()
                .position(|mv| self.label(state, mv).matches_token(token))
        })
    }
}
