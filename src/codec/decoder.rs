//! Artifact to payload: replays each game and turns move ranks back into bits.
//!
//! Every token except the very last one of the artifact contributes
//! `floor(log2 n)` bits. The last one contributes only what is needed to
//! finish the byte in progress, mirroring the encoder's clamp on its final
//! codeword.

use std::thread;

use tracing::{debug, info, warn};

use crate::codec::bit_cursor::BitAccumulator;
use crate::codec::codeword::{codeword_width, Codeword};
use crate::errors::{CodecError, CodecResult};
use crate::rules::rules_provider::RulesProvider;
use crate::rules::shakmaty_rules::StandardChess;
use crate::utils::pgn::{read_artifact, ParsedGame};

/// What to do with a token that does not name a selectable legal move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnmatchedTokenPolicy {
    /// Fail the whole decode with `CodecError::UnmatchedMoveToken`.
    #[default]
    Abort,
    /// Record the token in the `DecodeReport` and keep going. The bits that
    /// token carried are lost.
    Skip,
}

#[derive(Debug, Clone)]
pub struct DecoderConfig {
    pub unmatched_tokens: UnmatchedTokenPolicy,
    /// Yield the thread after this many games; `0` disables.
    pub yield_every_games: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            unmatched_tokens: UnmatchedTokenPolicy::Abort,
            yield_every_games: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedToken {
    pub game: usize,
    pub ply: usize,
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    pub payload: Vec<u8>,
    pub skipped: Vec<SkippedToken>,
}

impl DecodeReport {
    /// True when every token contributed its bits.
    pub fn is_lossless(&self) -> bool {
        self.skipped.is_empty()
    }
}

pub struct Decoder<P: RulesProvider = StandardChess> {
    rules: P,
    config: DecoderConfig,
}

impl Default for Decoder<StandardChess> {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder<StandardChess> {
    pub fn new() -> Self {
        Self::with_rules(StandardChess)
    }
}

impl<P: RulesProvider> Decoder<P> {
    pub fn with_rules(rules: P) -> Self {
        Self {
            rules,
            config: DecoderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DecoderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn decode(&self, artifact: &str) -> CodecResult<Vec<u8>> {
        self.decode_with_progress(artifact, &mut |_| {})
    }

    pub fn decode_with_progress(
        &self,
        artifact: &str,
        on_progress: &mut dyn FnMut(f64),
    ) -> CodecResult<Vec<u8>> {
        Ok(self.decode_with_report(artifact, on_progress)?.payload)
    }

    /// Decodes and lists every token that was skipped under
    /// `UnmatchedTokenPolicy::Skip`.
    pub fn decode_with_report(
        &self,
        artifact: &str,
        on_progress: &mut dyn FnMut(f64),
    ) -> CodecResult<DecodeReport> {
        let games = read_artifact(artifact)?;
        let mut acc = BitAccumulator::new();
        let mut skipped = Vec::<SkippedToken>::new();

        for (game_index, game) in games.iter().enumerate() {
            let is_last_game = game_index + 1 == games.len();
            self.replay_game(game_index, game, is_last_game, &mut acc, &mut skipped)?;

            on_progress(((game_index + 1) as f64 / games.len() as f64 * 100.0).min(100.0));

            let yield_every = self.config.yield_every_games;
            if yield_every > 0 && (game_index + 1) % yield_every == 0 {
                thread::yield_now();
            }
        }
        on_progress(100.0);

        info!(
            games = games.len(),
            bits = acc.accumulated_bits(),
            bytes = acc.bytes().len(),
            skipped = skipped.len(),
            "decoded artifact"
        );

        Ok(DecodeReport {
            payload: acc.into_bytes(),
            skipped,
        })
    }

    fn replay_game(
        &self,
        game_index: usize,
        game: &ParsedGame,
        is_last_game: bool,
        acc: &mut BitAccumulator,
        skipped: &mut Vec<SkippedToken>,
    ) -> CodecResult<()> {
        let mut state = self.rules.initial_state();

        for (ply, token) in game.tokens.iter().enumerate() {
            let moves = self.rules.legal_moves(&state);
            let Some(rank) = self.rules.find_rank(&state, &moves, token) else {
                self.unmatched(game_index, ply, token, skipped)?;
                continue;
            };

            let width = codeword_width(moves.len());
            let is_final_token = is_last_game && ply + 1 == game.tokens.len();
            let bits = if is_final_token {
                width.min(acc.bits_to_byte_boundary())
            } else {
                width
            };

            match Codeword::for_rank(rank, bits) {
                Some(codeword) => acc.push(codeword.rank, codeword.width),
                // Legal, but not a move the encoder could have chosen here.
                None => self.unmatched(game_index, ply, token, skipped)?,
            }

            state = self.rules.apply(&state, &moves[rank])?;
        }

        debug!(game = game_index, plies = game.tokens.len(), "replayed game");
        Ok(())
    }

    fn unmatched(
        &self,
        game: usize,
        ply: usize,
        token: &str,
        skipped: &mut Vec<SkippedToken>,
    ) -> CodecResult<()> {
        match self.config.unmatched_tokens {
            UnmatchedTokenPolicy::Abort => Err(CodecError::UnmatchedMoveToken {
                game,
                ply,
                token: token.to_owned(),
            }),
            UnmatchedTokenPolicy::Skip => {
                warn!(game, ply, token, "skipping move token; its bits are lost");
                skipped.push(SkippedToken {
                    game,
                    ply,
                    token: token.to_owned(),
                });
                Ok(())
            }
        }
    }
}

/// Decodes with standard chess, aborting on the first unmatched token.
pub fn decode_artifact(artifact: &str) -> CodecResult<Vec<u8>> {
    Decoder::new().decode(artifact)
}
