//! Payload to artifact: plays one legal move per codeword.
//!
//! At each position the encoder reads `floor(log2 n)` payload bits (fewer for
//! the final codeword) and plays the move whose rank equals their value. A
//! game is closed when the next position has at most one legal move, when the
//! payload runs out, or when the optional per-game ply cap is reached.

use std::thread;

use tracing::{debug, info};

use crate::codec::bit_cursor::BitCursor;
use crate::codec::codeword::{codeword_width, Codeword};
use crate::errors::{CodecError, CodecResult};
use crate::rules::rules_provider::RulesProvider;
use crate::rules::shakmaty_rules::StandardChess;
use crate::utils::headers::{HeaderGenerator, RandomHeaders};
use crate::utils::pgn::{normalize_result, write_artifact, GameRecord};

#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Close a game after this many plies even if it could continue.
    /// The decoder does not need to know the cap.
    pub max_plies_per_game: Option<usize>,
    /// Yield the thread after roughly this many payload bits; `0` disables.
    pub yield_every_bits: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            max_plies_per_game: None,
            yield_every_bits: 1000,
        }
    }
}

pub struct Encoder<P: RulesProvider = StandardChess> {
    rules: P,
    header_generator: Box<dyn HeaderGenerator>,
    config: EncoderConfig,
}

impl Default for Encoder<StandardChess> {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<StandardChess> {
    /// Standard chess with random cosmetic headers.
    pub fn new() -> Self {
        Self::with_rules(StandardChess)
    }
}

impl<P: RulesProvider> Encoder<P> {
    pub fn with_rules(rules: P) -> Self {
        Self {
            rules,
            header_generator: Box::new(RandomHeaders::from_entropy()),
            config: EncoderConfig::default(),
        }
    }

    pub fn with_headers<H: HeaderGenerator + 'static>(mut self, generator: H) -> Self {
        self.header_generator = Box::new(generator);
        self
    }

    pub fn with_config(mut self, config: EncoderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn encode(&self, payload: &[u8]) -> CodecResult<String> {
        self.encode_with_progress(payload, &mut |_| {})
    }

    /// Like `encode`, reporting percent complete after every move.
    pub fn encode_with_progress(
        &self,
        payload: &[u8],
        on_progress: &mut dyn FnMut(f64),
    ) -> CodecResult<String> {
        let records = self.encode_records(payload, on_progress)?;
        Ok(write_artifact(&records))
    }

    pub fn encode_records(
        &self,
        payload: &[u8],
        on_progress: &mut dyn FnMut(f64),
    ) -> CodecResult<Vec<GameRecord>> {
        let mut cursor = BitCursor::new(payload);
        let mut records = Vec::<GameRecord>::new();
        let mut state = self.rules.initial_state();
        let mut history = Vec::<P::Move>::new();
        let mut bits_since_yield = 0usize;

        while !cursor.is_exhausted() {
            let moves = self.rules.legal_moves(&state);
            let width = codeword_width(moves.len());
            if width == 0 {
                return Err(CodecError::NoEncodableCapacity {
                    game: records.len(),
                    ply: history.len(),
                    legal_moves: moves.len(),
                });
            }

            let (value, consumed) = cursor.read(width);
            let mv = Codeword::for_rank(value, width)
                .and_then(|codeword| moves.get(codeword.rank))
                .ok_or_else(|| {
                    CodecError::IllegalMove(format!(
                        "rank {value} outside {} legal moves",
                        moves.len()
                    ))
                })?;

            state = self.rules.apply(&state, mv)?;
            history.push(mv.clone());
            on_progress(cursor.progress());

            let capped = self
                .config
                .max_plies_per_game
                .is_some_and(|cap| history.len() >= cap);
            if cursor.is_exhausted() || capped || self.rules.is_terminal_or_forced(&state) {
                records.push(self.close_game(records.len(), &state, &history)?);
                history.clear();
                state = self.rules.initial_state();
            }

            if self.config.yield_every_bits > 0 {
                bits_since_yield += consumed as usize;
                if bits_since_yield >= self.config.yield_every_bits {
                    bits_since_yield = 0;
                    thread::yield_now();
                }
            }
        }

        if payload.is_empty() {
            on_progress(100.0);
        }

        info!(
            bytes = payload.len(),
            games = records.len(),
            plies = records.iter().map(|r| r.plies).sum::<usize>(),
            "encoded payload"
        );
        Ok(records)
    }

    fn close_game(
        &self,
        game_index: usize,
        state: &P::State,
        history: &[P::Move],
    ) -> CodecResult<GameRecord> {
        let mut headers = self.header_generator.headers(game_index);

        let result = match self.rules.outcome(state) {
            Some(outcome) => {
                if !headers.is_empty() {
                    headers.insert("Result".to_owned(), outcome.to_owned());
                }
                outcome.to_owned()
            }
            None => headers
                .get("Result")
                .map(|r| normalize_result(r))
                .unwrap_or("*")
                .to_owned(),
        };

        let movetext = self.rules.render_movetext(history)?;
        debug!(game = game_index, plies = history.len(), %result, "closed game");

        Ok(GameRecord {
            headers,
            movetext,
            result,
            plies: history.len(),
        })
    }
}

/// Encodes with standard chess and random headers.
pub fn encode_bytes(payload: &[u8]) -> CodecResult<String> {
    Encoder::new().encode(payload)
}

#[cfg(test)]
mod tests {
    use super::{Encoder, EncoderConfig};
    use crate::codec::decoder::Decoder;
    use crate::errors::{CodecError, CodecResult};
    use crate::rules::rules_provider::{MoveLabel, RulesProvider};
    use crate::utils::headers::{FixedHeaders, NoHeaders};

    /// A line where ply `i` offers `widths[i]` moves, then nothing.
    #[derive(Clone)]
    struct CorridorRules {
        widths: Vec<usize>,
        /// Reported once the line has at most one move left.
        decided: Option<&'static str>,
    }

    impl RulesProvider for CorridorRules {
        type State = usize;
        type Move = usize;

        fn initial_state(&self) -> usize {
            0
        }

        fn legal_moves(&self, state: &usize) -> Vec<usize> {
            (0..self.widths.get(*state).copied().unwrap_or(0)).collect()
        }

        fn apply(&self, state: &usize, _mv: &usize) -> CodecResult<usize> {
            Ok(state + 1)
        }

        fn label(&self, _state: &usize, mv: &usize) -> MoveLabel {
            MoveLabel {
                origin: String::new(),
                destination: String::new(),
                promotion: None,
                notation: format!("m{mv}"),
            }
        }

        fn render_movetext(&self, history: &[usize]) -> CodecResult<String> {
            Ok(history
                .iter()
                .map(|mv| format!("m{mv}"))
                .collect::<Vec<_>>()
                .join(" "))
        }

        fn outcome(&self, state: &usize) -> Option<&'static str> {
            self.decided.filter(|_| self.legal_moves(state).len() <= 1)
        }
    }

    fn corridor_rules(widths: &[usize]) -> CorridorRules {
        CorridorRules {
            widths: widths.to_vec(),
            decided: None,
        }
    }

    fn corridor(widths: &[usize]) -> Encoder<CorridorRules> {
        Encoder::with_rules(corridor_rules(widths)).with_headers(NoHeaders)
    }

    #[test]
    fn empty_payload_produces_no_games_and_full_progress() {
        let mut progress = Vec::new();
        let records = Encoder::new()
            .with_headers(NoHeaders)
            .encode_records(&[], &mut |p| progress.push(p))
            .expect("empty payload encodes");
        assert!(records.is_empty());
        assert_eq!(progress, vec![100.0]);
    }

    #[test]
    fn start_position_without_capacity_is_a_hard_error() {
        let err = corridor(&[1, 8]).encode(&[0xAB]).expect_err("must fail");
        assert!(matches!(
            err,
            CodecError::NoEncodableCapacity {
                game: 0,
                ply: 0,
                legal_moves: 1
            }
        ));
    }

    #[test]
    fn ranks_follow_payload_bits_and_final_codeword_is_clamped() {
        // Widths 3 bits, 3 bits, then a 4-bit position that only gets 2 bits.
        let records = corridor(&[8, 8, 16, 16])
            .encode_records(&[0b101_011_10], &mut |_| {})
            .expect("payload encodes");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].movetext, "m5 m3 m2");
        assert_eq!(records[0].plies, 3);
    }

    #[test]
    fn forced_position_closes_the_game_and_restarts() {
        // Two 2-bit plies, then a forced position: each game carries 4 bits.
        let records = corridor(&[4, 4, 1])
            .encode_records(&[0b1110_0100], &mut |_| {})
            .expect("payload encodes");
        let movetext: Vec<_> = records.iter().map(|r| r.movetext.as_str()).collect();
        assert_eq!(movetext, vec!["m3 m2", "m1 m0"]);
    }

    #[test]
    fn ply_cap_splits_games() {
        let records = corridor(&[4; 16])
            .with_config(EncoderConfig {
                max_plies_per_game: Some(1),
                yield_every_bits: 0,
            })
            .encode_records(&[0xFF], &mut |_| {})
            .expect("payload encodes");
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.plies == 1 && r.movetext == "m3"));
    }

    #[test]
    fn decided_game_overrides_header_result() {
        let rules = CorridorRules {
            decided: Some("1-0"),
            ..corridor_rules(&[4, 4, 1])
        };
        let records = Encoder::with_rules(rules)
            .with_headers(FixedHeaders::new([("Event", "Casual Game"), ("Result", "*")]))
            .encode_records(&[0b1110_0100], &mut |_| {})
            .expect("payload encodes");

        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.result, "1-0");
            assert_eq!(record.headers["Result"], "1-0");
            assert_eq!(record.headers["Event"], "Casual Game");
            assert!(record.to_pgn().ends_with(" 1-0\n"));
        }
    }

    #[test]
    fn undecided_game_keeps_header_result() {
        let rules = CorridorRules {
            decided: Some("1-0"),
            ..corridor_rules(&[4, 4, 4, 4, 4, 1])
        };
        let records = Encoder::with_rules(rules)
            .with_headers(FixedHeaders::new([("Result", "0-1")]))
            .encode_records(&[0b1110_0000], &mut |_| {})
            .expect("payload encodes");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].result, "0-1");
        assert_eq!(records[0].headers["Result"], "0-1");
    }

    #[test]
    fn wide_move_lists_round_trip_with_capped_width() {
        let rules = corridor_rules(&[1024, 1024]);
        let artifact = Encoder::with_rules(rules.clone())
            .with_headers(NoHeaders)
            .encode(&[0xAB, 0xCD])
            .expect("payload encodes");
        assert_eq!(artifact, "m171 m205 *\n");

        let payload = Decoder::with_rules(rules)
            .decode(&artifact)
            .expect("artifact decodes");
        assert_eq!(payload, vec![0xAB, 0xCD]);
    }

    #[test]
    fn progress_is_monotonic_and_ends_at_100() {
        let mut progress = Vec::new();
        Encoder::new()
            .with_headers(NoHeaders)
            .encode_with_progress(b"progress", &mut |p| progress.push(p))
            .expect("payload encodes");
        assert!(!progress.is_empty());
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(progress.last().copied(), Some(100.0));
    }
}
