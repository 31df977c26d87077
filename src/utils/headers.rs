//! Cosmetic PGN header generation.
//!
//! Headers carry no payload bits; the decoder skips them. They exist so each
//! game in the artifact looks like an ordinary archived game. Generation is
//! behind `HeaderGenerator` so tests and benches can run without randomness.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub const HIDDEN_VALUE: &str = "Hidden";

const EVENTS: &[&str] = &[
    "Friendly Match",
    "Tournament",
    "Casual Game",
    "Championship",
    "Club Championship",
    "Simultaneous Exhibition",
    "Charity Match",
    "Blitz Tournament",
    "Rapid Championship",
    "Online Invitational",
];

const SITES: &[&str] = &[
    "Local Club",
    "Online",
    "City Park",
    "University Hall",
    "Community Center",
    "Chess Cafe",
    "Mountain Retreat",
    "Coastal Town",
    "National Stadium",
    "Historical Landmark",
];

const OPENINGS: &[&str] = &[
    "Sicilian Defense",
    "French Defense",
    "Caro-Kann",
    "Ruy Lopez",
    "Italian Game",
    "English Opening",
    "King's Indian Defense",
    "Queen's Gambit",
    "Nimzo-Indian Defense",
    "Pirc Defense",
    "Grünfeld Defense",
];

const VARIATIONS: &[&str] = &[
    "Main Line",
    "Alternative Line",
    "Quiet Move",
    "Aggressive Line",
    "Theoretical Novelty",
];

const TIME_CONTROLS: &[&str] = &["3+2", "5+0", "10+0", "15+10", "30+0", "60+0", "90+30"];

const RESULTS: &[&str] = &["1-0", "0-1", "1/2-1/2", "*"];

/// Supplies the header block for each game the encoder closes.
pub trait HeaderGenerator: Send + Sync {
    fn headers(&self, game_index: usize) -> BTreeMap<String, String>;
}

/// Writes no headers at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHeaders;

impl HeaderGenerator for NoHeaders {
    fn headers(&self, _game_index: usize) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// Same header block for every game.
#[derive(Debug, Clone, Default)]
pub struct FixedHeaders {
    headers: BTreeMap<String, String>,
}

impl FixedHeaders {
    pub fn new<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            headers: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl HeaderGenerator for FixedHeaders {
    fn headers(&self, _game_index: usize) -> BTreeMap<String, String> {
        self.headers.clone()
    }
}

/// Plausible tournament-style headers with a random subset marked hidden.
///
/// With a seed, game `i` always gets the same headers; without one, the
/// thread-local generator is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomHeaders {
    seed: Option<u64>,
}

impl RandomHeaders {
    pub fn from_entropy() -> Self {
        Self { seed: None }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl HeaderGenerator for RandomHeaders {
    fn headers(&self, game_index: usize) -> BTreeMap<String, String> {
        match self.seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(game_index as u64));
                random_headers(&mut rng)
            }
            None => random_headers(&mut rand::rng()),
        }
    }
}

pub fn random_headers<R: Rng + ?Sized>(rng: &mut R) -> BTreeMap<String, String> {
    let white_elo: u32 = rng.random_range(200..=3000);
    let lower = white_elo * 9 / 10;
    let upper = white_elo * 11 / 10;
    let black_elo: u32 = rng.random_range(lower..=upper);

    let mut headers = BTreeMap::<String, String>::new();
    let mut put = |key: &str, value: String| {
        headers.insert(key.to_owned(), value);
    };

    put("Event", pick(rng, EVENTS));
    put("Site", pick(rng, SITES));
    put("Date", random_date(rng));
    put("Round", rng.random_range(1..=15u32).to_string());
    put("White", random_player_id(rng));
    put("Black", random_player_id(rng));
    put("ExpectedOpening", pick(rng, OPENINGS));
    put("WhiteElo", white_elo.to_string());
    put("BlackElo", black_elo.to_string());
    put("Result", pick(rng, RESULTS));
    put("Annotator", random_player_id(rng));
    put("Variation", pick(rng, VARIATIONS));
    put("EventDate", random_date(rng));
    put("TimeControl", pick(rng, TIME_CONTROLS));

    let mut keys: Vec<String> = headers.keys().cloned().collect();
    keys.shuffle(rng);
    let hidden = rng.random_range(1..=keys.len() / 2);
    for key in keys.into_iter().take(hidden) {
        headers.insert(key, HIDDEN_VALUE.to_owned());
    }

    headers
}

fn pick<R: Rng + ?Sized>(rng: &mut R, options: &[&str]) -> String {
    options.choose(rng).copied().unwrap_or("?").to_owned()
}

fn random_player_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.random_range(100_000..1_000_000u32).to_string()
}

/// A real calendar date between 1990 and 2023 in PGN `YYYY.MM.DD` form.
fn random_date<R: Rng + ?Sized>(rng: &mut R) -> String {
    let year = rng.random_range(1990..=2023);
    let month = rng.random_range(1..=12);
    let day = rng.random_range(1..=31);
    NaiveDate::from_ymd_opt(year, month, day)
        .or_else(|| NaiveDate::from_ymd_opt(year, month, 28))
        .map(|date| date.format("%Y.%m.%d").to_string())
        .unwrap_or_else(|| "????.??.??".to_owned())
}
