//! Crate root for the PGN steganography codec.
//!
//! Hides arbitrary bytes in sequences of legal chess games and recovers them.
//! The codec (bit cursor, codewords, encoder, decoder) sits on top of a
//! `RulesProvider`; PGN reading/writing, cosmetic headers and the conversion
//! log live in `utils`.

pub mod errors;

pub mod rules {
    pub mod rules_provider;
    pub mod shakmaty_rules;
}

pub mod codec {
    pub mod bit_cursor;
    pub mod codeword;
    pub mod decoder;
    pub mod encoder;
}

pub mod utils {
    pub mod conversion_log;
    pub mod headers;
    pub mod pgn;
}
