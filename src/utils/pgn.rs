//! PGN read/write for the encoded artifact.
//!
//! The artifact is a plain concatenation of PGN games separated by blank
//! lines. Writing renders a header block and numbered movetext per game;
//! reading splits the text back into games and reduces each movetext to the
//! bare move tokens the decoder replays.

use std::collections::BTreeMap;

use crate::errors::{CodecError, CodecResult};

/// One finished game as it appears in the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub headers: BTreeMap<String, String>,
    /// Numbered movetext without the result token.
    pub movetext: String,
    pub result: String,
    pub plies: usize,
}

impl GameRecord {
    pub fn to_pgn(&self) -> String {
        let mut out = String::new();

        if !self.headers.is_empty() {
            for (key, value) in &self.headers {
                out.push_str(&format!("[{} \"{}\"]\n", key, escape_pgn_value(value)));
            }
            out.push('\n');
        }

        out.push_str(&self.movetext);
        if !self.movetext.is_empty() {
            out.push(' ');
        }
        out.push_str(normalize_result(&self.result));
        out.push('\n');
        out
    }
}

/// Renders all records separated by a single blank line.
pub fn write_artifact(records: &[GameRecord]) -> String {
    records
        .iter()
        .map(GameRecord::to_pgn)
        .collect::<Vec<_>>()
        .join("\n")
}

/// A game read back from an artifact, reduced to replayable tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedGame {
    pub headers: BTreeMap<String, String>,
    pub tokens: Vec<String>,
    pub result: Option<String>,
}

#[derive(Default)]
struct PendingGame {
    headers: BTreeMap<String, String>,
    movetext_lines: Vec<String>,
}

/// Splits an artifact into games. Games without any move token are dropped.
pub fn read_artifact(text: &str) -> CodecResult<Vec<ParsedGame>> {
    let mut games = Vec::<ParsedGame>::new();
    let mut pending = PendingGame::default();

    for (line_no, line) in text.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if !pending.movetext_lines.is_empty() {
                finish_game(std::mem::take(&mut pending), &mut games)?;
            }
            continue;
        }

        if trimmed.starts_with('%') {
            continue;
        }

        if trimmed.starts_with('[') {
            if !pending.movetext_lines.is_empty() {
                finish_game(std::mem::take(&mut pending), &mut games)?;
            }
            let (key, value) = parse_header_line(trimmed).map_err(|msg| {
                CodecError::MalformedArtifact(format!("line {}: {msg}", line_no + 1))
            })?;
            pending.headers.insert(key, value);
            continue;
        }

        pending.movetext_lines.push(trimmed.to_owned());
    }

    if !pending.movetext_lines.is_empty() {
        finish_game(pending, &mut games)?;
    }

    Ok(games)
}

/// Move tokens of a single movetext block, in play order.
pub fn tokenize_movetext(movetext: &str) -> CodecResult<(Vec<String>, Option<String>)> {
    let cleaned = strip_pgn_comments_and_variations(movetext)?;
    let mut tokens = Vec::<String>::new();
    let mut result = None;

    for token in cleaned.split_whitespace() {
        if is_result_token(token) {
            result = Some(token.to_owned());
            continue;
        }
        if token.starts_with('$') {
            continue;
        }

        let mv = strip_move_number(token);
        if mv.is_empty() {
            continue;
        }
        tokens.push(mv.to_owned());
    }

    Ok((tokens, result))
}

fn finish_game(pending: PendingGame, games: &mut Vec<ParsedGame>) -> CodecResult<()> {
    let (tokens, result) = tokenize_movetext(&pending.movetext_lines.join("\n"))?;
    if tokens.is_empty() {
        return Ok(());
    }

    let result = result.or_else(|| pending.headers.get("Result").cloned());
    games.push(ParsedGame {
        headers: pending.headers,
        tokens,
        result,
    });
    Ok(())
}

fn parse_header_line(line: &str) -> Result<(String, String), String> {
    if !line.starts_with('[') || !line.ends_with(']') || line.len() < 2 {
        return Err(format!("invalid header line: {line}"));
    }
    let inner = &line[1..line.len() - 1];
    let mut parts = inner.splitn(2, ' ');
    let key = parts.next().unwrap_or_default().trim();
    if key.is_empty() {
        return Err(format!("invalid header key: {line}"));
    }
    let value_raw = parts
        .next()
        .ok_or_else(|| format!("invalid header value: {line}"))?
        .trim();

    if !value_raw.starts_with('"') || !value_raw.ends_with('"') || value_raw.len() < 2 {
        return Err(format!("invalid quoted header value: {line}"));
    }
    Ok((key.to_owned(), unescape_pgn_value(&value_raw[1..value_raw.len() - 1])))
}

fn strip_pgn_comments_and_variations(text: &str) -> CodecResult<String> {
    let mut out = String::with_capacity(text.len());
    let mut in_comment = false;
    let mut in_line_comment = false;
    let mut paren_depth = 0usize;

    for ch in text.chars() {
        match ch {
            '\n' if in_line_comment => {
                in_line_comment = false;
                out.push(' ');
            }
            _ if in_line_comment => {}
            '{' if !in_comment => in_comment = true,
            '}' if in_comment => {
                in_comment = false;
                out.push(' ');
            }
            '}' => {
                return Err(CodecError::MalformedArtifact(
                    "unmatched '}' in movetext".to_owned(),
                ))
            }
            _ if in_comment => {}
            ';' => in_line_comment = true,
            '(' => paren_depth += 1,
            ')' if paren_depth > 0 => {
                paren_depth -= 1;
                out.push(' ');
            }
            ')' => {
                return Err(CodecError::MalformedArtifact(
                    "unmatched ')' in movetext".to_owned(),
                ))
            }
            _ if paren_depth == 0 => out.push(ch),
            _ => {}
        }
    }

    if in_comment {
        return Err(CodecError::MalformedArtifact(
            "unterminated '{' comment in movetext".to_owned(),
        ));
    }
    if paren_depth > 0 {
        return Err(CodecError::MalformedArtifact(
            "unterminated '(' variation in movetext".to_owned(),
        ));
    }

    Ok(out)
}

/// Drops a leading move number (`12.`, `12...`, `12.e4` -> `e4`).
fn strip_move_number(token: &str) -> &str {
    let digits = token.len() - token.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return token;
    }
    let rest = &token[digits..];
    if rest.starts_with('.') {
        rest.trim_start_matches('.')
    } else {
        token
    }
}

fn is_result_token(token: &str) -> bool {
    matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*")
}

pub(crate) fn normalize_result(result: &str) -> &str {
    if is_result_token(result) {
        result
    } else {
        "*"
    }
}

fn escape_pgn_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn unescape_pgn_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(escaped @ ('\\' | '"')) => out.push(escaped),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{read_artifact, tokenize_movetext, write_artifact, GameRecord};
    use crate::errors::CodecError;

    fn record(event: &str, movetext: &str, result: &str, plies: usize) -> GameRecord {
        let mut headers = BTreeMap::new();
        headers.insert("Event".to_owned(), event.to_owned());
        headers.insert("Result".to_owned(), result.to_owned());
        GameRecord {
            headers,
            movetext: movetext.to_owned(),
            result: result.to_owned(),
            plies,
        }
    }

    #[test]
    fn written_artifact_reads_back_per_game_tokens() {
        let records = vec![
            record("Casual Game", "1. f3 e5 2. g4 Qh4#", "0-1", 4),
            record("Say \"hi\"", "1. e4 e5 2. Nf3", "*", 3),
        ];
        let text = write_artifact(&records);
        let games = read_artifact(&text).expect("artifact should parse");

        assert_eq!(games.len(), 2);
        assert_eq!(games[0].tokens, vec!["f3", "e5", "g4", "Qh4#"]);
        assert_eq!(games[0].result.as_deref(), Some("0-1"));
        assert_eq!(games[1].tokens.len(), records[1].plies);
        assert_eq!(games[1].headers["Event"], "Say \"hi\"");
    }

    #[test]
    fn headerless_records_are_separated_by_blank_lines() {
        let records = vec![
            GameRecord {
                headers: BTreeMap::new(),
                movetext: "1. d4".to_owned(),
                result: "*".to_owned(),
                plies: 1,
            },
            GameRecord {
                headers: BTreeMap::new(),
                movetext: "1. c4 c5".to_owned(),
                result: "*".to_owned(),
                plies: 2,
            },
        ];
        let text = write_artifact(&records);
        assert_eq!(text, "1. d4 *\n\n1. c4 c5 *\n");
        let games = read_artifact(&text).expect("artifact should parse");
        assert_eq!(games.len(), 2);
        assert_eq!(games[1].tokens, vec!["c4", "c5"]);
    }

    #[test]
    fn tokenizer_strips_numbers_comments_variations_and_nags() {
        let (tokens, result) = tokenize_movetext(
            "1.e4 {best by test} e5 2. Nf3 (2. f4 exf4) 2... Nc6 $1 3.Bb5 a6 ; rest\n1/2-1/2",
        )
        .expect("movetext should tokenize");
        assert_eq!(tokens, vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"]);
        assert_eq!(result.as_deref(), Some("1/2-1/2"));
    }

    #[test]
    fn semicolon_inside_brace_comment_is_plain_text() {
        let games = read_artifact("1. e4 {good; very good} e5 *\n").expect("should parse");
        assert_eq!(games[0].tokens, vec!["e4", "e5"]);
        assert_eq!(games[0].result.as_deref(), Some("*"));

        let (tokens, _) = tokenize_movetext("1. d4 ; see {later\n1... d5 2. c4 *")
            .expect("brace after ';' is part of the line comment");
        assert_eq!(tokens, vec!["d4", "d5", "c4"]);
    }

    #[test]
    fn header_values_with_backslashes_read_back_unchanged() {
        let mut headers = BTreeMap::new();
        headers.insert("Annotator".to_owned(), "C:\\games\\".to_owned());
        headers.insert("Event".to_owned(), "Say \\\"hi\\\"".to_owned());
        let record = GameRecord {
            headers: headers.clone(),
            movetext: "1. e4".to_owned(),
            result: "*".to_owned(),
            plies: 1,
        };
        let games = read_artifact(&record.to_pgn()).expect("should parse");
        assert_eq!(games[0].headers, headers);
    }

    #[test]
    fn rest_of_line_comments_are_dropped_when_reading() {
        let games = read_artifact("1. e4 e5 ; opening\n2. Nf3 *\n").expect("should parse");
        assert_eq!(games[0].tokens, vec!["e4", "e5", "Nf3"]);
    }

    #[test]
    fn header_block_separated_from_movetext_stays_one_game() {
        let text = "[Event \"A\"]\n[Site \"B\"]\n\n1. e4 *\n\n[Event \"C\"]\n\n1. d4 d5 *\n";
        let games = read_artifact(text).expect("should parse");
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].headers.len(), 2);
        assert_eq!(games[1].headers["Event"], "C");
        assert_eq!(games[1].tokens, vec!["d4", "d5"]);
    }

    #[test]
    fn games_without_moves_are_dropped() {
        let games = read_artifact("[Event \"Empty\"]\n\n*\n\n1. e4 *\n").expect("should parse");
        assert_eq!(games.len(), 1);
        assert!(read_artifact("").expect("empty parses").is_empty());
    }

    #[test]
    fn malformed_header_and_comment_are_rejected() {
        assert!(matches!(
            read_artifact("[Event Casual]\n\n1. e4 *\n"),
            Err(CodecError::MalformedArtifact(_))
        ));
        assert!(matches!(
            read_artifact("1. e4 { never closed e5 *\n"),
            Err(CodecError::MalformedArtifact(_))
        ));
        assert!(matches!(
            read_artifact("1. e4 ) e5 *\n"),
            Err(CodecError::MalformedArtifact(_))
        ));
    }
}
