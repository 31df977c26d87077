use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use pgn_stego::codec::decoder::{Decoder, DecoderConfig, UnmatchedTokenPolicy};
use pgn_stego::codec::encoder::{Encoder, EncoderConfig};
use pgn_stego::errors::CodecError;
use pgn_stego::utils::conversion_log::{ConversionLog, ConversionMode, TracingConversionLog};
use pgn_stego::utils::headers::{NoHeaders, RandomHeaders};

/// Hide a file inside chess games, or get it back out.
#[derive(Parser)]
#[command(name = "pgn_stego", version)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn any file into a PGN file of legal games
    Encode {
        input: PathBuf,
        /// Defaults to INPUT with `.pgn` appended
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Seed for the cosmetic game headers
        #[arg(long, conflicts_with = "no_headers")]
        seed: Option<u64>,
        /// Write bare movetext without header blocks
        #[arg(long)]
        no_headers: bool,
        /// Close each game after at most this many plies
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        max_plies: Option<u64>,
    },
    /// Recover the original file from a PGN produced by `encode`
    Decode {
        input: PathBuf,
        /// Defaults to INPUT without `.pgn`, or with `.bin` appended
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Drop moves that cannot be matched instead of failing
        #[arg(long)]
        skip_unmatched: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let log = TracingConversionLog::new();

    match cli.command {
        Commands::Encode {
            input,
            output,
            seed,
            no_headers,
            max_plies,
        } => {
            let payload =
                fs::read(&input).with_context(|| format!("failed reading {}", input.display()))?;
            let id = log.record_conversion(&file_name(&input), ConversionMode::Encode);

            let config = EncoderConfig {
                max_plies_per_game: max_plies.map(|n| n as usize),
                ..EncoderConfig::default()
            };
            let encoder = Encoder::new().with_config(config);
            let encoder = match (no_headers, seed) {
                (true, _) => encoder.with_headers(NoHeaders),
                (false, Some(seed)) => encoder.with_headers(RandomHeaders::seeded(seed)),
                (false, None) => encoder,
            };

            let artifact = encoder
                .encode_with_progress(&payload, &mut progress_logger("encode"))
                .context("encoding failed")?;

            let output = output.unwrap_or_else(|| with_suffix(&input, ".pgn"));
            fs::write(&output, artifact)
                .with_context(|| format!("failed writing {}", output.display()))?;
            log.record_download(id)?;
            tracing::info!(output = %output.display(), "wrote artifact");
        }
        Commands::Decode {
            input,
            output,
            skip_unmatched,
        } => {
            let bytes =
                fs::read(&input).with_context(|| format!("failed reading {}", input.display()))?;
            let artifact = String::from_utf8(bytes)
                .map_err(|e| CodecError::MalformedArtifact(format!("not UTF-8 text: {e}")))?;
            let id = log.record_conversion(&file_name(&input), ConversionMode::Decode);

            let decoder = Decoder::new().with_config(DecoderConfig {
                unmatched_tokens: if skip_unmatched {
                    UnmatchedTokenPolicy::Skip
                } else {
                    UnmatchedTokenPolicy::Abort
                },
                ..DecoderConfig::default()
            });
            let report = decoder
                .decode_with_report(&artifact, &mut progress_logger("decode"))
                .context("decoding failed")?;
            if !report.is_lossless() {
                tracing::warn!(
                    skipped = report.skipped.len(),
                    "some moves were skipped; output is incomplete"
                );
            }

            let output = output.unwrap_or_else(|| decoded_output_path(&input));
            fs::write(&output, &report.payload)
                .with_context(|| format!("failed writing {}", output.display()))?;
            log.record_download(id)?;
            tracing::info!(output = %output.display(), bytes = report.payload.len(), "wrote payload");
        }
    }

    Ok(())
}

/// Logs progress at every 10% step.
fn progress_logger(operation: &'static str) -> impl FnMut(f64) {
    let mut next_step = 0.0;
    move |percent| {
        if percent >= next_step {
            tracing::info!(operation, percent = percent.round() as u64, "progress");
            next_step = (percent / 10.0).floor() * 10.0 + 10.0;
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn decoded_output_path(input: &Path) -> PathBuf {
    match input.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("pgn") => input.with_extension(""),
        _ => with_suffix(input, ".bin"),
    }
}
