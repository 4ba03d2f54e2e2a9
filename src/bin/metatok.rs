//! metatok CLI binary.
//!
//! Token-sequence compression over JSON arrays of token IDs.
//!
//! # Commands
//!
//! - `compress` - Compress a token sequence to the wire stream
//! - `decompress` - Reconstruct the original sequence from a stream
//! - `discover` - List candidate patterns without compressing
//! - `analyze` - Report sequence statistics and projected savings

use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use metatok::{
    compress, decompress, CompressionConfig, CompressionEngine, SelectionMode, Token, VERSION,
};

#[derive(Parser)]
#[command(name = "metatok")]
#[command(version = VERSION)]
#[command(about = "Lossless dictionary compression for LLM token sequences", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a JSON token array to a wire stream
    Compress {
        /// JSON array input (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Selection mode (greedy, optimal, beam, ilp)
        #[arg(short, long)]
        mode: Option<String>,

        /// Show compression statistics on stderr
        #[arg(short, long)]
        stats: bool,
    },

    /// Decompress a wire stream back to the original sequence
    Decompress {
        /// JSON array input (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List candidate patterns without compressing
    Discover {
        /// JSON array input (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Minimum pattern length
        #[arg(long, default_value_t = 2)]
        min: usize,

        /// Maximum pattern length
        #[arg(long, default_value_t = 8)]
        max: usize,

        /// Maximum candidates to print
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Report sequence statistics and projected savings
    Analyze {
        /// JSON array input (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level.clone())),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Compress {
            input,
            file,
            output,
            config,
            mode,
            stats,
        } => cmd_compress(input, file, output, config, mode, stats),

        Commands::Decompress {
            input,
            file,
            output,
            config,
        } => cmd_decompress(input, file, output, config),

        Commands::Discover {
            input,
            file,
            min,
            max,
            limit,
        } => cmd_discover(input, file, min, max, limit),

        Commands::Analyze { input, file } => cmd_analyze(input, file),
    }
}

/// Read a JSON token array from an inline argument, a file, or stdin.
fn read_tokens(input: Option<String>, file: Option<PathBuf>) -> anyhow::Result<Vec<Token>> {
    let raw = if let Some(path) = file {
        std::fs::read_to_string(path)?
    } else {
        match input.as_deref() {
            Some("-") | None => {
                let mut buf = String::new();
                io::stdin().read_to_string(&mut buf)?;
                buf
            }
            Some(inline) => inline.to_string(),
        }
    };

    let tokens: Vec<Token> = serde_json::from_str(raw.trim())?;
    Ok(tokens)
}

fn write_tokens(tokens: &[Token], output: Option<PathBuf>) -> anyhow::Result<()> {
    let json = serde_json::to_string(tokens)?;
    match output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

fn load_config(path: Option<PathBuf>, mode: Option<String>) -> anyhow::Result<CompressionConfig> {
    let mut config = match path {
        Some(path) => CompressionConfig::from_file(path)?,
        None => CompressionConfig::from_env(),
    };
    if let Some(mode) = mode {
        config.selection_mode = SelectionMode::from_str(&mode)?;
    }
    Ok(config)
}

fn cmd_compress(
    input: Option<String>,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
    mode: Option<String>,
    stats: bool,
) -> anyhow::Result<()> {
    let tokens = read_tokens(input, file)?;
    let mut config = load_config(config_path, mode)?;
    if stats {
        config.collect_metrics = true;
    }

    let result = compress(&tokens, &config)?;

    if stats {
        eprintln!(
            "{} -> {} tokens ({:.1}% of original), {} dictionary entries",
            result.original_length,
            result.compressed_length,
            result.ratio() * 100.0,
            result.dictionary.len()
        );
        if let Some(metrics) = &result.metrics {
            eprintln!(
                "passes: {}, candidates: {}, occurrences replaced: {}",
                metrics.passes, metrics.candidates_discovered, metrics.occurrences_replaced
            );
        }
    }

    write_tokens(&result.stream, output)
}

fn cmd_decompress(
    input: Option<String>,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let stream = read_tokens(input, file)?;
    let config = load_config(config_path, None)?;

    let tokens = decompress(&stream, &config)?;
    write_tokens(&tokens, output)
}

fn cmd_discover(
    input: Option<String>,
    file: Option<PathBuf>,
    min: usize,
    max: usize,
    limit: usize,
) -> anyhow::Result<()> {
    let tokens = read_tokens(input, file)?;
    let candidates = CompressionEngine::default().discover(&tokens, min, max)?;

    println!("{} candidates", candidates.len());
    for candidate in candidates.iter().take(limit) {
        println!(
            "len {:>3}  count {:>4}  savings {:>6}  {:?}",
            candidate.length, candidate.count, candidate.raw_savings, candidate.pattern
        );
    }
    Ok(())
}

fn cmd_analyze(input: Option<String>, file: Option<PathBuf>) -> anyhow::Result<()> {
    let tokens = read_tokens(input, file)?;
    let distinct: std::collections::HashSet<&Token> = tokens.iter().collect();

    let defaults = CompressionConfig::default();
    let candidates = CompressionEngine::default().discover(
        &tokens,
        defaults.min_subsequence_length,
        defaults.max_subsequence_length,
    )?;
    let projected: i64 = candidates.iter().map(|c| c.raw_savings.max(0)).sum();

    println!("tokens:             {}", tokens.len());
    println!("distinct tokens:    {}", distinct.len());
    println!("candidates:         {}", candidates.len());
    println!("projected savings:  {projected} tokens (upper bound)");
    Ok(())
}
