mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ctxdoc_core::{CompileError, CompilerConfig, Policy};

use commands::{cmd_compile, cmd_index, cmd_lookup};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// ConTeXt interface compiler.
#[derive(Parser)]
#[command(name = "ctxdoc", version, about = "ConTeXt interface compiler")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Corpus selection shared by every subcommand.
#[derive(Args)]
pub(crate) struct CorpusArgs {
    /// Root directory of the XML interface corpus
    root: PathBuf,
    /// Abort on the first error instead of skipping the offending file or command
    #[arg(long)]
    strict: bool,
    /// Also load third-party module interface files
    #[arg(long)]
    modules: bool,
    /// Keep every documented variant (skip simplification)
    #[arg(long)]
    no_simplify: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a corpus into a sharded database directory
    Compile {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// Output directory for the index and shards
        #[arg(long)]
        out: PathBuf,
        /// Cumulative serialized size (bytes) at which a shard is flushed
        #[arg(long)]
        shard_size: Option<usize>,
    },

    /// Show the syntax variants of one command
    Lookup {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// Command name, without the leading backslash
        name: String,
    },

    /// Print the "<max_arg_count>:<name>" index
    Index {
        #[command(flatten)]
        corpus: CorpusArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    let result = match &cli.command {
        Commands::Compile {
            corpus,
            out,
            shard_size,
        } => load_config(cli.config.as_ref(), corpus)
            .and_then(|config| cmd_compile(&corpus.root, &config, out, *shard_size, cli.quiet)),
        Commands::Lookup { corpus, name } => load_config(cli.config.as_ref(), corpus)
            .and_then(|config| cmd_lookup(&corpus.root, &config, name, cli.output)),
        Commands::Index { corpus } => load_config(cli.config.as_ref(), corpus)
            .and_then(|config| cmd_index(&corpus.root, &config, cli.output)),
    };

    if let Err(e) = result {
        report_error(&e, cli.output, cli.quiet);
        process::exit(1);
    }
}

/// Configuration file values, overridden by command-line flags.
fn load_config(path: Option<&PathBuf>, corpus: &CorpusArgs) -> anyhow::Result<CompilerConfig> {
    let mut config = match path {
        Some(path) => CompilerConfig::load_from_path(path).map_err(anyhow::Error::msg)?,
        None => CompilerConfig::default(),
    };
    if corpus.strict {
        config.policy = Policy::Strict;
    }
    if corpus.modules {
        config.include_modules = true;
    }
    if corpus.no_simplify {
        config.simplify = false;
    }
    Ok(config)
}

/// Print an error to stderr. In JSON mode a compilation error keeps its
/// `kind` and `file` fields next to the full message.
pub(crate) fn report_error(err: &anyhow::Error, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    let msg = format!("{:#}", err);
    match output {
        OutputFormat::Text => eprintln!("error: {}", msg),
        OutputFormat::Json => {
            let mut value = match err.downcast_ref::<CompileError>() {
                Some(compile_err) => compile_err.to_json_value(),
                None => serde_json::json!({}),
            };
            value["error"] = serde_json::Value::String(msg);
            eprintln!("{}", value);
        }
    }
}
