use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use notice_rewriter::{
    forward_reader, DecodeFailure, ErrorDetailCapture, ForwardError, NoticeConsoleRewriter,
    RewriterConfig,
};
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Parser)]
#[command(name = "notice-console")]
#[command(about = "Rewrite a JSON notice stream as human-readable console lines")]
struct Cli {
    /// Read notices from this file instead of stdin.
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Write rewritten lines to stdout instead of stderr.
    #[arg(long)]
    stdout: bool,

    /// Drop whitespace-only lines instead of printing blank fields.
    #[arg(long)]
    skip_blank: bool,

    /// Log the full decoder message for each malformed notice.
    #[arg(long)]
    full_error_details: bool,
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("failed to open {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Forward(#[from] ForwardError),
    #[error("failed to flush output: {0}")]
    Flush(io::Error),
}

fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    init_tracing();

    let config = rewriter_config(&cli);
    if cli.stdout {
        run(&cli, io::stdout(), config)
    } else {
        run(&cli, io::stderr(), config)
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn rewriter_config(cli: &Cli) -> RewriterConfig {
    let mut config = RewriterConfig {
        skip_blank_lines: cli.skip_blank,
        ..RewriterConfig::default()
    };
    if cli.full_error_details {
        config.error_detail_capture = ErrorDetailCapture::FullDetails;
        config.error_sink = Some(Box::new(|failure: DecodeFailure| {
            warn!(
                line_number = failure.line_number,
                code = ?failure.code,
                details = %failure.details,
                "malformed notice"
            );
        }));
    }
    config
}

fn run<W: Write>(cli: &Cli, sink: W, config: RewriterConfig) -> Result<(), Error> {
    let rewriter = NoticeConsoleRewriter::with_config(sink, config);
    match &cli.input {
        Some(path) => {
            let file = File::open(path).map_err(|source| Error::Open {
                path: path.clone(),
                source,
            })?;
            forward_reader(file, &rewriter)?;
        }
        None => {
            forward_reader(io::stdin().lock(), &rewriter)?;
        }
    }
    rewriter.into_inner().flush().map_err(Error::Flush)
}
