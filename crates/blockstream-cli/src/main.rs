use std::path::PathBuf;

use anyhow::{Context, Result};
use blockstream_cli::Config;
use blockstream_session::{
    encode_event, FragmentSource, ScriptedSource, StreamSession, TranscriptSource, TurnRequest,
};
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Stream markdown as block-structured SSE events.
#[derive(Parser, Debug)]
#[command(name = "blockstream", about = "Stream markdown as block-structured SSE events")]
struct Cli {
    /// Markdown document to replay in fragments.
    #[arg(long, required_unless_present = "transcript", conflicts_with = "transcript")]
    input: Option<PathBuf>,

    /// JSONL transcript of upstream events to replay.
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Resume an existing conversation (no checkpoint event is issued).
    #[arg(long)]
    checkpoint: Option<String>,

    /// User message for the turn.
    #[arg(long, default_value = "")]
    message: String,

    /// Extra configuration file, layered over config/default.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Characters per fragment (overrides `stream.chunk_size`).
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Give every paragraph line its own block.
    #[arg(long)]
    paragraph_blocks: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    if let Some(chunk_size) = cli.chunk_size {
        config.stream.chunk_size = chunk_size;
    }
    if cli.paragraph_blocks {
        config.parser.paragraph_blocks = true;
    }

    init_logging(&config);

    let source = build_source(&cli, &config).await?;

    let mut request = TurnRequest::new(cli.message.clone());
    if let Some(checkpoint_id) = &cli.checkpoint {
        request = request.with_checkpoint(checkpoint_id.clone());
    }

    let upstream = source.open(request).await?;
    let mut handle = StreamSession::new(config.session()).spawn(upstream);

    let mut stdout = tokio::io::stdout();
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = handle.recv() => {
                let Some(event) = event else { break };
                let record = encode_event(&event)?;
                stdout.write_all(record.as_bytes()).await?;
                stdout.flush().await?;
            }
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                tracing::info!("Interrupted, cancelling session");
                interrupted = true;
                handle.cancel();
            }
        }
    }

    Ok(())
}

async fn build_source(cli: &Cli, config: &Config) -> Result<Box<dyn FragmentSource>> {
    if let Some(path) = &cli.transcript {
        tracing::info!("Replaying transcript: {}", path.display());
        return Ok(Box::new(TranscriptSource::new(path)));
    }

    let path = cli
        .input
        .as_ref()
        .context("Either --input or --transcript is required")?;
    let document = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    tracing::info!(
        chunk_size = config.stream.chunk_size,
        "Replaying markdown: {}",
        path.display()
    );
    Ok(Box::new(
        ScriptedSource::new(document).with_chunk_size(config.stream.chunk_size),
    ))
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // stdout carries the event stream
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
