//! CLI binary for blueprint-extract.
//!
//! `blueprint extract <S3_PATH>` runs one analysis in the terminal.
//! `blueprint serve` starts the web UI.

use anyhow::{Context, Result};
use blueprint_extract::{
    load_dotenv, ui, AnalysisConfig, AnalyzerError, DocumentKind, ModelResponse, OutputSink,
    Pipeline, PromptTemplate, Surface,
};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Terminal sink ────────────────────────────────────────────────────────────

/// Shows pipeline status on a stderr spinner and hands back the reply text.
///
/// With `quiet` set only warnings reach stderr.
struct TerminalSink {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl TerminalSink {
    fn new(show_progress: bool, quiet: bool) -> Self {
        let bar = show_progress.then(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
            );
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        Self { bar, quiet }
    }

    fn status_line(&self, message: &str) -> Option<String> {
        (!self.quiet).then(|| format!("{} {}", cyan("◆"), message))
    }

    fn println(&self, line: String) {
        match self.bar {
            Some(ref bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

impl OutputSink for TerminalSink {
    type Output = String;

    fn on_status(&self, message: &str) {
        if let Some(line) = self.status_line(message) {
            self.println(line);
        }
        if let Some(ref bar) = self.bar {
            bar.set_message(message.to_string());
        }
    }

    fn on_warning(&self, message: &str) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
        eprintln!("{} {}", yellow("⚠"), message);
    }

    fn finish(self, response: ModelResponse) -> String {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
        response.into_string()
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse one blueprint, result on stdout
  blueprint extract s3://my-bucket/plans/04-501.pdf

  # Engineering-drawing prompt, uncapped output
  blueprint extract --drawing --max-tokens 0 s3://my-bucket/drawings/pump.pdf

  # Start the web UI on http://127.0.0.1:8501
  blueprint serve

ENVIRONMENT VARIABLES (also read from ./.env):
  region_name             AWS region for Textract and Bedrock
  aws_access_key_id       Access key (optional; default AWS chain otherwise)
  aws_secret_access_key   Secret key (required with aws_access_key_id)
  aws_session_token       Session token for temporary credentials
  BEDROCK_MODEL           Bedrock model ID (required)
  RUST_LOG                Log filter, e.g. blueprint_extract=debug
"#;

/// Extract structured data from blueprints with Textract and Bedrock.
#[derive(Parser, Debug)]
#[command(
    name = "blueprint",
    version,
    about = "Extract structured data from architectural blueprints with Textract and Bedrock",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Bedrock model ID (overrides BEDROCK_MODEL).
    #[arg(long, global = true)]
    model: Option<String>,

    /// AWS region (overrides region_name).
    #[arg(long, global = true)]
    region: Option<String>,

    /// Sampling temperature (0.0–1.0).
    #[arg(long, global = true, env = "BLUEPRINT_TEMPERATURE")]
    temperature: Option<f32>,

    /// Nucleus sampling top-p (0.0–1.0).
    #[arg(long, global = true, env = "BLUEPRINT_TOP_P")]
    top_p: Option<f32>,

    /// Max output tokens; 0 leaves the limit to the model.
    #[arg(long, global = true, env = "BLUEPRINT_MAX_TOKENS")]
    max_tokens: Option<u32>,

    /// Path to a text file with a custom prompt template containing {data}.
    #[arg(long, global = true, env = "BLUEPRINT_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Use the engineering-drawing prompt instead of the blueprint prompt.
    #[arg(long, global = true)]
    drawing: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "BLUEPRINT_VERBOSE")]
    verbose: bool,

    /// Suppress status output.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse one document and print the result.
    Extract {
        /// S3 path of the document, e.g. s3://bucket/doc.pdf, or a local
        /// single-page file.
        s3_path: String,
    },
    /// Serve the web UI.
    Serve {
        /// Listen address.
        #[arg(long, env = "BLUEPRINT_ADDR", default_value = "127.0.0.1:8501")]
        addr: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers progress for `extract`; keep library logs quiet
    // unless asked for.
    let show_progress = !cli.quiet && matches!(cli.command, Command::Extract { .. });
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    load_dotenv();
    let config = build_config(&cli).await?;
    let pipeline = Pipeline::from_config(&config).await;

    match cli.command {
        Command::Extract { ref s3_path } => {
            let sink = TerminalSink::new(show_progress, cli.quiet);
            let pipeline = pipeline.allow_local_files(true);
            let text = match pipeline.run(s3_path, sink).await {
                Ok(text) => text,
                // The sink has already printed the warning.
                Err(AnalyzerError::EmptyLocator) => std::process::exit(2),
                Err(e) => return Err(e).context("Extraction failed"),
            };

            if !cli.quiet {
                eprintln!("{}", bold("Extracted Information:"));
            }
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(text.as_bytes())
                .context("Failed to write to stdout")?;
            if !text.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
        Command::Serve { addr } => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind {addr}"))?;
            eprintln!("{} {} on http://{}", cyan("◆"), bold(ui::TITLE), addr);
            axum::serve(listener, ui::router(Arc::new(pipeline)))
                .await
                .context("Web UI server failed")?;
        }
    }

    Ok(())
}

/// Layer CLI flags over the environment configuration.
async fn build_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::env_builder(Surface::Interactive, |k| std::env::var(k).ok());

    if let Some(ref model) = cli.model {
        builder = builder.model_id(model.clone());
    }
    if let Some(ref region) = cli.region {
        builder = builder.region(region.clone());
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(p) = cli.top_p {
        builder = builder.top_p(p);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens((n > 0).then_some(n));
    }
    if cli.drawing {
        builder = builder.document_kind(DocumentKind::EngineeringDrawing);
    }
    if let Some(ref path) = cli.prompt_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt template from {:?}", path))?;
        builder = builder.prompt(PromptTemplate::custom(text).context("Invalid prompt template")?);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_sink_prints_no_status_lines() {
        let sink = TerminalSink::new(false, true);
        assert_eq!(sink.status_line("Loading data from S3..."), None);
    }

    #[test]
    fn status_lines_shown_without_quiet() {
        let sink = TerminalSink::new(false, false);
        let line = sink.status_line("Loading data from S3...").unwrap();
        assert!(line.ends_with("Loading data from S3..."));
    }

    #[test]
    fn quiet_flag_parses_after_subcommand() {
        let cli = Cli::try_parse_from(["blueprint", "extract", "s3://b/k.pdf", "--quiet"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Command::Extract { ref s3_path } if s3_path == "s3://b/k.pdf"));
    }
}
