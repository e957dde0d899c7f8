//! PII Anonymizer CLI Application.
//!
//! Command-line front end for the anonymizer library: anonymize PDFs or
//! plain text, dump extracted page text, re-apply saved mappings and
//! inspect configuration files.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use anonymizer::{
    AnonymizationService, ConfigSnapshot, ConfigStore, PdfBackend, RequestConfig, ServerConfig,
};

/// PII Anonymization Tool
///
/// Detects personal information in PDF documents and text and replaces it
/// with consistent substitutes.
#[derive(Parser)]
#[command(name = "anonymizer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Server configuration file (JSON); built-in defaults when omitted
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Request overrides shared by the anonymizing subcommands.
#[derive(clap::Args, Debug, Default)]
struct RequestArgs {
    /// Explicit replacement as ORIGINAL=SUBSTITUTE (repeatable)
    #[arg(short, long, value_name = "ORIGINAL=SUBSTITUTE")]
    replace: Vec<String>,

    /// Detector to skip (repeatable)
    #[arg(short, long, value_name = "NAME")]
    disable: Vec<String>,

    /// Request configuration file (JSON); --replace and --disable add to it
    #[arg(long, value_name = "FILE")]
    request: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Anonymize a PDF and write the rebuilt document
    Redact {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Write the JSON report here instead of stdout
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// TrueType font for the output (needed for Hebrew glyphs)
        #[arg(long, value_name = "FILE")]
        font: Option<PathBuf>,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Anonymize plain text from a file or stdin and print the JSON report
    Text {
        /// Input text file (defaults to stdin)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Extract page text from a PDF (for debugging and verification)
    Extract {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Apply a saved mappings_used table to a text file
    Apply {
        /// Input text file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// JSON object of original to substitute
        #[arg(short, long, value_name = "FILE")]
        mappings: PathBuf,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate the configuration and report what it enables
    Check,
    /// Print the effective configuration as JSON
    Show,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Parses `ORIGINAL=SUBSTITUTE`. The substitute may itself contain `=`.
fn parse_replacement(raw: &str) -> Result<(String, String)> {
    let (original, substitute) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Replacement '{}' is not ORIGINAL=SUBSTITUTE", raw))?;
    if original.trim().is_empty() {
        anyhow::bail!("Replacement '{}' has an empty original", raw);
    }
    Ok((original.to_string(), substitute.to_string()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

impl RequestArgs {
    fn build(&self) -> Result<RequestConfig> {
        let mut request = match &self.request {
            Some(path) => read_json::<RequestConfig>(path)?,
            None => RequestConfig::default(),
        };
        for raw in &self.replace {
            let (original, substitute) = parse_replacement(raw)?;
            request.user_replacements.insert(original, substitute);
        }
        request.disabled_detectors.extend(self.disable.iter().cloned());
        Ok(request)
    }
}

/// Command handler holding the configured service.
struct AnonymizeHandler {
    service: AnonymizationService,
    verbose: bool,
}

impl AnonymizeHandler {
    fn new(config: ServerConfig, font: Option<&Path>, verbose: bool) -> Result<Self> {
        let store = Arc::new(ConfigStore::new(config).context("Invalid configuration")?);
        let mut backend = PdfBackend::new();
        if let Some(font) = font {
            let bytes = std::fs::read(font)
                .with_context(|| format!("Failed to read font {}", font.display()))?;
            backend = backend.with_font(bytes);
        }
        Ok(Self {
            service: AnonymizationService::with_backend(store, Box::new(backend)),
            verbose,
        })
    }

    fn redact(
        &self,
        input: &Path,
        output: &Path,
        report: Option<&Path>,
        request: &RequestConfig,
    ) -> Result<()> {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }

        let bytes =
            std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
        let document = self
            .service
            .process_pdf(&bytes, request)
            .with_context(|| "Anonymization failed")?;

        std::fs::write(output, &document.output)
            .with_context(|| format!("Failed to write to {}", output.display()))?;

        let json = serde_json::to_string_pretty(&document.response)?;
        match report {
            Some(path) => std::fs::write(path, json)
                .with_context(|| format!("Failed to write to {}", path.display()))?,
            None => println!("{}", json),
        }

        if self.verbose {
            for warning in &document.response.warnings {
                eprintln!("⚠ {}", warning);
            }
        }
        eprintln!(
            "✓ Anonymized {} match(es) on {} page(s) → {}",
            document.response.total_matches,
            document.response.page_count,
            output.display()
        );

        Ok(())
    }

    fn text(&self, input: Option<&Path>, request: &RequestConfig) -> Result<()> {
        let text = match input {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            None => {
                let mut buffer = String::new();
                std::io::stdin()
                    .read_to_string(&mut buffer)
                    .context("Failed to read stdin")?;
                buffer
            }
        };

        let response = self
            .service
            .process_text(&text, request)
            .with_context(|| "Anonymization failed")?;
        println!("{}", serde_json::to_string_pretty(&response)?);
        Ok(())
    }

    fn extract(&self, input: &Path, output: Option<&Path>) -> Result<()> {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }

        let bytes =
            std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
        let extraction = self
            .service
            .extract_pages(&bytes, &RequestConfig::default())
            .with_context(|| "Text extraction failed")?;

        let mut text = String::new();
        for page in &extraction.pages {
            text.push_str(&format!("--- page {} ---\n{}\n", page.page_number, page.text));
        }

        if let Some(output_path) = output {
            std::fs::write(output_path, &text)
                .with_context(|| format!("Failed to write to {}", output_path.display()))?;
            eprintln!(
                "✓ Extracted {} page(s) → {}",
                extraction.pages.len(),
                output_path.display()
            );
        } else {
            print!("{}", text);
        }

        Ok(())
    }
}

fn apply(input: &Path, mappings: &Path, output: Option<&Path>) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let mappings: BTreeMap<String, String> = read_json(mappings)?;

    let (result, count) = AnonymizationService::apply_mappings(&text, &mappings);
    match output {
        Some(path) => {
            std::fs::write(path, &result)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            eprintln!("✓ Applied {} replacement(s) → {}", count, path.display());
        }
        None => print!("{}", result),
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ServerConfig> {
    match path {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => Ok(ServerConfig::builtin()),
    }
}

fn config_command(action: &ConfigAction, config: ServerConfig) -> Result<()> {
    match action {
        ConfigAction::Check => {
            let snapshot = ConfigSnapshot::compile(config).context("Configuration is invalid")?;
            println!(
                "✓ Configuration valid: {} pattern(s) enabled, {} categor(ies) enabled, {} pool(s)",
                snapshot.enabled_patterns().count(),
                snapshot.enabled_categories().count(),
                snapshot.config().replacement_pools.len()
            );
        }
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Redact {
            input,
            output,
            report,
            font,
            request,
        } => {
            let handler = AnonymizeHandler::new(config, font.as_deref(), cli.verbose)?;
            handler.redact(input, output, report.as_deref(), &request.build()?)?;
        }
        Commands::Text { input, request } => {
            let handler = AnonymizeHandler::new(config, None, cli.verbose)?;
            handler.text(input.as_deref(), &request.build()?)?;
        }
        Commands::Extract { input, output } => {
            let handler = AnonymizeHandler::new(config, None, cli.verbose)?;
            handler.extract(input, output.as_deref())?;
        }
        Commands::Apply {
            input,
            mappings,
            output,
        } => apply(input, mappings, output.as_deref())?,
        Commands::Config { action } => config_command(action, config)?,
    }

    Ok(())
}
