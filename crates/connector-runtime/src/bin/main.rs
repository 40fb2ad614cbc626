//! AI Connector CLI
//!
//! Generates connector configs from OpenAPI specs, sends single prompts
//! through a config, and scans prompt files in live or mock mode.

use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use connector_core::{
    resolve_credential, ConfigGenerator, ConnectorConfig, ConnectorError, SecretString, Settings,
    SettingsManager,
};
use connector_runtime::scanner::{self, analyzer::Analyzer, render_summary, Responder};
use connector_runtime::{
    AppError, ConnectorRuntime, MockAnalyzer, MockResponder, Result, ScanMode, ScanReport,
    ScanResult, Scanner, TokioSleeper, Verdict,
};
use openapi_parser::OpenApiParser;

/// AI Connector - talk to any chat API described by an OpenAPI spec
#[derive(Parser, Debug)]
#[command(name = "ai-connector")]
#[command(author = "Symbia Labs")]
#[command(version)]
#[command(about = "Generate connector configs from OpenAPI specs and send prompts through them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print results and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Settings file (retry policy, timeout override)
    #[arg(long, global = true, env = "AI_CONNECTOR_SETTINGS")]
    settings: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a connector config from an OpenAPI spec
    Generate {
        /// Spec file path or http(s) URL
        #[arg(long)]
        spec: String,

        /// Where to write the config JSON
        #[arg(short, long)]
        output: PathBuf,

        /// Model to put in the request's static fields
        #[arg(long)]
        model: Option<String>,
    },

    /// Send one prompt through a config
    Run {
        #[arg(short, long)]
        config: PathBuf,

        #[arg(short, long)]
        prompt: String,

        /// API key; defaults to <PROVIDER>_API_KEY, then API_KEY
        #[arg(long)]
        credential: Option<String>,

        /// Print the full response body instead of the reply text
        #[arg(long)]
        raw: bool,
    },

    /// Send every prompt in a file and summarize the verdicts
    Scan {
        #[arg(short, long)]
        config: PathBuf,

        /// Prompt file, one prompt per line
        #[arg(long)]
        prompts: PathBuf,

        #[arg(long)]
        credential: Option<String>,

        /// Use canned replies instead of calling the API
        #[arg(long)]
        mock: bool,

        /// Write a JSON report here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seed for mock replies and verdicts
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        let exit_code = match &e {
            AppError::Usage(_) => 2,
            AppError::Connector(ConnectorError::Synthesis(_)) => 3,
            AppError::Connector(ConnectorError::CredentialNotFound(_)) => 4,
            _ => 1,
        };
        std::process::exit(exit_code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(cli.settings.as_deref())?;

    match cli.command {
        Commands::Generate {
            spec,
            output,
            model,
        } => handle_generate(&spec, &output, model.as_deref(), cli.verbose > 0, cli.quiet).await,
        Commands::Run {
            config,
            prompt,
            credential,
            raw,
        } => handle_run(&settings, &config, &prompt, credential.as_deref(), raw).await,
        Commands::Scan {
            config,
            prompts,
            credential,
            mock,
            output,
            seed,
        } => {
            let opts = ScanOptions {
                config: &config,
                prompts: &prompts,
                credential: credential.as_deref(),
                mock,
                output: output.as_deref(),
                seed,
                quiet: cli.quiet,
            };
            handle_scan(&settings, opts).await
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Ok(SettingsManager::load(path)?.into_settings()),
        None => Ok(Settings::default()),
    }
}

/// Credential for a config, or none when the config needs no auth
fn credential_for(config: &ConnectorConfig, flag: Option<&str>) -> Result<Option<SecretString>> {
    if config.auth().is_none() {
        return Ok(None);
    }
    Ok(Some(resolve_credential(&config.provider, flag)?))
}

fn live_runtime(
    settings: &Settings,
    config: ConnectorConfig,
    credential: Option<SecretString>,
) -> Result<ConnectorRuntime> {
    let timeout = Duration::from_secs(settings.timeout_for(config.timeout_seconds));
    Ok(ConnectorRuntime::new(
        config,
        credential,
        settings.retry.clone(),
        timeout,
    )?)
}

async fn handle_generate(
    location: &str,
    output: &Path,
    model: Option<&str>,
    show_candidates: bool,
    quiet: bool,
) -> Result<()> {
    let spec = OpenApiParser::load(location).await?;
    info!("Loaded '{}' with {} operations", spec.title, spec.operations.len());

    let generator = ConfigGenerator::new(&spec);

    if show_candidates {
        println!("Chat endpoint candidates:");
        for candidate in generator.candidates() {
            println!(
                "  [{:>6.1}] POST {}  {}",
                candidate.score,
                candidate.path(),
                candidate.summary()
            );
        }
    }

    let config = generator
        .generate(model)
        .map_err(ConnectorError::from)?;
    config.to_json_file(output)?;
    info!("Config written to {:?}", output);

    if !quiet {
        let auth = config.auth();
        println!("Generated config for {} ({})", config.name, config.provider);
        println!("  Endpoint:  POST {}", config.endpoint_url());
        println!("  Prompt:    {}", config.request.prompt_field);
        println!("  Reply:     {}", config.response.response_field);
        if auth.is_none() {
            println!("  Auth:      none");
        } else {
            println!("  Auth:      {:?} {}", auth.location, auth.key_name);
        }
        println!("  Written:   {}", output.display());
    }

    Ok(())
}

async fn handle_run(
    settings: &Settings,
    config_path: &Path,
    prompt: &str,
    credential: Option<&str>,
    raw: bool,
) -> Result<()> {
    let config = ConnectorConfig::from_json_file(config_path)?;
    let credential = credential_for(&config, credential)?;
    let runtime = live_runtime(settings, config, credential)?;

    let reply = runtime.send_prompt(prompt).await?;

    if raw {
        println!("{}", serde_json::to_string_pretty(&reply.raw)?);
    } else {
        println!("{}", reply.content);
    }
    info!(
        "Status {} in {}ms ({} retries)",
        reply.status, reply.latency_ms, reply.retries
    );

    Ok(())
}

struct ScanOptions<'a> {
    config: &'a Path,
    prompts: &'a Path,
    credential: Option<&'a str>,
    mock: bool,
    output: Option<&'a Path>,
    seed: Option<u64>,
    quiet: bool,
}

async fn handle_scan(settings: &Settings, opts: ScanOptions<'_>) -> Result<()> {
    let config = ConnectorConfig::from_json_file(opts.config)?;
    let prompts = scanner::load_prompts(opts.prompts)?;
    if prompts.is_empty() {
        return Err(AppError::Usage(format!(
            "No prompts found in {}",
            opts.prompts.display()
        )));
    }

    let config_name = config.name.clone();
    let analyzer = MockAnalyzer::new(opts.seed);

    if !opts.quiet {
        println!(
            "Scanning {} prompts against {}{}",
            prompts.len(),
            config_name,
            if opts.mock { " (mock mode)" } else { "" }
        );
    }

    let (mode, results) = if opts.mock {
        let responder = MockResponder::new(scanner::responder_seed(opts.seed), TokioSleeper);
        (ScanMode::Mock, scan(responder, analyzer, &prompts, opts.quiet).await)
    } else {
        let credential = credential_for(&config, opts.credential)?;
        let runtime = live_runtime(settings, config, credential)?;
        (ScanMode::Live, scan(runtime, analyzer, &prompts, opts.quiet).await)
    };

    println!();
    print!("{}", render_summary(&config_name, &results));

    if let Some(output) = opts.output {
        ScanReport::new(config_name, mode, results).write_to(output)?;
        if !opts.quiet {
            println!("Results exported to {}", output.display());
        }
    }

    Ok(())
}

async fn scan<R: Responder, A: Analyzer>(
    responder: R,
    analyzer: A,
    prompts: &[String],
    quiet: bool,
) -> Vec<ScanResult> {
    let mut scanner = Scanner::new(responder, analyzer);
    scanner
        .scan_all(prompts, |result, total| {
            if !quiet {
                print_progress(result, total);
            }
        })
        .await
}

fn print_progress(result: &ScanResult, total: usize) {
    let excerpt: String = result.prompt.chars().take(40).collect();
    println!("[{}/{}] {}...", result.index + 1, total, excerpt);
    match result.verdict {
        Verdict::Error => println!(
            "         error: {} (retries: {})",
            result.error_message.as_deref().unwrap_or("unknown failure"),
            result.retries
        ),
        verdict => println!(
            "         {} (confidence: {:.2}, latency: {}ms)",
            verdict, result.confidence, result.latency_ms
        ),
    }
}
