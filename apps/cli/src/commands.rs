//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use pagemark_extract::{ExtractOptions, Extraction, render_frontmatter};
use pagemark_fetch::Fetcher;
use pagemark_shared::{
    AppConfig, ExtractProfile, PagemarkError, config_file_path, init_config, init_config_at,
    load_config, load_config_from,
};
use tracing::info;
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// pagemark: turn web pages into clean Markdown.
#[derive(Parser)]
#[command(
    name = "pagemark",
    version,
    about = "Extract the main content of a web page as clean Markdown.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Use this config file instead of ~/.pagemark/pagemark.toml.
    #[arg(long, global = true, env = "PAGEMARK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Output rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Markdown,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch a URL and extract its main content.
    Url {
        /// Page to fetch (http or https).
        url: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Extract the main content of a local HTML file (`-` reads stdin).
    File {
        /// Path to the HTML file.
        path: PathBuf,

        /// Original address of the page, recorded in frontmatter and JSON output.
        #[arg(long)]
        source_url: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags shared by the extraction subcommands.
#[derive(Args, Debug, Clone)]
pub(crate) struct OutputArgs {
    /// Use the strict extraction profile.
    #[arg(long)]
    pub strict: bool,

    /// Write the result to this file instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value = "markdown")]
    pub format: OutputFormat,

    /// Prepend YAML frontmatter (markdown format only).
    #[arg(long)]
    pub frontmatter: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
    /// Print the config file location.
    Path,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pagemark=info",
        1 => "pagemark=debug",
        _ => "pagemark=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<ExitCode> {
    // `config init` must work even when the existing file no longer parses.
    if matches!(
        cli.command,
        Command::Config {
            action: ConfigAction::Init
        }
    ) {
        cmd_config_init(cli.config.as_deref())?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Url { url, output } => cmd_url(&config, &url, &output).await,
        Command::File {
            path,
            source_url,
            output,
        } => cmd_file(&config, &path, source_url.as_deref(), &output),
        Command::Config { action } => {
            match action {
                ConfigAction::Init => cmd_config_init(cli.config.as_deref())?,
                ConfigAction::Show => cmd_config_show(&config)?,
                ConfigAction::Path => cmd_config_path(cli.config.as_deref())?,
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Where a document came from, carried into the rendered output.
struct Source {
    url: Option<String>,
    status: Option<u16>,
    fetched_at: Option<String>,
}

async fn cmd_url(config: &AppConfig, url: &str, output: &OutputArgs) -> Result<ExitCode> {
    let parsed = Url::parse(url).map_err(|e| eyre!("invalid URL '{url}': {e}"))?;

    let fetcher = Fetcher::new(&config.fetch)?;
    let doc = fetcher.fetch(&parsed).await?;

    let opts = ExtractOptions {
        source_url: Some(doc.url.to_string()),
        profile: resolve_profile(config, output),
    };
    let source = Source {
        url: Some(doc.url.to_string()),
        status: Some(doc.status),
        fetched_at: Some(doc.fetched_at.to_rfc3339()),
    };

    finish(pagemark_extract::extract(&doc.body, &opts), &source, output)
}

fn cmd_file(
    config: &AppConfig,
    path: &Path,
    source_url: Option<&str>,
    output: &OutputArgs,
) -> Result<ExitCode> {
    let bytes = if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .wrap_err("failed to read stdin")?;
        buf
    } else {
        std::fs::read(path).map_err(|e| PagemarkError::io(path, e))?
    };

    let opts = ExtractOptions {
        source_url: source_url
            .map(str::to_string)
            .or_else(|| Some(path.display().to_string())),
        profile: resolve_profile(config, output),
    };
    let source = Source {
        url: source_url.map(str::to_string),
        status: None,
        fetched_at: None,
    };

    finish(pagemark_extract::extract_bytes(&bytes, &opts), &source, output)
}

/// `--strict` wins over the config file.
fn resolve_profile(config: &AppConfig, output: &OutputArgs) -> ExtractProfile {
    if output.strict {
        ExtractProfile::Strict
    } else {
        config.extract.profile
    }
}

/// Render and write an extraction result. `NoContent` maps to exit code 1.
fn finish(
    result: pagemark_shared::Result<Extraction>,
    source: &Source,
    output: &OutputArgs,
) -> Result<ExitCode> {
    let extraction = match result {
        Ok(extraction) => extraction,
        Err(err) if err.is_no_content() => {
            eprintln!("Error: No content extracted");
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => return Err(err.into()),
    };

    info!(
        strategy = extraction.strategy,
        raw_chars = extraction.raw_chars,
        final_chars = extraction.final_chars,
        "extraction complete"
    );

    let rendered = render(&extraction, source, output)?;

    match &output.out {
        Some(path) => {
            std::fs::write(path, &rendered).map_err(|e| PagemarkError::io(path, e))?;
            info!(path = %path.display(), "wrote output");
        }
        None => println!("{rendered}"),
    }

    Ok(ExitCode::SUCCESS)
}

fn render(extraction: &Extraction, source: &Source, output: &OutputArgs) -> Result<String> {
    match output.format {
        OutputFormat::Markdown if output.frontmatter => {
            let fm = render_frontmatter(
                source.url.as_deref().unwrap_or_default(),
                extraction.title.as_deref(),
            );
            Ok(format!("{fm}\n{}", extraction.markdown))
        }
        OutputFormat::Markdown => Ok(extraction.markdown.clone()),
        OutputFormat::Json => {
            let value = serde_json::json!({
                "source_url": source.url,
                "status": source.status,
                "fetched_at": source.fetched_at,
                "title": extraction.title,
                "strategy": extraction.strategy,
                "raw_chars": extraction.raw_chars,
                "final_chars": extraction.final_chars,
                "markdown": extraction.markdown,
            });
            Ok(serde_json::to_string_pretty(&value)?)
        }
    }
}

fn cmd_config_init(explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(path) => init_config_at(path)?,
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

fn cmd_config_path(explicit: Option<&Path>) -> Result<()> {
    match explicit {
        Some(path) => println!("{}", path.display()),
        None => println!("{}", config_file_path()?.display()),
    }
    Ok(())
}
