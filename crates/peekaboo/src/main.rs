use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use peekaboo_common::{logger, presets, AppConfig, PeekabooError, Preset};
use peekaboo_llm::{HttpTransport, Summarizer, Transport};
use peekaboo_template::{interpolate, Fallback, Values};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    if let Some(root) = find_project_root() {
        let env_path = root.join(".env");
        if env_path.exists() {
            dotenv::from_path(&env_path).ok();
        }
    } else {
        // Fallback to default dotenv behavior
        dotenv::dotenv().ok();
    }
}

#[derive(Parser)]
#[command(name = "peekaboo")]
#[command(about = "Peekaboo - summarize a user's comment history with an LLM", long_about = None)]
struct Cli {
    /// Settings file (JSON or TOML)
    #[arg(long, global = true, env = "PEEKABOO_SETTINGS")]
    settings: Option<PathBuf>,

    /// Endpoint preset used for defaults
    #[arg(long, global = true, default_value = "openai")]
    preset: Preset,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also write logs to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LimitArgs {
    /// Maximum comments to use; zero or negative means all
    #[arg(long, allow_negative_numbers = true)]
    max_comments: Option<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a user's comments and summarize them
    Summarize {
        /// Account name
        username: String,

        /// Read the comment listing from a file instead of fetching it
        #[arg(long)]
        input: Option<PathBuf>,

        /// Print the mapped comments and the request without sending it
        #[arg(long)]
        dry_run: bool,

        /// Print the full summary record as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        limit: LimitArgs,
    },

    /// Flatten a comment listing with the configured field mapping
    Map {
        /// Comment listing file
        #[arg(long, conflicts_with = "user", required_unless_present = "user")]
        input: Option<PathBuf>,

        /// Fetch the listing for this account instead
        #[arg(long)]
        user: Option<String>,

        #[command(flatten)]
        limit: LimitArgs,
    },

    /// Interpolate a template from the command line
    Render {
        /// Template text
        template: String,

        /// Named value for {$key} placeholders
        #[arg(long = "set", value_name = "KEY=VALUE", conflicts_with = "args")]
        named: Vec<String>,

        /// Positional value for {#1} / {#n} placeholders
        #[arg(long = "arg", value_name = "VALUE")]
        args: Vec<String>,

        /// Replacement for unresolved placeholders
        #[arg(long, default_value = "", conflicts_with = "keep")]
        fallback: String,

        /// Leave unresolved placeholders as written
        #[arg(long)]
        keep: bool,
    },

    /// Print the effective settings with secrets masked
    Settings,

    /// Print the default settings of the selected preset
    Defaults,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // AppConfig::load also reads .env from the working directory; the
    // project root file is loaded first so it wins for unset variables
    load_dotenv_from_project_root();

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }

    Ok(())
}

async fn run(cli: Cli) -> peekaboo_common::Result<()> {
    // These commands do not need valid settings
    match &cli.command {
        Commands::Defaults => return print_json(&AppConfig::preset(cli.preset)),
        Commands::Render {
            template,
            named,
            args,
            fallback,
            keep,
        } => {
            init_logging(&cli, None)?;
            println!("{}", render(template, named, args, fallback, *keep)?);
            return Ok(());
        }
        _ => {}
    }

    let mut config = AppConfig::load_with_preset(cli.settings.as_deref(), cli.preset)?;
    init_logging(&cli, Some(&config))?;

    tracing::info!("Peekaboo starting...");
    tracing::debug!("  Endpoint: {}", config.api_url);
    tracing::debug!("  Max comments: {}", config.max_comments);

    match cli.command {
        Commands::Summarize {
            username,
            input,
            dry_run,
            json,
            limit,
        } => {
            apply_limit(&mut config, &limit);
            let api_key = config.api_key.clone();
            let summarizer = Summarizer::new(config.clone(), transport(&config)?)?;

            let listing = match &input {
                Some(path) => read_json(path)?,
                None => summarizer.fetch_comments(&username).await?,
            };

            if dry_run {
                let mut prepared = summarizer.prepare(&username, &listing)?;
                prepared.request = prepared.request.redacted(&api_key);
                return print_json(&prepared);
            }

            let summary = summarizer.summarize_listing(&username, &listing).await?;
            if json {
                return print_json(&summary);
            }
            match &summary.text {
                Some(text) => println!("{}", text),
                None => {
                    tracing::warn!(
                        "No text at '{}' in the response, printing it whole",
                        config.llm_response_path
                    );
                    print_json(&summary.raw_response)?;
                }
            }
            Ok(())
        }
        Commands::Map { input, user, limit } => {
            apply_limit(&mut config, &limit);
            let summarizer = Summarizer::new(config.clone(), transport(&config)?)?;

            let listing = match (&input, &user) {
                (Some(path), _) => read_json(path)?,
                (None, Some(username)) => summarizer.fetch_comments(username).await?,
                (None, None) => {
                    return Err(PeekabooError::invalid_input("Either --input or --user is required"))
                }
            };

            print_json(&summarizer.map_comments(&listing))
        }
        Commands::Settings => print_json(&config.redacted()),
        Commands::Defaults | Commands::Render { .. } => Ok(()),
    }
}

/// Console logging, plus a log file when a directory is configured
fn init_logging(cli: &Cli, config: Option<&AppConfig>) -> peekaboo_common::Result<()> {
    let level = cli
        .log_level
        .clone()
        .or_else(|| config.map(|c| c.log_level.clone()))
        .unwrap_or_else(|| "warn".to_string());
    let level = logger::parse_log_level(&level).to_string().to_lowercase();

    match log_path(cli.log_dir.as_deref(), config) {
        Some(path) => logger::setup_logging(&path, &level),
        None => logger::setup_console_logging(&level),
    }
}

/// `--log-dir` wins over the settings directory; the file name comes from settings
fn log_path(cli_dir: Option<&Path>, config: Option<&AppConfig>) -> Option<PathBuf> {
    match cli_dir {
        Some(dir) => {
            let file = config.map_or(presets::DEFAULT_LOG_FILE, |c| c.log_file.as_str());
            Some(dir.join(file))
        }
        None => config.and_then(AppConfig::log_path),
    }
}

fn apply_limit(config: &mut AppConfig, limit: &LimitArgs) {
    if let Some(max_comments) = limit.max_comments {
        config.max_comments = max_comments;
    }
}

fn transport(config: &AppConfig) -> peekaboo_common::Result<Arc<dyn Transport>> {
    Ok(Arc::new(HttpTransport::from_config(config)?))
}

fn read_json(path: &Path) -> peekaboo_common::Result<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        PeekabooError::not_found(format!("Failed to read {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&text)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> peekaboo_common::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run the interpolator over command-line values
fn render(
    template: &str,
    named: &[String],
    args: &[String],
    fallback: &str,
    keep: bool,
) -> peekaboo_common::Result<String> {
    let fallback = if keep {
        Fallback::KeepPlaceholder
    } else {
        Fallback::Text(fallback)
    };

    if !args.is_empty() {
        return Ok(interpolate(template, Values::Positional(args), fallback));
    }

    let values = named
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| {
                    PeekabooError::invalid_input(format!("Expected KEY=VALUE, got '{}'", pair))
                })
        })
        .collect::<peekaboo_common::Result<HashMap<_, _>>>()?;

    Ok(interpolate(template, Values::Named(&values), fallback))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_summarize_with_negative_limit() {
        let cli = Cli::try_parse_from([
            "peekaboo", "summarize", "someone", "--max-comments", "-1", "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::Summarize { username, dry_run, limit, .. } => {
                assert_eq!(username, "someone");
                assert!(dry_run);
                assert_eq!(limit.max_comments, Some(-1));
            }
            _ => panic!("expected summarize"),
        }
        assert_eq!(cli.preset, Preset::OpenAi);
    }

    #[test]
    fn test_parse_preset() {
        let cli = Cli::try_parse_from(["peekaboo", "--preset", "ollama", "defaults"]).unwrap();
        assert_eq!(cli.preset, Preset::Ollama);
        assert!(Cli::try_parse_from(["peekaboo", "--preset", "other", "defaults"]).is_err());
    }

    #[test]
    fn test_map_requires_a_source() {
        assert!(Cli::try_parse_from(["peekaboo", "map"]).is_err());
        assert!(Cli::try_parse_from(["peekaboo", "map", "--input", "a.json", "--user", "x"]).is_err());
    }

    #[test]
    fn test_render_named_and_positional() {
        let named = vec!["name=World".to_string()];
        assert_eq!(render("Hello {$name}{$x}", &named, &[], "!", false).unwrap(), "Hello World!");
        assert_eq!(render("{$x}", &[], &[], "", true).unwrap(), "{$x}");

        let args = vec!["a".to_string(), "b".to_string()];
        assert_eq!(render("{#n}{#n}{#1}", &[], &args, "", false).unwrap(), "aba");
    }

    #[test]
    fn test_log_path_resolution() {
        assert_eq!(log_path(None, None), None);
        assert_eq!(
            log_path(Some(Path::new("/tmp/logs")), None),
            Some(PathBuf::from("/tmp/logs/peekaboo.log"))
        );

        let mut config = AppConfig::default();
        config.log_file = "summaries.log".to_string();
        assert_eq!(log_path(None, Some(&config)), None);

        config.log_dir = Some(PathBuf::from("/var/log/peekaboo"));
        assert_eq!(
            log_path(None, Some(&config)),
            Some(PathBuf::from("/var/log/peekaboo/summaries.log"))
        );
        assert_eq!(
            log_path(Some(Path::new("/tmp/logs")), Some(&config)),
            Some(PathBuf::from("/tmp/logs/summaries.log"))
        );
    }

    #[test]
    fn test_render_rejects_bad_pair() {
        let err = render("{$a}", &["novalue".to_string()], &[], "", false).unwrap_err();
        assert!(matches!(err, PeekabooError::InvalidInput(_)));
    }
}
