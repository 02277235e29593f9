//! Background Removal CLI Tool
//!
//! Sends one image to the remote removal service and saves the result, or
//! starts an interactive shell with the full upload → compare → download
//! workflow.

use super::config::CliConfigBuilder;
use super::shell::Shell;
use super::view::ProgressView;
use crate::{
    client::RemoveBgClient,
    controller::SessionController,
    intake::IntakeFilter,
    render::render,
    tracing_config::{TracingConfig, TracingFormat},
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, Instrument};

/// Remove image backgrounds through a remote service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgremove-remote")]
pub struct Cli {
    /// Image to process (PNG, JPG, JPEG); omit to start the interactive shell
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Directory the result is saved to as removed-background.png
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// API key for the removal service (prefer REMOVE_BG_API_KEY)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Removal endpoint; any host other than api.remove.bg is treated as a proxy
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Config file [default: <config dir>/bgremove-remote/config.json]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Initial theme
    #[arg(long, value_enum)]
    pub theme: Option<CliTheme>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Start the interactive shell even when INPUT is given
    #[arg(short, long)]
    pub interactive: bool,

    /// Process INPUT without saving the result
    #[arg(long)]
    pub no_download: bool,

    /// Enable verbose logging (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliTheme {
    Light,
    Dark,
}

/// Main CLI entry point
pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = TracingConfig::new()
        .with_verbosity(cli.verbose)
        .with_format(TracingFormat::Console)
        .with_session_id(uuid::Uuid::new_v4().to_string());
    subscriber
        .init()
        .context("Failed to initialize tracing subscriber")?;

    let span = subscriber.session_span();
    run(cli).instrument(span).await
}

async fn run(cli: Cli) -> Result<()> {
    let config = CliConfigBuilder::from_cli(&cli)?;
    debug!(?config, "configuration loaded");

    let client = RemoveBgClient::new(&config).context("Failed to create removal client")?;
    info!(
        endpoint = %client.endpoint(),
        authenticated = client.is_authenticated(),
        "removal client ready"
    );

    let controller = SessionController::from_config(&config, Arc::new(client));
    let intake = IntakeFilter::new(config.max_upload_bytes);
    let output_dir = config
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    match cli.input {
        Some(input) if !cli.interactive => {
            let download = (!cli.no_download).then_some(output_dir.as_path());
            process_single_file(&controller, &intake, &input, download).await
        },
        initial => Shell::new(controller, intake, output_dir).run(initial).await,
    }
}

/// One-shot mode: admit, process, show the result and save it
async fn process_single_file(
    controller: &SessionController,
    intake: &IntakeFilter,
    input: &Path,
    download: Option<&Path>,
) -> Result<()> {
    let start_time = Instant::now();
    let file = intake
        .admit_path(input)
        .await
        .with_context(|| format!("Cannot process {}", input.display()))?;

    let mut rx = controller.subscribe();
    let mut view = ProgressView::new();
    let attempt = controller.on_drop(file);
    tokio::pin!(attempt);

    loop {
        tokio::select! {
            _ = &mut attempt => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                view.update(rx.borrow_and_update().state());
            },
        }
    }

    let state = controller.snapshot();
    view.update(&state);
    print!("{}", render(&state, intake.max_bytes()));

    if let Some(error) = state.error {
        anyhow::bail!(error);
    }

    if let Some(dir) = download {
        match controller.handle_download(dir).await? {
            Some(path) => println!("✅ Saved {}", path.display()),
            None => anyhow::bail!("No processed image to save"),
        }
    }

    info!(
        elapsed_secs = start_time.elapsed().as_secs_f64(),
        "processed {}",
        input.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["bgremove-remote"]);
        assert!(cli.input.is_none());
        assert!(!cli.interactive);
        assert!(!cli.no_download);
        assert_eq!(cli.verbose, 0);
        assert!(cli.theme.is_none());
    }

    #[test]
    fn test_cli_one_shot_flags() {
        let cli = Cli::parse_from([
            "bgremove-remote",
            "cat.jpg",
            "-o",
            "results",
            "--theme",
            "dark",
            "--timeout",
            "30",
            "-vv",
        ]);
        assert_eq!(cli.input, Some(PathBuf::from("cat.jpg")));
        assert_eq!(cli.output, Some(PathBuf::from("results")));
        assert_eq!(cli.theme, Some(CliTheme::Dark));
        assert_eq!(cli.timeout, Some(30));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_rejects_unknown_theme() {
        assert!(Cli::try_parse_from(["bgremove-remote", "--theme", "sepia"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
