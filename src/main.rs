use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use eyre::{Result, WrapErr};
use log::{debug, info, warn};

mod cli;

use cli::Cli;
use ytnotes::config::{self, Config};
use ytnotes::notes::{DEFAULT_MODEL, Gemini};
use ytnotes::output::OutputStore;
use ytnotes::pipeline::Pipeline;
use ytnotes::youtube::YtDlp;

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytnotes.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytnotes")
        .join("logs")
}

fn tool_version(name: &str) -> Option<String> {
    Command::new(name)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .trim()
                .lines()
                .next()
                .unwrap_or("")
                .to_string()
        })
}

fn build_after_help() -> String {
    let yt_dlp_line = match tool_version(config::DEFAULT_YT_DLP) {
        Some(v) => format!("  \x1b[32m✅\x1b[0m yt-dlp     {v}"),
        None => "  \x1b[31m❌\x1b[0m yt-dlp     (not found, needed to list subtitles)".to_string(),
    };

    format!(
        "\nREQUIRED TOOLS:\n{yt_dlp_line}\n\nConfig is read from: {}\nLogs are written to: {}",
        config::config_path().display(),
        log_dir().join("ytnotes.log").display()
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring config file {}: {e}", config::config_path().display());
        Config::default()
    });

    // CLI flags take priority over the config file
    let bind = cli
        .bind
        .or(config.bind.clone())
        .unwrap_or_else(|| config::DEFAULT_BIND.to_string());
    let output_dir = cli
        .output_dir
        .or(config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_OUTPUT_DIR));
    let model = cli
        .model
        .or(config.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let yt_dlp = cli
        .yt_dlp
        .or(config.yt_dlp.clone())
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_YT_DLP));

    debug!("Effective config: bind={bind} output_dir={} model={model} yt_dlp={}", output_dir.display(), yt_dlp.display());
    if cli.verbose {
        eprintln!(
            "Output: {}\nModel: {model}\nyt-dlp: {}\nFetch timeout: {:?}\nNotes timeout: {:?}",
            output_dir.display(),
            yt_dlp.display(),
            config.fetch_timeout(),
            config.notes_timeout(),
        );
    }

    let store = OutputStore::new(output_dir);
    store.ensure()?;

    let client = reqwest::Client::new();
    let captions = Arc::new(YtDlp::new(yt_dlp, client.clone(), config.fetch_timeout()));
    let notes = Arc::new(Gemini::new(client, model, config.notes_timeout()));
    let pipeline = Arc::new(Pipeline::new(captions, notes, store));

    let app = ytnotes::server::create_router(pipeline);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .wrap_err_with(|| format!("could not bind {bind}"))?;
    info!("Listening on http://{bind}");
    eprintln!("Listening on http://{bind}");

    axum::serve(listener, app).await?;
    Ok(())
}
