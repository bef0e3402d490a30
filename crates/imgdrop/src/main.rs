//! `imgdrop` - CLI for the image compression service
//!
//! This binary uploads images, lists recent results, and fetches processed
//! files from the command line.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use imgdrop::cli::{Cli, Command, ConfigCommand, DownloadCommand, RecentCommand, UploadCommand};
use imgdrop::{
    init_logging, Config, HttpImageService, ImageService, MemoryView, RecentResults,
    TerminalView, UploadClient, UploadFile, View,
};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;
    let quiet = cli.quiet;

    match cli.command {
        Command::Upload(cmd) => handle_upload(config, cmd, quiet).await,
        Command::Recent(cmd) => handle_recent(&config, &cmd, quiet).await,
        Command::Download(cmd) => handle_download(&config, &cmd, quiet).await,
        Command::Ping => handle_ping(&config, quiet).await,
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn connect(config: &Config) -> anyhow::Result<Arc<dyn ImageService>> {
    let service = HttpImageService::new(config).context("building HTTP client")?;
    Ok(Arc::new(service))
}

async fn handle_upload(
    mut config: Config,
    cmd: UploadCommand,
    quiet: bool,
) -> anyhow::Result<ExitCode> {
    if cmd.quality.is_some() {
        config.upload.quality = cmd.quality;
    }

    let file = UploadFile::read(&cmd.file).await?;
    let service = connect(&config)?;
    let view: Arc<dyn View> = Arc::new(TerminalView::stdout().with_quiet(quiet));
    let recent = RecentResults::new(Arc::clone(&service), Arc::clone(&view), config.recent.limit);
    let client = UploadClient::new(service, view, recent, &config);

    let mut submission = client.submit(file).await;
    if !cmd.no_refresh {
        submission.settle().await;
    }

    Ok(if submission.is_completed() {
        ExitCode::SUCCESS
    } else {
        if quiet {
            eprintln!("{}", submission.message);
        }
        ExitCode::FAILURE
    })
}

async fn handle_recent(
    config: &Config,
    cmd: &RecentCommand,
    quiet: bool,
) -> anyhow::Result<ExitCode> {
    let service = connect(config)?;

    let refreshed = if cmd.json {
        let view = Arc::new(MemoryView::new());
        let recent = RecentResults::new(service, view.clone(), config.recent.limit);
        let refreshed = recent.refresh().await;
        if refreshed.is_some() && !quiet {
            println!("{}", serde_json::to_string_pretty(&view.snapshot().recent)?);
        }
        refreshed
    } else {
        let view = Arc::new(TerminalView::stdout().with_quiet(quiet));
        let recent = RecentResults::new(service, view, config.recent.limit);
        let refreshed = recent.refresh().await;
        if refreshed == Some(0) && !quiet {
            println!("No previous results.");
        }
        refreshed
    };

    Ok(match refreshed {
        Some(_) => ExitCode::SUCCESS,
        None => {
            eprintln!("Could not list recent results from {}", config.server.base_url);
            ExitCode::FAILURE
        }
    })
}

async fn handle_download(
    config: &Config,
    cmd: &DownloadCommand,
    quiet: bool,
) -> anyhow::Result<ExitCode> {
    let service = connect(config)?;
    let bytes = service
        .download(&cmd.url)
        .await
        .with_context(|| format!("downloading {}", cmd.url))?;

    let path = cmd.output_path();
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    if !quiet {
        println!("Saved {} bytes to {}", bytes.len(), path.display());
    }
    Ok(ExitCode::SUCCESS)
}

async fn handle_ping(config: &Config, quiet: bool) -> anyhow::Result<ExitCode> {
    let service = connect(config)?;
    let message = service
        .welcome()
        .await
        .with_context(|| format!("contacting {}", config.server.base_url))?;
    if !quiet {
        println!("{message}");
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<ExitCode> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Base URL:           {}", config.server.base_url);
                println!("  Upload path:        {}", config.server.upload_path);
                println!("  Images path:        {}", config.server.images_path);
                println!("  File field:         {}", config.server.file_field);
                println!(
                    "  Request timeout:    {}s",
                    config.server.request_timeout_secs
                );
                println!(
                    "  Connect timeout:    {}s",
                    config.server.connect_timeout_secs
                );
                println!();
                println!("[Upload]");
                match config.upload.quality {
                    Some(quality) => println!("  Quality:            {quality}"),
                    None => println!("  Quality:            server default"),
                }
                println!("  Refresh delay:      {}ms", config.upload.refresh_delay_ms);
                println!();
                println!("[Recent]");
                println!("  Limit:              {}", config.recent.limit);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => {
                    println!("Configuration error: {e}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
