//! `studio` - LinkedIn content studio in the terminal
//!
//! Collects a topic, tone and image style, hands them to hosted AI agents,
//! and prints the post and image they produce while streaming the agents'
//! activity.

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use console::Style;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::cli::{Cli, Commands, ConfigCommand, FormArgs};
use studio_core::config::Config;
use studio_core::logger;
use studio_core::output::OutputFormatter;
use studio_core::studio::{
    copy_to_clipboard, download_image, ActionState, ContentForm, Outcome, Studio,
};
use studio_core::{HttpAgentInvoker, WebSocketTransport};

mod cli;

type LiveStudio = Studio<HttpAgentInvoker, WebSocketTransport>;

/// Extra wait on top of the disconnect grace before giving up on the stream
const STREAM_SETTLE_SLACK: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        let blue = Style::new().blue();
        println!(
            "{} v{} ({})",
            blue.apply_to("studio"),
            env!("CARGO_PKG_VERSION"),
            env!("GIT_HASH")
        );
        return Ok(());
    }

    if let Some(dir) = Config::data_dir() {
        logger::init(dir);
    }

    let formatter = OutputFormatter::new();
    let config_path = cli.config.clone().or_else(Config::default_path);

    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Generate {
            form,
            copy,
            save_image,
            strict,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if *strict {
                config.strict_decoding = true;
            }
            let studio = build_studio(&config, form)?;
            let outcome = run_generate(&studio, &config, &formatter).await;
            finish(&studio, &formatter, outcome)?;
            export(&studio, &formatter, *copy, save_image.as_deref()).await?;
        }

        Commands::Post { form, copy } => {
            let config = load_config(cli.config.as_deref())?;
            let studio = build_studio(&config, form)?;
            let outcome = run_action(&studio, &formatter, ActionState::RegeneratingPost).await;
            finish(&studio, &formatter, outcome)?;
            export(&studio, &formatter, *copy, None).await?;
        }

        Commands::Image { form, save_image } => {
            let config = load_config(cli.config.as_deref())?;
            let studio = build_studio(&config, form)?;
            let outcome = run_action(&studio, &formatter, ActionState::RegeneratingImage).await;
            finish(&studio, &formatter, outcome)?;
            export(&studio, &formatter, false, save_image.as_deref()).await?;
        }

        Commands::Sample => {
            let config = load_config(cli.config.as_deref())?;
            let studio = LiveStudio::from_config(&config)?;
            studio.load_sample()?;
            let form = studio.form();
            println!(
                "{} {}",
                Style::new().bold().apply_to("Topic:"),
                form.topic
            );
            println!("Tone: {}  Style: {}", form.tone, form.style);
            formatter.print_content(&studio.content());
        }

        Commands::Config { cmd } => {
            handle_config(cmd.as_ref(), cli.config.as_deref(), config_path.as_deref())?;
        }

        Commands::Logs { lines } => {
            let Some(dir) = Config::data_dir() else {
                bail!("No data directory available on this platform");
            };
            let path = logger::log_file(&dir);
            let tail = logger::tail_file(&path, *lines)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            if tail.is_empty() {
                println!("No log entries in {}", path.display());
            }
            for line in tail {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = Config::load_or_default(path).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn build_studio(config: &Config, form: &FormArgs) -> Result<LiveStudio> {
    let studio = LiveStudio::from_config(config)?;
    studio.set_form(ContentForm::new(form.topic.clone(), form.tone, form.style));
    Ok(studio)
}

/// Print activity events as they arrive until aborted.
fn spawn_event_printer(studio: &LiveStudio) -> JoinHandle<()> {
    let mut events = studio.stream().subscribe();
    tokio::spawn(async move {
        let formatter = OutputFormatter::new();
        loop {
            match events.recv().await {
                Ok(event) => formatter.print_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    studio_core::warn_log!("Activity printer skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

async fn run_generate(
    studio: &LiveStudio,
    config: &Config,
    formatter: &OutputFormatter,
) -> studio_core::Result<Outcome> {
    let printer = spawn_event_printer(studio);
    let outcome = run_action(studio, formatter, ActionState::Generating).await;

    // Late events keep arriving until the grace disconnect
    let mut status = studio.stream().watch_status();
    let settle = config.stream.disconnect_grace() + STREAM_SETTLE_SLACK;
    let _ = tokio::time::timeout(settle, status.wait_for(|s| !s.is_live())).await;
    printer.abort();

    outcome
}

async fn run_action(
    studio: &LiveStudio,
    formatter: &OutputFormatter,
    action: ActionState,
) -> studio_core::Result<Outcome> {
    formatter.print_action(action);
    let running = async {
        match action {
            ActionState::Generating => studio.generate().await,
            ActionState::RegeneratingPost => studio.regenerate_post().await,
            ActionState::RegeneratingImage => studio.regenerate_image().await,
            ActionState::Idle => Ok(Outcome::default()),
        }
    };

    tokio::select! {
        outcome = running => outcome,
        _ = tokio::signal::ctrl_c() => {
            studio_core::warn_log!("{} interrupted", action);
            eprintln!();
            std::process::exit(130);
        }
    }
}

fn finish(
    studio: &LiveStudio,
    formatter: &OutputFormatter,
    outcome: studio_core::Result<Outcome>,
) -> Result<()> {
    match outcome {
        Ok(outcome) => {
            if !outcome.updated {
                formatter.print_error("The agent returned no content.");
            }
            formatter.print_content(&studio.content());
            Ok(())
        }
        Err(err) => {
            if err.is_retryable() {
                match err.retry_delay() {
                    Some(delay) => println!(
                        "Wait {}s, then run the command again to retry.",
                        delay.as_secs()
                    ),
                    None => println!("Run the command again to retry."),
                }
            }
            let message = err.user_message();
            Err(anyhow::Error::new(err).context(message))
        }
    }
}

async fn export(
    studio: &LiveStudio,
    formatter: &OutputFormatter,
    copy: bool,
    save_image: Option<&Path>,
) -> Result<()> {
    let content = studio.content();

    if copy {
        match content.post.as_deref().filter(|p| !p.is_empty()) {
            Some(post) => match copy_to_clipboard(post) {
                Ok(()) => formatter.print_success("Copied post to clipboard"),
                Err(err) => formatter.print_error(&err.to_string()),
            },
            None => formatter.print_error("No post to copy"),
        }
    }

    if let Some(path) = save_image {
        let Some(url) = content.image_url.as_deref().filter(|u| !u.is_empty()) else {
            formatter.print_error("No image to save");
            return Ok(());
        };
        let written = download_image(studio.invoker().http_client(), url, path)
            .await
            .with_context(|| format!("Failed to save image to {}", path.display()))?;
        formatter.print_success(&format!(
            "Saved image to {} ({} bytes)",
            path.display(),
            written
        ));
    }

    Ok(())
}

fn handle_config(
    cmd: Option<&ConfigCommand>,
    explicit: Option<&Path>,
    path: Option<&Path>,
) -> Result<()> {
    match cmd.unwrap_or(&ConfigCommand::Show) {
        ConfigCommand::Show => {
            let mut config = Config::load_or_default(explicit)?;
            if config.backend.api_key.is_some() {
                config.backend.api_key = Some("********".to_string());
            }
            print!("{}", config.to_toml()?);
        }
        ConfigCommand::Path => match path {
            Some(path) => println!("{}", path.display()),
            None => bail!("No configuration directory available on this platform"),
        },
        ConfigCommand::Init { force } => {
            let Some(path) = path.map(PathBuf::from) else {
                bail!("No configuration directory available on this platform");
            };
            if path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }
    Ok(())
}
