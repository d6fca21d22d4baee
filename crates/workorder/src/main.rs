//! `workorder` - CLI for the work-order assistant
//!
//! This binary runs the web service and provides maintenance commands for the
//! generated-document registry.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use clap::Parser;

use workorder::cli::{Cli, Command, ConfigCommand, FilesCommand, RenderCommand, SweepCommand};
use workorder::document::Renderer;
use workorder::logo::{order_logo, Logo};
use workorder::order::{CollectedOrder, WorkOrder};
use workorder::{init_logging, janitor, server, Config, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let mut config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Serve(serve_cmd) => {
            if let Some(bind) = serve_cmd.bind {
                config.server.bind = bind;
            }
            config.validate()?;
            server::serve(config).await?;
        }
        Command::Sweep(sweep_cmd) => handle_sweep(&config, &sweep_cmd)?,
        Command::Files(files_cmd) => handle_files(&config, &files_cmd)?,
        Command::Render(render_cmd) => handle_render(&config, &render_cmd)?,
        Command::Config(config_cmd) => handle_config(&config, config_cmd)?,
    }
    Ok(())
}

fn handle_sweep(config: &Config, cmd: &SweepCommand) -> anyhow::Result<()> {
    let max_age = cmd
        .max_age_secs
        .map_or_else(|| config.max_file_age(), Duration::from_secs);
    let storage = Storage::open(config.database_path())?;
    let report = janitor::sweep(&storage, &config.output_dir(), max_age);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Sweep of {} (max age {}s)", config.output_dir().display(), max_age.as_secs());
        println!("  {report}");
    }
    Ok(())
}

fn handle_files(config: &Config, cmd: &FilesCommand) -> anyhow::Result<()> {
    let storage = Storage::open(config.database_path())?;
    let files = storage.list()?;
    let output_dir = config.output_dir();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    if files.is_empty() {
        println!("No generated files.");
        return Ok(());
    }

    println!("{:<6} {:<20} {:<8} FILE", "ID", "CREATED (UTC)", "ON DISK");
    for file in &files {
        let on_disk = if output_dir.join(&file.filename).is_file() {
            "yes"
        } else {
            "no"
        };
        println!(
            "{:<6} {:<20} {:<8} {}",
            file.id,
            file.created_at.format("%Y-%m-%d %H:%M:%S"),
            on_disk,
            file.filename
        );
    }
    println!();
    println!("{} file(s) in {}", files.len(), output_dir.display());
    Ok(())
}

fn handle_render(config: &Config, cmd: &RenderCommand) -> anyhow::Result<()> {
    config.validate()?;

    let json = std::fs::read_to_string(&cmd.input)
        .with_context(|| format!("failed to read {}", cmd.input.display()))?;
    let collected: CollectedOrder = serde_json::from_str(&json)
        .with_context(|| format!("{} is not a collected order", cmd.input.display()))?;

    let logo = match &cmd.logo {
        Some(path) => Some(
            Logo::from_file(path).with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None => order_logo(&collected.oficina.logo_data_base64),
    };

    let order = WorkOrder::finalize(collected, Local::now().naive_local());
    let bytes = Renderer::from_config(&config.document).render(&order, logo.as_ref())?;
    std::fs::write(&cmd.output, &bytes)
        .with_context(|| format!("failed to write {}", cmd.output.display()))?;

    println!(
        "Rendered {} ({} bytes) to {}",
        order.numero_os,
        bytes.len(),
        cmd.output.display()
    );
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let mut shown = config.clone();
            if shown.llm.api_key.is_some() {
                shown.llm.api_key = Some("********".to_string());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind:               {}", shown.server.bind);
                println!("  Max body (bytes):   {}", shown.server.max_body_bytes);
                println!();
                println!("[LLM]");
                println!("  Base URL:           {}", shown.llm.base_url);
                println!("  Model:              {}", shown.llm.model);
                println!(
                    "  API key:            {}",
                    shown.llm.api_key.as_deref().unwrap_or("(not set)")
                );
                println!("  Max tokens:         {}", shown.llm.max_tokens);
                println!("  Temperature:        {}", shown.llm.temperature);
                println!("  Timeout (secs):     {}", shown.llm.timeout_secs);
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", shown.database_path().display());
                println!("  Output dir:         {}", shown.output_dir().display());
                println!();
                println!("[Cleanup]");
                println!("  Enabled:            {}", shown.cleanup.enabled);
                println!("  Interval (secs):    {}", shown.cleanup.interval_secs);
                println!("  Max age (secs):     {}", shown.cleanup.max_age_secs);
                println!();
                println!("[Document]");
                match &shown.document.font_path {
                    Some(path) => println!("  Font:               {}", path.display()),
                    None => println!("  Font:               Helvetica (built-in)"),
                }
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)).and_then(|c| c.validate()) {
                Ok(()) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
