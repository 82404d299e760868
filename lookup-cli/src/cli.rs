use anyhow::{Context, Result, anyhow};
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{InquireError, Text, validator::ValueRequiredValidator};
use std::{fs, io};

use weather_lookup_core::{
    Config, FormController, FormField, HttpWeatherClient, SubmissionResult, WeatherLookup,
    render_payload,
};

const ID_PLACEHOLDER: &str = "Please input an ID";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-lookup", version, about = "Weather Data Lookup")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the weather service URL.
    Configure,

    /// Retrieve the weather data stored under an ID.
    Lookup {
        /// ID of the stored weather record.
        id: String,

        /// Weather service URL; overrides the configured one.
        #[arg(long)]
        server: Option<String>,

        /// Print the raw JSON payload instead of the formatted weather.
        #[arg(long)]
        raw: bool,
    },

    /// Interactive lookup form. Esc or Ctrl-C leaves.
    Form {
        /// Weather service URL; overrides the configured one.
        #[arg(long)]
        server: Option<String>,
    },

    /// Format a stored weather payload read from a file, or `-` for stdin.
    Render {
        input: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Lookup { id, server, raw } => lookup(id, server.as_deref(), raw).await,
            Command::Form { server } => form(server.as_deref()).await,
            Command::Render { input } => render_input(&input),
        }
    }
}

fn resolve_client(server: Option<&str>) -> Result<HttpWeatherClient> {
    let config = match server {
        Some(url) => {
            let mut cfg = Config::default();
            cfg.set_server_url(url)?;
            cfg
        }
        None => Config::load()?,
    };

    let client = HttpWeatherClient::from_config(&config);
    tracing::debug!("Using weather service at {}", client.base_url());

    Ok(client)
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;
    let current = config.server_url().to_string();

    let url = Text::new("Weather service URL:")
        .with_default(&current)
        .prompt()
        .context("Failed to read weather service URL")?;

    config.set_server_url(&url)?;
    config.save()?;

    println!(
        "Saved weather service URL {} to {}",
        config.server_url(),
        Config::config_file_path()?.display()
    );

    Ok(())
}

async fn lookup(id: String, server: Option<&str>, raw: bool) -> Result<()> {
    let mut form = FormController::new(resolve_client(server)?);
    form.on_input_change(FormField::Id.as_str(), id)?;

    let result = form.submit().await?;
    if !result.success {
        return Err(anyhow!(result.message));
    }

    print_success(&result, raw);
    Ok(())
}

async fn form(server: Option<&str>) -> Result<()> {
    let client = resolve_client(server)?;

    println!("Weather Data Lookup");
    println!("Submit an ID to retrieve stored weather data from {}.", client.base_url());

    let mut form = FormController::new(client);

    loop {
        let initial = form.form().get(FormField::Id).to_string();
        let prompt = Text::new(&format!("{}:", FormField::Id.as_str()))
            .with_placeholder(ID_PLACEHOLDER)
            .with_initial_value(&initial)
            .with_validator(ValueRequiredValidator::new(ID_PLACEHOLDER))
            .prompt();

        let value = match prompt {
            Ok(value) => value,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e).context("Failed to read ID"),
        };

        form.on_input_change(FormField::Id.as_str(), value)?;

        let id = form.begin_submit()?;
        println!("{}", form.button_label());
        let outcome = form.lookup().fetch(&id).await;
        let result = form.finish(outcome)?;

        if result.success {
            print_success(&result, false);
        } else {
            let at = result.completed_at.with_timezone(&Local).format("%H:%M:%S");
            eprintln!("[{at}] {}", result.message);
        }

        form.dismiss();
    }

    Ok(())
}

fn render_input(input: &str) -> Result<()> {
    let raw = if input == "-" {
        io::read_to_string(io::stdin()).context("Failed to read weather payload from stdin")?
    } else {
        fs::read_to_string(input)
            .with_context(|| format!("Failed to read weather payload: {input}"))?
    };

    println!("{}", render_payload(&raw));
    Ok(())
}

fn print_success(result: &SubmissionResult, raw: bool) {
    let Some(payload) = result.payload.as_deref() else {
        println!("{}", result.message);
        return;
    };

    if raw {
        println!("{payload}");
    } else {
        println!("{}", result.message);
        println!();
        println!("{}", render_payload(payload));
    }
}
