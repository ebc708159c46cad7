use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use iocraft::prelude::*;
use std::{
    io::{self, Write},
    path::PathBuf,
};
use url::Url;

use import_probe::config::{self, ConfigFile, DEFAULT_BASE_URL};
use import_probe::{Driver, RunOptions, client};

use crate::ui::{ConfigHeader, ErrorMessage, InputPrompt, SuccessMessage};

mod ui;

#[derive(Parser)]
#[command(name = "import-probe")]
#[command(version)]
#[command(about = "Probe which upload request shapes an import API accepts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate, open an import and try the upload variants
    Run {
        /// Files to upload; the first one is used for the single upload
        #[arg(value_hint = ValueHint::FilePath)]
        files: Vec<PathBuf>,
        /// Remote directory sent as the `path` field
        #[arg(short, long)]
        remote_path: Option<String>,
        /// Skip the array-style batch upload
        #[arg(long)]
        no_batch: bool,
        /// Ask the server to process the import afterwards
        #[arg(long)]
        process: bool,
    },
    /// Configure import-probe interactively
    Config,
    /// Store the OAuth client secret in the OS keyring
    SetSecret { client_secret: String },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let _rt_guard = rt.enter();
    clap_complete::CompleteEnv::with_factory(Cli::command).complete();
    let cli = Cli::parse();

    rt.block_on(async {
        match cli.command {
            Commands::Config => interactive_config(),
            Commands::SetSecret { client_secret } => {
                config::set_client_secret_keyring(client_secret)
            }
            Commands::Run {
                files,
                remote_path,
                no_batch,
                process,
            } => {
                let mut config = config::read_config()?;
                if !files.is_empty() {
                    config.target_files = files;
                }
                if let Some(remote_path) = remote_path {
                    config.remote_path = remote_path;
                }

                let options = RunOptions {
                    batch: !no_batch,
                    process_import: process,
                };
                let report = Driver::new(config).run(&options).await;
                ui::print_report(&report);
                Ok(())
            }
        }
    })
}

fn read_input(prompt: &str, default: Option<&str>, description: Option<&str>) -> Result<String> {
    element! {
        InputPrompt(
            prompt: prompt.to_string(),
            default: default.map(|s| s.to_string()),
            description: description.map(|s| s.to_string())
        )
    }
    .print();

    print!("> ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match default {
        Some(def) if input.is_empty() => def.to_string(),
        _ => input.to_string(),
    })
}

fn optional(input: String) -> Option<String> {
    if input.is_empty() { None } else { Some(input) }
}

fn interactive_config() -> Result<()> {
    element!(ConfigHeader()).print();

    let existing = config::read_config_file()?;

    let base_url_default = existing
        .base_url
        .as_ref()
        .map(|u| u.to_string())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base_url = loop {
        let base_url_str = read_input(
            "Base URL",
            Some(base_url_default.as_str()),
            Some("The base URL of the import API"),
        )?;

        match Url::parse(&base_url_str) {
            Ok(url) => break client::api_root(url),
            Err(e) => {
                element!(ErrorMessage(message: format!("Invalid URL: {}", e))).print();
                println!();
            }
        }
    };

    let client_id = loop {
        let client_id = read_input(
            "Client ID",
            existing.client_id.as_deref(),
            Some("OAuth client ID used for the password grant"),
        )?;

        if client_id.is_empty() {
            element!(ErrorMessage(message: "Client ID cannot be empty".to_string())).print();
            println!();
        } else {
            break client_id;
        }
    };

    let client_secret = read_input(
        "Client secret",
        None,
        Some("Optional: stored securely in the OS keyring, leave empty to keep the current one"),
    )?;

    let team_id = optional(read_input(
        "Team ID",
        existing.team_id.as_deref(),
        Some("Optional: skip the current team lookup and use this team"),
    )?);

    let target_files_str = read_input(
        "Target files",
        None,
        Some("Optional: comma-separated files to upload when none are given to `run`"),
    )?;
    let target_files = if target_files_str.is_empty() {
        existing.target_files
    } else {
        target_files_str
            .split(',')
            .map(|f| PathBuf::from(f.trim()))
            .collect()
    };

    if let Some(client_secret) = optional(client_secret) {
        config::set_client_secret_keyring(client_secret)?;
    }

    let config_file = ConfigFile {
        base_url: Some(base_url),
        client_id: Some(client_id),
        team_id,
        target_files,
        remote_path: existing.remote_path,
        insecure_tls: existing.insecure_tls,
    };

    let path = config::write_config(config_file)?;

    element!(SuccessMessage(message: format!("Configuration written to {}", path.display()))).print();

    Ok(())
}
