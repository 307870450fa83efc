//! trackobot - uploads Hearthstone match results to a Track-o-Bot profile
//!
//! This tool provides commands for:
//! - Running the upload pipeline on observer output
//! - Setting up an account and opening the web profile
//! - Inspecting results that are waiting for upload
//!
//! Uses XDG Base Directory specification for file locations:
//! - Settings: $XDG_DATA_HOME/trackobot/settings.db (~/.local/share/trackobot/settings.db)
//! - Config: $XDG_CONFIG_HOME/trackobot/config.toml (~/.config/trackobot/config.toml)
//! - Logs: $XDG_STATE_HOME/trackobot/ (~/.local/state/trackobot/)

mod observer;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use trackobot_core::queue::peek_persisted;
use trackobot_core::settings::{self, keys, Credentials, SettingsStore, DEFAULT_WEBSERVICE_URL};
use trackobot_core::{logging, Account, Config, Pipeline, PipelineEvent, PipelineOptions, WebProfile};

#[derive(Parser)]
#[command(name = "trackobot")]
#[command(about = "Upload Hearthstone match results to a Track-o-Bot profile")]
#[command(version)]
struct Args {
    /// Also print log output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload results reported by the observer until interrupted
    Run {
        /// Read observer messages from FILE instead of stdin
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Make sure an account exists and show it
    Account,

    /// Print a one-time login link for the web profile
    Profile,

    /// Show configuration, account and queue status
    Status,

    /// List results waiting for upload
    Queue,

    /// Point the client at a different profile service
    SetUrl {
        /// Base URL, e.g. https://trackobot.com
        url: String,
    },
}

type Settings = Arc<dyn SettingsStore>;

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard =
        logging::init(&config.logging, args.verbose).context("failed to initialize logging")?;

    tracing::info!(command = ?args.command, "trackobot starting");

    let settings = settings::open_or_memory(&Config::settings_path(), &config.settings.namespace);

    match args.command {
        Command::Run { input } => cmd_run(&config, settings, input),
        Command::Account => cmd_account(&config, settings),
        Command::Profile => cmd_profile(&config, settings),
        Command::Status => cmd_status(&config, &*settings),
        Command::Queue => cmd_queue(&*settings),
        Command::SetUrl { url } => cmd_set_url(&*settings, &url),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")
}

fn profile_client(config: &Config, settings: &Settings) -> Result<Arc<WebProfile<dyn SettingsStore>>> {
    let client = WebProfile::new(Arc::clone(settings), &config.service)
        .context("failed to create profile client")?;
    Ok(Arc::new(client))
}

fn cmd_run(config: &Config, settings: Settings, input: Option<PathBuf>) -> Result<()> {
    let reader: Box<dyn BufRead + Send> = match &input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open observer input {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    let runtime = runtime()?;
    let api = profile_client(config, &settings)?;

    runtime.block_on(async {
        let (pipeline, mut events) =
            Pipeline::new(settings, api, PipelineOptions::from_config(config));
        let (handle, task) = pipeline.spawn();
        handle.ensure_account()?;

        let interrupt = handle.clone();
        ctrlc::set_handler(move || {
            eprintln!("\nShutting down...");
            let _ = interrupt.shutdown();
        })
        .context("failed to set Ctrl-C handler")?;

        // A plain thread: a pending stdin read must not hold up shutdown
        let observer_handle = handle.clone();
        std::thread::spawn(move || {
            if let Err(e) = observer::forward(reader, &observer_handle) {
                tracing::error!(error = %format!("{:#}", e), "Observer input failed");
            }
        });

        let printer = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    PipelineEvent::AccountCreated => println!("Account created"),
                    PipelineEvent::ResultUploaded(id) => println!("Result {} uploaded", id),
                    PipelineEvent::ProfileUrl(url) => println!("{}", url),
                }
            }
        });

        println!("Waiting for results (Ctrl-C to stop)...");
        task.await.context("pipeline task failed")?;
        printer.abort();
        Ok::<_, anyhow::Error>(())
    })?;

    // Uploads still in flight are dropped with the runtime; their results
    // are not in the saved queue.
    runtime.shutdown_background();
    println!("Stopped.");
    Ok(())
}

fn cmd_account(config: &Config, settings: Settings) -> Result<()> {
    let api = profile_client(config, &settings)?;
    let account = Account::new(settings, api);

    let credentials = match account.credentials()? {
        Some(credentials) => credentials,
        None => {
            println!("No account found, creating one...");
            runtime()?
                .block_on(account.register())
                .context("failed to create an account")?
        }
    };

    println!("Account: {}", credentials.username);
    Ok(())
}

fn cmd_profile(config: &Config, settings: Settings) -> Result<()> {
    let api = profile_client(config, &settings)?;
    let account = Account::new(settings, api);
    if !account.is_set_up() {
        bail!("no account set up yet; run 'trackobot account' first");
    }

    let url = runtime()?
        .block_on(account.profile_url())
        .context("failed to get a login link from the profile service")?;
    println!("{}", url);
    Ok(())
}

fn cmd_status(config: &Config, settings: &dyn SettingsStore) -> Result<()> {
    println!("Track-o-Bot Status");
    println!("==================");
    println!();

    println!("Config file:     {}", Config::config_path().display());
    println!("Settings:        {}", Config::settings_path().display());
    println!("Logs:            {}", logging::log_dir().display());
    println!();

    let url = settings
        .get_string(keys::WEBSERVICE_URL)?
        .filter(|url| !url.is_empty());
    match url {
        Some(url) => println!("Service URL:     {}", url),
        None => println!("Service URL:     {} (default)", DEFAULT_WEBSERVICE_URL),
    }

    match Credentials::load(settings)? {
        Some(credentials) => println!("Account:         {}", credentials.username),
        None => println!("Account:         <not set>"),
    }

    let pending = peek_persisted(settings).context("failed to read saved results")?;
    println!("Pending results: {}", pending.len());
    println!();

    let queue = &config.queue;
    println!("Check period:    {}s", queue.check_period_secs);
    println!("Upload period:   {}s", queue.upload_period_secs);
    println!("Requeue:         {:?}", queue.requeue);
    println!("Timeout:         {}s", config.service.timeout_secs);

    Ok(())
}

fn cmd_queue(settings: &dyn SettingsStore) -> Result<()> {
    let pending = peek_persisted(settings).context("failed to read saved results")?;

    if pending.is_empty() {
        println!("No results waiting for upload");
        return Ok(());
    }

    println!("{} result(s) waiting for upload:", pending.len());
    for (index, result) in pending.iter().enumerate() {
        println!(
            "{:>3}. {:<12} {:<7} {} vs. {} ({}, {} cards) [{}]",
            index + 1,
            result.mode.as_str(),
            if result.win { "win" } else { "loss" },
            result.hero.as_str(),
            result.opponent.as_str(),
            if result.coin { "coin" } else { "first" },
            result.card_history.len(),
            result.fingerprint()
        );
    }

    Ok(())
}

fn cmd_set_url(settings: &dyn SettingsStore, url: &str) -> Result<()> {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("service URL must start with http:// or https://, got {:?}", url);
    }

    settings::set_service_url(settings, url).context("failed to store service URL")?;
    println!("Service URL set to {}", url.trim_end_matches('/'));
    Ok(())
}
