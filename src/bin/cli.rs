use anyhow::{anyhow, Context, Result};
use circuit_spotify as lib;
use clap::{Parser, Subcommand};
use lib::api::http::HttpTransport;
use lib::config::Settings;
use lib::models::NowPlaying;
use lib::nvm::FileNvm;
use lib::{ApiClient, TokenClient, TokenStore};
use std::path::PathBuf;
use std::time::Duration;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "circuit-spotify", version)]
struct Cli {
    /// Path to settings TOML (CIRCUITSPOTIFY_* keys)
    #[arg(long, value_name = "FILE", default_value = "settings.toml")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the authorization URL to open in a browser
    AuthUrl,
    /// Exchange an authorization code for tokens and store them
    Exchange {
        /// Code from the redirect URL; defaults to CIRCUITSPOTIFY_CODE
        #[arg(long)]
        code: Option<String>,
    },
    /// Refresh the access token with the stored refresh token
    Refresh,
    /// Show the currently playing track
    NowPlaying {
        /// Print the raw JSON response
        #[arg(long)]
        raw: bool,
    },
    /// Print the stored tokens
    Tokens,
    /// Zero the whole NVM region (development only)
    Wipe {
        #[arg(long)]
        confirm: bool,
    },
    /// Validate settings and exit
    ConfigValidate,
}

type Client = ApiClient<HttpTransport, FileNvm>;

fn build_client(settings: &Settings) -> Result<Client> {
    let transport = match settings.timeout_secs {
        Some(secs) => HttpTransport::with_timeout(Duration::from_secs(secs))?,
        None => HttpTransport::new(),
    };
    let nvm = FileNvm::open(&settings.nvm_path, settings.nvm_size)
        .with_context(|| format!("opening nvm file {}", settings.nvm_path.display()))?;
    let tokens = TokenClient::new(
        transport,
        TokenStore::new(nvm),
        settings.credentials()?,
        settings.endpoints(),
        &settings.scope_list()?,
    );
    Ok(ApiClient::new(tokens))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(Some(cli.settings.as_path()))?;

    // Logs go to stdout and, when a log dir is configured, a daily file.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (file_layer, _guard) = match &settings.log_dir {
        Some(dir) => {
            let appender: RollingFileAppender = tracing_appender::rolling::daily(dir, "circuit-spotify.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(non_blocking)), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(fmt::layer().with_writer(std::io::stdout))
        .try_init()
        .context("installing tracing subscriber")?;

    match cli.command {
        Commands::AuthUrl => {
            println!("{}", settings.auth_url()?);
        }
        Commands::Exchange { code } => {
            let mut client = build_client(&settings)?;
            let tokens = client.tokens_mut();
            match code {
                Some(code) => tokens.exchange(&code)?,
                None => tokens.exchange_configured_code()?,
            }
            println!("Tokens saved to {}", settings.nvm_path.display());
        }
        Commands::Refresh => {
            let mut client = build_client(&settings)?;
            client.tokens_mut().refresh()?;
            println!("Access token refreshed");
        }
        Commands::NowPlaying { raw } => {
            let mut client = build_client(&settings)?;
            if raw {
                let data = client.get_currently_playing()?;
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                match client.now_playing()? {
                    NowPlaying::Playing(cp) => match cp.item {
                        Some(track) => {
                            let state = if cp.is_playing { "playing" } else { "paused" };
                            println!("[{}] {}", state, track.summary());
                        }
                        None => println!("Playing {}", cp.currently_playing_type.unwrap_or_default()),
                    },
                    NowPlaying::Nothing { details, .. } => println!("Nothing playing ({})", details),
                    NowPlaying::Error(e) => {
                        return Err(anyhow!("Spotify API error {:?}: {}", e.status, e.message));
                    }
                }
            }
        }
        Commands::Tokens => {
            let client = build_client(&settings)?;
            let record = client.tokens().store().read()?;
            println!("access_token: {}", record.access_token);
            println!("refresh_token: {}", record.refresh_token);
        }
        Commands::Wipe { confirm } => {
            if !confirm {
                eprintln!("Refusing to wipe without --confirm: this zeroes the whole NVM region.");
                std::process::exit(2);
            }
            let mut client = build_client(&settings)?;
            client.tokens_mut().store_mut().wipe()?;
            println!("Wiped {}", settings.nvm_path.display());
        }
        Commands::ConfigValidate => match settings.validate() {
            Ok(()) => println!("OK"),
            Err(e) => {
                eprintln!("Config validation failed: {:#}", e);
                std::process::exit(2);
            }
        },
    }

    Ok(())
}
