use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use music_discovery::catalog::{build_provider, ProviderKind, Track};
use music_discovery::config::{AppConfig, CliConfig, FileConfig};
use music_discovery::onboarding::OnboardingOrchestrator;
use music_discovery::playlist::{
    query::parse_date, ListQuery, NewOwnedTrack, OwnedTrackStore, RawListParams, SqliteTrackStore,
};
use music_discovery::preferences::{
    PreferenceSource, PreferenceStatus, PreferenceStore, SqliteDiscoveryStore, UserStore,
};
use music_discovery::recommendation::RecommendationGenerator;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "discovery-cli", about = "Music discovery from the command line")]
struct CliArgs {
    /// Directory holding discovery.db and playlist.db.
    #[clap(long, env = "DISCOVERY_DB_DIR", value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Path to a TOML config file. Its values override command line arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Catalog provider to query.
    #[clap(long, value_enum, default_value_t = ProviderKind::Deezer)]
    pub provider: ProviderKind,

    /// Overrides the provider's public API endpoint.
    #[clap(long)]
    pub base_url: Option<String>,

    /// Client id for the Jamendo API.
    #[clap(long, env = "JAMENDO_CLIENT_ID")]
    pub jamendo_client_id: Option<String>,

    /// Timeout in seconds for each provider request.
    #[clap(long, default_value_t = 10)]
    pub request_timeout_sec: u64,

    /// Retry a timed-out provider request once.
    #[clap(long)]
    pub retry_on_timeout: bool,

    #[command(subcommand)]
    command: Command,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            provider: self.provider,
            base_url: self.base_url.clone(),
            jamendo_client_id: self.jamendo_client_id.clone(),
            request_timeout_sec: self.request_timeout_sec,
            retry_on_timeout: self.retry_on_timeout,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates a user with the given handle.
    CreateUser { handle: String },

    /// Shows a user and their onboarding progress.
    Profile {
        #[clap(long)]
        user: String,
    },

    /// Searches the catalog.
    Search {
        query: String,
        #[clap(long, default_value_t = 10)]
        limit: usize,
    },

    /// Fetches a batch of random tracks to vote on during onboarding.
    Onboarding {
        #[clap(long)]
        user: String,
        #[clap(long, default_value_t = 10)]
        count: usize,
    },

    /// Records a like or dislike for a catalog track.
    Vote {
        #[clap(long)]
        user: String,
        #[clap(long)]
        track_id: String,
        #[clap(long)]
        title: String,
        #[clap(long)]
        artist: String,
        #[clap(long)]
        artist_id: Option<String>,
        #[clap(long)]
        audio_url: Option<String>,
        #[clap(long)]
        image_url: Option<String>,
        #[clap(long, value_enum)]
        status: PreferenceStatus,
        #[clap(long, value_enum, default_value = "home")]
        source: PreferenceSource,
    },

    /// Recommends tracks based on the artists the user liked.
    Recommend {
        #[clap(long)]
        user: String,
        #[clap(long, default_value_t = 10)]
        limit: usize,
    },

    /// Adds a track to a user's own playlist.
    AddTrack {
        #[clap(long)]
        owner: String,
        #[clap(long)]
        title: String,
        #[clap(long)]
        artist: String,
        #[clap(long)]
        url: Option<String>,
        /// Creation date, RFC 3339 or YYYY-MM-DD. Defaults to now.
        #[clap(long)]
        created: Option<String>,
    },

    /// Lists owned tracks with filtering, sorting and pagination.
    ListTracks {
        #[clap(long)]
        page: Option<String>,
        #[clap(long)]
        limit: Option<String>,
        /// createdAt, title or artist
        #[clap(long)]
        sort_by: Option<String>,
        /// asc or desc
        #[clap(long)]
        sort_order: Option<String>,
        #[clap(long)]
        title: Option<String>,
        #[clap(long)]
        artist: Option<String>,
        /// Only tracks owned by this user.
        #[clap(long)]
        owner: Option<String>,
        #[clap(long)]
        created_from: Option<String>,
        #[clap(long)]
        created_to: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn resolve_user(store: &SqliteDiscoveryStore, handle: &str) -> Result<usize> {
    store
        .get_user_id(handle)?
        .with_context(|| format!("User '{}' not found", handle))
}

async fn run(command: Command, config: &AppConfig) -> Result<()> {
    let discovery_store = Arc::new(SqliteDiscoveryStore::new(config.discovery_db_path())?);

    match command {
        Command::CreateUser { handle } => {
            if handle.trim().is_empty() {
                bail!("The user handle cannot be empty.");
            }
            if discovery_store.get_user_id(&handle)?.is_some() {
                bail!("User handle already exists.");
            }
            let user_id = discovery_store.create_user(&handle)?;
            print_json(&discovery_store.get_user(user_id)?)
        }
        Command::Profile { user } => {
            let user_id = resolve_user(&discovery_store, &user)?;
            let catalog = build_provider(&config.catalog)?;
            let onboarding = OnboardingOrchestrator::new(catalog, discovery_store.clone());
            print_json(&serde_json::json!({
                "user": discovery_store.get_user(user_id)?,
                "onboarding": onboarding.status(user_id)?,
            }))
        }
        Command::Search { query, limit } => {
            let catalog = build_provider(&config.catalog)?;
            print_json(&catalog.search(&query, limit).await?)
        }
        Command::Onboarding { user, count } => {
            let user_id = resolve_user(&discovery_store, &user)?;
            let catalog = build_provider(&config.catalog)?;
            let onboarding = OnboardingOrchestrator::new(catalog, discovery_store.clone());
            print_json(&onboarding.get_batch(user_id, count).await?)
        }
        Command::Vote {
            user,
            track_id,
            title,
            artist,
            artist_id,
            audio_url,
            image_url,
            status,
            source,
        } => {
            let user_id = resolve_user(&discovery_store, &user)?;
            let track = Track {
                provider_track_id: track_id,
                title,
                artist,
                artist_id,
                audio_url,
                image_url,
            };
            let outcome = discovery_store
                .upsert_signal(user_id, &track, status, source)?
                .with_context(|| format!("User '{}' not found", user))?;
            print_json(&outcome)
        }
        Command::Recommend { user, limit } => {
            let user_id = resolve_user(&discovery_store, &user)?;
            let catalog = build_provider(&config.catalog)?;
            let generator = RecommendationGenerator::new(
                catalog,
                discovery_store.clone(),
                config.recommendations.clone(),
            );
            print_json(&generator.generate(user_id, limit).await?)
        }
        Command::AddTrack {
            owner,
            title,
            artist,
            url,
            created,
        } => {
            let owner_id = resolve_user(&discovery_store, &owner)?;
            if title.trim().is_empty() || artist.trim().is_empty() {
                bail!("Title and artist cannot be empty.");
            }
            let created = match created {
                Some(date) => Some(
                    parse_date(&date).with_context(|| format!("Invalid creation date: {}", date))?,
                ),
                None => None,
            };
            let track_store = SqliteTrackStore::new(config.playlist_db_path())?;
            print_json(&track_store.create_track(NewOwnedTrack {
                title: title.trim().to_string(),
                artist: artist.trim().to_string(),
                url,
                owner_id,
                created,
            })?)
        }
        Command::ListTracks {
            page,
            limit,
            sort_by,
            sort_order,
            title,
            artist,
            owner,
            created_from,
            created_to,
        } => {
            let owner_id = match owner {
                Some(handle) => Some(resolve_user(&discovery_store, &handle)?),
                None => None,
            };
            let query = ListQuery::from(RawListParams {
                page,
                limit,
                sort_by,
                sort_order,
                title,
                artist,
                owner_id,
                created_from,
                created_to,
            });
            debug!(?query, "Listing owned tracks");
            let track_store = SqliteTrackStore::new(config.playlist_db_path())?;
            print_json(&track_store.list_tracks(&query)?)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    run(cli_args.command, &config).await
}
