//! Application state wiring all services together.
//!
//! AppState holds the concrete pipeline instances used by both CLI and
//! REST API. The pipeline types are generic over repository/gateway
//! traits, but AppState pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;

use tattle_core::persona::ActorService;
use tattle_core::miner::StoryMiner;
use tattle_core::publisher::GossipPublisher;
use tattle_core::round::{RoundConfig, RoundEngine};
use tattle_infra::config::{load_config, resolve_data_dir};
use tattle_infra::credentials::RefreshingCredentialSource;
use tattle_infra::gateway::{HttpModelGateway, OAuthClient};
use tattle_infra::sqlite::actor::SqliteActorRepository;
use tattle_infra::sqlite::gossip::SqliteGossipRepository;
use tattle_infra::sqlite::interaction::SqliteInteractionRepository;
use tattle_infra::sqlite::message::SqliteMessageRepository;
use tattle_infra::sqlite::pool::DatabasePool;
use tattle_infra::sqlite::profile::SqliteProfileRepository;
use tattle_infra::sqlite::room::SqliteRoomRepository;
use tattle_infra::sqlite::story::SqliteStoryRepository;
use tattle_infra::sqlite::trend::SqliteTrendRepository;
use tattle_types::config::AppConfig;

/// Shared credential source / gateway handles. The pipeline engines each
/// hold one, so both live behind Arc.
pub type SharedCredentials = Arc<RefreshingCredentialSource<SqliteProfileRepository>>;
pub type SharedGateway = Arc<HttpModelGateway>;

/// Concrete type aliases for the pipeline generics pinned to infra
/// implementations.
pub type ConcreteRoundEngine = RoundEngine<
    SqliteRoomRepository,
    SqliteActorRepository,
    SqliteMessageRepository,
    SharedCredentials,
    SharedGateway,
>;

pub type ConcreteStoryMiner = StoryMiner<
    SqliteActorRepository,
    SqliteMessageRepository,
    SharedCredentials,
    SharedGateway,
>;

pub type ConcreteGossipPublisher = GossipPublisher<
    SqliteActorRepository,
    SqliteStoryRepository,
    SqliteGossipRepository,
    SqliteTrendRepository,
    SharedCredentials,
    SharedGateway,
>;

pub type ConcreteActorService = ActorService<SqliteProfileRepository, SqliteActorRepository>;

/// Shared application state holding the pipeline plus direct repository
/// handles for the read endpoints.
#[derive(Clone)]
pub struct AppState {
    pub round_engine: Arc<ConcreteRoundEngine>,
    pub miner: Arc<ConcreteStoryMiner>,
    pub publisher: Arc<ConcreteGossipPublisher>,
    pub actor_service: Arc<ConcreteActorService>,
    pub oauth: Arc<OAuthClient>,

    pub profiles: Arc<SqliteProfileRepository>,
    pub actors: Arc<SqliteActorRepository>,
    pub rooms: Arc<SqliteRoomRepository>,
    pub messages: Arc<SqliteMessageRepository>,
    pub stories: Arc<SqliteStoryRepository>,
    pub gossip: Arc<SqliteGossipRepository>,
    pub trends: Arc<SqliteTrendRepository>,
    pub interactions: Arc<SqliteInteractionRepository>,

    pub config: AppConfig,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to the DB, load config,
    /// wire the pipeline.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let db_url = format!("sqlite://{}?mode=rwc", data_dir.join("tattle.db").display());
        let db_pool = DatabasePool::new(&db_url).await?;

        let config = load_config(&data_dir).await;

        // OAuth app credentials come from the environment only.
        let client_id = std::env::var("TATTLE_OAUTH_CLIENT_ID").unwrap_or_default();
        let client_secret =
            SecretString::from(std::env::var("TATTLE_OAUTH_CLIENT_SECRET").unwrap_or_default());
        if client_id.is_empty() {
            tracing::warn!("TATTLE_OAUTH_CLIENT_ID not set; sign-in and generation will fail");
        }

        let gateway: SharedGateway = Arc::new(HttpModelGateway::new(
            config.gateway_base_url.clone(),
            client_id.clone(),
        ));

        let credentials: SharedCredentials = Arc::new(RefreshingCredentialSource::new(
            SqliteProfileRepository::new(db_pool.clone()),
            OAuthClient::new(
                config.gateway_base_url.clone(),
                client_id.clone(),
                client_secret.clone(),
            ),
        ));

        let oauth = Arc::new(OAuthClient::new(
            config.gateway_base_url.clone(),
            client_id,
            client_secret,
        ));

        let round_config = RoundConfig {
            pace_min_ms: config.pace_min_ms,
            pace_max_ms: config.pace_max_ms,
        };

        let round_engine = RoundEngine::new(
            SqliteRoomRepository::new(db_pool.clone()),
            SqliteActorRepository::new(db_pool.clone()),
            SqliteMessageRepository::new(db_pool.clone()),
            credentials.clone(),
            gateway.clone(),
            round_config,
        );

        let miner = StoryMiner::new(
            SqliteActorRepository::new(db_pool.clone()),
            SqliteMessageRepository::new(db_pool.clone()),
            credentials.clone(),
            gateway.clone(),
        );

        let publisher = GossipPublisher::new(
            SqliteActorRepository::new(db_pool.clone()),
            SqliteStoryRepository::new(db_pool.clone()),
            SqliteGossipRepository::new(db_pool.clone()),
            SqliteTrendRepository::new(db_pool.clone()),
            credentials.clone(),
            gateway.clone(),
        );

        let actor_service = ActorService::new(
            SqliteProfileRepository::new(db_pool.clone()),
            SqliteActorRepository::new(db_pool.clone()),
        );

        Ok(Self {
            round_engine: Arc::new(round_engine),
            miner: Arc::new(miner),
            publisher: Arc::new(publisher),
            actor_service: Arc::new(actor_service),
            oauth,
            profiles: Arc::new(SqliteProfileRepository::new(db_pool.clone())),
            actors: Arc::new(SqliteActorRepository::new(db_pool.clone())),
            rooms: Arc::new(SqliteRoomRepository::new(db_pool.clone())),
            messages: Arc::new(SqliteMessageRepository::new(db_pool.clone())),
            stories: Arc::new(SqliteStoryRepository::new(db_pool.clone())),
            gossip: Arc::new(SqliteGossipRepository::new(db_pool.clone())),
            trends: Arc::new(SqliteTrendRepository::new(db_pool.clone())),
            interactions: Arc::new(SqliteInteractionRepository::new(db_pool.clone())),
            config,
            data_dir,
            db_pool,
        })
    }
}
