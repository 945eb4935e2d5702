//! Application state wiring all services together.
//!
//! The builder and poll service are generic over the repository trait;
//! AppState pins them to the SQLite implementation and shares one pool
//! between them.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use pollbot_core::builder::PollBuilder;
use pollbot_core::service::access::AccessPolicy;
use pollbot_core::service::poll::PollService;
use pollbot_infra::config::{load_global_config, resolve_data_dir};
use pollbot_infra::sqlite::poll::SqlitePollRepository;
use pollbot_infra::sqlite::pool::{DatabasePool, database_url_in};
use pollbot_types::config::GlobalConfig;

use crate::chat::PollPlugin;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcretePollBuilder = PollBuilder<SqlitePollRepository>;
pub type ConcretePollService = PollService<SqlitePollRepository>;
pub type ConcretePollPlugin = PollPlugin<SqlitePollRepository>;

#[derive(Clone)]
pub struct AppState {
    pub builder: Arc<ConcretePollBuilder>,
    pub poll_service: Arc<ConcretePollService>,
    pub repo: SqlitePollRepository,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load configuration, open the store and wire services.
    ///
    /// `extra_admins` (from `--admin`) are added to the configured admin set.
    pub async fn init(extra_admins: &[String]) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let mut config = load_global_config(&data_dir).await;
        config.admins.extend(extra_admins.iter().cloned());

        let db_url = match &config.database_url {
            Some(url) => url.clone(),
            None => format!("{}?mode=rwc", database_url_in(&data_dir)),
        };
        let db_pool = DatabasePool::new(&db_url).await?;
        tracing::info!(data_dir = %data_dir.display(), admins = config.admins.len(), "poll store ready");

        let repo = SqlitePollRepository::new(db_pool);
        let access = AccessPolicy::new(config.admins.iter().cloned());

        Ok(Self {
            builder: Arc::new(PollBuilder::new(repo.clone())),
            poll_service: Arc::new(PollService::new(repo.clone(), access)),
            repo,
            config: Arc::new(config),
            data_dir,
        })
    }

    /// Tally bar width from config; zero falls back to the default.
    pub fn bar_width(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.config.bar_width)
            .or_else(|| NonZeroUsize::new(GlobalConfig::default().bar_width))
            .unwrap_or(NonZeroUsize::MIN)
    }

    pub fn plugin(&self) -> ConcretePollPlugin {
        PollPlugin::new(
            Arc::clone(&self.builder),
            Arc::clone(&self.poll_service),
            self.bar_width(),
        )
    }
}
