use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use arena_combat::KillEnemy;
use arena_infra::{
    config::{AppConfig, StorageConfig},
    kill_coordinator::{KillCoordinator, KillError, KillReceipt},
    seed::{SeedError, SeedPlan, seed_demo_data},
    store::{CombatStore, InMemoryCombatStore, PostgresCombatStore, StoreError},
};

#[derive(Debug, Error)]
pub enum ServicesError {
    #[error("failed to connect to database: {0}")]
    Connect(#[from] sqlx::Error),
    #[error("failed to prepare schema: {0}")]
    Migrate(#[from] StoreError),
    #[error("failed to seed demo data: {0}")]
    Seed(#[from] SeedError),
}

type InMemoryCoordinator = KillCoordinator<Arc<InMemoryCombatStore>>;
type PersistentCoordinator = KillCoordinator<Arc<PostgresCombatStore>>;

#[derive(Debug, Clone)]
pub enum AppServices {
    InMemory {
        coordinator: Arc<InMemoryCoordinator>,
    },
    Persistent {
        coordinator: Arc<PersistentCoordinator>,
    },
}

impl AppServices {
    pub fn in_memory(store: Arc<InMemoryCombatStore>) -> Self {
        AppServices::InMemory {
            coordinator: Arc::new(KillCoordinator::new(store)),
        }
    }

    pub fn persistent(store: Arc<PostgresCombatStore>) -> Self {
        AppServices::Persistent {
            coordinator: Arc::new(KillCoordinator::new(store)),
        }
    }

    pub async fn attempt_kill(&self, command: KillEnemy) -> Result<KillReceipt, KillError> {
        match self {
            AppServices::InMemory { coordinator } => coordinator.attempt_kill(command).await,
            AppServices::Persistent { coordinator } => coordinator.attempt_kill(command).await,
        }
    }

    /// Read side, whichever backend is wired.
    pub fn store(&self) -> &dyn CombatStore {
        match self {
            AppServices::InMemory { coordinator } => coordinator.store().as_ref(),
            AppServices::Persistent { coordinator } => coordinator.store().as_ref(),
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            AppServices::InMemory { .. } => "in_memory",
            AppServices::Persistent { .. } => "postgres",
        }
    }
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, ServicesError> {
    let services = match &config.storage {
        StorageConfig::InMemory => build_in_memory_services(),
        StorageConfig::Postgres {
            url,
            max_connections,
        } => build_persistent_services(url, *max_connections).await?,
    };

    if config.seed_demo_data {
        seed_demo_data(services.store(), SeedPlan::default()).await?;
    }

    Ok(services)
}

fn build_in_memory_services() -> AppServices {
    // In-memory wiring (dev/test): state is lost on restart.
    AppServices::in_memory(Arc::new(InMemoryCombatStore::new()))
}

async fn build_persistent_services(
    url: &str,
    max_connections: u32,
) -> Result<AppServices, ServicesError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await?;

    let store = PostgresCombatStore::new(pool);
    store.migrate().await?;
    tracing::info!(max_connections, "connected to postgres");

    Ok(AppServices::persistent(Arc::new(store)))
}
